// SPDX-License-Identifier: MIT OR Apache-2.0
//! Source kinds: modules with no inputs that feed values into a graph.

use std::any::Any;

use glam::DVec3;
use patina_graph::{
    EvalContext, Module, Port, ReadError, Rgb, SceneContext, StreamError, StreamReader,
    StreamWriter, ValueKind,
};
use serde::{Deserialize, Serialize};

const NUMBER_OUTPUT: [Port; 1] = [Port::output(ValueKind::Number, "Value")];
const COLOR_OUTPUT: [Port; 1] = [Port::output(ValueKind::Color, "Color")];

/// Component of the sample point selected by a [`CoordinateModule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    /// X position
    #[default]
    X,
    /// Y position
    Y,
    /// Z position
    Z,
    /// Scene time
    Time,
}

impl Axis {
    fn tag(self) -> i16 {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::Time => 3,
        }
    }

    fn from_tag(tag: i16) -> Option<Self> {
        match tag {
            0 => Some(Self::X),
            1 => Some(Self::Y),
            2 => Some(Self::Z),
            3 => Some(Self::Time),
            _ => None,
        }
    }
}

/// Emits one coordinate of the sample point
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateModule {
    axis: Axis,
}

impl CoordinateModule {
    /// Create a coordinate source for `axis`
    pub fn new(axis: Axis) -> Self {
        Self { axis }
    }

    /// The selected axis
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Change the selected axis
    pub fn set_axis(&mut self, axis: Axis) {
        self.axis = axis;
    }
}

impl Module for CoordinateModule {
    fn kind(&self) -> &str {
        "coordinate"
    }

    fn input_ports(&self) -> &[Port] {
        &[]
    }

    fn output_ports(&self) -> &[Port] {
        &NUMBER_OUTPUT
    }

    fn average_value(&self, _which: usize, _blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        let point = ctx.point();
        match self.axis {
            Axis::X => point.position.x,
            Axis::Y => point.position.y,
            Axis::Z => point.position.z,
            Axis::Time => point.time,
        }
    }

    fn value_gradient(
        &self,
        _which: usize,
        _blur: f64,
        grad: &mut DVec3,
        _ctx: &mut EvalContext<'_>,
    ) {
        *grad = match self.axis {
            Axis::X => DVec3::X,
            Axis::Y => DVec3::Y,
            Axis::Z => DVec3::Z,
            Axis::Time => DVec3::ZERO,
        };
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        w.write_i16(self.axis.tag())
    }

    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        let tag = r.read_i16()?;
        self.axis = Axis::from_tag(tag)
            .ok_or_else(|| ReadError::Malformed(format!("coordinate axis {tag}")))?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Emits a constant number
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberModule {
    value: f64,
}

impl NumberModule {
    /// Create a constant with `value`
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    /// The constant value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Change the constant value
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

impl Module for NumberModule {
    fn kind(&self) -> &str {
        "number"
    }

    fn input_ports(&self) -> &[Port] {
        &[]
    }

    fn output_ports(&self) -> &[Port] {
        &NUMBER_OUTPUT
    }

    fn average_value(&self, _which: usize, _blur: f64, _ctx: &mut EvalContext<'_>) -> f64 {
        self.value
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        w.write_f64(self.value)
    }

    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        self.value = r.read_f64()?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Emits a constant color
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorModule {
    color: Rgb,
}

impl ColorModule {
    /// Create a constant with `color`
    pub fn new(color: Rgb) -> Self {
        Self { color }
    }

    /// The constant color
    pub fn color_value(&self) -> Rgb {
        self.color
    }

    /// Change the constant color
    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }
}

impl Module for ColorModule {
    fn kind(&self) -> &str {
        "color"
    }

    fn input_ports(&self) -> &[Port] {
        &[]
    }

    fn output_ports(&self) -> &[Port] {
        &COLOR_OUTPUT
    }

    fn average_value(&self, _which: usize, _blur: f64, _ctx: &mut EvalContext<'_>) -> f64 {
        f64::from(self.color.brightness())
    }

    fn color(&self, _which: usize, _blur: f64, out: &mut Rgb, _ctx: &mut EvalContext<'_>) {
        *out = self.color;
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        w.write_f32(self.color.r)?;
        w.write_f32(self.color.g)?;
        w.write_f32(self.color.b)
    }

    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        self.color.r = r.read_f32()?;
        self.color.g = r.read_f32()?;
        self.color.b = r.read_f32()?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Emits one of the per-point surface parameters
///
/// Hosts that attach parameter arrays to their geometry (vertex weights,
/// painted masks) surface them to graphs through this kind; the gradient is
/// reported as zero because the engine only sees one point at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterModule {
    index: usize,
}

impl ParameterModule {
    /// Create a source for parameter `index`
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// The parameter index read from each point
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Module for ParameterModule {
    fn kind(&self) -> &str {
        "parameter"
    }

    fn input_ports(&self) -> &[Port] {
        &[]
    }

    fn output_ports(&self) -> &[Port] {
        &NUMBER_OUTPUT
    }

    fn average_value(&self, _which: usize, _blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        ctx.point().param(self.index)
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        w.write_i32(self.index as i32)
    }

    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        let index = r.read_i32()?;
        self.index = usize::try_from(index)
            .map_err(|_| ReadError::Malformed(format!("parameter index {index}")))?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use patina_graph::PointInfo;

    use super::*;
    use crate::testkit::{eval_color, eval_gradient, eval_number};

    #[test]
    fn test_coordinate_selects_axis() {
        let point = PointInfo::at(DVec3::new(1.0, 2.0, 3.0)).with_time(4.0);
        for (axis, expected) in [
            (Axis::X, 1.0),
            (Axis::Y, 2.0),
            (Axis::Z, 3.0),
            (Axis::Time, 4.0),
        ] {
            let value = eval_number(Box::new(CoordinateModule::new(axis)), point.clone());
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn test_coordinate_gradient_is_unit_axis() {
        let point = PointInfo::at(DVec3::new(5.0, 6.0, 7.0));
        let grad = eval_gradient(Box::new(CoordinateModule::new(Axis::Y)), point.clone());
        assert_eq!(grad, DVec3::Y);
        let grad = eval_gradient(Box::new(CoordinateModule::new(Axis::Time)), point);
        assert_eq!(grad, DVec3::ZERO);
    }

    #[test]
    fn test_number_is_constant() {
        let value = eval_number(Box::new(NumberModule::new(2.5)), PointInfo::default());
        assert_eq!(value, 2.5);
    }

    #[test]
    fn test_color_module_channels() {
        let cyan = Rgb::new(0.0, 1.0, 1.0);
        let color = eval_color(Box::new(ColorModule::new(cyan)), PointInfo::default());
        assert_eq!(color, cyan);

        // Number channel reads the brightness.
        let value = eval_number(Box::new(ColorModule::new(cyan)), PointInfo::default());
        assert!((value - f64::from(cyan.brightness())).abs() < 1.0e-9);
    }

    #[test]
    fn test_parameter_reads_point_params() {
        let point = PointInfo::default().with_params(vec![0.25, 0.75]);
        let value = eval_number(Box::new(ParameterModule::new(1)), point.clone());
        assert_eq!(value, 0.75);

        // Out-of-range parameters read as zero.
        let value = eval_number(Box::new(ParameterModule::new(9)), point);
        assert_eq!(value, 0.0);
    }
}
