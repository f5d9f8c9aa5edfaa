// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color kinds: assembling, converting, and blending colors.

use std::any::Any;

use patina_graph::{
    EvalContext, Module, Port, ReadError, Rgb, SceneContext, StreamError, StreamReader,
    StreamWriter, ValueKind,
};
use serde::{Deserialize, Serialize};

const COLOR_OUTPUT: [Port; 1] = [Port::output(ValueKind::Color, "Color")];
const RGB_INPUTS: [Port; 3] = [
    Port::input(ValueKind::Number, "Red"),
    Port::input(ValueKind::Number, "Green"),
    Port::input(ValueKind::Number, "Blue"),
];
const HSV_INPUTS: [Port; 3] = [
    Port::input(ValueKind::Number, "Hue"),
    Port::input(ValueKind::Number, "Saturation"),
    Port::input(ValueKind::Number, "Value"),
];
const BLEND_INPUTS: [Port; 3] = [
    Port::input(ValueKind::Number, "Fraction"),
    Port::input(ValueKind::Color, "Color 1"),
    Port::input(ValueKind::Color, "Color 2"),
];
const SPECTRUM_INPUTS: [Port; 1] = [Port::input(ValueKind::Number, "Index")];

fn brightness_of(module: &dyn Module, which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
    let mut color = Rgb::BLACK;
    module.color(which, blur, &mut color, ctx);
    f64::from(color.brightness())
}

/// Assembles a color from red, green, and blue numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbModule;

impl Module for RgbModule {
    fn kind(&self) -> &str {
        "rgb"
    }

    fn input_ports(&self) -> &[Port] {
        &RGB_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &COLOR_OUTPUT
    }

    fn average_value(&self, which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        brightness_of(self, which, blur, ctx)
    }

    fn color(&self, _which: usize, blur: f64, out: &mut Rgb, ctx: &mut EvalContext<'_>) {
        let r = ctx.input_value_or(0, blur, 0.0);
        let g = ctx.input_value_or(1, blur, 0.0);
        let b = ctx.input_value_or(2, blur, 0.0);
        out.set(r as f32, g as f32, b as f32);
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Assembles a color from hue, saturation, and value numbers
///
/// Hue is taken in `[0, 1]` and wraps, so a ramp feeding it cycles through
/// the spectrum.
#[derive(Debug, Clone, Copy, Default)]
pub struct HsvModule;

impl Module for HsvModule {
    fn kind(&self) -> &str {
        "hsv"
    }

    fn input_ports(&self) -> &[Port] {
        &HSV_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &COLOR_OUTPUT
    }

    fn average_value(&self, which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        brightness_of(self, which, blur, ctx)
    }

    fn color(&self, _which: usize, blur: f64, out: &mut Rgb, ctx: &mut EvalContext<'_>) {
        let hue = ctx.input_value_or(0, blur, 0.0);
        let saturation = ctx.input_value_or(1, blur, 0.0);
        let value = ctx.input_value_or(2, blur, 0.0);
        out.set_hsv(
            (hue * 360.0) as f32,
            saturation as f32,
            value as f32,
        );
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Interpolates between two colors by a fraction
///
/// The fraction is clamped to `[0, 1]`; unlinked colors read as black and
/// white so a bare blend is a gray ramp.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlendModule;

impl Module for BlendModule {
    fn kind(&self) -> &str {
        "blend"
    }

    fn input_ports(&self) -> &[Port] {
        &BLEND_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &COLOR_OUTPUT
    }

    fn average_value(&self, which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        brightness_of(self, which, blur, ctx)
    }

    fn color(&self, _which: usize, blur: f64, out: &mut Rgb, ctx: &mut EvalContext<'_>) {
        let fraction = ctx.input_value_or(0, blur, 0.5).clamp(0.0, 1.0);
        let mut first = Rgb::BLACK;
        ctx.input_color(1, blur, &mut first);
        let mut second = Rgb::WHITE;
        if !ctx.input_color(2, blur, &mut second) {
            second = Rgb::WHITE;
        }
        *out = Rgb::lerp(first, second, fraction as f32);
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One color stop of a [`SpectrumModule`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumStop {
    /// Index position in `[0, 1]`
    pub position: f64,
    /// Color at this position
    pub color: Rgb,
}

impl SpectrumStop {
    /// Create a stop
    pub fn new(position: f64, color: Rgb) -> Self {
        Self { position, color }
    }
}

/// Maps a number to a color ramp
///
/// Stops are kept sorted by position; the index input is clamped to
/// `[0, 1]` and values between stops interpolate linearly.
#[derive(Debug, Clone)]
pub struct SpectrumModule {
    stops: Vec<SpectrumStop>,
}

impl Default for SpectrumModule {
    fn default() -> Self {
        Self::new(vec![
            SpectrumStop::new(0.0, Rgb::BLACK),
            SpectrumStop::new(1.0, Rgb::WHITE),
        ])
    }
}

impl SpectrumModule {
    /// Create a ramp from `stops`, sorting them by position
    pub fn new(mut stops: Vec<SpectrumStop>) -> Self {
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { stops }
    }

    /// The stops, in position order
    pub fn stops(&self) -> &[SpectrumStop] {
        &self.stops
    }

    fn sample(&self, index: f64) -> Rgb {
        let Some((first, rest)) = self.stops.split_first() else {
            return Rgb::BLACK;
        };
        let index = index.clamp(0.0, 1.0);
        if index <= first.position {
            return first.color;
        }
        let mut prev = *first;
        for stop in rest {
            if index <= stop.position {
                let width = stop.position - prev.position;
                if width <= 0.0 {
                    return stop.color;
                }
                let t = (index - prev.position) / width;
                return Rgb::lerp(prev.color, stop.color, t as f32);
            }
            prev = *stop;
        }
        prev.color
    }
}

impl Module for SpectrumModule {
    fn kind(&self) -> &str {
        "spectrum"
    }

    fn input_ports(&self) -> &[Port] {
        &SPECTRUM_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &COLOR_OUTPUT
    }

    fn average_value(&self, which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        brightness_of(self, which, blur, ctx)
    }

    fn color(&self, _which: usize, blur: f64, out: &mut Rgb, ctx: &mut EvalContext<'_>) {
        let index = ctx.input_value_or(0, blur, 0.0);
        *out = self.sample(index);
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(self.clone())
    }

    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        w.write_i32(self.stops.len() as i32)?;
        for stop in &self.stops {
            w.write_f64(stop.position)?;
            w.write_f32(stop.color.r)?;
            w.write_f32(stop.color.g)?;
            w.write_f32(stop.color.b)?;
        }
        Ok(())
    }

    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        let count = r.read_i32()?;
        if count < 0 {
            return Err(ReadError::Malformed(format!("spectrum stop count {count}")));
        }
        let mut stops = Vec::new();
        for _ in 0..count {
            let position = r.read_f64()?;
            let red = r.read_f32()?;
            let green = r.read_f32()?;
            let blue = r.read_f32()?;
            stops.push(SpectrumStop::new(position, Rgb::new(red, green, blue)));
        }
        *self = Self::new(stops);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use patina_graph::PointInfo;

    use super::*;
    use crate::testkit::{color_proc, eval_color, feed_numbers};

    #[test]
    fn test_rgb_assembles_components() {
        let (mut proc, rgb) = color_proc(Box::new(RgbModule));
        feed_numbers(&mut proc, rgb, &[(0, 0.2), (1, 0.4), (2, 0.8)]);
        proc.init_for_point(PointInfo::default());
        let mut color = Rgb::BLACK;
        proc.output_color(0, &mut color);
        assert_eq!(color, Rgb::new(0.2, 0.4, 0.8));
    }

    #[test]
    fn test_hsv_wraps_hue() {
        let (mut proc, hsv) = color_proc(Box::new(HsvModule));
        feed_numbers(&mut proc, hsv, &[(0, 1.5), (1, 1.0), (2, 1.0)]);
        proc.init_for_point(PointInfo::default());
        let mut color = Rgb::BLACK;
        proc.output_color(0, &mut color);

        // Hue 1.5 is the same as hue 0.5 (cyan for full saturation/value).
        let mut expected = Rgb::BLACK;
        expected.set_hsv(180.0, 1.0, 1.0);
        assert_eq!(color, expected);
    }

    #[test]
    fn test_bare_blend_is_gray_ramp() {
        let (mut proc, blend) = color_proc(Box::new(BlendModule));
        feed_numbers(&mut proc, blend, &[(0, 0.25)]);
        proc.init_for_point(PointInfo::default());
        let mut color = Rgb::BLACK;
        proc.output_color(0, &mut color);
        assert_eq!(color, Rgb::gray(0.25));
    }

    #[test]
    fn test_blend_clamps_fraction() {
        let (mut proc, blend) = color_proc(Box::new(BlendModule));
        feed_numbers(&mut proc, blend, &[(0, 4.0)]);
        proc.init_for_point(PointInfo::default());
        let mut color = Rgb::BLACK;
        proc.output_color(0, &mut color);
        assert_eq!(color, Rgb::WHITE);
    }

    #[test]
    fn test_spectrum_interpolates_between_stops() {
        let ramp = SpectrumModule::new(vec![
            SpectrumStop::new(1.0, Rgb::WHITE),
            SpectrumStop::new(0.5, Rgb::new(1.0, 0.0, 0.0)),
            SpectrumStop::new(0.0, Rgb::BLACK),
        ]);
        // Constructor sorts the stops.
        assert_eq!(ramp.stops()[0].position, 0.0);

        let (mut proc, spectrum) = color_proc(Box::new(ramp));
        feed_numbers(&mut proc, spectrum, &[(0, 0.75)]);
        proc.init_for_point(PointInfo::default());
        let mut color = Rgb::BLACK;
        proc.output_color(0, &mut color);
        assert_eq!(color, Rgb::new(1.0, 0.5, 0.5));
    }

    #[test]
    fn test_spectrum_clamps_index() {
        let module = SpectrumModule::default();
        let below = eval_color(Box::new(module.clone()), PointInfo::default());
        assert_eq!(below, Rgb::BLACK);
        assert_eq!(module.sample(7.0), Rgb::WHITE);
        assert_eq!(module.sample(-7.0), Rgb::BLACK);
    }

    #[test]
    fn test_empty_spectrum_is_black() {
        let module = SpectrumModule::new(Vec::new());
        assert_eq!(module.sample(0.5), Rgb::BLACK);
    }
}
