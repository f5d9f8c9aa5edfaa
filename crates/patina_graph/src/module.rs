// SPDX-License-Identifier: MIT OR Apache-2.0
//! The module trait: the unit of computation in a procedure.

use std::any::Any;

use glam::DVec3;

use crate::color::Rgb;
use crate::evaluation::EvalContext;
use crate::port::Port;
use crate::stream::{ReadError, SceneContext, StreamError, StreamReader, StreamWriter};

/// A computation node in a procedure graph
///
/// Implementations hold their kind-specific parameters and expose a fixed
/// port shape. All per-point state lives outside the module in the
/// procedure's evaluation cache, so the channel methods take `&self` and
/// pull input values through the [`EvalContext`], which memoizes each
/// output per point.
///
/// The three channels mirror the [`ValueKind`](crate::ValueKind)s ports can
/// carry. A module only needs to implement the channels its outputs
/// produce; the defaults derive the rest, and they are also the answer a
/// caller gets when requesting a kind an output does not produce: a gray
/// color from the number channel, a zero gradient, a zero value.
pub trait Module: Send {
    /// Kind identifier, written to streams and resolved through a
    /// [`KindRegistry`](crate::KindRegistry) when reading them back
    fn kind(&self) -> &str;

    /// Ordered input port shape
    fn input_ports(&self) -> &[Port];

    /// Ordered output port shape
    fn output_ports(&self) -> &[Port];

    /// Average value of output `which` over a footprint of size `blur`
    fn average_value(&self, which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        let _ = (which, blur, ctx);
        0.0
    }

    /// Gradient of output `which` with respect to position
    ///
    /// Doubles as the vector channel for vector-kind outputs.
    fn value_gradient(&self, which: usize, blur: f64, grad: &mut DVec3, ctx: &mut EvalContext<'_>) {
        let _ = (which, blur, ctx);
        *grad = DVec3::ZERO;
    }

    /// Color of output `which`
    fn color(&self, which: usize, blur: f64, out: &mut Rgb, ctx: &mut EvalContext<'_>) {
        let value = self.average_value(which, blur, ctx);
        *out = Rgb::gray(value as f32);
    }

    /// Deep copy with the same parameters
    ///
    /// The copy shares no state with the original; identity queries such as
    /// [`Procedure::module_index`](crate::Procedure::module_index) treat it
    /// as a distinct module.
    fn duplicate(&self) -> Box<dyn Module>;

    /// Write kind-specific parameters
    ///
    /// The default writes nothing, for kinds fully described by their
    /// identifier.
    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        let _ = (w, scene);
        Ok(())
    }

    /// Restore the parameters written by [`Module::write_payload`]
    ///
    /// Called on a freshly constructed instance of the same kind; the port
    /// shape reported afterwards is the one the procedure trusts.
    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        let _ = (r, scene);
        Ok(())
    }

    /// The module as [`Any`], for host-side downcasting
    fn as_any(&self) -> &dyn Any;
}
