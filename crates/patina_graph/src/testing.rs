// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal module kinds used by the engine's own tests.

use std::any::Any;
use std::cell::Cell;

use crate::evaluation::EvalContext;
use crate::module::Module;
use crate::port::{Port, ValueKind};
use crate::procedure::Procedure;
use crate::registry::KindRegistry;
use crate::stream::{ReadError, SceneContext, StreamError, StreamReader, StreamWriter};

/// Constant number with a serialized payload
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

const CONSTANT_OUTPUTS: [Port; 1] = [Port::output(ValueKind::Number, "Value")];

impl Module for Constant {
    fn kind(&self) -> &str {
        "test.constant"
    }

    fn input_ports(&self) -> &[Port] {
        &[]
    }

    fn output_ports(&self) -> &[Port] {
        &CONSTANT_OUTPUTS
    }

    fn average_value(&self, _which: usize, _blur: f64, _ctx: &mut EvalContext<'_>) -> f64 {
        self.value
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(Self { value: self.value })
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

/// Adds its two inputs, treating unlinked inputs as zero
pub struct Sum;

const SUM_INPUTS: [Port; 2] = [
    Port::input(ValueKind::Number, "Value 1"),
    Port::input(ValueKind::Number, "Value 2"),
];
const SUM_OUTPUTS: [Port; 1] = [Port::output(ValueKind::Number, "Sum")];

impl Module for Sum {
    fn kind(&self) -> &str {
        "test.sum"
    }

    fn input_ports(&self) -> &[Port] {
        &SUM_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &SUM_OUTPUTS
    }

    fn average_value(&self, _which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        ctx.input_value_or(0, blur, 0.0) + ctx.input_value_or(1, blur, 0.0)
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(Self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Constant that counts how many times its number channel is evaluated
pub struct Counting {
    value: f64,
    calls: Cell<usize>,
}

impl Counting {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Module for Counting {
    fn kind(&self) -> &str {
        "test.counting"
    }

    fn input_ports(&self) -> &[Port] {
        &[]
    }

    fn output_ports(&self) -> &[Port] {
        &CONSTANT_OUTPUTS
    }

    fn average_value(&self, _which: usize, _blur: f64, _ctx: &mut EvalContext<'_>) -> f64 {
        self.calls.set(self.calls.get() + 1);
        self.value
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(Self::new(self.value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Sums its inputs, pulling the second at a widened blur
pub struct Spread {
    widen: f64,
}

impl Spread {
    pub fn new(widen: f64) -> Self {
        Self { widen }
    }
}

impl Module for Spread {
    fn kind(&self) -> &str {
        "test.spread"
    }

    fn input_ports(&self) -> &[Port] {
        &SUM_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &SUM_OUTPUTS
    }

    fn average_value(&self, _which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        ctx.input_value_or(0, blur, 0.0) + ctx.input_value_or(1, blur + self.widen, 0.0)
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(Self { widen: self.widen })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registry containing all of the test kinds
pub fn test_registry() -> KindRegistry {
    let mut registry = KindRegistry::new();
    registry.register("test.constant", || Box::new(Constant::new(0.0)));
    registry.register("test.sum", || Box::new(Sum));
    registry.register("test.counting", || Box::new(Counting::new(0.0)));
    registry.register("test.spread", || Box::new(Spread::new(0.0)));
    registry
}

/// Read the call counter of the `Counting` module at `index`
pub fn counting_calls(proc: &Procedure, index: usize) -> usize {
    proc.module(index)
        .and_then(|module| module.as_any().downcast_ref::<Counting>())
        .map(Counting::calls)
        .unwrap_or(0)
}
