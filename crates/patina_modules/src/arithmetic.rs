// SPDX-License-Identifier: MIT OR Apache-2.0
//! Math kinds: binary arithmetic, unary functions, and blur control.

use std::any::Any;

use glam::DVec3;
use patina_graph::{
    EvalContext, Module, ModuleConstructor, Port, ReadError, Rgb, SceneContext, StreamError,
    StreamReader, StreamWriter, ValueKind,
};
use serde::{Deserialize, Serialize};

const BINARY_INPUTS: [Port; 2] = [
    Port::input(ValueKind::Number, "Value 1"),
    Port::input(ValueKind::Number, "Value 2"),
];
const UNARY_INPUTS: [Port; 1] = [Port::input(ValueKind::Number, "Value")];
const RESULT_OUTPUT: [Port; 1] = [Port::output(ValueKind::Number, "Result")];
const VALUE_OUTPUT: [Port; 1] = [Port::output(ValueKind::Number, "Value")];

/// Binary operator applied by an [`ArithmeticModule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`, zero when `b` is zero
    Divide,
    /// `a` raised to `b`
    Power,
    /// Smaller of the two
    Min,
    /// Larger of the two
    Max,
}

impl ArithmeticOp {
    /// Every operator, in palette order
    pub const ALL: [Self; 7] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Power,
        Self::Min,
        Self::Max,
    ];

    /// Registry identifier for this operator
    pub fn kind(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Power => "power",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Registry constructor for this operator
    pub fn constructor(self) -> ModuleConstructor {
        match self {
            Self::Add => || Box::new(ArithmeticModule::new(Self::Add)),
            Self::Subtract => || Box::new(ArithmeticModule::new(Self::Subtract)),
            Self::Multiply => || Box::new(ArithmeticModule::new(Self::Multiply)),
            Self::Divide => || Box::new(ArithmeticModule::new(Self::Divide)),
            Self::Power => || Box::new(ArithmeticModule::new(Self::Power)),
            Self::Min => || Box::new(ArithmeticModule::new(Self::Min)),
            Self::Max => || Box::new(ArithmeticModule::new(Self::Max)),
        }
    }

    /// Values assumed for unlinked inputs
    ///
    /// Multiplicative operators default to their identity so a half-wired
    /// module passes its one input through instead of pinning it to zero.
    fn defaults(self) -> (f64, f64) {
        match self {
            Self::Add | Self::Subtract | Self::Min | Self::Max => (0.0, 0.0),
            Self::Multiply | Self::Divide | Self::Power => (0.0, 1.0),
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            Self::Power => a.powf(b),
            Self::Min => a.min(b),
            Self::Max => a.max(b),
        }
    }
}

/// Combines two numbers with a binary operator
#[derive(Debug, Clone, Copy)]
pub struct ArithmeticModule {
    op: ArithmeticOp,
}

impl ArithmeticModule {
    /// Create a module applying `op`
    pub fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }

    /// The operator applied
    pub fn op(&self) -> ArithmeticOp {
        self.op
    }
}

impl Module for ArithmeticModule {
    fn kind(&self) -> &str {
        self.op.kind()
    }

    fn input_ports(&self) -> &[Port] {
        &BINARY_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &RESULT_OUTPUT
    }

    fn average_value(&self, _which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        let (d0, d1) = self.op.defaults();
        let a = ctx.input_value_or(0, blur, d0);
        let b = ctx.input_value_or(1, blur, d1);
        self.op.apply(a, b)
    }

    fn value_gradient(
        &self,
        _which: usize,
        blur: f64,
        grad: &mut DVec3,
        ctx: &mut EvalContext<'_>,
    ) {
        let mut g0 = DVec3::ZERO;
        let mut g1 = DVec3::ZERO;
        ctx.input_gradient(0, blur, &mut g0);
        ctx.input_gradient(1, blur, &mut g1);
        let (d0, d1) = self.op.defaults();
        let a = ctx.input_value_or(0, blur, d0);
        let b = ctx.input_value_or(1, blur, d1);

        *grad = match self.op {
            ArithmeticOp::Add => g0 + g1,
            ArithmeticOp::Subtract => g0 - g1,
            ArithmeticOp::Multiply => b * g0 + a * g1,
            ArithmeticOp::Divide => {
                if b == 0.0 {
                    DVec3::ZERO
                } else {
                    (g0 * b - g1 * a) / (b * b)
                }
            }
            ArithmeticOp::Power => {
                // d(a^b) = a^(b-1) * (b*da + a*ln(a)*db); undefined parts
                // collapse to zero rather than NaN.
                if a > 0.0 {
                    a.powf(b - 1.0) * (b * g0 + a * a.ln() * g1)
                } else {
                    DVec3::ZERO
                }
            }
            ArithmeticOp::Min => {
                if a <= b {
                    g0
                } else {
                    g1
                }
            }
            ArithmeticOp::Max => {
                if a >= b {
                    g0
                } else {
                    g1
                }
            }
        };
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Unary function applied by a [`FunctionModule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Sine, input in radians
    Sine,
    /// Cosine, input in radians
    Cosine,
    /// Square root, zero for non-positive input
    Sqrt,
    /// Absolute value
    Abs,
    /// Natural exponential
    Exp,
    /// Natural logarithm, zero for non-positive input
    Log,
}

impl UnaryOp {
    /// Every function, in palette order
    pub const ALL: [Self; 6] = [
        Self::Sine,
        Self::Cosine,
        Self::Sqrt,
        Self::Abs,
        Self::Exp,
        Self::Log,
    ];

    /// Registry identifier for this function
    pub fn kind(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Cosine => "cosine",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Exp => "exp",
            Self::Log => "log",
        }
    }

    /// Registry constructor for this function
    pub fn constructor(self) -> ModuleConstructor {
        match self {
            Self::Sine => || Box::new(FunctionModule::new(Self::Sine)),
            Self::Cosine => || Box::new(FunctionModule::new(Self::Cosine)),
            Self::Sqrt => || Box::new(FunctionModule::new(Self::Sqrt)),
            Self::Abs => || Box::new(FunctionModule::new(Self::Abs)),
            Self::Exp => || Box::new(FunctionModule::new(Self::Exp)),
            Self::Log => || Box::new(FunctionModule::new(Self::Log)),
        }
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sine => x.sin(),
            Self::Cosine => x.cos(),
            Self::Sqrt => {
                if x > 0.0 {
                    x.sqrt()
                } else {
                    0.0
                }
            }
            Self::Abs => x.abs(),
            Self::Exp => x.exp(),
            Self::Log => {
                if x > 0.0 {
                    x.ln()
                } else {
                    0.0
                }
            }
        }
    }

    fn derivative(self, x: f64) -> f64 {
        match self {
            Self::Sine => x.cos(),
            Self::Cosine => -x.sin(),
            Self::Sqrt => {
                if x > 0.0 {
                    0.5 / x.sqrt()
                } else {
                    0.0
                }
            }
            Self::Abs => {
                if x < 0.0 {
                    -1.0
                } else {
                    1.0
                }
            }
            Self::Exp => x.exp(),
            Self::Log => {
                if x > 0.0 {
                    1.0 / x
                } else {
                    0.0
                }
            }
        }
    }
}

/// Applies a unary function to its input
#[derive(Debug, Clone, Copy)]
pub struct FunctionModule {
    op: UnaryOp,
}

impl FunctionModule {
    /// Create a module applying `op`
    pub fn new(op: UnaryOp) -> Self {
        Self { op }
    }

    /// The function applied
    pub fn op(&self) -> UnaryOp {
        self.op
    }
}

impl Module for FunctionModule {
    fn kind(&self) -> &str {
        self.op.kind()
    }

    fn input_ports(&self) -> &[Port] {
        &UNARY_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &RESULT_OUTPUT
    }

    fn average_value(&self, _which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        self.op.apply(ctx.input_value_or(0, blur, 0.0))
    }

    fn value_gradient(
        &self,
        _which: usize,
        blur: f64,
        grad: &mut DVec3,
        ctx: &mut EvalContext<'_>,
    ) {
        let mut gx = DVec3::ZERO;
        ctx.input_gradient(0, blur, &mut gx);
        let x = ctx.input_value_or(0, blur, 0.0);
        *grad = self.op.derivative(x) * gx;
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Widens the blur its upstream graph is evaluated with
///
/// Everything upstream of this module sees `blur + amount`, which pattern
/// kinds use to drop octaves and soften edges. Memoization keys on blur, so
/// a module reachable both through and around a blur evaluates twice with
/// the two footprints.
#[derive(Debug, Clone, Copy)]
pub struct BlurModule {
    amount: f64,
}

impl Default for BlurModule {
    fn default() -> Self {
        Self { amount: 0.05 }
    }
}

impl BlurModule {
    /// Create a blur adding `amount` to the footprint
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    /// The added blur amount
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Change the added blur amount
    pub fn set_amount(&mut self, amount: f64) {
        self.amount = amount;
    }
}

impl Module for BlurModule {
    fn kind(&self) -> &str {
        "blur"
    }

    fn input_ports(&self) -> &[Port] {
        &UNARY_INPUTS
    }

    fn output_ports(&self) -> &[Port] {
        &VALUE_OUTPUT
    }

    fn average_value(&self, _which: usize, blur: f64, ctx: &mut EvalContext<'_>) -> f64 {
        ctx.input_value_or(0, blur + self.amount, 0.0)
    }

    fn value_gradient(
        &self,
        _which: usize,
        blur: f64,
        grad: &mut DVec3,
        ctx: &mut EvalContext<'_>,
    ) {
        ctx.input_gradient(0, blur + self.amount, grad);
    }

    fn color(&self, _which: usize, blur: f64, out: &mut Rgb, ctx: &mut EvalContext<'_>) {
        ctx.input_color(0, blur + self.amount, out);
    }

    fn duplicate(&self) -> Box<dyn Module> {
        Box::new(*self)
    }

    fn write_payload(
        &self,
        w: &mut StreamWriter<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), StreamError> {
        w.write_f64(self.amount)
    }

    fn read_payload(
        &mut self,
        r: &mut StreamReader<'_>,
        _scene: &dyn SceneContext,
    ) -> Result<(), ReadError> {
        self.amount = r.read_f64()?;
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
    use crate::source::CoordinateModule;
    use crate::testkit::{eval_binary, eval_number, eval_unary, gradient_proc};

    #[test]
    fn test_arithmetic_values() {
        let cases = [
            (ArithmeticOp::Add, 6.0, 2.0, 8.0),
            (ArithmeticOp::Subtract, 6.0, 2.0, 4.0),
            (ArithmeticOp::Multiply, 6.0, 2.0, 12.0),
            (ArithmeticOp::Divide, 6.0, 2.0, 3.0),
            (ArithmeticOp::Power, 6.0, 2.0, 36.0),
            (ArithmeticOp::Min, 6.0, 2.0, 2.0),
            (ArithmeticOp::Max, 6.0, 2.0, 6.0),
        ];
        for (op, a, b, expected) in cases {
            let value = eval_binary(Box::new(ArithmeticModule::new(op)), a, b);
            assert_eq!(value, expected, "{op:?}");
        }
    }

    #[test]
    fn test_divide_by_zero_is_zero() {
        let value = eval_binary(Box::new(ArithmeticModule::new(ArithmeticOp::Divide)), 5.0, 0.0);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_multiplicative_defaults_pass_through() {
        // Only input 1 wired: multiply and divide treat the missing second
        // input as one, add as zero.
        let value = eval_unary(Box::new(ArithmeticModule::new(ArithmeticOp::Multiply)), 7.0);
        assert_eq!(value, 7.0);
        let value = eval_unary(Box::new(ArithmeticModule::new(ArithmeticOp::Divide)), 7.0);
        assert_eq!(value, 7.0);
        let value = eval_unary(Box::new(ArithmeticModule::new(ArithmeticOp::Add)), 7.0);
        assert_eq!(value, 7.0);
    }

    #[test]
    fn test_unary_functions() {
        let x: f64 = 0.7;
        let cases = [
            (UnaryOp::Sine, x.sin()),
            (UnaryOp::Cosine, x.cos()),
            (UnaryOp::Sqrt, x.sqrt()),
            (UnaryOp::Abs, x),
            (UnaryOp::Exp, x.exp()),
            (UnaryOp::Log, x.ln()),
        ];
        for (op, expected) in cases {
            let value = eval_unary(Box::new(FunctionModule::new(op)), x);
            assert!((value - expected).abs() < 1.0e-12, "{op:?}");
        }
    }

    #[test]
    fn test_log_and_sqrt_guard_nonpositive_input() {
        assert_eq!(eval_unary(Box::new(FunctionModule::new(UnaryOp::Log)), -2.0), 0.0);
        assert_eq!(eval_unary(Box::new(FunctionModule::new(UnaryOp::Sqrt)), -2.0), 0.0);
    }

    #[test]
    fn test_sine_of_x_gradient() {
        // sine(x) has gradient (cos(x), 0, 0).
        let (mut proc, sine) = gradient_proc(Box::new(FunctionModule::new(UnaryOp::Sine)));
        let x = proc.add_module(
            Box::new(CoordinateModule::default()),
            patina_graph::Position::default(),
        );
        proc.add_link(patina_graph::Link::to_module(
            patina_graph::Source::new(x, 0),
            sine,
            0,
        ));

        let position = DVec3::new(1.1, 0.0, 0.0);
        proc.init_for_point(PointInfo::at(position));
        let mut grad = DVec3::ZERO;
        proc.output_gradient(0, &mut grad);
        assert!((grad.x - position.x.cos()).abs() < 1.0e-12);
        assert_eq!(grad.y, 0.0);
        assert_eq!(grad.z, 0.0);
    }

    #[test]
    fn test_unlinked_arithmetic_uses_defaults() {
        let value = eval_number(
            Box::new(ArithmeticModule::new(ArithmeticOp::Power)),
            PointInfo::default(),
        );
        // 0^1 with nothing wired.
        assert_eq!(value, 0.0);
    }
}
