// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared test scaffolding: one-module procedures and single-point reads.

use glam::DVec3;
use patina_graph::{
    Link, Module, OutputModule, PointInfo, Position, Procedure, Rgb, Source, ValueKind,
};

use crate::source::NumberModule;

/// Procedure with one number output fed by the module's first output port
pub fn number_proc(module: Box<dyn Module>) -> (Procedure, usize) {
    let mut proc = Procedure::new(vec![OutputModule::new(
        "Value",
        ValueKind::Number,
        0.0,
        Rgb::BLACK,
    )]);
    let index = proc.add_module(module, Position::default());
    proc.add_link(Link::to_output(Source::new(index, 0), 0));
    (proc, index)
}

/// Same shape as [`number_proc`]; the caller reads the gradient channel
pub fn gradient_proc(module: Box<dyn Module>) -> (Procedure, usize) {
    number_proc(module)
}

/// Procedure with one color output fed by the module's first output port
pub fn color_proc(module: Box<dyn Module>) -> (Procedure, usize) {
    let mut proc = Procedure::new(vec![OutputModule::new(
        "Color",
        ValueKind::Color,
        0.0,
        Rgb::BLACK,
    )]);
    let index = proc.add_module(module, Position::default());
    proc.add_link(Link::to_output(Source::new(index, 0), 0));
    (proc, index)
}

/// Wire constant numbers into the given inputs of `target`
pub fn feed_numbers(proc: &mut Procedure, target: usize, values: &[(usize, f64)]) {
    for &(input, value) in values {
        let constant = proc.add_module(Box::new(NumberModule::new(value)), Position::default());
        proc.add_link(Link::to_module(Source::new(constant, 0), target, input));
    }
}

/// Value of the module's first output at `point`, no inputs wired
pub fn eval_number(module: Box<dyn Module>, point: PointInfo) -> f64 {
    let (mut proc, _) = number_proc(module);
    proc.init_for_point(point);
    proc.output_value(0)
}

/// Gradient of the module's first output at `point`, no inputs wired
pub fn eval_gradient(module: Box<dyn Module>, point: PointInfo) -> DVec3 {
    let (mut proc, _) = gradient_proc(module);
    proc.init_for_point(point);
    let mut grad = DVec3::ZERO;
    proc.output_gradient(0, &mut grad);
    grad
}

/// Color of the module's first output at `point`, no inputs wired
pub fn eval_color(module: Box<dyn Module>, point: PointInfo) -> Rgb {
    let (mut proc, _) = color_proc(module);
    proc.init_for_point(point);
    let mut color = Rgb::BLACK;
    proc.output_color(0, &mut color);
    color
}

/// Value of a two-input module with constants `a` and `b` wired in
pub fn eval_binary(module: Box<dyn Module>, a: f64, b: f64) -> f64 {
    let (mut proc, index) = number_proc(module);
    feed_numbers(&mut proc, index, &[(0, a), (1, b)]);
    proc.init_for_point(PointInfo::default());
    proc.output_value(0)
}

/// Value of a module with only its first input wired to the constant `x`
pub fn eval_unary(module: Box<dyn Module>, x: f64) -> f64 {
    let (mut proc, index) = number_proc(module);
    feed_numbers(&mut proc, index, &[(0, x)]);
    proc.init_for_point(PointInfo::default());
    proc.output_value(0)
}
