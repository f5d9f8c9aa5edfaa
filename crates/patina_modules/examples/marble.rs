// SPDX-License-Identifier: MIT OR Apache-2.0
//! Renders a marble swatch as ASCII shading.
//!
//! Builds the classic `0.5 + 0.5 * sin(6x + 4 * turbulence(p))` vein graph
//! and evaluates it over a small grid.

use glam::DVec3;
use patina_graph::{Link, OutputModule, PointInfo, Position, Procedure, Rgb, Source, ValueKind};
use patina_modules::{
    ArithmeticModule, ArithmeticOp, Axis, CoordinateModule, FunctionModule, NumberModule,
    SpectrumModule, SpectrumStop, TurbulenceModule, UnaryOp,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SHADES: &[u8] = b" .:-=+*#%@";

fn marble() -> Procedure {
    let mut proc = Procedure::new(vec![OutputModule::new(
        "Color",
        ValueKind::Color,
        0.5,
        Rgb::gray(0.5),
    )]);

    let x = proc.add_module(
        Box::new(CoordinateModule::new(Axis::X)),
        Position::new(0, 0),
    );
    let six = proc.add_module(Box::new(NumberModule::new(6.0)), Position::new(0, 60));
    let scaled_x = proc.add_module(
        Box::new(ArithmeticModule::new(ArithmeticOp::Multiply)),
        Position::new(120, 30),
    );
    let swirl = proc.add_module(
        Box::new(TurbulenceModule::new(4, 0.6)),
        Position::new(0, 120),
    );
    let four = proc.add_module(Box::new(NumberModule::new(4.0)), Position::new(0, 180));
    let scaled_swirl = proc.add_module(
        Box::new(ArithmeticModule::new(ArithmeticOp::Multiply)),
        Position::new(120, 150),
    );
    let phase = proc.add_module(
        Box::new(ArithmeticModule::new(ArithmeticOp::Add)),
        Position::new(240, 90),
    );
    let wave = proc.add_module(
        Box::new(FunctionModule::new(UnaryOp::Sine)),
        Position::new(360, 90),
    );
    // Remap the wave from [-1, 1] into ramp space.
    let half = proc.add_module(Box::new(NumberModule::new(0.5)), Position::new(360, 150));
    let scaled_wave = proc.add_module(
        Box::new(ArithmeticModule::new(ArithmeticOp::Multiply)),
        Position::new(480, 90),
    );
    let vein = proc.add_module(
        Box::new(ArithmeticModule::new(ArithmeticOp::Add)),
        Position::new(600, 90),
    );
    let ramp = proc.add_module(
        Box::new(SpectrumModule::new(vec![
            SpectrumStop::new(0.0, Rgb::new(0.10, 0.14, 0.35)),
            SpectrumStop::new(1.0, Rgb::WHITE),
        ])),
        Position::new(720, 90),
    );

    proc.add_link(Link::to_module(Source::new(x, 0), scaled_x, 0));
    proc.add_link(Link::to_module(Source::new(six, 0), scaled_x, 1));
    proc.add_link(Link::to_module(Source::new(swirl, 0), scaled_swirl, 0));
    proc.add_link(Link::to_module(Source::new(four, 0), scaled_swirl, 1));
    proc.add_link(Link::to_module(Source::new(scaled_x, 0), phase, 0));
    proc.add_link(Link::to_module(Source::new(scaled_swirl, 0), phase, 1));
    proc.add_link(Link::to_module(Source::new(phase, 0), wave, 0));
    proc.add_link(Link::to_module(Source::new(wave, 0), scaled_wave, 0));
    proc.add_link(Link::to_module(Source::new(half, 0), scaled_wave, 1));
    proc.add_link(Link::to_module(Source::new(scaled_wave, 0), vein, 0));
    proc.add_link(Link::to_module(Source::new(half, 0), vein, 1));
    proc.add_link(Link::to_module(Source::new(vein, 0), ramp, 0));
    proc.add_link(Link::to_output(Source::new(ramp, 0), 0));
    proc
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("marble=debug".parse().unwrap());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut proc = marble();
    tracing::debug!(
        modules = proc.module_count(),
        links = proc.link_count(),
        "marble graph built"
    );

    for row in 0..24 {
        let mut line = String::with_capacity(64);
        for col in 0..64 {
            let point = PointInfo::at(DVec3::new(col as f64 / 16.0, row as f64 / 8.0, 0.0));
            proc.init_for_point(point);
            let mut color = Rgb::BLACK;
            proc.output_color(0, &mut color);
            let shade = (color.brightness() * (SHADES.len() - 1) as f32).round() as usize;
            line.push(SHADES[shade.min(SHADES.len() - 1)] as char);
        }
        println!("{line}");
    }
}
