// SPDX-License-Identifier: MIT OR Apache-2.0
//! Standard module kinds for Patina procedures.
//!
//! This crate provides the stock building blocks a host wires into
//! [`Procedure`](patina_graph::Procedure) graphs:
//! - Sources: coordinates, constants, texture parameters
//! - Math: binary arithmetic, unary functions, blur control
//! - Color: component assembly, blending, spectrum ramps
//! - Patterns: fractal noise, turbulence, checker
//!
//! ## Architecture
//!
//! Every kind implements [`Module`](patina_graph::Module) and is registered
//! under a stable identifier so saved procedures can be read back.
//! [`standard_registry`] bundles the full catalog; hosts extend it with
//! their own kinds before loading.

pub mod arithmetic;
pub mod color;
pub mod noise;
pub mod pattern;
pub mod source;

#[cfg(test)]
mod testkit;

pub use arithmetic::{ArithmeticModule, ArithmeticOp, BlurModule, FunctionModule, UnaryOp};
pub use color::{BlendModule, HsvModule, RgbModule, SpectrumModule, SpectrumStop};
pub use pattern::{CheckerModule, NoiseModule, TurbulenceModule};
pub use source::{Axis, ColorModule, CoordinateModule, NumberModule, ParameterModule};

use patina_graph::KindRegistry;

/// Registry holding every kind this crate ships
///
/// Arithmetic and function kinds register one identifier per operation, so
/// a stream names "multiply" rather than a shared kind plus a payload flag.
pub fn standard_registry() -> KindRegistry {
    let mut registry = KindRegistry::new();

    registry.register("coordinate", || Box::new(CoordinateModule::default()));
    registry.register("number", || Box::new(NumberModule::new(0.0)));
    registry.register("color", || {
        Box::new(ColorModule::new(patina_graph::Rgb::WHITE))
    });
    registry.register("parameter", || Box::new(ParameterModule::new(0)));

    for op in ArithmeticOp::ALL {
        registry.register(op.kind(), op.constructor());
    }
    for op in UnaryOp::ALL {
        registry.register(op.kind(), op.constructor());
    }
    registry.register("blur", || Box::new(BlurModule::default()));

    registry.register("rgb", || Box::new(RgbModule));
    registry.register("hsv", || Box::new(HsvModule));
    registry.register("blend", || Box::new(BlendModule));
    registry.register("spectrum", || Box::new(SpectrumModule::default()));

    registry.register("noise", || Box::new(NoiseModule::default()));
    registry.register("turbulence", || Box::new(TurbulenceModule::default()));
    registry.register("checker", || Box::new(CheckerModule));

    registry
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use patina_graph::{
        Link, OutputModule, PointInfo, Position, Procedure, Rgb, Source, ValueKind,
    };

    use super::*;

    fn color_output() -> Vec<OutputModule> {
        vec![OutputModule::new(
            "Color",
            ValueKind::Color,
            0.0,
            Rgb::BLACK,
        )]
    }

    /// Coordinate-driven turbulence through a black-to-white ramp.
    fn marble_procedure() -> Procedure {
        let mut proc = Procedure::new(color_output());
        let x = proc.add_module(
            Box::new(CoordinateModule::new(Axis::X)),
            Position::new(0, 0),
        );
        let swirl = proc.add_module(
            Box::new(TurbulenceModule::new(3, 0.5)),
            Position::new(120, 0),
        );
        let ramp = proc.add_module(
            Box::new(SpectrumModule::new(vec![
                SpectrumStop::new(0.0, Rgb::BLACK),
                SpectrumStop::new(1.0, Rgb::WHITE),
            ])),
            Position::new(240, 0),
        );
        proc.add_link(Link::to_module(Source::new(x, 0), swirl, 1));
        proc.add_link(Link::to_module(Source::new(swirl, 0), ramp, 0));
        proc.add_link(Link::to_output(Source::new(ramp, 0), 0));
        proc
    }

    #[test]
    fn test_every_kind_reports_its_registered_identifier() {
        let registry = standard_registry();
        assert_eq!(registry.len(), 25);
        let kinds: Vec<String> = registry.kinds().map(str::to_owned).collect();
        for kind in kinds {
            let module = registry.instantiate(&kind).unwrap();
            assert_eq!(module.kind(), kind);
        }
    }

    #[test]
    fn test_marble_round_trips_through_registry() {
        let original = marble_procedure();
        let mut bytes = Vec::new();
        original.write_to_stream(&mut bytes, &()).unwrap();

        let mut restored = Procedure::new(color_output());
        restored
            .read_from_stream(&mut bytes.as_slice(), &(), &standard_registry())
            .unwrap();

        let mut original = original;
        for i in 0..10 {
            let point = PointInfo::at(DVec3::new(i as f64 * 0.37, 0.5, -0.2));
            original.init_for_point(point.clone());
            restored.init_for_point(point);

            let mut want = Rgb::BLACK;
            let mut got = Rgb::BLACK;
            original.output_color(0, &mut want);
            restored.output_color(0, &mut got);
            assert_eq!(got, want, "sample {i}");
        }
    }

    #[test]
    fn test_blur_fades_checker_toward_mean() {
        let mut proc = Procedure::new(vec![OutputModule::new(
            "Value",
            ValueKind::Number,
            0.0,
            Rgb::BLACK,
        )]);
        let cells = proc.add_module(Box::new(CheckerModule), Position::default());
        let blur = proc.add_module(Box::new(BlurModule::new(0.25)), Position::default());
        proc.add_link(Link::to_module(Source::new(cells, 0), blur, 0));
        proc.add_link(Link::to_output(Source::new(blur, 0), 0));

        // Even cell reads 1.0 crisp; a 0.25 blur pulls it halfway to 0.5.
        proc.init_for_point(PointInfo::at(DVec3::new(0.5, 0.5, 0.5)));
        assert_eq!(proc.output_value(0), 0.75);
    }

    #[test]
    fn test_marble_graph_is_acyclic() {
        let proc = marble_procedure();
        assert!(!proc.check_feedback());
    }
}
