// SPDX-License-Identifier: MIT OR Apache-2.0
//! Procedural evaluation graph engine for Patina.
//!
//! A [`Procedure`] is a graph of [`Module`]s computing a fixed set of named
//! outputs. Hosts use procedures to drive:
//! - Procedural textures and material channels
//! - Displacement and deformation fields
//! - Animated scalar/color parameters
//!
//! ## Architecture
//!
//! The engine is built around a few deliberate choices:
//! - Modules live in an arena and are addressed by index
//! - Destination ports cache their resolved source, so evaluation never
//!   searches the link list
//! - Evaluation pulls lazily from the outputs with per-point memoization
//! - Persistence is a versioned binary stream; module kinds are restored
//!   through a [`KindRegistry`]

pub mod color;
pub mod evaluation;
pub mod link;
pub mod module;
pub mod output;
pub mod point;
pub mod port;
pub mod procedure;
pub mod registry;
pub mod stream;

#[cfg(test)]
mod testing;

pub use color::Rgb;
pub use evaluation::EvalContext;
pub use link::{Destination, Link, Source};
pub use module::Module;
pub use output::OutputModule;
pub use point::PointInfo;
pub use port::{Port, PortDirection, ValueKind};
pub use procedure::{Position, Procedure, FORMAT_VERSION};
pub use registry::{KindRegistry, ModuleConstructor};
pub use stream::{ReadError, SceneContext, StreamError, StreamReader, StreamWriter};
