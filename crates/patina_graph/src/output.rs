// SPDX-License-Identifier: MIT OR Apache-2.0
//! Procedure output slots.

use crate::color::Rgb;
use crate::link::Source;
use crate::port::{Port, ValueKind};

/// A named terminal result of a procedure
///
/// Outputs are fixed when the procedure is constructed; they have exactly
/// one input and no outputs of their own. While unlinked they answer reads
/// with their defaults, so a host always gets a usable value.
#[derive(Debug, Clone)]
pub struct OutputModule {
    name: String,
    port: Port,
    default_value: f64,
    default_color: Rgb,
    pub(crate) source: Option<Source>,
}

impl OutputModule {
    /// Create an output slot with its unlinked defaults
    pub fn new(
        name: impl Into<String>,
        kind: ValueKind,
        default_value: f64,
        default_color: Rgb,
    ) -> Self {
        Self {
            name: name.into(),
            port: Port::input(kind, "Value"),
            default_value,
            default_color,
            source: None,
        }
    }

    /// Display name of this output
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of value this output produces
    pub fn kind(&self) -> ValueKind {
        self.port.kind
    }

    /// The single input port descriptor
    pub fn input_port(&self) -> &Port {
        &self.port
    }

    /// Number value reported while unlinked
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Color reported while unlinked
    pub fn default_color(&self) -> Rgb {
        self.default_color
    }

    /// The resolved source currently feeding this output, if any
    pub fn source(&self) -> Option<Source> {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortDirection;

    #[test]
    fn test_output_port_shape() {
        let output = OutputModule::new("Diffuse", ValueKind::Color, 0.0, Rgb::gray(0.5));
        assert_eq!(output.name(), "Diffuse");
        assert_eq!(output.kind(), ValueKind::Color);
        assert_eq!(output.input_port().direction, PortDirection::Input);
        assert_eq!(output.source(), None);
        assert_eq!(output.default_color(), Rgb::gray(0.5));
    }
}
