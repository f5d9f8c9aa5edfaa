// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port descriptors for module inputs/outputs.

use serde::{Deserialize, Serialize};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Kind of value a port carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Scalar number
    Number,
    /// RGB color
    Color,
    /// 3D vector
    Vector,
    /// Host-defined payload outside the standard channels
    Other,
}

impl ValueKind {
    /// Check if a value of this kind can feed a port expecting `other`
    ///
    /// Numbers feed every channel through the standard conversions (gray
    /// colors, scalar gradients); the other kinds only feed themselves.
    pub fn converts_to(self, other: ValueKind) -> bool {
        self == other || self == Self::Number
    }
}

/// A typed connection point on a module
///
/// Ports are pure descriptors: modules expose fixed slices of them, and a
/// port's index within that slice is how links address it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    /// Port direction
    pub direction: PortDirection,
    /// Kind of value flowing through
    pub kind: ValueKind,
    /// Short label for editors and logs
    pub label: &'static str,
}

impl Port {
    /// Create an input port
    pub const fn input(kind: ValueKind, label: &'static str) -> Self {
        Self {
            direction: PortDirection::Input,
            kind,
            label,
        }
    }

    /// Create an output port
    pub const fn output(kind: ValueKind, label: &'static str) -> Self {
        Self {
            direction: PortDirection::Output,
            kind,
            label,
        }
    }

    /// Check if a connection from this port to another is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        // Must be opposite directions
        if self.direction == other.direction {
            return false;
        }

        // Check kind compatibility in flow order
        let (from, to) = if self.direction == PortDirection::Output {
            (self.kind, other.kind)
        } else {
            (other.kind, self.kind)
        };
        from.converts_to(to)
    }
}
