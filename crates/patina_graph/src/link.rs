// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the procedure graph.

use serde::{Deserialize, Serialize};

/// Reference to one output port: module index plus port position
///
/// This is the "resolved source" a destination port caches once a link is
/// added, so evaluation never searches the link list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Index of the supplying module in the procedure's module list
    pub module: usize,
    /// Position of the port within that module's output list
    pub output: usize,
}

impl Source {
    /// Create a source reference
    pub fn new(module: usize, output: usize) -> Self {
        Self { module, output }
    }
}

/// Destination of a link: a module input or a procedure output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// An input port on a regular module
    Module {
        /// Index of the consuming module
        module: usize,
        /// Position of the port within that module's input list
        input: usize,
    },
    /// The single input of one procedure output
    Output {
        /// Index into the procedure's output list
        output: usize,
    },
}

/// A directed edge from an output port to an input port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The supplying output port
    pub from: Source,
    /// The consuming input port
    pub to: Destination,
}

impl Link {
    /// Create a link
    pub fn new(from: Source, to: Destination) -> Self {
        Self { from, to }
    }

    /// Create a link into a module input
    pub fn to_module(from: Source, module: usize, input: usize) -> Self {
        Self::new(from, Destination::Module { module, input })
    }

    /// Create a link into a procedure output
    pub fn to_output(from: Source, output: usize) -> Self {
        Self::new(from, Destination::Output { output })
    }

    /// Check if this link involves the module at `index`
    pub fn touches_module(&self, index: usize) -> bool {
        if self.from.module == index {
            return true;
        }
        matches!(self.to, Destination::Module { module, .. } if module == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touches_module_checks_both_endpoints() {
        let link = Link::to_module(Source::new(0, 0), 2, 1);
        assert!(link.touches_module(0));
        assert!(link.touches_module(2));
        assert!(!link.touches_module(1));
    }

    #[test]
    fn test_output_destination_ignores_module_index() {
        let link = Link::to_output(Source::new(3, 0), 1);
        assert!(link.touches_module(3));
        assert!(!link.touches_module(1));
    }
}
