// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of constructible module kinds.

use indexmap::IndexMap;

use crate::module::Module;

/// Constructor producing a default instance of one module kind
pub type ModuleConstructor = fn() -> Box<dyn Module>;

/// Maps kind identifiers to constructors
///
/// The engine does not hardcode a module catalog. Hosts register the kinds
/// they ship and pass the registry to
/// [`Procedure::read_from_stream`](crate::Procedure::read_from_stream),
/// which instantiates modules by the identifiers stored in the stream.
/// Iteration follows registration order, which editors use for palettes.
#[derive(Debug, Default)]
pub struct KindRegistry {
    kinds: IndexMap<String, ModuleConstructor>,
}

impl KindRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            kinds: IndexMap::new(),
        }
    }

    /// Register `constructor` under `kind`, replacing any previous entry
    pub fn register(&mut self, kind: impl Into<String>, constructor: ModuleConstructor) {
        let kind = kind.into();
        if self.kinds.insert(kind.clone(), constructor).is_some() {
            tracing::warn!(kind = %kind, "module kind re-registered");
        }
    }

    /// Look up the constructor for `kind`
    pub fn resolve(&self, kind: &str) -> Option<ModuleConstructor> {
        self.kinds.get(kind).copied()
    }

    /// Construct a default instance of `kind`
    pub fn instantiate(&self, kind: &str) -> Option<Box<dyn Module>> {
        self.resolve(kind).map(|constructor| constructor())
    }

    /// Registered kind identifiers, in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Check if no kinds are registered
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
