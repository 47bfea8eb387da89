//! Anchor names declared with `anchor-name`, and the selectors declaring them.

use std::collections::BTreeMap;

use serde::Serialize;

/// Anchor name to the selectors that declared it, in declaration order.
///
/// A registry belongs to one rewrite invocation; nothing is shared between
/// invocations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct AnchorNameRegistry {
    names: BTreeMap<String, Vec<String>>,
}

impl AnchorNameRegistry {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            names: BTreeMap::new(),
        }
    }

    /// Record that elements matching `selector` carry `name`.
    ///
    /// Duplicate names accumulate; later declarations are tried first when
    /// binding, so the list is kept in declaration order.
    pub fn register(&mut self, name: &str, selector: &str) {
        self.names
            .entry(name.to_string())
            .or_default()
            .push(selector.to_string());
    }

    /// Selectors declaring `name`, in declaration order. Empty when unknown.
    #[must_use]
    pub fn selectors(&self, name: &str) -> &[String] {
        self.names.get(name).map_or(&[], Vec::as_slice)
    }

    /// Whether any selector declared `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
