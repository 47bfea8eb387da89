//! Binding an anchor reference to the element it measures.

use log::debug;
use serde::Serialize;
use tether_css::serialize::serialize_identifier;
use tether_css::{AnchorNameRegistry, AnchorReference};
use tether_dom::{DomTree, NodeId};

use crate::oracle::LayoutOracle;
use crate::validate::AnchorValidator;

/// The attribute naming a target's implicit anchor by `id`.
pub const IMPLICIT_ANCHOR_ATTRIBUTE: &str = "anchor";

/// The elements involved in resolving one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBinding {
    /// The anchor element, when one was accepted.
    pub anchor_element: Option<NodeId>,
    /// The positioned element.
    pub target_element: Option<NodeId>,
}

/// The anchor name `reference` asks for when evaluated on `target`.
///
/// A custom property reference is read from the target's computed style and
/// must hold a dashed ident.
#[must_use]
pub fn effective_anchor_name(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    target: NodeId,
    reference: &AnchorReference,
) -> Option<String> {
    if let Some(name) = &reference.anchor_name {
        return Some(name.clone());
    }
    let property = reference.custom_prop_name.as_deref()?;
    let value = oracle.computed_value(dom, target, property)?;
    let name = value.trim();
    if name.starts_with("--") {
        Some(name.to_string())
    } else {
        debug!("custom property {property} does not name an anchor: `{name}`");
        None
    }
}

/// Selectors for the elements `reference` may anchor to.
#[must_use]
pub fn candidate_selectors(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    registry: &AnchorNameRegistry,
    target: NodeId,
    reference: &AnchorReference,
) -> Vec<String> {
    if reference.uses_implicit_anchor() {
        return dom
            .attribute(target, IMPLICIT_ANCHOR_ATTRIBUTE)
            .filter(|id| !id.is_empty())
            .map(|id| {
                let mut selector = String::from("#");
                serialize_identifier(id, &mut selector);
                vec![selector]
            })
            .unwrap_or_default();
    }
    effective_anchor_name(dom, oracle, target, reference)
        .map(|name| registry.selectors(&name).to_vec())
        .unwrap_or_default()
}

/// Bind `reference` on `target` to an anchor element.
///
/// `None` is the common outcome for unknown names, empty custom properties
/// and anchors that fail validation; the caller falls back.
#[must_use]
pub fn bind(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    validator: &dyn AnchorValidator,
    registry: &AnchorNameRegistry,
    target: NodeId,
    reference: &AnchorReference,
) -> Option<NodeId> {
    let selectors = candidate_selectors(dom, oracle, registry, target, reference);
    if selectors.is_empty() {
        debug!(
            "no anchor candidates for {} on {target:?}",
            reference.indirection_key
        );
        return None;
    }
    let anchor = validator.validate(dom, oracle, target, &selectors);
    if anchor.is_none() {
        debug!(
            "no acceptable anchor among {selectors:?} for {}",
            reference.indirection_key
        );
    }
    anchor
}

/// [`bind`], reporting both ends of the binding.
#[must_use]
pub fn resolve_binding(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    validator: &dyn AnchorValidator,
    registry: &AnchorNameRegistry,
    target: NodeId,
    reference: &AnchorReference,
) -> ResolvedBinding {
    ResolvedBinding {
        anchor_element: bind(dom, oracle, validator, registry, target, reference),
        target_element: Some(target),
    }
}
