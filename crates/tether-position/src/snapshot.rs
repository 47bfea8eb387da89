//! The rule model with anchor elements filled in, for inspection.
//!
//! Each rule is bound against the first element its selector matches, the
//! same way the runtime binds it.

use std::collections::BTreeMap;

use serde::Serialize;
use tether_css::selector::query_selector_all;
use tether_css::{AnchorNameRegistry, AnchorReference, RuleModel, SelectionStrategy, TryValue};
use tether_dom::{DomTree, NodeId};

use crate::binder::bind;
use crate::oracle::LayoutOracle;
use crate::validate::AnchorValidator;

/// An [`AnchorReference`] and the element it bound to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundReference {
    /// The extracted reference.
    #[serde(flatten)]
    pub reference: AnchorReference,
    /// The accepted anchor element, `null` when none.
    pub anchor_el: Option<NodeId>,
}

/// A [`TryValue`] with its reference bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoundTryValue {
    /// A value used as written.
    Literal(String),
    /// A bound anchor reference.
    Anchor(BoundReference),
}

/// A try block with its references bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundTryBlock {
    /// Marker value of the block.
    pub id: String,
    /// Declarations of the block.
    pub declarations: BTreeMap<String, BoundTryValue>,
}

/// A target rule with its references bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundTargetRule {
    /// Anchored declarations.
    pub declarations: BTreeMap<String, BoundReference>,
    /// Fallback blocks, in source order.
    pub fallbacks: Vec<BoundTryBlock>,
    /// Fallback selection strategy.
    pub order: SelectionStrategy,
}

/// Bound rules keyed by selector.
pub type BoundRuleModel = BTreeMap<String, BoundTargetRule>;

/// Bind every reference of `rules` against the first element matching its
/// selector. Rules matching nothing bind to `null` throughout.
#[must_use]
pub fn bind_rules(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    validator: &dyn AnchorValidator,
    registry: &AnchorNameRegistry,
    rules: &RuleModel,
) -> BoundRuleModel {
    rules
        .iter()
        .map(|(selector, rule)| {
            let target = query_selector_all(dom, selector).first().copied();
            let bound = |reference: &AnchorReference| BoundReference {
                reference: reference.clone(),
                anchor_el: target
                    .and_then(|target| bind(dom, oracle, validator, registry, target, reference)),
            };
            let declarations = rule
                .declarations
                .iter()
                .map(|(property, reference)| (property.clone(), bound(reference)))
                .collect();
            let fallbacks = rule
                .fallbacks
                .iter()
                .map(|block| BoundTryBlock {
                    id: block.id.clone(),
                    declarations: block
                        .declarations
                        .iter()
                        .map(|(property, value)| {
                            let value = match value {
                                TryValue::Literal(text) => BoundTryValue::Literal(text.clone()),
                                TryValue::Anchor(reference) => {
                                    BoundTryValue::Anchor(bound(reference))
                                }
                            };
                            (property.clone(), value)
                        })
                        .collect(),
                })
                .collect();
            let rule = BoundTargetRule {
                declarations,
                fallbacks,
                order: rule.order,
            };
            (selector.clone(), rule)
        })
        .collect()
}
