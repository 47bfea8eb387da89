//! The rule model produced by the rewriter: what each target selector
//! anchors, and the alternative layouts it may fall back to.

use std::collections::BTreeMap;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::anchor::AnchorReference;
use crate::parser::Declaration;

/// Rule model keyed by target selector text.
pub type RuleModel = BTreeMap<String, TargetRule>;

/// One declaration inside an `@try` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TryValue {
    /// A plain value, applied as written.
    Literal(String),
    /// A value computed from an anchor.
    Anchor(AnchorReference),
}

impl TryValue {
    /// The anchor reference, if this value has one.
    #[must_use]
    pub const fn as_anchor(&self) -> Option<&AnchorReference> {
        match self {
            Self::Anchor(reference) => Some(reference),
            Self::Literal(_) => None,
        }
    }
}

/// An alternative layout from a `@position-fallback` rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TryBlock {
    /// Marker attribute value that activates this block.
    pub id: String,
    /// Property name to value.
    pub declarations: BTreeMap<String, TryValue>,
    /// The block's declarations with anchor calls already replaced, used to
    /// emit the activating style rule.
    #[serde(skip)]
    pub rewritten: Vec<Declaration>,
}

impl TryBlock {
    /// An empty block with the given marker id.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self {
            id,
            declarations: BTreeMap::new(),
            rewritten: Vec::new(),
        }
    }

    /// Every anchor reference in the block.
    pub fn anchors(&self) -> impl Iterator<Item = (&str, &AnchorReference)> {
        self.declarations
            .iter()
            .filter_map(|(property, value)| Some((property.as_str(), value.as_anchor()?)))
    }
}

/// [CSS Anchor Positioning § 5.3](https://drafts.csswg.org/css-anchor-position-1/#position-try-order-property)
///
/// How a fallback block is chosen when the default layout overflows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionStrategy {
    /// First block that does not overflow.
    #[default]
    Normal,
    /// Block leaving the widest visible box.
    MostWidth,
    /// Block leaving the tallest visible box.
    MostHeight,
    /// [`Self::MostWidth`] or [`Self::MostHeight`] along the inline axis.
    MostInlineSize,
    /// [`Self::MostWidth`] or [`Self::MostHeight`] along the block axis.
    MostBlockSize,
}

/// Everything the polyfill knows about one target selector.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRule {
    /// Property name to the anchor reference that replaced its value.
    pub declarations: BTreeMap<String, AnchorReference>,
    /// Fallback layouts, in source order.
    pub fallbacks: Vec<TryBlock>,
    /// Fallback selection strategy.
    pub order: SelectionStrategy,
}

impl TargetRule {
    /// Every anchor reference in the rule, declarations first.
    pub fn anchors(&self) -> impl Iterator<Item = (&str, &AnchorReference)> {
        self.declarations
            .iter()
            .map(|(property, reference)| (property.as_str(), reference))
            .chain(self.fallbacks.iter().flat_map(TryBlock::anchors))
    }
}
