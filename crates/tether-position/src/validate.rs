//! Which of the elements carrying an anchor name a target may anchor to.
//!
//! [CSS Anchor Positioning § 3.2](https://drafts.csswg.org/css-anchor-position-1/#determining)
//! "An element el is an acceptable anchor element for an absolutely
//! positioned element query el if all of the following are true ..."

use tether_css::selector::query_selector_all;
use tether_dom::{DomTree, NodeId};

use crate::oracle::LayoutOracle;

/// Chooses the anchor element for a target among the elements matching a
/// list of selectors.
pub trait AnchorValidator {
    /// The accepted anchor element, or `None` when no candidate is legal.
    fn validate(
        &self,
        dom: &DomTree,
        oracle: &dyn LayoutOracle,
        target: NodeId,
        selectors: &[String],
    ) -> Option<NodeId>;
}

/// The positioning-context rules of anchor acceptability.
///
/// Candidates are tried from last to first in tree order, so of several
/// legal elements the one closest before the target wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositioningValidator;

impl AnchorValidator for PositioningValidator {
    fn validate(
        &self,
        dom: &DomTree,
        oracle: &dyn LayoutOracle,
        target: NodeId,
        selectors: &[String],
    ) -> Option<NodeId> {
        let mut candidates: Vec<NodeId> = selectors
            .iter()
            .flat_map(|selector| query_selector_all(dom, selector))
            .collect();
        candidates.sort_by(|a, b| dom.tree_order(*a, *b).unwrap_or_else(|| a.cmp(b)));
        candidates.dedup();

        candidates
            .into_iter()
            .rev()
            .find(|&anchor| is_acceptable_anchor(dom, oracle, anchor, target))
    }
}

/// Whether `anchor` may be used to position `target`.
#[must_use]
pub fn is_acceptable_anchor(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    anchor: NodeId,
    target: NodeId,
) -> bool {
    // "el is not a descendant of query el"
    if anchor == target || dom.is_descendant_of(anchor, target) {
        return false;
    }

    // "el is a descendant of query el's containing block, or query el's
    // containing block is the initial containing block"
    let target_block = oracle.offset_parent(dom, target);
    if let Some(block) = target_block
        && !dom.is_descendant_of(anchor, block)
    {
        return false;
    }

    let anchor_block = oracle.offset_parent(dom, anchor);

    // "If el has the same containing block as query el, el is not absolutely
    // positioned or el precedes query el in the tree order"
    if anchor_block == target_block {
        return !oracle.is_absolutely_positioned(dom, anchor) || dom.precedes(anchor, target);
    }

    // "If el has a different containing block from query el, the last
    // containing block in el's containing block chain before reaching query
    // el's containing block is not absolutely positioned"
    let mut current = anchor_block;
    for _ in 0..dom.len() {
        let Some(block) = current else {
            return false;
        };
        let next = oracle.offset_parent(dom, block);
        if next == target_block {
            return !oracle.is_absolutely_positioned(dom, block);
        }
        current = next;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_layout::StaticLayout;
    use tether_dom::ElementData;

    fn anchor_element(name: &str) -> ElementData {
        ElementData::new("div").with_attribute("class", name)
    }

    #[test]
    fn test_target_and_its_descendants_are_rejected() {
        let mut dom = DomTree::new();
        let target = dom.append_element(NodeId::ROOT, anchor_element("a"));
        let inner = dom.append_element(target, anchor_element("a"));
        let layout = StaticLayout::new();

        assert!(!is_acceptable_anchor(&dom, &layout, target, target));
        assert!(!is_acceptable_anchor(&dom, &layout, inner, target));
        assert_eq!(
            PositioningValidator.validate(&dom, &layout, target, &[".a".to_string()]),
            None
        );
    }

    #[test]
    fn test_absolutely_positioned_sibling_must_precede() {
        let mut dom = DomTree::new();
        let before = dom.append_element(NodeId::ROOT, anchor_element("a"));
        let target = dom.append_element(NodeId::ROOT, ElementData::new("div"));
        let after = dom.append_element(NodeId::ROOT, anchor_element("a"));
        let mut layout = StaticLayout::new();
        layout.set_computed(before, "position", "absolute");
        layout.set_computed(after, "position", "absolute");

        assert!(is_acceptable_anchor(&dom, &layout, before, target));
        assert!(!is_acceptable_anchor(&dom, &layout, after, target));
        assert_eq!(
            PositioningValidator.validate(&dom, &layout, target, &[".a".to_string()]),
            Some(before)
        );
    }

    #[test]
    fn test_anchor_outside_target_containing_block() {
        let mut dom = DomTree::new();
        let outside = dom.append_element(NodeId::ROOT, anchor_element("a"));
        let block = dom.append_element(NodeId::ROOT, ElementData::new("section"));
        let target = dom.append_element(block, ElementData::new("div"));
        let mut layout = StaticLayout::new();
        layout.set_offset_parent(target, block);

        assert!(!is_acceptable_anchor(&dom, &layout, outside, target));
    }

    #[test]
    fn test_anchor_inside_absolutely_positioned_block() {
        let mut dom = DomTree::new();
        let popup = dom.append_element(NodeId::ROOT, ElementData::new("div"));
        let anchor = dom.append_element(popup, anchor_element("a"));
        let target = dom.append_element(NodeId::ROOT, ElementData::new("div"));
        let mut layout = StaticLayout::new();
        layout.set_offset_parent(anchor, popup);

        assert!(is_acceptable_anchor(&dom, &layout, anchor, target));
        layout.set_computed(popup, "position", "fixed");
        assert!(!is_acceptable_anchor(&dom, &layout, anchor, target));
    }
}
