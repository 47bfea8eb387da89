//! A [`LayoutOracle`] that answers from recorded measurements.
//!
//! Embedders that lay out ahead of time, and tests, describe the page once:
//! element boxes, computed values and containing blocks. A target's box may
//! also be recorded per marker value, so applying a try block (which sets the
//! marker attribute) changes what the oracle reports for it.

use std::cell::Cell;
use std::collections::HashMap;

use tether_dom::{DomTree, NodeId};

use crate::geometry::{EdgeSizes, Rect, Size};
use crate::oracle::{LayoutOracle, overflow_from_rects};

/// Default viewport: 1280×720.
const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 720.0);

/// Properties whose computed value is taken from the nearest ancestor when
/// not recorded on the element itself.
fn is_inherited(property: &str) -> bool {
    property.starts_with("--") || matches!(property, "writing-mode" | "direction")
}

/// Recorded layout of one document.
#[derive(Debug, Clone)]
pub struct StaticLayout {
    rects: HashMap<NodeId, Rect>,
    marked_rects: HashMap<(NodeId, String), Rect>,
    computed: HashMap<(NodeId, String), String>,
    offset_parents: HashMap<NodeId, NodeId>,
    client_sizes: HashMap<NodeId, Size>,
    viewport: Size,
    marker_attribute: String,
    overflow_checks: Cell<usize>,
}

impl StaticLayout {
    /// An empty layout with a 1280×720 viewport, reading markers from
    /// `data-anchor-polyfill`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rects: HashMap::new(),
            marked_rects: HashMap::new(),
            computed: HashMap::new(),
            offset_parents: HashMap::new(),
            client_sizes: HashMap::new(),
            viewport: DEFAULT_VIEWPORT,
            marker_attribute: "data-anchor-polyfill".to_string(),
            overflow_checks: Cell::new(0),
        }
    }

    /// Read active try-block markers from `attribute` instead.
    #[must_use]
    pub fn with_marker_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.marker_attribute = attribute.into();
        self
    }

    /// Set the viewport size.
    pub const fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
    }

    /// Record the border box of `node`.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        let _ = self.rects.insert(node, rect);
    }

    /// Record the border box of `node` while its marker attribute equals
    /// `marker`.
    pub fn set_marked_rect(&mut self, node: NodeId, marker: &str, rect: Rect) {
        let _ = self.marked_rects.insert((node, marker.to_string()), rect);
    }

    /// Record a computed value.
    pub fn set_computed(&mut self, node: NodeId, property: &str, value: &str) {
        let _ = self
            .computed
            .insert((node, property.to_string()), value.to_string());
    }

    /// Record the containing block of `node`.
    pub fn set_offset_parent(&mut self, node: NodeId, parent: NodeId) {
        let _ = self.offset_parents.insert(node, parent);
    }

    /// Record the padding-box size of `node`.
    pub fn set_client_size(&mut self, node: NodeId, size: Size) {
        let _ = self.client_sizes.insert(node, size);
    }

    /// How many overflow measurements have been taken.
    #[must_use]
    pub const fn overflow_checks(&self) -> usize {
        self.overflow_checks.get()
    }

    fn own_value(&self, node: NodeId, property: &str) -> Option<&String> {
        self.computed.get(&(node, property.to_string()))
    }
}

impl Default for StaticLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutOracle for StaticLayout {
    fn measure_rect(&self, dom: &DomTree, node: NodeId) -> Option<Rect> {
        dom.attribute(node, &self.marker_attribute)
            .and_then(|marker| self.marked_rects.get(&(node, marker.to_string())))
            .or_else(|| self.rects.get(&node))
            .copied()
    }

    fn measure_overflow(
        &self,
        dom: &DomTree,
        node: NodeId,
        boundary: Option<NodeId>,
    ) -> Option<EdgeSizes> {
        self.overflow_checks.set(self.overflow_checks.get() + 1);
        overflow_from_rects(self, dom, node, boundary)
    }

    fn computed_value(&self, dom: &DomTree, node: NodeId, property: &str) -> Option<String> {
        if let Some(value) = self.own_value(node, property) {
            return Some(value.clone());
        }
        if !is_inherited(property) {
            return None;
        }
        dom.ancestors(node)
            .find_map(|ancestor| self.own_value(ancestor, property))
            .cloned()
    }

    fn offset_parent(&self, _dom: &DomTree, node: NodeId) -> Option<NodeId> {
        self.offset_parents.get(&node).copied()
    }

    fn client_size(&self, _dom: &DomTree, node: NodeId) -> Option<Size> {
        self.client_sizes.get(&node).copied()
    }

    fn viewport(&self) -> Size {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_css::WritingMode;
    use tether_dom::ElementData;

    #[test]
    fn test_marked_rect_follows_marker_attribute() {
        let mut dom = DomTree::new();
        let target = dom.append_element(NodeId::ROOT, ElementData::new("div"));
        let mut layout = StaticLayout::new();
        layout.set_rect(target, Rect::new(0.0, 0.0, 10.0, 10.0));
        layout.set_marked_rect(target, "try-1", Rect::new(5.0, 5.0, 10.0, 10.0));

        assert_eq!(layout.measure_rect(&dom, target).map(|r| r.x), Some(0.0));
        dom.set_attribute(target, "data-anchor-polyfill", "try-1");
        assert_eq!(layout.measure_rect(&dom, target).map(|r| r.x), Some(5.0));
        dom.set_attribute(target, "data-anchor-polyfill", "try-2");
        assert_eq!(layout.measure_rect(&dom, target).map(|r| r.x), Some(0.0));
    }

    #[test]
    fn test_inherited_and_non_inherited_values() {
        let mut dom = DomTree::new();
        let outer = dom.append_element(NodeId::ROOT, ElementData::new("div"));
        let inner = dom.append_element(outer, ElementData::new("span"));
        let mut layout = StaticLayout::new();
        layout.set_computed(outer, "writing-mode", "vertical-rl");
        layout.set_computed(outer, "--which", "--a");
        layout.set_computed(outer, "position", "relative");

        assert_eq!(layout.writing_mode(&dom, inner), WritingMode::VerticalRl);
        assert_eq!(layout.computed_value(&dom, inner, "--which").as_deref(), Some("--a"));
        assert_eq!(layout.computed_value(&dom, inner, "position"), None);
        assert!(!layout.is_right_to_left(&dom, inner));
    }

    #[test]
    fn test_overflow_against_viewport_is_counted() {
        let mut dom = DomTree::new();
        let target = dom.append_element(NodeId::ROOT, ElementData::new("div"));
        let mut layout = StaticLayout::new();
        layout.set_viewport(100.0, 100.0);
        layout.set_rect(target, Rect::new(90.0, 0.0, 20.0, 20.0));

        let overflow = layout.measure_overflow(&dom, target, None).unwrap();
        assert_eq!(overflow.right, 10.0);
        assert_eq!(layout.overflow_checks(), 1);
    }
}
