//! The boundary between the polyfill and the embedder's layout engine.
//!
//! Every measurement the runtime needs goes through [`LayoutOracle`]. The
//! runtime never computes layout itself; it reads boxes and computed values,
//! publishes custom properties and toggles a marker attribute, then asks
//! again.

use tether_css::{Direction, WritingMode};
use tether_dom::{DomTree, NodeId};

use crate::geometry::{EdgeSizes, Rect, Size};

/// Layout measurements for elements of a [`DomTree`].
///
/// All rects share one coordinate space (typically the viewport's).
pub trait LayoutOracle {
    /// The border box of `node`, or `None` if it is not rendered.
    fn measure_rect(&self, dom: &DomTree, node: NodeId) -> Option<Rect>;

    /// How far `node` overflows `boundary` on each side (positive means
    /// overflowing). A `None` boundary is the viewport.
    fn measure_overflow(
        &self,
        dom: &DomTree,
        node: NodeId,
        boundary: Option<NodeId>,
    ) -> Option<EdgeSizes> {
        overflow_from_rects(self, dom, node, boundary)
    }

    /// The computed value of `property` on `node`, custom properties included.
    fn computed_value(&self, dom: &DomTree, node: NodeId, property: &str) -> Option<String>;

    /// [CSSOM View § 7 `offsetParent`](https://drafts.csswg.org/cssom-view/#dom-htmlelement-offsetparent)
    ///
    /// The containing block used for positioning `node`. `None` stands for
    /// the initial containing block.
    fn offset_parent(&self, dom: &DomTree, node: NodeId) -> Option<NodeId>;

    /// The padding-box size of `node` (`clientWidth` / `clientHeight`).
    fn client_size(&self, dom: &DomTree, node: NodeId) -> Option<Size>;

    /// Border widths of `node`, read from its computed `border-*-width`.
    fn border_widths(&self, dom: &DomTree, node: NodeId) -> EdgeSizes {
        let side = |name: &str| {
            self.computed_value(dom, node, name)
                .as_deref()
                .and_then(parse_px)
                .unwrap_or(0.0)
        };
        EdgeSizes {
            top: side("border-top-width"),
            right: side("border-right-width"),
            bottom: side("border-bottom-width"),
            left: side("border-left-width"),
        }
    }

    /// The size of the viewport.
    fn viewport(&self) -> Size;

    /// The computed `writing-mode` of `node`.
    fn writing_mode(&self, dom: &DomTree, node: NodeId) -> WritingMode {
        self.computed_value(dom, node, "writing-mode")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default()
    }

    /// The computed `direction` of `node`.
    fn direction(&self, dom: &DomTree, node: NodeId) -> Direction {
        self.computed_value(dom, node, "direction")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Whether `node`'s inline base direction is right-to-left.
    fn is_right_to_left(&self, dom: &DomTree, node: NodeId) -> bool {
        self.direction(dom, node) == Direction::Rtl
    }

    /// Whether `node` is `position: absolute` or `position: fixed`.
    fn is_absolutely_positioned(&self, dom: &DomTree, node: NodeId) -> bool {
        self.computed_value(dom, node, "position")
            .is_some_and(|value| matches!(value.trim(), "absolute" | "fixed"))
    }
}

/// Overflow of `node` computed from measured rects: against `boundary`'s
/// border box, or against the viewport when there is no boundary.
pub fn overflow_from_rects<O: LayoutOracle + ?Sized>(
    oracle: &O,
    dom: &DomTree,
    node: NodeId,
    boundary: Option<NodeId>,
) -> Option<EdgeSizes> {
    let rect = oracle.measure_rect(dom, node)?;
    let outer = match boundary {
        Some(boundary) => oracle.measure_rect(dom, boundary)?,
        None => {
            let viewport = oracle.viewport();
            Rect::new(0.0, 0.0, viewport.width, viewport.height)
        }
    };
    Some(EdgeSizes::overflow(&rect, &outer))
}

/// Parse a computed length such as `"12.5px"`.
#[must_use]
pub fn parse_px(value: &str) -> Option<f64> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}
