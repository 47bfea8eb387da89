//! Turning an anchor reference into a pixel length.
//!
//! [CSS Anchor Positioning § 2.1.1](https://drafts.csswg.org/css-anchor-position-1/#anchor-resolution)
//!
//! ```text
//!   containing block (padding box)
//!   ┌──────────────────────────────────────────┐
//!   │        ┌────────┐ ─┬─ rect.y             │
//!   │        │ anchor │  │                     │
//!   │        └────────┘ ─┴─ rect.y + height    │  top: anchor(bottom)
//!   │        ┌────────┐  ◀── offset            │    = rect.y + height
//!   │        │ target │                        │  bottom: anchor(top)
//!   │        └────────┘                        │    = cb.height - rect.y
//!   └──────────────────────────────────────────┘
//! ```

use log::trace;
use tether_css::{
    AnchorMeasure, AnchorSide, AnchorSideKeyword, AnchorSize, AnchoredProperty, Axis, Direction,
    InsetProperty, WritingMode,
};
use tether_dom::{DomTree, NodeId};

use crate::geometry::Rect;
use crate::oracle::LayoutOracle;

/// Everything needed to resolve one anchor reference on one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveRequest<'a> {
    /// The positioned element.
    pub target: NodeId,
    /// The property the value is used in.
    pub property: AnchoredProperty,
    /// The anchor's box in the target's containing block coordinates, or
    /// `None` when no anchor was bound.
    pub anchor_rect: Option<Rect>,
    /// The edge or size asked for.
    pub measure: AnchorMeasure,
    /// Returned verbatim when the reference cannot be resolved.
    pub fallback: &'a str,
    /// Round results to whole pixels.
    pub round_to_pixels: bool,
}

/// Resolve `request` to a `"<number>px"` string, or its fallback text.
#[must_use]
pub fn resolve(dom: &DomTree, oracle: &dyn LayoutOracle, request: &ResolveRequest<'_>) -> String {
    let Some(rect) = request.anchor_rect else {
        return request.fallback.to_string();
    };

    let pixels = match (request.measure, request.property) {
        (AnchorMeasure::Size(size), AnchoredProperty::Sizing(_)) => {
            Some(anchor_size(dom, oracle, request.target, &rect, size))
        }
        (AnchorMeasure::Edge(side), AnchoredProperty::Inset(inset)) => {
            anchor_edge(dom, oracle, request.target, &rect, side, inset)
        }
        _ => None,
    };

    match pixels {
        Some(pixels) => {
            let value = px(pixels, request.round_to_pixels);
            trace!("{} on {:?} resolved to {value}", request.property.name(), request.target);
            value
        }
        None => {
            trace!(
                "{:?} cannot feed {}; using fallback",
                request.measure,
                request.property.name()
            );
            request.fallback.to_string()
        }
    }
}

/// Format a pixel length. Negative zero prints as `0px`.
#[must_use]
pub fn px(value: f64, round: bool) -> String {
    let value = if round { value.round() } else { value };
    // -0 + 0 is +0
    let value = value + 0.0;
    format!("{value}px")
}

/// [§ 2.2 anchor-size()](https://drafts.csswg.org/css-anchor-position-1/#anchor-size-fn)
///
/// `block`/`inline` are read in the containing block's writing mode,
/// `self-block`/`self-inline` in the target's.
fn anchor_size(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    target: NodeId,
    rect: &Rect,
    size: AnchorSize,
) -> f64 {
    let axis = match size {
        AnchorSize::Width => Axis::Horizontal,
        AnchorSize::Height => Axis::Vertical,
        AnchorSize::Block => containing_block_flow(dom, oracle, target).0.block_axis(),
        AnchorSize::Inline => containing_block_flow(dom, oracle, target).0.inline_axis(),
        AnchorSize::SelfBlock => oracle.writing_mode(dom, target).block_axis(),
        AnchorSize::SelfInline => oracle.writing_mode(dom, target).inline_axis(),
    };
    rect.size(axis)
}

/// [§ 2.1 anchor()](https://drafts.csswg.org/css-anchor-position-1/#anchor-pos)
fn anchor_edge(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    target: NodeId,
    rect: &Rect,
    side: AnchorSide,
    inset: InsetProperty,
) -> Option<f64> {
    let writing_mode = oracle.writing_mode(dom, target);
    let direction = oracle.direction(dom, target);
    let physical = inset.physical_side(writing_mode, direction);
    let axis = physical.axis();

    let percentage = match side {
        AnchorSide::Percentage(percentage) => percentage,
        AnchorSide::Keyword(keyword) => {
            let flow = match keyword {
                AnchorSideKeyword::SelfStart | AnchorSideKeyword::SelfEnd => {
                    (writing_mode, direction)
                }
                _ => containing_block_flow(dom, oracle, target),
            };
            keyword_percentage(keyword, axis, flow)?
        }
    };

    let offset = rect.origin(axis) + rect.size(axis) * percentage / 100.0;
    if physical.is_end() {
        Some(containing_block_size(dom, oracle, target, axis) - offset)
    } else {
        Some(offset)
    }
}

/// The position of `keyword` along `axis` as a percentage of the anchor's
/// size. `None` when a physical keyword names the other axis.
fn keyword_percentage(
    keyword: AnchorSideKeyword,
    axis: Axis,
    (writing_mode, direction): (WritingMode, Direction),
) -> Option<f64> {
    let physical = |keyword_axis: Axis, percentage: f64| {
        (keyword_axis == axis).then_some(percentage)
    };
    let flips = writing_mode.axis_starts_at_end(axis, direction);
    match keyword {
        AnchorSideKeyword::Top => physical(Axis::Vertical, 0.0),
        AnchorSideKeyword::Bottom => physical(Axis::Vertical, 100.0),
        AnchorSideKeyword::Left => physical(Axis::Horizontal, 0.0),
        AnchorSideKeyword::Right => physical(Axis::Horizontal, 100.0),
        AnchorSideKeyword::Center => Some(50.0),
        AnchorSideKeyword::Start | AnchorSideKeyword::SelfStart => {
            Some(if flips { 100.0 } else { 0.0 })
        }
        AnchorSideKeyword::End | AnchorSideKeyword::SelfEnd => {
            Some(if flips { 0.0 } else { 100.0 })
        }
    }
}

/// Writing mode and direction of the target's containing block.
fn containing_block_flow(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    target: NodeId,
) -> (WritingMode, Direction) {
    let block = oracle
        .offset_parent(dom, target)
        .or_else(|| dom.document_element());
    block.map_or_else(Default::default, |block| {
        (oracle.writing_mode(dom, block), oracle.direction(dom, block))
    })
}

/// The padding-box extent of the target's containing block along `axis`.
///
/// Inline offset parents report a zero client size; their border box minus
/// borders is used instead.
fn containing_block_size(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    target: NodeId,
    axis: Axis,
) -> f64 {
    let Some(block) = oracle.offset_parent(dom, target) else {
        return oracle.viewport().along(axis);
    };
    let client = oracle
        .client_size(dom, block)
        .map_or(0.0, |size| size.along(axis));
    if client > 0.0 {
        return client;
    }
    let borders = oracle.border_widths(dom, block);
    oracle.measure_rect(dom, block).map_or(0.0, |rect| {
        rect.size(axis) - borders.start(axis) - borders.end(axis)
    })
}

/// Measure `anchor` relative to the padding box of `target`'s containing
/// block.
#[must_use]
pub fn anchor_rect_in_containing_block(
    dom: &DomTree,
    oracle: &dyn LayoutOracle,
    anchor: NodeId,
    target: NodeId,
) -> Option<Rect> {
    let rect = oracle.measure_rect(dom, anchor)?;
    let Some(block) = oracle.offset_parent(dom, target) else {
        return Some(rect);
    };
    let Some(block_rect) = oracle.measure_rect(dom, block) else {
        return Some(rect);
    };
    let borders = oracle.border_widths(dom, block);
    Some(rect.translate(
        -(block_rect.x + borders.left),
        -(block_rect.y + borders.top),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_formatting() {
        assert_eq!(px(150.0, false), "150px");
        assert_eq!(px(12.5, false), "12.5px");
        assert_eq!(px(-0.0, false), "0px");
        assert_eq!(px(-0.4, true), "0px");
        assert_eq!(px(12.5, true), "13px");
    }

    #[test]
    fn test_keyword_percentages() {
        let ltr = (WritingMode::HorizontalTb, Direction::Ltr);
        let rtl = (WritingMode::HorizontalTb, Direction::Rtl);
        assert_eq!(keyword_percentage(AnchorSideKeyword::Bottom, Axis::Vertical, ltr), Some(100.0));
        assert_eq!(keyword_percentage(AnchorSideKeyword::Left, Axis::Vertical, ltr), None);
        assert_eq!(keyword_percentage(AnchorSideKeyword::Center, Axis::Horizontal, ltr), Some(50.0));
        assert_eq!(keyword_percentage(AnchorSideKeyword::Start, Axis::Horizontal, ltr), Some(0.0));
        assert_eq!(keyword_percentage(AnchorSideKeyword::Start, Axis::Horizontal, rtl), Some(100.0));
        assert_eq!(keyword_percentage(AnchorSideKeyword::End, Axis::Vertical, rtl), Some(100.0));

        let vertical_rl = (WritingMode::VerticalRl, Direction::Ltr);
        assert_eq!(
            keyword_percentage(AnchorSideKeyword::SelfStart, Axis::Horizontal, vertical_rl),
            Some(100.0)
        );
    }
}
