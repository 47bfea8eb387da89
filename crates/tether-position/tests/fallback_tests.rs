//! Integration tests for the fallback selection state machine.

use std::collections::BTreeMap;

use tether_css::{SelectionStrategy, TargetRule, TryBlock};
use tether_dom::{DomTree, ElementData, NodeId};
use tether_position::fallback::{Begin, FallbackSelector, Phase, Selection};
use tether_position::geometry::Rect;
use tether_position::static_layout::StaticLayout;

const MARKER: &str = "data-anchor-polyfill";

fn rule(blocks: usize, order: SelectionStrategy) -> TargetRule {
    TargetRule {
        declarations: BTreeMap::new(),
        fallbacks: (0..blocks)
            .map(|i| TryBlock::new(format!("anchor-try-0-{i}")))
            .collect(),
        order,
    }
}

/// A 100×100 viewport with one target whose box depends on the active block.
struct Page {
    dom: DomTree,
    layout: StaticLayout,
    target: NodeId,
}

const INSIDE: Rect = Rect::new(10.0, 10.0, 20.0, 20.0);
const OUTSIDE: Rect = Rect::new(90.0, 90.0, 20.0, 20.0);

fn page(default: Rect, blocks: &[Rect]) -> Page {
    let mut dom = DomTree::new();
    let target = dom.append_element(NodeId::ROOT, ElementData::new("div"));
    let mut layout = StaticLayout::new();
    layout.set_viewport(100.0, 100.0);
    layout.set_rect(target, default);
    for (i, rect) in blocks.iter().enumerate() {
        layout.set_marked_rect(target, &format!("anchor-try-0-{i}"), *rect);
    }
    Page {
        dom,
        layout,
        target,
    }
}

fn run(page: &mut Page, rule: &TargetRule) -> Option<Selection> {
    let mut selector = FallbackSelector::new(page.target, rule, MARKER);
    assert_eq!(selector.begin(), Begin::Started);
    selector.run(&mut page.dom, &page.layout)
}

#[test]
fn test_default_layout_that_fits_clears_marker() {
    let mut page = page(INSIDE, &[OUTSIDE]);
    page.dom.set_attribute(page.target, MARKER, "anchor-try-0-0");

    let selection = run(&mut page, &rule(1, SelectionStrategy::Normal));
    assert_eq!(selection, Some(Selection::Default));
    assert_eq!(page.dom.attribute(page.target, MARKER), None);
    assert_eq!(page.layout.overflow_checks(), 1);
}

#[test]
fn test_normal_order_stops_at_first_fitting_block() {
    let mut page = page(OUTSIDE, &[OUTSIDE, INSIDE, INSIDE, OUTSIDE]);

    let selection = run(&mut page, &rule(4, SelectionStrategy::Normal));
    assert_eq!(selection, Some(Selection::Block(1)));
    assert_eq!(page.dom.attribute(page.target, MARKER), Some("anchor-try-0-1"));
    // default, block 0, block 1; nothing after the winner
    assert_eq!(page.layout.overflow_checks(), 3);
}

#[test]
fn test_normal_order_reverts_when_nothing_fits() {
    let mut page = page(OUTSIDE, &[OUTSIDE, OUTSIDE]);

    let selection = run(&mut page, &rule(2, SelectionStrategy::Normal));
    assert_eq!(selection, Some(Selection::Reverted));
    assert_eq!(page.dom.attribute(page.target, MARKER), None);
    assert_eq!(page.layout.overflow_checks(), 3);
}

#[test]
fn test_most_width_picks_largest_visible_extent() {
    let mut page = page(
        OUTSIDE,
        &[
            Rect::new(80.0, 0.0, 40.0, 10.0),
            Rect::new(-10.0, 0.0, 50.0, 10.0),
            Rect::new(0.0, 0.0, 40.0, 200.0),
        ],
    );

    // visible widths: 20, 40, 40 (tie goes to the earlier block)
    let selection = run(&mut page, &rule(3, SelectionStrategy::MostWidth));
    assert_eq!(selection, Some(Selection::Block(1)));
    assert_eq!(page.dom.attribute(page.target, MARKER), Some("anchor-try-0-1"));
}

#[test]
fn test_logical_strategy_uses_target_writing_mode() {
    let blocks = [Rect::new(0.0, 0.0, 30.0, 90.0), Rect::new(0.0, 0.0, 60.0, 10.0)];

    let mut horizontal = page(OUTSIDE, &blocks);
    let selection = run(&mut horizontal, &rule(2, SelectionStrategy::MostBlockSize));
    assert_eq!(selection, Some(Selection::Block(0)));

    // the block axis is horizontal in vertical-rl
    let mut vertical = page(OUTSIDE, &blocks);
    vertical.layout.set_computed(vertical.target, "writing-mode", "vertical-rl");
    let selection = run(&mut vertical, &rule(2, SelectionStrategy::MostBlockSize));
    assert_eq!(selection, Some(Selection::Block(1)));
}

#[test]
fn test_unmeasurable_target_counts_as_fitting() {
    let mut dom = DomTree::new();
    let target = dom.append_element(NodeId::ROOT, ElementData::new("div"));
    let layout = StaticLayout::new();
    let mut selector = FallbackSelector::new(target, &rule(2, SelectionStrategy::Normal), MARKER);

    let _ = selector.begin();
    assert_eq!(selector.run(&mut dom, &layout), Some(Selection::Default));
}

#[test]
fn test_overlapping_evaluation_is_dropped() {
    let mut page = page(OUTSIDE, &[OUTSIDE, INSIDE]);
    let mut selector = FallbackSelector::new(page.target, &rule(2, SelectionStrategy::Normal), MARKER);

    assert_eq!(selector.phase(), Phase::Idle);
    assert_eq!(selector.begin(), Begin::Started);
    assert_eq!(selector.step(&mut page.dom, &page.layout), None);
    assert_eq!(selector.phase(), Phase::Iterating { next: 0 });
    assert!(selector.is_busy());
    assert_eq!(selector.begin(), Begin::Dropped);

    assert_eq!(selector.step(&mut page.dom, &page.layout), None);
    assert_eq!(
        selector.step(&mut page.dom, &page.layout),
        Some(Selection::Block(1))
    );
    assert_eq!(selector.phase(), Phase::Settled(Selection::Block(1)));
    assert!(!selector.is_busy());
    assert_eq!(selector.begin(), Begin::Started);
}

#[test]
fn test_step_without_begin_does_nothing() {
    let mut page = page(OUTSIDE, &[INSIDE]);
    let mut selector = FallbackSelector::new(page.target, &rule(1, SelectionStrategy::Normal), MARKER);
    assert_eq!(selector.step(&mut page.dom, &page.layout), None);
    assert_eq!(page.layout.overflow_checks(), 0);
}
