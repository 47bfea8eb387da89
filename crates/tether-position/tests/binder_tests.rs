//! Integration tests for binding references to anchor elements.

use tether_css::{
    AnchorMeasure, AnchorNameRegistry, AnchorReference, AnchorSide, AnchorSideKeyword,
};
use tether_dom::{DomTree, ElementData, NodeId};
use tether_position::binder::{ResolvedBinding, bind, candidate_selectors, resolve_binding};
use tether_position::oracle::LayoutOracle;
use tether_position::static_layout::StaticLayout;
use tether_position::validate::{AnchorValidator, PositioningValidator};

fn reference(anchor_name: Option<&str>, custom_prop_name: Option<&str>) -> AnchorReference {
    AnchorReference {
        anchor_name: anchor_name.map(str::to_string),
        custom_prop_name: custom_prop_name.map(str::to_string),
        measure: AnchorMeasure::Edge(AnchorSide::Keyword(AnchorSideKeyword::Bottom)),
        fallback_value: "0px".to_string(),
        indirection_key: "--anchor-0".to_string(),
    }
}

/// ```text
/// body
/// ├── button#first.anchor
/// ├── button#second.anchor
/// ├── div#target [anchor="second"]
/// └── button#third.anchor
/// ```
struct Page {
    dom: DomTree,
    layout: StaticLayout,
    registry: AnchorNameRegistry,
    first: NodeId,
    second: NodeId,
    third: NodeId,
    target: NodeId,
}

fn page() -> Page {
    let mut dom = DomTree::new();
    let body = dom.append_element(NodeId::ROOT, ElementData::new("body"));
    let button = |id: &str| {
        ElementData::new("button")
            .with_attribute("id", id)
            .with_attribute("class", "anchor")
    };
    let first = dom.append_element(body, button("first"));
    let second = dom.append_element(body, button("second"));
    let target = dom.append_element(
        body,
        ElementData::new("div")
            .with_attribute("id", "target")
            .with_attribute("anchor", "second"),
    );
    let third = dom.append_element(body, button("third"));

    let mut registry = AnchorNameRegistry::new();
    registry.register("--a", "#first");
    registry.register("--a", ".anchor");
    registry.register("--solo", "#first");

    let mut layout = StaticLayout::new();
    for anchor in [first, second, third] {
        layout.set_computed(anchor, "position", "absolute");
    }
    Page {
        dom,
        layout,
        registry,
        first,
        second,
        third,
        target,
    }
}

fn bind_on(page: &Page, reference: &AnchorReference) -> Option<NodeId> {
    bind(
        &page.dom,
        &page.layout,
        &PositioningValidator,
        &page.registry,
        page.target,
        reference,
    )
}

#[test]
fn test_unknown_name_binds_nothing() {
    let page = page();
    assert_eq!(bind_on(&page, &reference(Some("--missing"), None)), None);
}

#[test]
fn test_duplicate_names_bind_to_the_accepted_element() {
    let page = page();
    // #third follows the target and is absolutely positioned, so the
    // nearest legal candidate is #second, not the first declared.
    assert_eq!(bind_on(&page, &reference(Some("--a"), None)), Some(page.second));
    assert_eq!(bind_on(&page, &reference(Some("--solo"), None)), Some(page.first));
}

#[test]
fn test_later_static_anchor_is_accepted() {
    let mut page = page();
    page.layout.set_computed(page.third, "position", "static");
    assert_eq!(bind_on(&page, &reference(Some("--a"), None)), Some(page.third));
}

#[test]
fn test_custom_property_names_the_anchor() {
    let mut page = page();
    let via_property = reference(None, Some("--which"));
    assert_eq!(bind_on(&page, &via_property), None);

    page.layout.set_computed(page.target, "--which", " --solo ");
    assert_eq!(bind_on(&page, &via_property), Some(page.first));

    page.layout.set_computed(page.target, "--which", "solo");
    assert_eq!(bind_on(&page, &via_property), None);
}

#[test]
fn test_implicit_anchor_attribute() {
    let mut page = page();
    let implicit = reference(None, None);
    assert_eq!(
        candidate_selectors(&page.dom, &page.layout, &page.registry, page.target, &implicit),
        vec!["#second".to_string()]
    );
    assert_eq!(bind_on(&page, &implicit), Some(page.second));

    page.dom.remove_attribute(page.target, "anchor");
    assert_eq!(bind_on(&page, &implicit), None);
}

#[test]
fn test_resolved_binding_reports_both_ends() {
    let page = page();
    let binding = resolve_binding(
        &page.dom,
        &page.layout,
        &PositioningValidator,
        &page.registry,
        page.target,
        &reference(Some("--solo"), None),
    );
    assert_eq!(
        binding,
        ResolvedBinding {
            anchor_element: Some(page.first),
            target_element: Some(page.target),
        }
    );
}

/// Accepts the first candidate in tree order, whatever its position.
struct FirstMatch;

impl AnchorValidator for FirstMatch {
    fn validate(
        &self,
        dom: &DomTree,
        _oracle: &dyn LayoutOracle,
        _target: NodeId,
        selectors: &[String],
    ) -> Option<NodeId> {
        selectors
            .iter()
            .flat_map(|selector| tether_css::query_selector_all(dom, selector))
            .min_by(|a, b| dom.tree_order(*a, *b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

#[test]
fn test_validator_decides_among_candidates() {
    let page = page();
    let chosen = bind(
        &page.dom,
        &page.layout,
        &FirstMatch,
        &page.registry,
        page.target,
        &reference(Some("--a"), None),
    );
    assert_eq!(chosen, Some(page.first));
}
