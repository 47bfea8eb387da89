//! Integration tests for CSS selector parsing and matching.

use tether_css::selector::{
    AttributeSelector, Combinator, PseudoClass, SimpleSelector, parse_selector,
    parse_selector_list, query_selector_all, split_selector_list,
};
use tether_dom::{DomTree, ElementData, NodeId, NodeType};

fn element(tag: &str, id: Option<&str>, classes: &[&str]) -> ElementData {
    let mut data = ElementData::new(tag);
    if let Some(id) = id {
        data = data.with_attribute("id", id);
    }
    if !classes.is_empty() {
        data = data.with_attribute("class", classes.join(" "));
    }
    data
}

/// ```text
/// html
/// └── body
///     ├── div#menu.popover
///     │   ├── button#anchor.trigger [data-role="opener"]
///     │   └── span.tip
///     └── div#tooltip.popover [data-anchor-polyfill="anchor-try-0-1"]
/// ```
struct Fixture {
    tree: DomTree,
    body: NodeId,
    menu: NodeId,
    anchor: NodeId,
    tip: NodeId,
    tooltip: NodeId,
}

fn fixture() -> Fixture {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, ElementData::new("html"));
    let body = tree.append_element(html, ElementData::new("body"));
    let menu = tree.append_element(body, element("div", Some("menu"), &["popover"]));
    let anchor = tree.append_element(
        menu,
        element("button", Some("anchor"), &["trigger"]).with_attribute("data-role", "opener"),
    );
    let tip = tree.append_element(menu, element("span", None, &["tip"]));
    let tooltip = tree.append_element(
        body,
        element("div", Some("tooltip"), &["popover"])
            .with_attribute("data-anchor-polyfill", "anchor-try-0-1"),
    );
    Fixture {
        tree,
        body,
        menu,
        anchor,
        tip,
        tooltip,
    }
}

#[test]
fn test_parse_simple_selectors() {
    let selector = parse_selector("DIV").unwrap();
    assert!(matches!(
        &selector.complex.subject.simple_selectors[0],
        SimpleSelector::Type(name) if name == "div"
    ));

    let selector = parse_selector("#main.a.b").unwrap();
    assert_eq!(selector.complex.subject.simple_selectors.len(), 3);

    let selector = parse_selector("*").unwrap();
    assert!(matches!(
        selector.complex.subject.simple_selectors[..],
        [SimpleSelector::Universal]
    ));
}

#[test]
fn test_parse_combinator_chain() {
    let selector = parse_selector("div.container > ul li+a ~ b").unwrap();
    let combinators: Vec<Combinator> = selector
        .complex
        .combinators
        .iter()
        .map(|(combinator, _)| *combinator)
        .collect();
    assert_eq!(
        combinators,
        vec![
            Combinator::SubsequentSibling,
            Combinator::NextSibling,
            Combinator::Descendant,
            Combinator::Child,
        ]
    );
    assert!(matches!(
        &selector.complex.combinators[3].1.simple_selectors[..],
        [SimpleSelector::Type(div), SimpleSelector::Class(container)]
            if div == "div" && container == "container"
    ));
}

#[test]
fn test_parse_invalid_selectors() {
    assert!(parse_selector("> a").is_none());
    assert!(parse_selector("a >").is_none());
    assert!(parse_selector("a > > b").is_none());
    assert!(parse_selector(".").is_none());
    assert!(parse_selector("").is_none());
    assert!(parse_selector_list("a, > b").is_none());
}

#[test]
fn test_parse_pseudo_classes() {
    let first = parse_selector("li:first-child").unwrap();
    assert_eq!(
        first.complex.subject.simple_selectors[1],
        SimpleSelector::PseudoClass(PseudoClass::FirstChild)
    );
    for never in ["a:hover", "p::before", "p:before", "li:nth-child(2n+1)", "a:not(.b)"] {
        let selector = parse_selector(never).unwrap();
        assert_eq!(
            selector.complex.subject.simple_selectors[1],
            SimpleSelector::NeverMatch,
            "{never}"
        );
    }
}

#[test]
fn test_parse_attribute_selectors() {
    let cases = [
        ("[href]", AttributeSelector::Exists("href".into())),
        ("[type=text]", AttributeSelector::Equals("type".into(), "text".into())),
        (
            "[data-anchor-polyfill=\"anchor-try-0-1\"]",
            AttributeSelector::Equals("data-anchor-polyfill".into(), "anchor-try-0-1".into()),
        ),
        ("[class~=active]", AttributeSelector::Includes("class".into(), "active".into())),
        ("[lang|=en]", AttributeSelector::DashMatch("lang".into(), "en".into())),
        ("[href^='https']", AttributeSelector::PrefixMatch("href".into(), "https".into())),
        ("[ src $= \".png\" ]", AttributeSelector::SuffixMatch("src".into(), ".png".into())),
        ("[data-theme*=dark i]", AttributeSelector::SubstringMatch("data-theme".into(), "dark".into())),
    ];
    for (text, expected) in cases {
        let selector = parse_selector(text).unwrap_or_else(|| panic!("{text} should parse"));
        assert_eq!(
            selector.complex.subject.simple_selectors,
            vec![SimpleSelector::Attribute(expected)],
            "{text}"
        );
    }
    assert!(parse_selector("[=x]").is_none());
    assert!(parse_selector("[a=b c d]").is_none());
}

#[test]
fn test_split_selector_list_respects_nesting() {
    assert_eq!(
        split_selector_list("#a, .b > c,:is(d, e)"),
        vec!["#a", ".b > c", ":is(d, e)"]
    );
    assert!(split_selector_list("  ").is_empty());
}

#[test]
fn test_matches_combinators_in_tree() {
    let f = fixture();
    let selector = parse_selector("body > .popover .trigger").unwrap();
    assert!(selector.matches_in_tree(&f.tree, f.anchor));
    assert!(!selector.matches_in_tree(&f.tree, f.tip));

    let sibling = parse_selector("#anchor + span").unwrap();
    assert!(sibling.matches_in_tree(&f.tree, f.tip));

    let subsequent = parse_selector("#menu ~ div").unwrap();
    assert!(subsequent.matches_in_tree(&f.tree, f.tooltip));
    assert!(!subsequent.matches_in_tree(&f.tree, f.menu));
}

#[test]
fn test_matches_structural_pseudo_classes() {
    let f = fixture();
    assert!(parse_selector(":first-child").unwrap().matches_in_tree(&f.tree, f.anchor));
    assert!(parse_selector(":last-child").unwrap().matches_in_tree(&f.tree, f.tip));
    assert!(parse_selector("div:last-of-type").unwrap().matches_in_tree(&f.tree, f.tooltip));
    assert!(parse_selector(":empty").unwrap().matches_in_tree(&f.tree, f.tip));
    assert!(!parse_selector(":empty").unwrap().matches_in_tree(&f.tree, f.menu));
    assert!(!parse_selector(":only-child").unwrap().matches_in_tree(&f.tree, f.menu));
    let html = f.tree.parent(f.body).unwrap();
    assert!(parse_selector(":root").unwrap().matches_in_tree(&f.tree, html));
}

#[test]
fn test_empty_ignores_comments() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, ElementData::new("div"));
    let comment = tree.alloc(NodeType::Comment("note".into()));
    tree.append_child(div, comment);
    assert!(parse_selector("div:empty").unwrap().matches_in_tree(&tree, div));

    let text = tree.alloc(NodeType::Text("x".into()));
    tree.append_child(div, text);
    assert!(!parse_selector("div:empty").unwrap().matches_in_tree(&tree, div));
}

#[test]
fn test_match_attribute_values() {
    let f = fixture();
    let matches = |text: &str, node: NodeId| parse_selector(text).unwrap().matches_in_tree(&f.tree, node);
    assert!(matches("[data-role]", f.anchor));
    assert!(matches("[data-role=opener]", f.anchor));
    assert!(matches("[class~=trigger]", f.anchor));
    assert!(matches("[data-anchor-polyfill^=anchor-try]", f.tooltip));
    assert!(matches("[data-anchor-polyfill$=\"-1\"]", f.tooltip));
    assert!(matches("[id*=ool]", f.tooltip));
    assert!(!matches("[id^=\"\"]", f.tooltip));
    assert!(!matches("[data-role=closer]", f.anchor));
}

#[test]
fn test_query_selector_all_in_tree_order() {
    let f = fixture();
    assert_eq!(query_selector_all(&f.tree, ".popover"), vec![f.menu, f.tooltip]);
    assert_eq!(
        query_selector_all(&f.tree, "#tooltip, #anchor, .trigger"),
        vec![f.anchor, f.tooltip]
    );
    assert!(query_selector_all(&f.tree, "a:hover").is_empty());
    assert!(query_selector_all(&f.tree, "#menu >").is_empty());
}

#[test]
fn test_disconnected_elements_are_not_queried() {
    let mut f = fixture();
    f.tree.remove_child(f.body, f.tooltip);
    assert_eq!(query_selector_all(&f.tree, ".popover"), vec![f.menu]);
}
