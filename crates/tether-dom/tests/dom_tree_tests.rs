//! Tests for tree mutation, tree order, attributes and root properties.

use std::cmp::Ordering;

use tether_dom::{DomTree, ElementData, NodeId};

/// Helper to create an element node under `parent` and return its NodeId.
fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    tree.append_element(parent, ElementData::new(tag))
}

// ========== remove_child ==========

#[test]
fn test_remove_child_first_of_three() {
    let mut tree = DomTree::new();
    let parent = element(&mut tree, NodeId::ROOT, "div");
    let a = element(&mut tree, parent, "a");
    let b = element(&mut tree, parent, "b");
    let c = element(&mut tree, parent, "c");

    tree.remove_child(parent, a);

    assert_eq!(tree.children(parent), &[b, c]);
    assert_eq!(tree.prev_sibling(b), None);
    assert_eq!(tree.next_sibling(b), Some(c));
    assert_eq!(tree.parent(a), None);
}

#[test]
fn test_remove_child_middle_relinks_siblings() {
    let mut tree = DomTree::new();
    let parent = element(&mut tree, NodeId::ROOT, "div");
    let a = element(&mut tree, parent, "a");
    let b = element(&mut tree, parent, "b");
    let c = element(&mut tree, parent, "c");

    tree.remove_child(parent, b);

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
}

#[test]
fn test_remove_child_wrong_parent_is_ignored() {
    let mut tree = DomTree::new();
    let parent = element(&mut tree, NodeId::ROOT, "div");
    let other = element(&mut tree, NodeId::ROOT, "div");
    let child = element(&mut tree, parent, "span");

    tree.remove_child(other, child);

    assert_eq!(tree.parent(child), Some(parent));
}

#[test]
fn test_removed_subtree_is_disconnected() {
    let mut tree = DomTree::new();
    let parent = element(&mut tree, NodeId::ROOT, "div");
    let child = element(&mut tree, parent, "span");
    let grandchild = element(&mut tree, child, "em");

    assert!(tree.is_connected(grandchild));
    tree.remove_child(parent, child);
    assert!(!tree.is_connected(child));
    assert!(!tree.is_connected(grandchild));
    assert!(tree.is_descendant_of(grandchild, child));
}

// ========== tree order ==========

#[test]
fn test_descendants_are_preorder() {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html");
    let head = element(&mut tree, html, "head");
    let body = element(&mut tree, html, "body");
    let p = element(&mut tree, body, "p");
    let title = element(&mut tree, head, "title");

    let order: Vec<NodeId> = tree.elements().collect();
    assert_eq!(order, vec![html, head, title, body, p]);
}

#[test]
fn test_tree_order_comparisons() {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html");
    let a = element(&mut tree, html, "div");
    let a_child = element(&mut tree, a, "span");
    let b = element(&mut tree, html, "div");

    assert!(tree.precedes(a, b));
    assert!(tree.precedes(a_child, b));
    assert!(tree.precedes(a, a_child));
    assert!(!tree.precedes(b, a_child));
    assert_eq!(tree.tree_order(b, b), Some(Ordering::Equal));
}

#[test]
fn test_tree_order_detached_is_none() {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html");
    let detached = tree.alloc(tether_dom::NodeType::Element(ElementData::new("div")));

    assert_eq!(tree.tree_order(html, detached), None);
    assert!(!tree.precedes(html, detached));
}

// ========== attributes ==========

#[test]
fn test_set_and_remove_attribute() {
    let mut tree = DomTree::new();
    let div = element(&mut tree, NodeId::ROOT, "div");

    tree.set_attribute(div, "data-anchor-polyfill", "try-1");
    assert_eq!(tree.attribute(div, "data-anchor-polyfill"), Some("try-1"));

    tree.remove_attribute(div, "data-anchor-polyfill");
    assert_eq!(tree.attribute(div, "data-anchor-polyfill"), None);
}

#[test]
fn test_element_by_id_returns_first_in_tree_order() {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html");
    let first = tree.append_element(html, ElementData::new("div").with_attribute("id", "dup"));
    let _second = tree.append_element(html, ElementData::new("div").with_attribute("id", "dup"));

    assert_eq!(tree.element_by_id("dup"), Some(first));
    assert_eq!(tree.element_by_id("missing"), None);
}

#[test]
fn test_classes_split_on_any_whitespace() {
    let data = ElementData::new("div").with_attribute("class", "a  b\tc");
    let classes = data.classes();
    assert_eq!(classes.len(), 3);
    assert!(classes.contains("b"));
}

// ========== root properties ==========

#[test]
fn test_root_properties_round_trip() {
    let mut tree = DomTree::new();
    tree.set_root_property("--anchor-1", "150px");
    tree.set_root_property("--anchor-0", "0px");

    assert_eq!(tree.root_property("--anchor-1"), Some("150px"));
    let names: Vec<&str> = tree.root_properties().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["--anchor-0", "--anchor-1"]);

    tree.remove_root_property("--anchor-1");
    assert_eq!(tree.root_property("--anchor-1"), None);
}
