//! CSS Selector parsing and matching
//!
//! This module implements selector parsing and matching per
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/). Selectors are
//! parsed from the same component values the stylesheet parser produces, so
//! the selector text recorded in the rule model can be matched against a
//! [`DomTree`] directly.

use std::iter::Peekable;
use std::slice::Iter;

use tether_dom::{DomTree, ElementData, NodeId, NodeType};

use crate::parser::{CSSParser, ComponentValue};
use crate::serialize::ToCss;
use crate::tokenizer::{CSSToken, CSSTokenizer};

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    /// "A type selector is the name of a document language element type,
    /// and represents an instance of that element type in the document tree."
    Type(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// Pseudo-class or pseudo-element that never matches outside a live
    /// document (`:hover`, `::before`, `:nth-child(2)`, `:not(.a)`). Its
    /// presence does not invalidate the selector.
    NeverMatch,

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    /// Structural pseudo-class that requires DOM tree context to match.
    PseudoClass(PseudoClass),

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),
}

/// Structural pseudo-classes per [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// [§ 4.4 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    /// "The :root pseudo-class represents an element that is the root of the document."
    Root,
    /// [§ 4.12 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    FirstChild,
    /// [§ 4.12 :last-child](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    LastChild,
    /// [§ 4.11 :first-of-type](https://www.w3.org/TR/selectors-4/#the-first-of-type-pseudo)
    FirstOfType,
    /// [§ 4.11 :last-of-type](https://www.w3.org/TR/selectors-4/#the-last-of-type-pseudo)
    LastOfType,
    /// [§ 4.12 :only-child](https://www.w3.org/TR/selectors-4/#the-only-child-pseudo)
    OnlyChild,
    /// [§ 4.5 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    /// "The :empty pseudo-class represents an element that has no children at all."
    Empty,
}

impl PseudoClass {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "root" => Self::Root,
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            "first-of-type" => Self::FirstOfType,
            "last-of-type" => Self::LastOfType,
            "only-child" => Self::OnlyChild,
            "empty" => Self::Empty,
            _ => return None,
        })
    }
}

/// Attribute selectors per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]` "Represents an element with the att attribute"
    Exists(String),
    /// `[attr=value]` "whose value is exactly 'val'."
    Equals(String, String),
    /// `[attr~=value]` "a whitespace-separated list of words, one of which is exactly 'val'."
    Includes(String, String),
    /// `[attr|=value]` "either being exactly 'val' or beginning with 'val' immediately followed by '-'."
    DashMatch(String, String),
    /// `[attr^=value]` "begins with the prefix 'val'."
    PrefixMatch(String, String),
    /// `[attr$=value]` "ends with the suffix 'val'."
    SuffixMatch(String, String),
    /// `[attr*=value]` "contains at least one instance of the substring 'val'."
    SubstringMatch(String, String),
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The list of simple selectors that make up this compound selector.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
    /// "A selector of the form 'A B' represents an element B that is an
    /// arbitrary descendant of some ancestor element A."
    Descendant,
    /// [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
    Child,
    /// [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
    NextSibling,
    /// [§ 16.4 Subsequent-sibling combinator](https://www.w3.org/TR/selectors-4/#general-sibling-combinators)
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Example: `div.container > ul.nav li` is stored as
/// ```text
/// subject: [li], combinators: [(Descendant, [ul.nav]), (Child, [div.container])]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector (the subject of the selector).
    pub subject: CompoundSelector,
    /// Chain of (combinator, compound) pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// A parsed CSS selector ready for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// The complex selector (compound selectors with combinators).
    pub complex: ComplexSelector,
}

impl ParsedSelector {
    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// Match against an element with full DOM tree context.
    #[must_use]
    pub fn matches_in_tree(&self, tree: &DomTree, node_id: NodeId) -> bool {
        compound_matches_in_tree(&self.complex.subject, tree, node_id)
            && self.matches_combinators(tree, node_id)
    }

    /// Walk the combinator chain right to left, moving to the element that
    /// satisfied each relationship.
    ///
    /// Matching is greedy: the nearest qualifying ancestor or sibling is taken.
    fn matches_combinators(&self, tree: &DomTree, subject_id: NodeId) -> bool {
        let mut current_id = subject_id;

        for (combinator, compound) in &self.complex.combinators {
            let next = match combinator {
                Combinator::Descendant => tree
                    .ancestors(current_id)
                    .find(|&ancestor| compound_matches_in_tree(compound, tree, ancestor)),
                Combinator::Child => tree
                    .parent(current_id)
                    .filter(|&parent| compound_matches_in_tree(compound, tree, parent)),
                Combinator::NextSibling => tree
                    .preceding_siblings(current_id)
                    .find(|&sibling| tree.as_element(sibling).is_some())
                    .filter(|&sibling| compound_matches_in_tree(compound, tree, sibling)),
                Combinator::SubsequentSibling => tree
                    .preceding_siblings(current_id)
                    .find(|&sibling| compound_matches_in_tree(compound, tree, sibling)),
            };
            match next {
                Some(id) => current_id = id,
                None => return false,
            }
        }

        true
    }
}

fn compound_matches_in_tree(compound: &CompoundSelector, tree: &DomTree, node_id: NodeId) -> bool {
    let Some(element) = tree.as_element(node_id) else {
        return false;
    };
    compound.simple_selectors.iter().all(|simple| match simple {
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(*pc, tree, node_id, element),
        _ => simple.matches(element),
    })
}

fn element_children(tree: &DomTree, parent: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
    tree.children(parent)
        .iter()
        .copied()
        .filter(|&c| tree.as_element(c).is_some())
}

fn pseudo_class_matches(pc: PseudoClass, tree: &DomTree, node_id: NodeId, element: &ElementData) -> bool {
    let same_type = |c: NodeId| {
        tree.as_element(c)
            .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(&element.tag_name))
    };
    match pc {
        PseudoClass::Root => tree.document_element() == Some(node_id),
        PseudoClass::FirstChild => tree
            .parent(node_id)
            .is_some_and(|parent| element_children(tree, parent).next() == Some(node_id)),
        PseudoClass::LastChild => tree
            .parent(node_id)
            .is_some_and(|parent| element_children(tree, parent).next_back() == Some(node_id)),
        PseudoClass::FirstOfType => tree.parent(node_id).is_some_and(|parent| {
            element_children(tree, parent).find(|&c| same_type(c)) == Some(node_id)
        }),
        PseudoClass::LastOfType => tree.parent(node_id).is_some_and(|parent| {
            element_children(tree, parent).rev().find(|&c| same_type(c)) == Some(node_id)
        }),
        PseudoClass::OnlyChild => tree
            .parent(node_id)
            .is_some_and(|parent| element_children(tree, parent).count() == 1),
        PseudoClass::Empty => tree
            .children(node_id)
            .iter()
            .all(|&c| match tree.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.is_empty(),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            }),
    }
}

impl SimpleSelector {
    /// Check if this simple selector matches the given element without tree
    /// context. Structural pseudo-classes never match here.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
            Self::Class(class_name) => element.classes().contains(class_name.as_str()),
            Self::Id(id) => element.id().is_some_and(|el_id| el_id == id),
            Self::Universal => true,
            Self::NeverMatch | Self::PseudoClass(_) => false,
            Self::Attribute(attr_sel) => attr_sel.matches(element),
        }
    }
}

impl AttributeSelector {
    fn matches(&self, element: &ElementData) -> bool {
        let value = |name: &str| element.attribute(name);
        match self {
            Self::Exists(name) => value(name).is_some(),
            Self::Equals(name, val) => value(name).is_some_and(|v| v == val),
            Self::Includes(name, val) => {
                value(name).is_some_and(|v| v.split_ascii_whitespace().any(|w| w == val))
            }
            Self::DashMatch(name, val) => value(name).is_some_and(|v| {
                v == val || v.strip_prefix(val.as_str()).is_some_and(|rest| rest.starts_with('-'))
            }),
            // "If 'val' is the empty string then the selector does not represent anything."
            Self::PrefixMatch(name, val) => {
                !val.is_empty() && value(name).is_some_and(|v| v.starts_with(val.as_str()))
            }
            Self::SuffixMatch(name, val) => {
                !val.is_empty() && value(name).is_some_and(|v| v.ends_with(val.as_str()))
            }
            Self::SubstringMatch(name, val) => {
                !val.is_empty() && value(name).is_some_and(|v| v.contains(val.as_str()))
            }
        }
    }
}

fn component_values(text: &str) -> Vec<ComponentValue> {
    let mut tokenizer = CSSTokenizer::new(text);
    tokenizer.run();
    CSSParser::new(tokenizer.into_tokens()).parse_component_values()
}

/// [§ 5.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list)
///
/// Split a selector list into its complex selectors as text, e.g.
/// `"#a, .b > c"` into `["#a", ".b > c"]`. Commas nested in functions such
/// as `:is(a, b)` do not split.
#[must_use]
pub fn split_selector_list(text: &str) -> Vec<String> {
    component_values(text)
        .split(|v| *v == ComponentValue::Token(CSSToken::Comma))
        .map(|part| part.to_css_string().trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Parse a single complex selector.
///
/// [§ 4 Selector syntax](https://www.w3.org/TR/selectors-4/#syntax)
///
/// Returns `None` for invalid selectors. Unsupported pseudo-classes and
/// pseudo-elements parse as [`SimpleSelector::NeverMatch`].
#[must_use]
pub fn parse_selector(raw: &str) -> Option<ParsedSelector> {
    parse_complex(&component_values(raw))
}

/// Parse a selector list.
///
/// "A selector list is invalid if any of its selectors is invalid."
#[must_use]
pub fn parse_selector_list(raw: &str) -> Option<Vec<ParsedSelector>> {
    let values = component_values(raw);
    values
        .split(|v| *v == ComponentValue::Token(CSSToken::Comma))
        .map(parse_complex)
        .collect()
}

/// Every element of `tree` matching any selector in `selectors`, in tree
/// order. An invalid selector list matches nothing.
#[must_use]
pub fn query_selector_all(tree: &DomTree, selectors: &str) -> Vec<NodeId> {
    let Some(list) = parse_selector_list(selectors) else {
        return Vec::new();
    };
    tree.elements()
        .filter(|&id| list.iter().any(|selector| selector.matches_in_tree(tree, id)))
        .collect()
}

fn parse_complex(values: &[ComponentValue]) -> Option<ParsedSelector> {
    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current: Vec<SimpleSelector> = Vec::new();
    let mut pending: Option<Combinator> = None;

    let mut iter = values.iter().peekable();
    while let Some(value) = iter.next() {
        match value {
            // Whitespace after a compound is a descendant combinator unless an
            // explicit combinator follows.
            ComponentValue::Token(CSSToken::Whitespace) => {
                if !current.is_empty() {
                    compounds.push(CompoundSelector {
                        simple_selectors: std::mem::take(&mut current),
                    });
                    pending = Some(Combinator::Descendant);
                }
            }
            ComponentValue::Token(CSSToken::Delim(c @ ('>' | '+' | '~'))) => {
                if !current.is_empty() {
                    compounds.push(CompoundSelector {
                        simple_selectors: std::mem::take(&mut current),
                    });
                } else if compounds.is_empty() || pending != Some(Combinator::Descendant) {
                    return None;
                }
                pending = Some(match c {
                    '>' => Combinator::Child,
                    '+' => Combinator::NextSibling,
                    _ => Combinator::SubsequentSibling,
                });
            }
            other => {
                if let Some(combinator) = pending.take() {
                    combinators.push(combinator);
                }
                current.push(parse_simple(other, &mut iter)?);
            }
        }
    }

    // A trailing explicit combinator leaves nothing to match.
    if current.is_empty() {
        if pending != Some(Combinator::Descendant) {
            return None;
        }
        current = compounds.pop()?.simple_selectors;
        pending = None;
    }
    if pending.is_some() {
        return None;
    }

    let subject = CompoundSelector {
        simple_selectors: current,
    };
    let combinators = combinators.into_iter().zip(compounds).rev().collect();
    let complex = ComplexSelector {
        subject,
        combinators,
    };
    Some(ParsedSelector { complex })
}

fn parse_simple(value: &ComponentValue, iter: &mut Peekable<Iter<'_, ComponentValue>>) -> Option<SimpleSelector> {
    match value {
        ComponentValue::Token(CSSToken::Ident(name)) => Some(SimpleSelector::Type(name.to_ascii_lowercase())),
        ComponentValue::Token(CSSToken::Delim('*')) => Some(SimpleSelector::Universal),
        ComponentValue::Token(CSSToken::Hash { value, .. }) => Some(SimpleSelector::Id(value.clone())),
        // "The class selector is given as a full stop (. U+002E) immediately
        // followed by an identifier."
        ComponentValue::Token(CSSToken::Delim('.')) => match iter.next() {
            Some(ComponentValue::Token(CSSToken::Ident(class))) => Some(SimpleSelector::Class(class.clone())),
            _ => None,
        },
        ComponentValue::Token(CSSToken::Colon) => {
            let pseudo_element = iter.next_if(|v| **v == ComponentValue::Token(CSSToken::Colon)).is_some();
            match iter.next()? {
                ComponentValue::Token(CSSToken::Ident(name)) if !pseudo_element => Some(
                    PseudoClass::from_name(name).map_or(SimpleSelector::NeverMatch, SimpleSelector::PseudoClass),
                ),
                ComponentValue::Token(CSSToken::Ident(_)) | ComponentValue::Function { .. } => {
                    Some(SimpleSelector::NeverMatch)
                }
                _ => None,
            }
        }
        ComponentValue::Block { token: '[', value } => parse_attribute(value).map(SimpleSelector::Attribute),
        _ => None,
    }
}

/// `[name]`, `[name op value]` or `[name op value i]`.
fn parse_attribute(values: &[ComponentValue]) -> Option<AttributeSelector> {
    let parts: Vec<&ComponentValue> = values.iter().filter(|v| !v.is_whitespace()).collect();
    let name = parts.first()?.as_ident()?.to_ascii_lowercase();

    let (operator, rest) = match parts.get(1..)? {
        [] => return Some(AttributeSelector::Exists(name)),
        [ComponentValue::Token(CSSToken::Delim('=')), rest @ ..] => ('=', rest),
        [
            ComponentValue::Token(CSSToken::Delim(op @ ('~' | '|' | '^' | '$' | '*'))),
            ComponentValue::Token(CSSToken::Delim('=')),
            rest @ ..,
        ] => (*op, rest),
        _ => return None,
    };

    let value = match rest {
        [ComponentValue::Token(CSSToken::Ident(v) | CSSToken::String(v))]
        | [ComponentValue::Token(CSSToken::Ident(v) | CSSToken::String(v)), ComponentValue::Token(CSSToken::Ident(_))] => {
            v.clone()
        }
        _ => return None,
    };

    Some(match operator {
        '=' => AttributeSelector::Equals(name, value),
        '~' => AttributeSelector::Includes(name, value),
        '|' => AttributeSelector::DashMatch(name, value),
        '^' => AttributeSelector::PrefixMatch(name, value),
        '$' => AttributeSelector::SuffixMatch(name, value),
        _ => AttributeSelector::SubstringMatch(name, value),
    })
}
