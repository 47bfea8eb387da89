//! CSS tokenizer, parser and anchor-positioning rewriter for Tether.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Tokenizer** ([§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization))
//!   - Numeric tokens keep their source text so rewritten stylesheets
//!     reproduce numbers exactly
//!
//! - **CSS Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Style rules, declaration lists, and at-rules parsed by their grammar
//!   - Serialization back to text ([`serialize::ToCss`])
//!
//! - **CSS Selectors** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, class, ID, universal, attribute and structural pseudo-class selectors
//!   - Combinators, selector lists, and [`selector::query_selector_all`]
//!
//! - **Anchor Positioning** ([CSS Anchor Positioning](https://drafts.csswg.org/css-anchor-position-1/))
//!   - `anchor()` / `anchor-size()` syntax ([`anchor`])
//!   - Classification of stylesheet nodes and a rebuilding walker ([`classify`])
//!   - Extraction of anchor references into a rule model ([`rewrite`])
//!
//! # Not Yet Implemented
//!
//! - Comments are not preserved in rewritten text
//! - `:is()`, `:not()`, `:nth-child()` and friends never match

/// Anchor function syntax.
pub mod anchor;
/// Stylesheet node classification and tree walking.
pub mod classify;
/// The rule model produced by rewriting.
pub mod model;
/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// Inset and sizing properties.
pub mod properties;
/// Anchor name registry.
pub mod registry;
/// Two-pass stylesheet rewriting.
pub mod rewrite;
/// CSS selector parsing and matching per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// Serialization back to CSS text.
pub mod serialize;
/// CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;
/// Writing modes, directions and physical sides per [CSS Writing Modes Level 4](https://www.w3.org/TR/css-writing-modes-4/).
pub mod writing_mode;

pub use anchor::{AnchorMeasure, AnchorReference, AnchorSide, AnchorSideKeyword, AnchorSize};
pub use model::{RuleModel, SelectionStrategy, TargetRule, TryBlock, TryValue};
pub use parser::{CSSParser, ComponentValue, Declaration, Rule, Stylesheet};
pub use properties::{AnchoredProperty, InsetProperty, SizingProperty};
pub use registry::AnchorNameRegistry;
pub use rewrite::{RewriteOptions, RewriteOutput, SourceOrigin, StyleSource, rewrite_sources};
pub use selector::{ParsedSelector, parse_selector, query_selector_all};
pub use serialize::ToCss;
pub use tokenizer::{CSSToken, CSSTokenizer};
pub use writing_mode::{Axis, Direction, PhysicalSide, WritingMode};

/// Tokenize and parse a complete stylesheet.
#[must_use]
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut tokenizer = CSSTokenizer::new(css);
    tokenizer.run();
    CSSParser::new(tokenizer.into_tokens()).parse_stylesheet()
}

/// Tokenize and parse a declaration list, such as a `style` attribute.
#[must_use]
pub fn parse_declarations(css: &str) -> Vec<Declaration> {
    let mut tokenizer = CSSTokenizer::new(css);
    tokenizer.run();
    CSSParser::new(tokenizer.into_tokens()).parse_declaration_list()
}
