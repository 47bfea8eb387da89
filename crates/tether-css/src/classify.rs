//! Classification of stylesheet nodes and a rebuilding tree walker.
//!
//! Every node the rewriter cares about falls into one variant of
//! [`Classified`]; visitors `match` on it exhaustively. [`walk`] visits a
//! stylesheet in document order and builds a new one from the visitor's
//! answers, leaving the input untouched.

use crate::anchor::var_name;
use crate::parser::{AtRule, AtRuleBlock, ComponentValue, Declaration, Rule, StyleRule, Stylesheet};

/// A node of the parsed stylesheet.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// A declaration inside a style rule or declaration block.
    Declaration(&'a Declaration),
    /// An at-rule.
    AtRule(&'a AtRule),
    /// A component value inside a declaration value.
    Value(&'a ComponentValue),
}

/// Declarations controlling fallback layouts. The payload is the first
/// identifier of the value, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackDeclaration<'a> {
    /// `position-fallback: --name`
    Fallback(Option<&'a str>),
    /// `position-try-order: most-width` (also spelled `position-fallback-order`)
    Order(Option<&'a str>),
}

/// The closed set of node kinds the rewriter distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified<'a> {
    /// `anchor-name: --a, --b`, with the dashed names declared.
    AnchorNameDeclaration {
        /// The dashed names, in order (`none` yields none).
        names: Vec<&'a str>,
    },
    /// An `anchor()` call, with its arguments.
    AnchorFunction(&'a [ComponentValue]),
    /// An `anchor-size()` call, with its arguments.
    AnchorSizeFunction(&'a [ComponentValue]),
    /// `--custom: ...`
    CustomPropertyDeclaration {
        /// The custom property name.
        name: &'a str,
        /// Its value.
        value: &'a [ComponentValue],
    },
    /// `var(--custom ...)`
    CustomPropertyReference {
        /// The referenced custom property.
        name: &'a str,
    },
    /// `position-fallback` or its order declaration.
    PositionFallbackDeclaration(FallbackDeclaration<'a>),
    /// `@position-fallback --name { ... }`
    PositionFallbackAtRule {
        /// The fallback set's name.
        name: &'a str,
    },
    /// `@try { ... }` inside `@position-fallback`.
    TryBlock,
    /// Anything else.
    Other,
}

/// Where a node sits in the stylesheet.
///
/// At-rules are visited with the context their contents will see, so a
/// `@try` rule already carries its own ordinal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkContext<'c> {
    /// Index of the source being walked.
    pub source: usize,
    /// Selector text of the enclosing style rule.
    pub selector: Option<&'c str>,
    /// Name of the enclosing declaration.
    pub property: Option<&'c str>,
    /// Name of the enclosing `@position-fallback` rule.
    pub fallback: Option<&'c str>,
    /// Ordinal of the enclosing `@try` block within the source.
    pub try_block: Option<usize>,
}

/// What to do with a visited node.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// Keep the node (and walk into it).
    Keep,
    /// Replace a component value.
    Replace(ComponentValue),
    /// Drop a declaration, at-rule or component value.
    Remove,
}

/// Callbacks for [`walk`].
pub trait Visitor {
    /// Decide what happens to a classified node.
    fn visit(&mut self, node: Classified<'_>, ctx: &WalkContext<'_>) -> Rewrite;

    /// Called with each declaration after its value has been rebuilt.
    fn leave_declaration(&mut self, _declaration: &Declaration, _ctx: &WalkContext<'_>) {}
}

/// A rebuilt stylesheet and the number of nodes replaced or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Walked<T> {
    /// The rebuilt tree.
    pub tree: T,
    /// How many nodes the visitor replaced or removed.
    pub rewrites: usize,
}

/// Classify a node. Pure: depends only on the node and its position.
#[must_use]
pub fn classify<'a>(node: Node<'a>, ctx: &WalkContext<'_>) -> Classified<'a> {
    match node {
        Node::Declaration(declaration) => classify_declaration(declaration),
        Node::AtRule(at_rule) => {
            if at_rule.name.eq_ignore_ascii_case("position-fallback") {
                first_ident(&at_rule.prelude)
                    .map_or(Classified::Other, |name| Classified::PositionFallbackAtRule { name })
            } else if at_rule.name.eq_ignore_ascii_case("try") && ctx.fallback.is_some() {
                Classified::TryBlock
            } else {
                Classified::Other
            }
        }
        Node::Value(ComponentValue::Function { name, value }) => {
            if name.eq_ignore_ascii_case("anchor") {
                Classified::AnchorFunction(value)
            } else if name.eq_ignore_ascii_case("anchor-size") {
                Classified::AnchorSizeFunction(value)
            } else if name.eq_ignore_ascii_case("var") {
                var_name(value).map_or(Classified::Other, |name| {
                    Classified::CustomPropertyReference { name }
                })
            } else {
                Classified::Other
            }
        }
        Node::Value(_) => Classified::Other,
    }
}

fn classify_declaration(declaration: &Declaration) -> Classified<'_> {
    let name = declaration.name.as_str();
    if name.starts_with("--") {
        return Classified::CustomPropertyDeclaration {
            name,
            value: &declaration.value,
        };
    }
    match name.to_ascii_lowercase().as_str() {
        "anchor-name" => Classified::AnchorNameDeclaration {
            names: declaration
                .value
                .iter()
                .filter_map(ComponentValue::as_ident)
                .filter(|ident| ident.starts_with("--"))
                .collect(),
        },
        "position-fallback" => Classified::PositionFallbackDeclaration(FallbackDeclaration::Fallback(
            first_ident(&declaration.value),
        )),
        "position-try-order" | "position-fallback-order" => Classified::PositionFallbackDeclaration(
            FallbackDeclaration::Order(first_ident(&declaration.value)),
        ),
        _ => Classified::Other,
    }
}

fn first_ident(values: &[ComponentValue]) -> Option<&str> {
    values
        .iter()
        .find(|v| !v.is_whitespace())
        .and_then(ComponentValue::as_ident)
}

/// Walk a stylesheet, returning the rebuilt copy.
pub fn walk<V: Visitor>(sheet: &Stylesheet, source: usize, visitor: &mut V) -> Walked<Stylesheet> {
    let mut walker = Walker::new(visitor);
    let ctx = WalkContext {
        source,
        ..WalkContext::default()
    };
    let rules = walker.rules(&sheet.rules, &ctx);
    Walked {
        tree: Stylesheet { rules },
        rewrites: walker.rewrites,
    }
}

/// Walk a bare declaration list (an inline style) as if it were the body of
/// a style rule with the given selector.
pub fn walk_declarations<V: Visitor>(
    declarations: &[Declaration],
    selector: &str,
    source: usize,
    visitor: &mut V,
) -> Walked<Vec<Declaration>> {
    let mut walker = Walker::new(visitor);
    let ctx = WalkContext {
        source,
        selector: Some(selector),
        ..WalkContext::default()
    };
    let tree = walker.declarations(declarations, &ctx);
    Walked {
        tree,
        rewrites: walker.rewrites,
    }
}

struct Walker<'v, V> {
    visitor: &'v mut V,
    rewrites: usize,
    try_blocks: usize,
}

impl<'v, V: Visitor> Walker<'v, V> {
    const fn new(visitor: &'v mut V) -> Self {
        Self {
            visitor,
            rewrites: 0,
            try_blocks: 0,
        }
    }

    fn rules(&mut self, rules: &[Rule], ctx: &WalkContext<'_>) -> Vec<Rule> {
        let mut out = Vec::with_capacity(rules.len());
        for rule in rules {
            match rule {
                Rule::Style(style) => out.push(Rule::Style(self.style_rule(style, ctx))),
                Rule::At(at_rule) => {
                    if let Some(at_rule) = self.at_rule(at_rule, ctx) {
                        out.push(Rule::At(at_rule));
                    }
                }
            }
        }
        out
    }

    fn style_rule(&mut self, rule: &StyleRule, ctx: &WalkContext<'_>) -> StyleRule {
        let selector = rule.selector_text();
        let inner = WalkContext {
            source: ctx.source,
            selector: Some(&selector),
            ..WalkContext::default()
        };
        StyleRule {
            prelude: rule.prelude.clone(),
            declarations: self.declarations(&rule.declarations, &inner),
        }
    }

    fn at_rule(&mut self, at_rule: &AtRule, ctx: &WalkContext<'_>) -> Option<AtRule> {
        let class = classify(Node::AtRule(at_rule), ctx);
        let mut inner = *ctx;
        match class {
            Classified::PositionFallbackAtRule { name } => {
                inner = WalkContext {
                    source: ctx.source,
                    fallback: Some(name),
                    ..WalkContext::default()
                };
            }
            Classified::TryBlock => {
                inner.try_block = Some(self.try_blocks);
                self.try_blocks += 1;
            }
            _ => {}
        }

        if self.visitor.visit(class, &inner) == Rewrite::Remove {
            self.rewrites += 1;
            return None;
        }

        let block = at_rule.block.as_ref().map(|block| match block {
            AtRuleBlock::Rules(rules) => AtRuleBlock::Rules(self.rules(rules, &inner)),
            AtRuleBlock::Declarations(declarations) => {
                AtRuleBlock::Declarations(self.declarations(declarations, &inner))
            }
            AtRuleBlock::Raw(values) => AtRuleBlock::Raw(values.clone()),
        });
        Some(AtRule {
            name: at_rule.name.clone(),
            prelude: at_rule.prelude.clone(),
            block,
        })
    }

    fn declarations(&mut self, declarations: &[Declaration], ctx: &WalkContext<'_>) -> Vec<Declaration> {
        let mut out = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let class = classify(Node::Declaration(declaration), ctx);
            if self.visitor.visit(class, ctx) == Rewrite::Remove {
                self.rewrites += 1;
                continue;
            }
            let inner = WalkContext {
                property: Some(&declaration.name),
                ..*ctx
            };
            let rebuilt = Declaration {
                name: declaration.name.clone(),
                value: self.values(&declaration.value, &inner),
                important: declaration.important,
            };
            self.visitor.leave_declaration(&rebuilt, &inner);
            out.push(rebuilt);
        }
        out
    }

    fn values(&mut self, values: &[ComponentValue], ctx: &WalkContext<'_>) -> Vec<ComponentValue> {
        let mut out = Vec::with_capacity(values.len());
        for value in values {
            let class = classify(Node::Value(value), ctx);
            // Anchor function arguments are captured whole, never walked.
            let opaque = matches!(
                class,
                Classified::AnchorFunction(_) | Classified::AnchorSizeFunction(_)
            );
            match self.visitor.visit(class, ctx) {
                Rewrite::Replace(replacement) => {
                    self.rewrites += 1;
                    out.push(replacement);
                }
                Rewrite::Remove => self.rewrites += 1,
                Rewrite::Keep => out.push(match value {
                    ComponentValue::Function { name, value } if !opaque => ComponentValue::Function {
                        name: name.clone(),
                        value: self.values(value, ctx),
                    },
                    ComponentValue::Block { token, value } => ComponentValue::Block {
                        token: *token,
                        value: self.values(value, ctx),
                    },
                    other => other.clone(),
                }),
            }
        }
        out
    }
}
