//! Two-pass rewriting of author stylesheets.
//!
//! Anchor functions are pulled out of the stylesheet text and replaced by
//! `var(<key>)` placeholders. The extracted references form the
//! [`RuleModel`] the runtime resolves; computed pixel values are later
//! published on the document root under each key.
//!
//! - Custom property names the sources already use are reserved first, so
//!   no generated key shadows one.
//! - Pass 1 records anchor names, direct anchor calls, custom properties
//!   assigned an anchor call, fallback names and `@position-fallback` rules.
//! - Pass 2 runs only when a custom property carried an anchor call, and
//!   redirects `var(--prop)` uses in inset and sizing properties to a
//!   property-specific clone of that reference.
//! - Pass 3 attaches fallback blocks to their targets (each selector after
//!   the first gets its own keys), strips the fallback syntax and emits one
//!   marker-activated rule per `@try` block.

use std::collections::{BTreeMap, HashSet};

use log::debug;
use serde::Serialize;
use tether_common::warning::warn_once;

use crate::anchor::{AnchorCall, AnchorFunction, AnchorReference, var_name};
use crate::classify::{
    Classified, FallbackDeclaration, Rewrite, Visitor, WalkContext, Walked, walk, walk_declarations,
};
use crate::model::{RuleModel, SelectionStrategy, TryBlock, TryValue};
use crate::parser::{CSSParser, ComponentValue, Declaration, Rule, StyleRule, Stylesheet};
use crate::properties::AnchoredProperty;
use crate::registry::AnchorNameRegistry;
use crate::selector::split_selector_list;
use crate::serialize::{ToCss, serialize_string};
use crate::tokenizer::{CSSToken, CSSTokenizer};

/// Where a [`StyleSource`]'s text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SourceOrigin {
    /// A complete stylesheet.
    Stylesheet,
    /// The contents of a `style` attribute. `selector` addresses the element
    /// the attribute belongs to.
    Inline {
        /// Selector standing in for the element.
        selector: String,
    },
}

/// Stylesheet text handed in by the embedder and, when rewritten, handed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSource {
    /// The CSS text.
    pub css_text: String,
    /// Set when `css_text` was replaced by the rewriter.
    pub changed: bool,
    /// Sheet or inline style.
    pub origin: SourceOrigin,
}

impl StyleSource {
    /// A full stylesheet.
    #[must_use]
    pub fn stylesheet(css_text: impl Into<String>) -> Self {
        Self {
            css_text: css_text.into(),
            changed: false,
            origin: SourceOrigin::Stylesheet,
        }
    }

    /// An inline style whose element is addressed by `selector`.
    #[must_use]
    pub fn inline(selector: impl Into<String>, css_text: impl Into<String>) -> Self {
        Self {
            css_text: css_text.into(),
            changed: false,
            origin: SourceOrigin::Inline {
                selector: selector.into(),
            },
        }
    }
}

/// Naming used by the rewriter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Attribute whose value selects the active `@try` block.
    pub marker_attribute: String,
    /// Prefix of generated custom property names.
    pub key_prefix: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            marker_attribute: "data-anchor-polyfill".to_string(),
            key_prefix: "--anchor".to_string(),
        }
    }
}

/// Result of [`rewrite_sources`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RewriteOutput {
    /// Target rules keyed by selector text.
    pub rules: RuleModel,
    /// Anchor names seen in this invocation.
    pub registry: AnchorNameRegistry,
    /// Whether any source text was replaced.
    pub changed: bool,
}

/// Rewrite every source and build the rule model.
///
/// Sources are read and, when something was extracted from them, overwritten
/// in place with `changed` set. A source with nothing to rewrite keeps its
/// text byte for byte.
pub fn rewrite_sources(sources: &mut [StyleSource], options: &RewriteOptions) -> RewriteOutput {
    ParseContext::new(options).run(sources)
}

#[derive(Debug, Clone)]
enum Parsed {
    Sheet(Stylesheet),
    Inline { selector: String, declarations: Vec<Declaration> },
}

impl Parsed {
    fn parse(source: &StyleSource) -> Self {
        let mut tokenizer = CSSTokenizer::new(&source.css_text);
        tokenizer.run();
        let mut parser = CSSParser::new(tokenizer.into_tokens());
        match &source.origin {
            SourceOrigin::Stylesheet => Self::Sheet(parser.parse_stylesheet()),
            SourceOrigin::Inline { selector } => Self::Inline {
                selector: selector.clone(),
                declarations: parser.parse_declaration_list(),
            },
        }
    }

    fn walk<V: Visitor>(&self, index: usize, visitor: &mut V) -> (Self, usize) {
        match self {
            Self::Sheet(sheet) => {
                let Walked { tree, rewrites } = walk(sheet, index, visitor);
                (Self::Sheet(tree), rewrites)
            }
            Self::Inline {
                selector,
                declarations,
            } => {
                let Walked { tree, rewrites } = walk_declarations(declarations, selector, index, visitor);
                (
                    Self::Inline {
                        selector: selector.clone(),
                        declarations: tree,
                    },
                    rewrites,
                )
            }
        }
    }

    fn to_css_text(&self) -> String {
        match self {
            Self::Sheet(sheet) => sheet.to_css_string(),
            Self::Inline { declarations, .. } => declarations
                .iter()
                .map(ToCss::to_css_string)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// A `position-fallback` declaration on a target.
#[derive(Debug, Clone)]
struct FallbackUse {
    name: String,
}

/// The try blocks of one `@position-fallback` rule.
#[derive(Debug, Clone)]
struct FallbackDefinition {
    source: usize,
    blocks: Vec<TryBlock>,
}

/// State of one rewrite invocation.
///
/// Nothing outlives the invocation; a second call starts from scratch.
#[derive(Debug)]
pub struct ParseContext<'o> {
    options: &'o RewriteOptions,
    registry: AnchorNameRegistry,
    rules: RuleModel,
    custom_prop_assignments: BTreeMap<String, AnchorReference>,
    fallback_names: BTreeMap<String, FallbackUse>,
    orders: BTreeMap<String, SelectionStrategy>,
    fallbacks: BTreeMap<String, FallbackDefinition>,
    key_counter: usize,
    issued_keys: HashSet<String>,
    /// Set when the declaration being walked produced an anchor reference.
    pending_anchor: bool,
}

impl<'o> ParseContext<'o> {
    /// A fresh context.
    #[must_use]
    pub fn new(options: &'o RewriteOptions) -> Self {
        Self {
            options,
            registry: AnchorNameRegistry::new(),
            rules: RuleModel::new(),
            custom_prop_assignments: BTreeMap::new(),
            fallback_names: BTreeMap::new(),
            orders: BTreeMap::new(),
            fallbacks: BTreeMap::new(),
            key_counter: 0,
            issued_keys: HashSet::new(),
            pending_anchor: false,
        }
    }

    /// Run all passes over `sources`, consuming the context.
    pub fn run(mut self, sources: &mut [StyleSource]) -> RewriteOutput {
        let mut trees: Vec<(Parsed, usize)> = sources
            .iter()
            .map(|source| (Parsed::parse(source), 0))
            .collect();

        // STEP 0: Custom properties the sheets already declare or read are
        // never issued as keys.
        for (index, (tree, _)) in trees.iter().enumerate() {
            let _ = tree.walk(index, &mut ReservePass { cx: &mut self });
        }

        // STEP 1: Direct resolution.
        for (index, (tree, rewrites)) in trees.iter_mut().enumerate() {
            let (walked, count) = tree.walk(index, &mut DirectPass { cx: &mut self });
            *tree = walked;
            *rewrites += count;
        }

        // STEP 2: Indirection resolution.
        if !self.custom_prop_assignments.is_empty() {
            for (index, (tree, rewrites)) in trees.iter_mut().enumerate() {
                let (walked, count) = tree.walk(index, &mut IndirectPass { cx: &mut self });
                *tree = walked;
                *rewrites += count;
            }
        }

        // STEP 3: Fallback attachment, stripping and emission.
        let emitted = self.attach_fallbacks();
        for (index, (tree, rewrites)) in trees.iter_mut().enumerate() {
            let (walked, count) = tree.walk(index, &mut StripPass);
            *tree = walked;
            *rewrites += count;
            if let (Parsed::Sheet(sheet), Some(rules)) = (&mut *tree, emitted.get(&index)) {
                sheet.rules.extend(rules.iter().cloned().map(Rule::Style));
                *rewrites += rules.len();
            }
        }

        let mut changed = false;
        for (source, (tree, rewrites)) in sources.iter_mut().zip(&trees) {
            if *rewrites > 0 {
                source.css_text = tree.to_css_text();
                source.changed = true;
                changed = true;
            }
        }

        RewriteOutput {
            rules: self.rules,
            registry: self.registry,
            changed,
        }
    }

    fn next_key(&mut self) -> String {
        loop {
            let key = format!("{}-{}", self.options.key_prefix, self.key_counter);
            self.key_counter += 1;
            if self.issued_keys.insert(key.clone()) {
                return key;
            }
        }
    }

    /// Key for the copy of `original` consumed by `property`.
    fn clone_key(&mut self, original: &str, property: &str) -> String {
        let base = format!("{original}-{property}");
        let mut key = base.clone();
        let mut suffix = 2;
        while !self.issued_keys.insert(key.clone()) {
            key = format!("{base}-{suffix}");
            suffix += 1;
        }
        key
    }

    fn try_id(&self, source: usize, ordinal: usize) -> String {
        format!(
            "{}-try-{source}-{ordinal}",
            self.options.key_prefix.trim_start_matches('-')
        )
    }

    /// The try block the walker is inside, if it belongs to the current
    /// definition of its `@position-fallback` name.
    fn try_block_mut(&mut self, ctx: &WalkContext<'_>) -> Option<&mut TryBlock> {
        let id = self.try_id(ctx.source, ctx.try_block?);
        self.fallbacks
            .get_mut(ctx.fallback?)?
            .blocks
            .iter_mut()
            .find(|block| block.id == id)
    }

    /// Record `reference` for `property` in the enclosing try block or target
    /// rule. Returns `false` when there is nowhere to put it.
    fn attach(&mut self, ctx: &WalkContext<'_>, property: AnchoredProperty, reference: AnchorReference) -> bool {
        if ctx.try_block.is_some() {
            let Some(block) = self.try_block_mut(ctx) else {
                return false;
            };
            let _ = block
                .declarations
                .insert(property.name().to_string(), TryValue::Anchor(reference));
        } else {
            let Some(selector) = ctx.selector else {
                return false;
            };
            let _ = self
                .rules
                .entry(selector.to_string())
                .or_default()
                .declarations
                .insert(property.name().to_string(), reference);
        }
        self.pending_anchor = true;
        true
    }

    fn extract(&mut self, function: AnchorFunction, args: &[ComponentValue], ctx: &WalkContext<'_>) -> Rewrite {
        let Some(property) = ctx.property else {
            return Rewrite::Keep;
        };
        let custom = property.starts_with("--");
        let anchored = AnchoredProperty::parse(property);
        if !custom && anchored.is_none() {
            return Rewrite::Keep;
        }

        let call = match AnchorCall::parse(function, args) {
            Ok(call) => call,
            Err(err) => {
                debug!("leaving {function}() in `{property}` untouched: {err}");
                return Rewrite::Keep;
            }
        };

        let key = self.next_key();
        let replacement = var_reference(&key);
        let reference = AnchorReference::new(call, key);
        match anchored {
            Some(anchored) if !custom => {
                if !self.attach(ctx, anchored, reference) {
                    return Rewrite::Keep;
                }
            }
            _ => {
                let _ = self
                    .custom_prop_assignments
                    .insert(property.to_string(), reference);
            }
        }
        Rewrite::Replace(replacement)
    }

    /// Copy each used fallback's blocks onto its target and build the rules
    /// that activate them, grouped by the source defining the at-rule.
    ///
    /// The first selector using a definition takes its blocks as they are;
    /// every later one gets a copy with fresh keys.
    fn attach_fallbacks(&mut self) -> BTreeMap<usize, Vec<StyleRule>> {
        let mut emitted: BTreeMap<usize, Vec<StyleRule>> = BTreeMap::new();
        let mut attached: HashSet<String> = HashSet::new();
        let uses: Vec<(String, String)> = self
            .fallback_names
            .iter()
            .map(|(selector, usage)| (selector.clone(), usage.name.clone()))
            .collect();

        for (selector, name) in uses {
            let Some(definition) = self.fallbacks.get(&name).cloned() else {
                let _ = warn_once(
                    "rewrite",
                    &format!("`{selector}` uses position-fallback {name} but no @position-fallback rule defines it"),
                );
                continue;
            };
            let blocks = if attached.insert(name) {
                definition.blocks
            } else {
                self.rekey_blocks(&definition.blocks)
            };

            let selectors = split_selector_list(&selector);
            let rules = emitted.entry(definition.source).or_default();
            for block in &blocks {
                rules.push(activation_rule(&selectors, &self.options.marker_attribute, block));
            }

            let order = self.orders.get(&selector).copied().unwrap_or_default();
            let target = self.rules.entry(selector).or_default();
            target.fallbacks = blocks;
            target.order = order;
        }
        emitted
    }

    /// Copy `blocks` giving every anchor reference a new key, and point the
    /// rewritten declarations at the new keys.
    fn rekey_blocks(&mut self, blocks: &[TryBlock]) -> Vec<TryBlock> {
        let mut copies = Vec::with_capacity(blocks.len());
        for block in blocks {
            let mut copy = block.clone();
            let mut renamed: BTreeMap<String, String> = BTreeMap::new();
            for value in copy.declarations.values_mut() {
                if let TryValue::Anchor(reference) = value {
                    let key = self.next_key();
                    let _ = renamed.insert(reference.indirection_key.clone(), key.clone());
                    *reference = reference.with_key(key);
                }
            }
            for declaration in &mut copy.rewritten {
                declaration.value = rename_vars(&declaration.value, &renamed);
            }
            copies.push(copy);
        }
        copies
    }
}

/// `sel1[marker="id"], sel2[marker="id"] { decl !important; ... }`
fn activation_rule(selectors: &[String], marker_attribute: &str, block: &TryBlock) -> StyleRule {
    let mut id = String::new();
    serialize_string(&block.id, &mut id);
    let prelude = selectors
        .iter()
        .map(|selector| format!("{selector}[{marker_attribute}={id}]"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut tokenizer = CSSTokenizer::new(prelude);
    tokenizer.run();
    StyleRule {
        prelude: CSSParser::new(tokenizer.into_tokens()).parse_component_values(),
        declarations: block
            .rewritten
            .iter()
            .map(|declaration| Declaration {
                important: true,
                ..declaration.clone()
            })
            .collect(),
    }
}

/// `var(<key>)`
fn var_reference(key: &str) -> ComponentValue {
    ComponentValue::function("var", vec![ComponentValue::Token(CSSToken::ident(key))])
}

/// `values` with every `var(<old>)` in `renamed` pointing at its new key.
fn rename_vars(values: &[ComponentValue], renamed: &BTreeMap<String, String>) -> Vec<ComponentValue> {
    values
        .iter()
        .map(|value| match value {
            ComponentValue::Function { name, value: args } if name.eq_ignore_ascii_case("var") => {
                var_name(args)
                    .and_then(|old| renamed.get(old))
                    .map_or_else(|| value.clone(), |key| var_reference(key))
            }
            ComponentValue::Function { name, value: args } => {
                ComponentValue::function(name.clone(), rename_vars(args, renamed))
            }
            ComponentValue::Block { token, value: inner } => ComponentValue::Block {
                token: *token,
                value: rename_vars(inner, renamed),
            },
            ComponentValue::Token(_) => value.clone(),
        })
        .collect()
}

/// Property name used as the key inside a try block.
fn try_property_name(name: &str) -> String {
    AnchoredProperty::parse(name).map_or_else(|| name.to_string(), |p| p.name().to_string())
}

struct DirectPass<'c, 'o> {
    cx: &'c mut ParseContext<'o>,
}

impl Visitor for DirectPass<'_, '_> {
    fn visit(&mut self, node: Classified<'_>, ctx: &WalkContext<'_>) -> Rewrite {
        match node {
            Classified::AnchorNameDeclaration { names } => {
                if let (Some(selector), None) = (ctx.selector, ctx.try_block) {
                    for name in names {
                        self.cx.registry.register(name, selector);
                    }
                }
                Rewrite::Keep
            }
            Classified::AnchorFunction(args) => self.cx.extract(AnchorFunction::Anchor, args, ctx),
            Classified::AnchorSizeFunction(args) => {
                self.cx.extract(AnchorFunction::AnchorSize, args, ctx)
            }
            Classified::PositionFallbackDeclaration(declaration) => {
                if let (Some(selector), None) = (ctx.selector, ctx.try_block) {
                    self.fallback_declaration(selector, declaration);
                }
                Rewrite::Keep
            }
            Classified::PositionFallbackAtRule { name } => {
                // A later definition of the same name replaces the earlier one.
                let _ = self.cx.fallbacks.insert(
                    name.to_string(),
                    FallbackDefinition {
                        source: ctx.source,
                        blocks: Vec::new(),
                    },
                );
                Rewrite::Keep
            }
            Classified::TryBlock => {
                if let (Some(name), Some(ordinal)) = (ctx.fallback, ctx.try_block) {
                    let id = self.cx.try_id(ctx.source, ordinal);
                    if let Some(definition) = self.cx.fallbacks.get_mut(name) {
                        definition.blocks.push(TryBlock::new(id));
                    }
                }
                Rewrite::Keep
            }
            Classified::CustomPropertyDeclaration { .. }
            | Classified::CustomPropertyReference { .. }
            | Classified::Other => Rewrite::Keep,
        }
    }

    fn leave_declaration(&mut self, declaration: &Declaration, ctx: &WalkContext<'_>) {
        let anchored = std::mem::take(&mut self.cx.pending_anchor);
        let Some(block) = self.cx.try_block_mut(ctx) else {
            return;
        };
        let property = try_property_name(&declaration.name);
        if !anchored {
            let _ = block
                .declarations
                .insert(property, TryValue::Literal(declaration.value.to_css_string()));
        }
        replace_declaration(&mut block.rewritten, declaration);
    }
}

impl DirectPass<'_, '_> {
    fn fallback_declaration(&mut self, selector: &str, declaration: FallbackDeclaration<'_>) {
        match declaration {
            FallbackDeclaration::Fallback(Some(name)) => {
                let _ = self.cx.fallback_names.insert(
                    selector.to_string(),
                    FallbackUse {
                        name: name.to_string(),
                    },
                );
            }
            FallbackDeclaration::Order(Some(order)) => match order.parse::<SelectionStrategy>() {
                Ok(strategy) => {
                    let _ = self.cx.orders.insert(selector.to_string(), strategy);
                }
                Err(_) => debug!("ignoring unknown fallback order `{order}` on `{selector}`"),
            },
            FallbackDeclaration::Fallback(None) | FallbackDeclaration::Order(None) => {}
        }
    }
}

/// Keep the last declaration of each property, in first-seen position.
fn replace_declaration(declarations: &mut Vec<Declaration>, declaration: &Declaration) {
    match declarations.iter_mut().find(|d| d.name == declaration.name) {
        Some(existing) => existing.clone_from(declaration),
        None => declarations.push(declaration.clone()),
    }
}

struct IndirectPass<'c, 'o> {
    cx: &'c mut ParseContext<'o>,
}

impl Visitor for IndirectPass<'_, '_> {
    fn visit(&mut self, node: Classified<'_>, ctx: &WalkContext<'_>) -> Rewrite {
        match node {
            Classified::CustomPropertyReference { name } => {
                let Some(anchored) = ctx.property.and_then(AnchoredProperty::parse) else {
                    return Rewrite::Keep;
                };
                let Some(assigned) = self.cx.custom_prop_assignments.get(name) else {
                    return Rewrite::Keep;
                };
                let original = assigned.indirection_key.clone();
                let assigned = assigned.clone();
                let key = self.cx.clone_key(&original, anchored.name());
                let replacement = var_reference(&key);
                if self.cx.attach(ctx, anchored, assigned.with_key(key)) {
                    Rewrite::Replace(replacement)
                } else {
                    Rewrite::Keep
                }
            }
            Classified::AnchorNameDeclaration { .. }
            | Classified::AnchorFunction(_)
            | Classified::AnchorSizeFunction(_)
            | Classified::CustomPropertyDeclaration { .. }
            | Classified::PositionFallbackDeclaration(_)
            | Classified::PositionFallbackAtRule { .. }
            | Classified::TryBlock
            | Classified::Other => Rewrite::Keep,
        }
    }

    fn leave_declaration(&mut self, declaration: &Declaration, ctx: &WalkContext<'_>) {
        if !std::mem::take(&mut self.cx.pending_anchor) {
            return;
        }
        if let Some(block) = self.cx.try_block_mut(ctx) {
            replace_declaration(&mut block.rewritten, declaration);
        }
    }
}

/// Records every custom property name a source declares or reads.
struct ReservePass<'c, 'o> {
    cx: &'c mut ParseContext<'o>,
}

impl Visitor for ReservePass<'_, '_> {
    fn visit(&mut self, node: Classified<'_>, _ctx: &WalkContext<'_>) -> Rewrite {
        match node {
            Classified::CustomPropertyDeclaration { name, .. }
            | Classified::CustomPropertyReference { name } => {
                let _ = self.cx.issued_keys.insert(name.to_string());
            }
            Classified::AnchorNameDeclaration { .. }
            | Classified::AnchorFunction(_)
            | Classified::AnchorSizeFunction(_)
            | Classified::PositionFallbackDeclaration(_)
            | Classified::PositionFallbackAtRule { .. }
            | Classified::TryBlock
            | Classified::Other => {}
        }
        Rewrite::Keep
    }
}

/// Removes the fallback syntax once it has been turned into the rule model.
struct StripPass;

impl Visitor for StripPass {
    fn visit(&mut self, node: Classified<'_>, ctx: &WalkContext<'_>) -> Rewrite {
        match node {
            Classified::PositionFallbackAtRule { .. } => Rewrite::Remove,
            Classified::PositionFallbackDeclaration(_) if ctx.fallback.is_none() => Rewrite::Remove,
            Classified::AnchorNameDeclaration { .. }
            | Classified::AnchorFunction(_)
            | Classified::AnchorSizeFunction(_)
            | Classified::CustomPropertyDeclaration { .. }
            | Classified::CustomPropertyReference { .. }
            | Classified::PositionFallbackDeclaration(_)
            | Classified::TryBlock
            | Classified::Other => Rewrite::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_skip_already_issued_names() {
        let options = RewriteOptions::default();
        let mut cx = ParseContext::new(&options);
        let first = cx.next_key();
        assert_eq!(first, "--anchor-0");
        assert_eq!(cx.clone_key(&first, "top"), "--anchor-0-top");
        assert_eq!(cx.clone_key(&first, "top"), "--anchor-0-top-2");
        assert_eq!(cx.next_key(), "--anchor-1");
    }

    #[test]
    fn test_try_ids_drop_leading_dashes() {
        let options = RewriteOptions {
            key_prefix: "--pos".to_string(),
            ..RewriteOptions::default()
        };
        let cx = ParseContext::new(&options);
        assert_eq!(cx.try_id(2, 5), "pos-try-2-5");
    }

    #[test]
    fn test_inline_source_uses_given_selector() {
        let mut sources = [StyleSource::inline("[data-id=\"7\"]", "top: anchor(--a bottom); color: red")];
        let output = rewrite_sources(&mut sources, &RewriteOptions::default());

        assert!(sources[0].changed);
        assert_eq!(sources[0].css_text, "top: var(--anchor-0); color: red");
        assert!(output.rules.contains_key("[data-id=\"7\"]"));
    }
}
