//! CSS Parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! "The input to the parsing stage is a stream of tokens from the tokenization stage."
//!
//! At-rule blocks are parsed according to the grammar of the at-rule: rule
//! lists for conditional and grouping rules (`@media`, `@position-fallback`),
//! declaration lists for descriptor rules (`@try`, `@font-face`), and raw
//! component values for everything else so unknown rules survive a rewrite.

use crate::serialize::ToCss;
use crate::tokenizer::CSSToken;

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
///
/// A CSS declaration (e.g., `top: anchor(--a bottom)`).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property name.
    pub name: String,
    /// The property value as component values, trimmed, without `!important`.
    pub value: Vec<ComponentValue>,
    /// Whether the declaration has `!important`.
    pub important: bool,
}

/// [§ 5.4.8 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// A preserved token.
    Token(CSSToken),
    /// A function with its arguments.
    Function {
        /// The function name.
        name: String,
        /// The function arguments.
        value: Vec<Self>,
    },
    /// A simple block.
    Block {
        /// The opening token character: `{`, `[` or `(`.
        token: char,
        /// The block contents.
        value: Vec<Self>,
    },
}

impl ComponentValue {
    /// Returns `true` for whitespace tokens.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Token(CSSToken::Whitespace))
    }

    /// Returns the ident value if this is an `<ident-token>`.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Token(token) => token.as_ident(),
            _ => None,
        }
    }

    /// Build `name(args)` from already parsed arguments.
    #[must_use]
    pub fn function(name: impl Into<String>, value: Vec<Self>) -> Self {
        Self::Function {
            name: name.into(),
            value,
        }
    }
}

/// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
///
/// A CSS style rule (selector list + declarations).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// The selector list as component values.
    pub prelude: Vec<ComponentValue>,
    /// The declarations in this rule block.
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// The selector list as written (whitespace collapsed), e.g. `#a, .b > c`.
    ///
    /// This is the key the anchor registry and rule model use.
    #[must_use]
    pub fn selector_text(&self) -> String {
        self.prelude.to_css_string()
    }

    /// [§ 5.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list)
    ///
    /// "A selector list is a comma-separated list of selectors."
    #[must_use]
    pub fn selectors(&self) -> Vec<String> {
        self.prelude
            .split(|v| *v == ComponentValue::Token(CSSToken::Comma))
            .map(|part| part.to_css_string().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }
}

/// The body of an at-rule, shaped by the at-rule's grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum AtRuleBlock {
    /// `<rule-list>` (e.g. `@media`, `@supports`, `@position-fallback`).
    Rules(Vec<Rule>),
    /// `<declaration-list>` (e.g. `@try`, `@font-face`).
    Declarations(Vec<Declaration>),
    /// Any other block, kept verbatim.
    Raw(Vec<ComponentValue>),
}

/// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// The at-keyword name (without the `@`).
    pub name: String,
    /// The prelude component values.
    pub prelude: Vec<ComponentValue>,
    /// The block, or `None` for statement at-rules such as `@import`.
    pub block: Option<AtRuleBlock>,
}

/// [§ 5.3.3 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// A style rule (qualified rule).
    Style(StyleRule),
    /// An at-rule.
    At(AtRule),
}

/// [§ 5.3.2 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    /// The list of rules in the stylesheet.
    pub rules: Vec<Rule>,
}

/// How the block of an at-rule named `name` is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockGrammar {
    Rules,
    Declarations,
    Raw,
}

fn block_grammar(name: &str) -> BlockGrammar {
    match name.to_ascii_lowercase().as_str() {
        "media" | "supports" | "container" | "layer" | "document" | "scope"
        | "starting-style" | "position-fallback" => BlockGrammar::Rules,
        "try" | "position-try" | "font-face" | "page" | "property" | "counter-style"
        | "font-palette-values" | "viewport" => BlockGrammar::Declarations,
        _ => BlockGrammar::Raw,
    }
}

/// CSS parser
pub struct CSSParser {
    tokens: Vec<CSSToken>,
    position: usize,
}

impl CSSParser {
    /// Create a new parser from a list of tokens.
    #[must_use]
    pub const fn new(tokens: Vec<CSSToken>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    pub fn parse_stylesheet(&mut self) -> Stylesheet {
        // "Consume a list of rules from input, with the top-level flag set."
        Stylesheet {
            rules: self.consume_list_of_rules(true),
        }
    }

    /// [§ 5.3.8 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
    ///
    /// Parse declarations from a style attribute or similar.
    pub fn parse_declaration_list(&mut self) -> Vec<Declaration> {
        self.consume_list_of_declarations()
    }

    /// [§ 5.3.10 Parse a list of component values](https://www.w3.org/TR/css-syntax-3/#parse-list-of-component-values)
    pub fn parse_component_values(&mut self) -> Vec<ComponentValue> {
        trim_whitespace(self.consume_until(&CSSToken::EOF))
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    ///
    /// Nested lists (inside an at-rule block) stop at the closing `}`, which is
    /// left for the caller.
    fn consume_list_of_rules(&mut self, top_level: bool) -> Vec<Rule> {
        let mut rules = Vec::new();

        loop {
            match self.peek() {
                Some(CSSToken::Whitespace | CSSToken::Semicolon) => {
                    let _ = self.consume();
                }
                None | Some(CSSToken::EOF) => return rules,
                Some(CSSToken::RightBrace) if !top_level => return rules,
                Some(CSSToken::CDO | CSSToken::CDC) if top_level => {
                    let _ = self.consume();
                }
                Some(CSSToken::AtKeyword(_)) => {
                    if let Some(at_rule) = self.consume_at_rule() {
                        rules.push(Rule::At(at_rule));
                    }
                }
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule() {
                        rules.push(Rule::Style(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule(&mut self) -> Option<AtRule> {
        let name = match self.consume() {
            Some(CSSToken::AtKeyword(name)) => name.clone(),
            _ => return None,
        };
        let mut prelude = Vec::new();

        loop {
            match self.peek() {
                // "<semicolon-token>: Return the at-rule."
                Some(CSSToken::Semicolon) => {
                    let _ = self.consume();
                    break;
                }
                // "<EOF-token>: This is a parse error. Return the at-rule."
                // A stray `}` closes the enclosing block, not this rule.
                None | Some(CSSToken::EOF | CSSToken::RightBrace) => break,
                Some(CSSToken::LeftBrace) => {
                    let block = match block_grammar(&name) {
                        BlockGrammar::Rules => {
                            let _ = self.consume();
                            let rules = self.consume_list_of_rules(false);
                            self.consume_closing_brace();
                            AtRuleBlock::Rules(rules)
                        }
                        BlockGrammar::Declarations => {
                            let _ = self.consume();
                            let declarations = self.consume_list_of_declarations();
                            self.consume_closing_brace();
                            AtRuleBlock::Declarations(declarations)
                        }
                        BlockGrammar::Raw => AtRuleBlock::Raw(self.consume_simple_block()),
                    };
                    return Some(AtRule {
                        name,
                        prelude: trim_whitespace(prelude),
                        block: Some(block),
                    });
                }
                Some(_) => {
                    if let Some(value) = self.consume_component_value() {
                        prelude.push(value);
                    }
                }
            }
        }

        Some(AtRule {
            name,
            prelude: trim_whitespace(prelude),
            block: None,
        })
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule(&mut self) -> Option<StyleRule> {
        let mut prelude = Vec::new();

        loop {
            match self.peek() {
                // "<EOF-token>: This is a parse error. Return nothing."
                None | Some(CSSToken::EOF) => return None,
                // Unbalanced `}` inside a nested list: drop what we have.
                Some(CSSToken::RightBrace) => {
                    let _ = self.consume();
                    return None;
                }
                Some(CSSToken::LeftBrace) => {
                    let _ = self.consume();
                    let declarations = self.consume_list_of_declarations();
                    self.consume_closing_brace();
                    return Some(StyleRule {
                        prelude: trim_whitespace(prelude),
                        declarations,
                    });
                }
                Some(_) => {
                    if let Some(value) = self.consume_component_value() {
                        prelude.push(value);
                    }
                }
            }
        }
    }

    /// [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    fn consume_list_of_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();

        loop {
            match self.peek() {
                Some(CSSToken::Whitespace | CSSToken::Semicolon) => {
                    let _ = self.consume();
                }
                None | Some(CSSToken::EOF | CSSToken::RightBrace) => return declarations,
                // Nested at-rules are not part of any declaration list we model.
                Some(CSSToken::AtKeyword(_)) => {
                    let _ = self.consume_at_rule();
                }
                Some(CSSToken::Ident(_)) => {
                    if let Some(declaration) = self.consume_declaration() {
                        declarations.push(declaration);
                    }
                }
                // "anything else: This is a parse error. ... As long as the next input
                // token is anything other than a <semicolon-token> or <EOF-token>,
                // consume a component value and throw away the returned value."
                Some(_) => {
                    while !matches!(
                        self.peek(),
                        None | Some(CSSToken::Semicolon | CSSToken::RightBrace | CSSToken::EOF)
                    ) {
                        let _ = self.consume_component_value();
                    }
                }
            }
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn consume_declaration(&mut self) -> Option<Declaration> {
        let name = match self.consume() {
            Some(CSSToken::Ident(name)) => name.clone(),
            _ => return None,
        };
        self.skip_whitespace();

        // "If the next input token is anything other than a <colon-token>, this is
        // a parse error. Return nothing."
        let has_colon = self.peek() == Some(&CSSToken::Colon);
        let mut value = Vec::new();
        if has_colon {
            let _ = self.consume();
            self.skip_whitespace();
        }
        while !matches!(
            self.peek(),
            None | Some(CSSToken::EOF | CSSToken::Semicolon | CSSToken::RightBrace)
        ) {
            if let Some(v) = self.consume_component_value() {
                value.push(v);
            }
        }
        if !has_colon {
            return None;
        }

        let (value, important) = strip_important(value);
        Some(Declaration {
            name,
            value,
            important,
        })
    }

    /// [§ 5.4.7 Consume a simple block](https://www.w3.org/TR/css-syntax-3/#consume-simple-block)
    fn consume_simple_block(&mut self) -> Vec<ComponentValue> {
        let ending = match self.consume() {
            Some(CSSToken::LeftBrace) => CSSToken::RightBrace,
            Some(CSSToken::LeftBracket) => CSSToken::RightBracket,
            Some(CSSToken::LeftParen) => CSSToken::RightParen,
            _ => return Vec::new(),
        };
        self.consume_until(&ending)
    }

    /// Consume component values up to and including `ending` (or EOF).
    fn consume_until(&mut self, ending: &CSSToken) -> Vec<ComponentValue> {
        let mut value = Vec::new();
        loop {
            match self.peek() {
                Some(token) if token == ending => {
                    let _ = self.consume();
                    return value;
                }
                None | Some(CSSToken::EOF) => return value,
                Some(_) => {
                    if let Some(v) = self.consume_component_value() {
                        value.push(v);
                    }
                }
            }
        }
    }

    /// [§ 5.4.8 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
    fn consume_component_value(&mut self) -> Option<ComponentValue> {
        let token = match self.peek()? {
            CSSToken::EOF => return None,
            CSSToken::LeftBrace => '{',
            CSSToken::LeftBracket => '[',
            CSSToken::LeftParen => '(',
            CSSToken::Function(name) => {
                let name = name.clone();
                let _ = self.consume();
                let value = self.consume_until(&CSSToken::RightParen);
                return Some(ComponentValue::Function { name, value });
            }
            _ => return self.consume().cloned().map(ComponentValue::Token),
        };
        let value = self.consume_simple_block();
        Some(ComponentValue::Block { token, value })
    }

    fn consume_closing_brace(&mut self) {
        if self.peek() == Some(&CSSToken::RightBrace) {
            let _ = self.consume();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek() == Some(&CSSToken::Whitespace) {
            let _ = self.consume();
        }
    }

    fn consume(&mut self) -> Option<&CSSToken> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn peek(&self) -> Option<&CSSToken> {
        self.tokens.get(self.position)
    }
}

/// Remove leading and trailing whitespace tokens.
pub(crate) fn trim_whitespace(mut value: Vec<ComponentValue>) -> Vec<ComponentValue> {
    while value.last().is_some_and(ComponentValue::is_whitespace) {
        let _ = value.pop();
    }
    let leading = value.iter().take_while(|v| v.is_whitespace()).count();
    let _ = value.drain(..leading);
    value
}

/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation, i.e.
/// if the last two (non-whitespace, non-comment) tokens in its value are
/// a <delim-token> with the value "!" followed by an <ident-token> with
/// a value that is an ASCII case-insensitive match for "important"."
///
/// Returns the trimmed value and whether the annotation was present.
fn strip_important(value: Vec<ComponentValue>) -> (Vec<ComponentValue>, bool) {
    let mut value = trim_whitespace(value);

    // STEP 1: The last token must be the ident "important".
    let ends_with_important = value
        .last()
        .and_then(ComponentValue::as_ident)
        .is_some_and(|ident| ident.eq_ignore_ascii_case("important"));
    if !ends_with_important {
        return (value, false);
    }

    // STEP 2: Skipping whitespace, the token before it must be "!".
    let bang = value[..value.len() - 1]
        .iter()
        .rposition(|v| !v.is_whitespace())
        .filter(|&i| value[i] == ComponentValue::Token(CSSToken::Delim('!')));
    match bang {
        Some(i) => {
            value.truncate(i);
            (trim_whitespace(value), true)
        }
        None => (value, false),
    }
}
