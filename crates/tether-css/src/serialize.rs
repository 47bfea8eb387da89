//! Serialization back to CSS text per
//! [§ 9 Serialization](https://www.w3.org/TR/css-syntax-3/#serialization).
//!
//! "The tokenizer described in this specification does not produce tokens for
//! comments, or otherwise preserve them in any way." Rewritten stylesheets
//! therefore lose comments and collapse whitespace runs to a single space, but
//! every token that survived parsing is reproduced.

use crate::parser::{AtRule, AtRuleBlock, ComponentValue, Declaration, Rule, StyleRule, Stylesheet};
use crate::tokenizer::tokenizer::is_ident_code_point;
use crate::tokenizer::{CSSToken, HashType};

/// Types that can be written out as CSS text.
pub trait ToCss {
    /// Append the CSS text for `self` to `dest`.
    fn to_css(&self, dest: &mut String);

    /// Serialize into a fresh string.
    fn to_css_string(&self) -> String {
        let mut dest = String::new();
        self.to_css(&mut dest);
        dest
    }
}

impl ToCss for CSSToken {
    fn to_css(&self, dest: &mut String) {
        match self {
            Self::Ident(v) => serialize_identifier(v, dest),
            Self::Function(v) => {
                serialize_identifier(v, dest);
                dest.push('(');
            }
            Self::AtKeyword(v) => {
                dest.push('@');
                serialize_identifier(v, dest);
            }
            Self::Hash { value, hash_type } => {
                dest.push('#');
                match hash_type {
                    HashType::Id => serialize_identifier(value, dest),
                    HashType::Unrestricted => serialize_name(value, dest),
                }
            }
            Self::String(v) => serialize_string(v, dest),
            Self::Url(v) => {
                dest.push_str("url(");
                for c in v.chars() {
                    if matches!(c, '(' | ')' | '"' | '\'' | '\\') || c.is_whitespace() {
                        dest.push('\\');
                    }
                    dest.push(c);
                }
                dest.push(')');
            }
            Self::BadString | Self::BadUrl | Self::EOF => {}
            Self::Delim(c) => dest.push(*c),
            Self::Number { repr, .. } => dest.push_str(repr),
            Self::Percentage { repr, .. } => {
                dest.push_str(repr);
                dest.push('%');
            }
            Self::Dimension { repr, unit, .. } => {
                dest.push_str(repr);
                serialize_identifier(unit, dest);
            }
            Self::Whitespace => dest.push(' '),
            Self::CDO => dest.push_str("<!--"),
            Self::CDC => dest.push_str("-->"),
            Self::Colon => dest.push(':'),
            Self::Semicolon => dest.push(';'),
            Self::Comma => dest.push(','),
            Self::LeftBracket => dest.push('['),
            Self::RightBracket => dest.push(']'),
            Self::LeftParen => dest.push('('),
            Self::RightParen => dest.push(')'),
            Self::LeftBrace => dest.push('{'),
            Self::RightBrace => dest.push('}'),
        }
    }
}

impl ToCss for ComponentValue {
    fn to_css(&self, dest: &mut String) {
        match self {
            Self::Token(token) => token.to_css(dest),
            Self::Function { name, value } => {
                serialize_identifier(name, dest);
                dest.push('(');
                value.to_css(dest);
                dest.push(')');
            }
            Self::Block { token, value } => {
                let closing = match token {
                    '{' => '}',
                    '[' => ']',
                    _ => ')',
                };
                dest.push(*token);
                value.to_css(dest);
                dest.push(closing);
            }
        }
    }
}

impl ToCss for [ComponentValue] {
    fn to_css(&self, dest: &mut String) {
        for value in self {
            value.to_css(dest);
        }
    }
}

impl ToCss for Declaration {
    fn to_css(&self, dest: &mut String) {
        serialize_identifier(&self.name, dest);
        dest.push_str(": ");
        self.value.to_css(dest);
        if self.important {
            dest.push_str(" !important");
        }
    }
}

fn declarations_block(declarations: &[Declaration], dest: &mut String) {
    dest.push('{');
    for declaration in declarations {
        dest.push(' ');
        declaration.to_css(dest);
        dest.push(';');
    }
    dest.push_str(" }");
}

impl ToCss for StyleRule {
    fn to_css(&self, dest: &mut String) {
        self.prelude.to_css(dest);
        dest.push(' ');
        declarations_block(&self.declarations, dest);
    }
}

impl ToCss for AtRule {
    fn to_css(&self, dest: &mut String) {
        dest.push('@');
        serialize_identifier(&self.name, dest);
        if !self.prelude.is_empty() {
            dest.push(' ');
            self.prelude.to_css(dest);
        }
        match &self.block {
            None => dest.push(';'),
            Some(AtRuleBlock::Declarations(declarations)) => {
                dest.push(' ');
                declarations_block(declarations, dest);
            }
            Some(AtRuleBlock::Rules(rules)) => {
                dest.push_str(" {");
                for rule in rules {
                    dest.push_str("\n  ");
                    rule.to_css(dest);
                }
                dest.push_str("\n}");
            }
            Some(AtRuleBlock::Raw(value)) => {
                dest.push_str(" {");
                value.to_css(dest);
                dest.push('}');
            }
        }
    }
}

impl ToCss for Rule {
    fn to_css(&self, dest: &mut String) {
        match self {
            Self::Style(rule) => rule.to_css(dest),
            Self::At(rule) => rule.to_css(dest),
        }
    }
}

impl ToCss for Stylesheet {
    fn to_css(&self, dest: &mut String) {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                dest.push('\n');
            }
            rule.to_css(dest);
        }
    }
}

/// [CSSOM § 2.1 Serialize an identifier](https://drafts.csswg.org/cssom/#serialize-an-identifier)
pub fn serialize_identifier(ident: &str, dest: &mut String) {
    let chars: Vec<char> = ident.chars().collect();
    if chars == ['-'] {
        dest.push_str("\\-");
        return;
    }
    for (i, &c) in chars.iter().enumerate() {
        let leading_digit = c.is_ascii_digit() && (i == 0 || (i == 1 && chars[0] == '-'));
        if c == '\0' {
            dest.push('\u{FFFD}');
        } else if c.is_control() || leading_digit {
            // "the character escaped as code point"
            push_code_point_escape(c, dest);
        } else if is_ident_code_point(c) {
            dest.push(c);
        } else {
            dest.push('\\');
            dest.push(c);
        }
    }
}

/// Like [`serialize_identifier`] without the leading-digit rule, for
/// unrestricted hash tokens such as `#1a`.
fn serialize_name(name: &str, dest: &mut String) {
    for c in name.chars() {
        if c.is_control() {
            push_code_point_escape(c, dest);
        } else if is_ident_code_point(c) {
            dest.push(c);
        } else {
            dest.push('\\');
            dest.push(c);
        }
    }
}

/// [CSSOM § 2.1 Serialize a string](https://drafts.csswg.org/cssom/#serialize-a-string)
pub fn serialize_string(value: &str, dest: &mut String) {
    dest.push('"');
    for c in value.chars() {
        match c {
            '\0' => dest.push('\u{FFFD}'),
            '"' | '\\' => {
                dest.push('\\');
                dest.push(c);
            }
            c if c.is_control() => push_code_point_escape(c, dest),
            c => dest.push(c),
        }
    }
    dest.push('"');
}

fn push_code_point_escape(c: char, dest: &mut String) {
    dest.push_str(&format!("\\{:x} ", u32::from(c)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_escapes() {
        let mut out = String::new();
        serialize_identifier("1st", &mut out);
        assert_eq!(out, "\\31 st");

        out.clear();
        serialize_identifier("a.b", &mut out);
        assert_eq!(out, "a\\.b");

        out.clear();
        serialize_identifier("--anchor-0", &mut out);
        assert_eq!(out, "--anchor-0");
    }

    #[test]
    fn test_string_escapes() {
        let mut out = String::new();
        serialize_string("say \"hi\"\n", &mut out);
        assert_eq!(out, "\"say \\\"hi\\\"\\a \"");
    }
}
