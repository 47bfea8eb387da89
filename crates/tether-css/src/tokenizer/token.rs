//! Tokens produced by [`CSSTokenizer`](super::CSSTokenizer).
//!
//! [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization)
//!
//! The set follows CSS Syntax Level 3 minus `<unicode-range-token>`, which no
//! anchor positioning property can contain.
//!
//! Numeric tokens keep the code points they were read from so that a rewritten
//! stylesheet reproduces `0.50em` as `0.50em` rather than `0.5em`.

/// Type flag of a `<hash-token>`.
///
/// Only `Id` hashes are usable as ID selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// The value after `#` would start an identifier.
    Id,
    /// Anything else, e.g. `#1a` or a hex color.
    Unrestricted,
}

/// Type flag of a `<number-token>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    /// Digits only.
    Integer,
    /// Has a fraction or an exponent.
    Number,
}

/// One token of CSS source text.
#[derive(Debug, Clone, PartialEq)]
pub enum CSSToken {
    /// An identifier, dashed idents included.
    Ident(String),
    /// `name(`, stored without the parenthesis.
    Function(String),
    /// `@name`, stored without the `@`.
    AtKeyword(String),
    /// `#value`
    Hash {
        /// Code points after the `#`.
        value: String,
        /// Whether `value` is a valid identifier.
        hash_type: HashType,
    },
    /// Quoted string contents with escapes resolved.
    String(String),
    /// A string cut off by a newline.
    BadString,
    /// Unquoted `url(...)` contents.
    Url(String),
    /// Malformed unquoted url.
    BadUrl,
    /// Any single code point not covered by another token.
    Delim(char),
    /// A bare number.
    Number {
        /// Parsed value.
        value: f64,
        /// Source text, sign included.
        repr: String,
        /// Integer or number.
        numeric_type: NumericType,
    },
    /// A number followed by `%`.
    Percentage {
        /// Parsed value.
        value: f64,
        /// Source text without the `%`.
        repr: String,
    },
    /// A number followed by a unit.
    Dimension {
        /// Parsed value.
        value: f64,
        /// Source text without the unit.
        repr: String,
        /// Unit as written.
        unit: String,
    },
    /// A run of whitespace.
    Whitespace,
    /// `<!--`
    CDO,
    /// `-->`
    CDC,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// End of input.
    EOF,
}

impl CSSToken {
    /// `<ident-token>` with the given value.
    #[must_use]
    pub fn ident(value: impl Into<String>) -> Self {
        Self::Ident(value.into())
    }

    /// `<function-token>` with the given name.
    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(name.into())
    }

    /// True for [`CSSToken::EOF`].
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::EOF)
    }

    /// True for [`CSSToken::Whitespace`].
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }

    /// The identifier, if this is one.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Ident(v) => Some(v),
            _ => None,
        }
    }
}
