//! Anchor function syntax.
//!
//! [CSS Anchor Positioning § 2.1](https://drafts.csswg.org/css-anchor-position-1/#anchor-pos)
//!
//! ```text
//! anchor( <anchor-element>? && <anchor-side>, <length-percentage>? )
//! anchor-size( <anchor-element>? && <anchor-size>, <length-percentage>? )
//! <anchor-element> = <dashed-ident> | var(<custom-property-name>)
//! ```

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::parser::ComponentValue;
use crate::serialize::ToCss;
use crate::tokenizer::CSSToken;

/// Value used when an anchor function has no fallback argument.
pub const DEFAULT_FALLBACK: &str = "0px";

/// Keyword form of `<anchor-side>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AnchorSideKeyword {
    /// `top`
    Top,
    /// `right`
    Right,
    /// `bottom`
    Bottom,
    /// `left`
    Left,
    /// `center`
    Center,
    /// `start` of the containing block's axis
    Start,
    /// `end` of the containing block's axis
    End,
    /// `self-start`, using the positioned element's own writing mode
    SelfStart,
    /// `self-end`, using the positioned element's own writing mode
    SelfEnd,
}

/// `<anchor-side>`: a keyword or a percentage along the axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnchorSide {
    /// A side keyword.
    Keyword(AnchorSideKeyword),
    /// `<percentage>`, stored as the number before `%`.
    Percentage(f64),
}

/// `<anchor-size>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AnchorSize {
    /// `width`
    Width,
    /// `height`
    Height,
    /// `block`, along the containing block's block axis
    Block,
    /// `inline`, along the containing block's inline axis
    Inline,
    /// `self-block`, along the element's own block axis
    SelfBlock,
    /// `self-inline`, along the element's own inline axis
    SelfInline,
}

/// What an anchor function measures on the anchor box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AnchorMeasure {
    /// `anchor()`: a position along an edge.
    #[serde(rename = "anchorEdge")]
    Edge(AnchorSide),
    /// `anchor-size()`: one of the anchor's dimensions.
    #[serde(rename = "anchorSize")]
    Size(AnchorSize),
}

/// The two anchor functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum AnchorFunction {
    /// `anchor()`
    Anchor,
    /// `anchor-size()`
    AnchorSize,
}

/// Reasons an anchor function is not extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorSyntaxError {
    /// No side (or size) keyword was given.
    #[error("{function}() is missing its side or size keyword")]
    MissingKeyword {
        /// The function being parsed.
        function: AnchorFunction,
    },
    /// An identifier that is neither a dashed anchor name nor a known keyword.
    #[error("`{keyword}` is not a valid keyword for {function}()")]
    UnknownKeyword {
        /// The function being parsed.
        function: AnchorFunction,
        /// The offending identifier.
        keyword: String,
    },
    /// Something other than a name, keyword or percentage before the comma,
    /// or a second name or keyword.
    #[error("unexpected `{found}` in {function}()")]
    Unexpected {
        /// The function being parsed.
        function: AnchorFunction,
        /// The offending component, serialized.
        found: String,
    },
}

/// A parsed `anchor()` / `anchor-size()` call, before it is given an
/// indirection key.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorCall {
    /// The dashed anchor name, if given directly.
    pub anchor_name: Option<String>,
    /// The custom property holding the anchor name, for `anchor(var(--x) top)`.
    pub custom_prop_name: Option<String>,
    /// Edge or size to measure.
    pub measure: AnchorMeasure,
    /// The fallback argument as CSS text, or [`DEFAULT_FALLBACK`].
    pub fallback_value: String,
}

impl AnchorCall {
    /// Parse the arguments of an anchor function.
    ///
    /// # Errors
    ///
    /// Returns an [`AnchorSyntaxError`] when the arguments do not match the
    /// function's grammar. Such calls are left in the stylesheet untouched.
    pub fn parse(function: AnchorFunction, args: &[ComponentValue]) -> Result<Self, AnchorSyntaxError> {
        let comma = ComponentValue::Token(CSSToken::Comma);
        let (head, fallback) = match args.iter().position(|v| *v == comma) {
            Some(i) => (&args[..i], Some(&args[i + 1..])),
            None => (args, None),
        };

        let mut anchor_name = None;
        let mut custom_prop_name = None;
        let mut measure = None;
        let unexpected = |value: &ComponentValue| AnchorSyntaxError::Unexpected {
            function,
            found: value.to_css_string(),
        };

        for value in head.iter().filter(|v| !v.is_whitespace()) {
            let has_element = anchor_name.is_some() || custom_prop_name.is_some();
            match value {
                ComponentValue::Token(CSSToken::Ident(ident)) if ident.starts_with("--") => {
                    if has_element {
                        return Err(unexpected(value));
                    }
                    anchor_name = Some(ident.clone());
                }
                ComponentValue::Function { name, value: var_args }
                    if name.eq_ignore_ascii_case("var") =>
                {
                    let Some(property) = var_name(var_args).filter(|_| !has_element) else {
                        return Err(unexpected(value));
                    };
                    custom_prop_name = Some(property.to_string());
                }
                ComponentValue::Token(CSSToken::Ident(ident)) => {
                    if measure.is_some() {
                        return Err(unexpected(value));
                    }
                    measure = Some(parse_keyword(function, ident)?);
                }
                ComponentValue::Token(CSSToken::Percentage { value: pct, .. })
                    if function == AnchorFunction::Anchor =>
                {
                    if measure.is_some() {
                        return Err(unexpected(value));
                    }
                    measure = Some(AnchorMeasure::Edge(AnchorSide::Percentage(*pct)));
                }
                other => return Err(unexpected(other)),
            }
        }

        let measure = measure.ok_or(AnchorSyntaxError::MissingKeyword { function })?;
        let fallback_value = fallback
            .map(|values| values.to_css_string().trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| DEFAULT_FALLBACK.to_string());

        Ok(Self {
            anchor_name,
            custom_prop_name,
            measure,
            fallback_value,
        })
    }
}

fn parse_keyword(function: AnchorFunction, ident: &str) -> Result<AnchorMeasure, AnchorSyntaxError> {
    let lower = ident.to_ascii_lowercase();
    let parsed = match function {
        AnchorFunction::Anchor => lower
            .parse()
            .map(|keyword| AnchorMeasure::Edge(AnchorSide::Keyword(keyword)))
            .ok(),
        AnchorFunction::AnchorSize => lower.parse().map(AnchorMeasure::Size).ok(),
    };
    parsed.ok_or_else(|| AnchorSyntaxError::UnknownKeyword {
        function,
        keyword: ident.to_string(),
    })
}

/// [CSS Variables § 3](https://www.w3.org/TR/css-variables-1/#using-variables)
///
/// "var() = var( <custom-property-name> , <declaration-value>? )"
///
/// Returns the referenced custom property name.
#[must_use]
pub fn var_name(args: &[ComponentValue]) -> Option<&str> {
    args.iter()
        .find(|v| !v.is_whitespace())
        .and_then(ComponentValue::as_ident)
        .filter(|name| name.starts_with("--"))
}

/// An extracted anchor function with its indirection key.
///
/// Immutable once created; the rewriter replaces the call in the stylesheet
/// with `var(<indirection_key>)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorReference {
    /// The dashed anchor name, if given directly.
    pub anchor_name: Option<String>,
    /// The custom property holding the anchor name.
    pub custom_prop_name: Option<String>,
    /// Edge or size to measure, serialized as `anchorEdge` / `anchorSize`.
    #[serde(flatten)]
    pub measure: AnchorMeasure,
    /// Used verbatim when the anchor cannot be resolved.
    pub fallback_value: String,
    /// The custom property name the resolved value is published under.
    pub indirection_key: String,
}

impl AnchorReference {
    /// Attach an indirection key to a parsed call.
    #[must_use]
    pub fn new(call: AnchorCall, indirection_key: String) -> Self {
        Self {
            anchor_name: call.anchor_name,
            custom_prop_name: call.custom_prop_name,
            measure: call.measure,
            fallback_value: call.fallback_value,
            indirection_key,
        }
    }

    /// Whether neither a name nor a custom property was given, so the
    /// element's implicit anchor is used.
    #[must_use]
    pub const fn uses_implicit_anchor(&self) -> bool {
        self.anchor_name.is_none() && self.custom_prop_name.is_none()
    }

    /// The same reference published under a different key.
    #[must_use]
    pub fn with_key(&self, indirection_key: String) -> Self {
        Self {
            indirection_key,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CSSParser;
    use crate::tokenizer::CSSTokenizer;

    /// Parse `css` as a declaration value and return the first function's args.
    fn function_args(css: &str) -> Vec<ComponentValue> {
        let mut tokenizer = CSSTokenizer::new(format!("x: {css}"));
        tokenizer.run();
        let declarations = CSSParser::new(tokenizer.into_tokens()).parse_declaration_list();
        match declarations[0].value.first() {
            Some(ComponentValue::Function { value, .. }) => value.clone(),
            other => panic!("Expected function, got {other:?}"),
        }
    }

    fn parse_anchor(css: &str) -> Result<AnchorCall, AnchorSyntaxError> {
        AnchorCall::parse(AnchorFunction::Anchor, &function_args(css))
    }

    #[test]
    fn test_name_and_side() {
        let call = parse_anchor("anchor(--my-anchor bottom)").unwrap();
        assert_eq!(call.anchor_name.as_deref(), Some("--my-anchor"));
        assert_eq!(
            call.measure,
            AnchorMeasure::Edge(AnchorSide::Keyword(AnchorSideKeyword::Bottom))
        );
        assert_eq!(call.fallback_value, "0px");
    }

    #[test]
    fn test_side_before_name_and_fallback() {
        let call = parse_anchor("anchor(end --a, calc(1px + 2%))").unwrap();
        assert_eq!(call.anchor_name.as_deref(), Some("--a"));
        assert_eq!(call.fallback_value, "calc(1px + 2%)");
    }

    #[test]
    fn test_percentage_side() {
        let call = parse_anchor("anchor(--a 25%)").unwrap();
        assert_eq!(call.measure, AnchorMeasure::Edge(AnchorSide::Percentage(25.0)));
    }

    #[test]
    fn test_implicit_anchor() {
        let call = parse_anchor("anchor(top)").unwrap();
        assert!(call.anchor_name.is_none());
        assert!(call.custom_prop_name.is_none());
    }

    #[test]
    fn test_var_anchor_element() {
        let call = parse_anchor("anchor(var(--which) left, 5px)").unwrap();
        assert_eq!(call.custom_prop_name.as_deref(), Some("--which"));
        assert_eq!(call.fallback_value, "5px");
    }

    #[test]
    fn test_malformed_calls() {
        assert_eq!(
            parse_anchor("anchor(--a)"),
            Err(AnchorSyntaxError::MissingKeyword {
                function: AnchorFunction::Anchor
            })
        );
        assert!(matches!(
            parse_anchor("anchor(--a middle)"),
            Err(AnchorSyntaxError::UnknownKeyword { .. })
        ));
        assert!(matches!(
            parse_anchor("anchor(--a --b top)"),
            Err(AnchorSyntaxError::Unexpected { .. })
        ));
        assert!(matches!(
            parse_anchor("anchor(--a 10px)"),
            Err(AnchorSyntaxError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_anchor_size_keywords() {
        let args = function_args("anchor-size(--a self-inline)");
        let call = AnchorCall::parse(AnchorFunction::AnchorSize, &args).unwrap();
        assert_eq!(call.measure, AnchorMeasure::Size(AnchorSize::SelfInline));

        let args = function_args("anchor-size(--a top)");
        assert!(AnchorCall::parse(AnchorFunction::AnchorSize, &args).is_err());
    }

    #[test]
    fn test_reference_serializes_camel_case() {
        let call = parse_anchor("anchor(--a bottom)").unwrap();
        let reference = AnchorReference::new(call, "--anchor-0".to_string());
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["anchorName"], "--a");
        assert_eq!(json["anchorEdge"], "bottom");
        assert_eq!(json["fallbackValue"], "0px");
        assert_eq!(json["indirectionKey"], "--anchor-0");
    }
}
