//! Polyfill configuration.

use serde::{Deserialize, Serialize};
use tether_css::RewriteOptions;
use thiserror::Error;

/// Errors loading [`PolyfillOptions`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON for [`PolyfillOptions`].
    #[error("invalid polyfill configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The marker attribute name is empty.
    #[error("marker attribute must not be empty")]
    EmptyMarker,
    /// The key prefix is not a custom property name.
    #[error("key prefix `{0}` must start with `--`")]
    InvalidKeyPrefix(String),
}

/// How the polyfill names things and formats values.
///
/// ```
/// use tether_position::config::PolyfillOptions;
///
/// let options = PolyfillOptions::from_json(r#"{ "roundToPixels": true }"#).unwrap();
/// assert_eq!(options.marker_attribute, "data-anchor-polyfill");
/// assert!(options.round_to_pixels);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PolyfillOptions {
    /// Attribute set on a target to the id of its active try block.
    pub marker_attribute: String,
    /// Prefix of the custom properties carrying resolved values.
    pub key_prefix: String,
    /// Round resolved lengths to whole pixels.
    pub round_to_pixels: bool,
}

impl Default for PolyfillOptions {
    fn default() -> Self {
        let rewrite = RewriteOptions::default();
        Self {
            marker_attribute: rewrite.marker_attribute,
            key_prefix: rewrite.key_prefix,
            round_to_pixels: false,
        }
    }
}

impl PolyfillOptions {
    /// Parse options from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON, unknown fields, an empty
    /// marker attribute, or a key prefix that is not a custom property name.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check the options are usable.
    ///
    /// # Errors
    ///
    /// See [`PolyfillOptions::from_json`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_attribute.trim().is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        if !self.key_prefix.starts_with("--") || self.key_prefix.len() == 2 {
            return Err(ConfigError::InvalidKeyPrefix(self.key_prefix.clone()));
        }
        Ok(())
    }

    /// The subset of options the stylesheet rewriter needs.
    #[must_use]
    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            marker_attribute: self.marker_attribute.clone(),
            key_prefix: self.key_prefix.clone(),
        }
    }
}
