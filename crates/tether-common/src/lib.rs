//! Common utilities for the Tether crates.
//!
//! This crate provides infrastructure shared by the stylesheet rewriter and
//! the positioning runtime:
//! - **Authoring diagnostics** - deduplicated warnings about stylesheet
//!   constructs that parse but cannot take effect

pub mod warning;
