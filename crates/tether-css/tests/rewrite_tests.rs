//! Integration tests for stylesheet rewriting and the rule model.

use tether_css::anchor::{AnchorMeasure, AnchorSide, AnchorSideKeyword, AnchorSize};
use tether_css::model::{SelectionStrategy, TryValue};
use tether_css::rewrite::{RewriteOptions, RewriteOutput, StyleSource, rewrite_sources};

/// Rewrite each string as its own stylesheet.
fn rewrite(sheets: &[&str]) -> (Vec<StyleSource>, RewriteOutput) {
    let mut sources: Vec<StyleSource> = sheets.iter().map(|css| StyleSource::stylesheet(*css)).collect();
    let output = rewrite_sources(&mut sources, &RewriteOptions::default());
    (sources, output)
}

fn edge(keyword: AnchorSideKeyword) -> AnchorMeasure {
    AnchorMeasure::Edge(AnchorSide::Keyword(keyword))
}

#[test]
fn test_no_anchor_syntax_leaves_text_untouched() {
    let css = "a { color: red }\n/* keep me */ b{top:0;anchor-name: none}";
    let (sources, output) = rewrite(&[css]);

    assert!(output.rules.is_empty());
    assert!(!output.changed);
    assert!(!sources[0].changed);
    assert_eq!(sources[0].css_text, css);
}

#[test]
fn test_unknown_anchor_name_scenario() {
    let (sources, output) = rewrite(&["#f1 { position:absolute; top:anchor(--my-anchor bottom); }"]);

    assert!(output.changed);
    assert_eq!(
        sources[0].css_text,
        "#f1 { position: absolute; top: var(--anchor-0); }"
    );
    assert!(output.registry.is_empty());

    let json = serde_json::to_value(&output.rules).unwrap();
    let top = &json["#f1"]["declarations"]["top"];
    assert_eq!(top["anchorName"], "--my-anchor");
    assert_eq!(top["anchorEdge"], "bottom");
    assert_eq!(top["fallbackValue"], "0px");
    assert_eq!(top["indirectionKey"], "--anchor-0");
    assert_eq!(json["#f1"]["fallbacks"], serde_json::json!([]));
    assert_eq!(json["#f1"]["order"], "normal");
}

#[test]
fn test_rewriting_rewritten_text_is_a_no_op() {
    let css = "#a { anchor-name: --a; }
        #t { --p: anchor(--a top); top: var(--p); left: calc(anchor(--a right) + 4px); position-fallback: --f; }
        @position-fallback --f { @try { bottom: anchor(--a top); } }";
    let (first, output) = rewrite(&[css]);
    assert!(output.changed);

    let (second, output) = rewrite(&[&first[0].css_text]);
    assert!(!output.changed);
    assert!(!second[0].changed);
    assert!(output.rules.is_empty());
    assert_eq!(second[0].css_text, first[0].css_text);
}

#[test]
fn test_anchor_names_accumulate_in_declaration_order() {
    let (_, output) = rewrite(&[
        "#one { anchor-name: --a; } .two, .three { anchor-name: --a, --b; }",
        "#four { anchor-name: --a; }",
    ]);
    assert_eq!(output.registry.selectors("--a"), &["#one", ".two, .three", "#four"]);
    assert_eq!(output.registry.selectors("--b"), &[".two, .three"]);
}

#[test]
fn test_last_declaration_wins() {
    let (sources, output) = rewrite(&["#t { top: anchor(--a top); top: anchor(--b bottom, 3px); }"]);
    let top = &output.rules["#t"].declarations["top"];
    assert_eq!(top.anchor_name.as_deref(), Some("--b"));
    assert_eq!(top.fallback_value, "3px");
    assert_eq!(top.indirection_key, "--anchor-1");
    assert_eq!(
        sources[0].css_text,
        "#t { top: var(--anchor-0); top: var(--anchor-1); }"
    );
}

#[test]
fn test_anchor_inside_calc_and_media() {
    let (sources, output) = rewrite(&[
        "@media screen { #t { top: calc(anchor(--a top) + 10px); width: anchor-size(--a width); } }",
    ]);
    let rule = &output.rules["#t"];
    assert_eq!(rule.declarations["top"].measure, edge(AnchorSideKeyword::Top));
    assert_eq!(rule.declarations["width"].measure, AnchorMeasure::Size(AnchorSize::Width));
    assert_eq!(
        sources[0].css_text,
        "@media screen {\n  #t { top: calc(var(--anchor-0) + 10px); width: var(--anchor-1); }\n}"
    );
}

#[test]
fn test_malformed_and_misplaced_calls_are_left_alone() {
    let (sources, output) = rewrite(&[
        "#t { top: anchor(--a); margin-top: anchor(--a top); left: anchor(--a left); }",
    ]);
    let rule = &output.rules["#t"];
    assert_eq!(rule.declarations.len(), 1);
    assert_eq!(rule.declarations["left"].indirection_key, "--anchor-0");
    assert_eq!(
        sources[0].css_text,
        "#t { top: anchor(--a); margin-top: anchor(--a top); left: var(--anchor-0); }"
    );
}

#[test]
fn test_custom_property_is_cloned_per_consuming_property() {
    let (sources, output) = rewrite(&[
        "#a { anchor-name: --a; }
         .t { --pos: anchor(--a top, 5px); top: var(--pos); bottom: var(--pos); color: var(--pos); }",
    ]);
    let rule = &output.rules[".t"];
    assert_eq!(rule.declarations.len(), 2);
    assert_eq!(rule.declarations["top"].indirection_key, "--anchor-0-top");
    assert_eq!(rule.declarations["bottom"].indirection_key, "--anchor-0-bottom");
    assert_eq!(rule.declarations["bottom"].anchor_name.as_deref(), Some("--a"));
    assert_eq!(rule.declarations["bottom"].fallback_value, "5px");
    assert!(sources[0].css_text.ends_with(
        ".t { --pos: var(--anchor-0); top: var(--anchor-0-top); bottom: var(--anchor-0-bottom); color: var(--pos); }"
    ));
}

#[test]
fn test_custom_property_consumed_by_two_rules_gets_unique_keys() {
    let (_, output) = rewrite(&[
        ":root { --pos: anchor(--a bottom); } .x { top: var(--pos); } .y { top: var(--pos); }",
    ]);
    assert_eq!(output.rules[".x"].declarations["top"].indirection_key, "--anchor-0-top");
    assert_eq!(output.rules[".y"].declarations["top"].indirection_key, "--anchor-0-top-2");
}

#[test]
fn test_position_fallback_blocks_are_attached_and_emitted() {
    let css = "#anchor { anchor-name: --a; }
#t { position: absolute; position-fallback: --flip; position-try-order: most-width; top: anchor(--a bottom); }
@position-fallback --flip {
  @try { top: anchor(--a top); left: 10px; }
  @try { bottom: anchor(--a top, 1px); }
}";
    let (sources, output) = rewrite(&[css]);
    let rule = &output.rules["#t"];

    assert_eq!(rule.order, SelectionStrategy::MostWidth);
    assert_eq!(rule.fallbacks.len(), 2);
    assert_eq!(rule.fallbacks[0].id, "anchor-try-0-0");
    assert_eq!(rule.fallbacks[1].id, "anchor-try-0-1");
    assert_eq!(
        rule.fallbacks[0].declarations["left"],
        TryValue::Literal("10px".to_string())
    );
    let TryValue::Anchor(top) = &rule.fallbacks[0].declarations["top"] else {
        panic!("Expected anchor reference in first block");
    };
    assert_eq!(top.indirection_key, "--anchor-1");
    assert_eq!(top.measure, edge(AnchorSideKeyword::Top));
    let TryValue::Anchor(bottom) = &rule.fallbacks[1].declarations["bottom"] else {
        panic!("Expected anchor reference in second block");
    };
    assert_eq!(bottom.fallback_value, "1px");

    assert_eq!(
        sources[0].css_text,
        "#anchor { anchor-name: --a; }
#t { position: absolute; top: var(--anchor-0); }
#t[data-anchor-polyfill=\"anchor-try-0-0\"] { top: var(--anchor-1) !important; left: 10px !important; }
#t[data-anchor-polyfill=\"anchor-try-0-1\"] { bottom: var(--anchor-2) !important; }"
    );
}

#[test]
fn test_fallback_emitted_into_defining_source_for_every_selector() {
    let (sources, output) = rewrite(&[
        ".a, .b { position-fallback: --f; }",
        "p { color: red; }",
        "@position-fallback --f { @try { top: 0; } }",
    ]);
    assert_eq!(output.rules[".a, .b"].fallbacks.len(), 1);
    assert_eq!(output.rules[".a, .b"].fallbacks[0].id, "anchor-try-2-0");

    assert_eq!(sources[0].css_text, ".a, .b { }");
    assert!(!sources[1].changed);
    assert_eq!(sources[1].css_text, "p { color: red; }");
    assert_eq!(
        sources[2].css_text,
        ".a[data-anchor-polyfill=\"anchor-try-2-0\"], .b[data-anchor-polyfill=\"anchor-try-2-0\"] { top: 0 !important; }"
    );
}

#[test]
fn test_later_fallback_definition_wins() {
    let (_, output) = rewrite(&[
        "#t { position-fallback: --f; }
         @position-fallback --f { @try { top: 0; } @try { top: 1px; } }
         @position-fallback --f { @try { left: 2px; } }",
    ]);
    let fallbacks = &output.rules["#t"].fallbacks;
    assert_eq!(fallbacks.len(), 1);
    assert_eq!(fallbacks[0].id, "anchor-try-0-2");
    assert_eq!(fallbacks[0].declarations["left"], TryValue::Literal("2px".to_string()));
}

#[test]
fn test_custom_property_inside_try_block() {
    let (sources, output) = rewrite(&[
        "#t { --p: anchor(--a right); position-fallback: --f; }
@position-fallback --f { @try { left: var(--p); } }",
    ]);
    let block = &output.rules["#t"].fallbacks[0];
    let TryValue::Anchor(left) = &block.declarations["left"] else {
        panic!("Expected anchor reference, got {:?}", block.declarations["left"]);
    };
    assert_eq!(left.indirection_key, "--anchor-0-left");
    assert_eq!(left.measure, edge(AnchorSideKeyword::Right));
    assert_eq!(
        sources[0].css_text,
        "#t { --p: var(--anchor-0); }
#t[data-anchor-polyfill=\"anchor-try-0-0\"] { left: var(--anchor-0-left) !important; }"
    );
}

#[test]
fn test_unknown_fallback_name_is_inert() {
    let (sources, output) = rewrite(&["#t { position-fallback: --missing; color: blue; }"]);
    assert!(!output.rules.contains_key("#t"));
    assert_eq!(sources[0].css_text, "#t { color: blue; }");
}

#[test]
fn test_custom_key_prefix_and_marker() {
    let options = RewriteOptions {
        marker_attribute: "data-pos".to_string(),
        key_prefix: "--tether".to_string(),
    };
    let mut sources = vec![StyleSource::stylesheet(
        "#t { left: anchor(--a right); position-fallback: --f; } @position-fallback --f { @try { top: 0 } }",
    )];
    let output = rewrite_sources(&mut sources, &options);

    assert_eq!(output.rules["#t"].declarations["left"].indirection_key, "--tether-0");
    assert!(sources[0].css_text.contains("#t[data-pos=\"tether-try-0-0\"] { top: 0 !important; }"));
}

#[test]
fn test_shared_fallback_gets_fresh_keys_per_selector() {
    let (sources, output) = rewrite(&["#t1 { position-fallback: --f; }
#t2 { position-fallback: --f; }
@position-fallback --f { @try { top: anchor(--x bottom); left: 4px; } }"]);

    let key = |selector: &str| match &output.rules[selector].fallbacks[0].declarations["top"] {
        TryValue::Anchor(reference) => reference.indirection_key.clone(),
        other => panic!("Expected anchor reference, got {other:?}"),
    };
    assert_eq!(key("#t1"), "--anchor-0");
    assert_eq!(key("#t2"), "--anchor-1");
    assert_eq!(
        output.rules["#t2"].fallbacks[0].declarations["left"],
        TryValue::Literal("4px".to_string())
    );

    let css = &sources[0].css_text;
    assert!(css.contains(
        "#t1[data-anchor-polyfill=\"anchor-try-0-0\"] { top: var(--anchor-0) !important; left: 4px !important; }"
    ));
    assert!(css.contains(
        "#t2[data-anchor-polyfill=\"anchor-try-0-0\"] { top: var(--anchor-1) !important; left: 4px !important; }"
    ));
}

#[test]
fn test_keys_avoid_custom_properties_already_in_use() {
    let (sources, output) = rewrite(&[
        "#old { top: var(--anchor-0); } :root { --anchor-1: 3px; }",
        "#new { left: anchor(--a left); top: anchor(--a top); }",
    ]);

    let rule = &output.rules["#new"];
    assert_eq!(rule.declarations["left"].indirection_key, "--anchor-2");
    assert_eq!(rule.declarations["top"].indirection_key, "--anchor-3");
    assert!(!sources[0].changed);
    assert_eq!(
        sources[1].css_text,
        "#new { left: var(--anchor-2); top: var(--anchor-3); }"
    );
}
