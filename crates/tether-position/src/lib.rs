//! Anchor positioning runtime for Tether.
//!
//! # Scope
//!
//! This crate provides:
//! - **Layout Oracle** - the measurement interface to the embedder's layout
//!   engine ([`LayoutOracle`]), and [`StaticLayout`] for recorded layouts
//! - **Binding** - picking the anchor element for a reference
//!   ([`binder::bind`], [`validate::PositioningValidator`])
//! - **Resolution** - anchor references to pixel lengths ([`resolve::resolve`])
//! - **Fallbacks** - choosing among `@try` blocks by overflow
//!   ([`fallback::FallbackSelector`])
//! - **Orchestration** - [`Polyfill`] rewrites stylesheets, subscribes
//!   targets and keeps their custom properties up to date
//!
//! # Indirection
//!
//! Rewritten stylesheets read `var(--anchor-N)`. Resolved values are written
//! to the document root with [`DomTree::set_root_property`], and the active
//! try block is named by the target's marker attribute.
//!
//! # Not Yet Implemented
//!
//! - Anchors inside shadow trees
//! - `position-try` and `@position-try` (the newer fallback syntax)

/// Anchor binding.
pub mod binder;
/// Polyfill configuration.
pub mod config;
/// Fallback selection.
pub mod fallback;
/// Rects, sizes and edges.
pub mod geometry;
/// The layout oracle interface.
pub mod oracle;
/// Pixel resolution.
pub mod resolve;
/// Target subscriptions.
pub mod scheduler;
/// Bound rule snapshots.
pub mod snapshot;
/// A recorded-measurement oracle.
pub mod static_layout;
/// Anchor acceptability.
pub mod validate;

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::Serialize;
use tether_css::selector::query_selector_all;
use tether_css::{
    AnchorNameRegistry, AnchorReference, AnchoredProperty, RuleModel, StyleSource,
    rewrite_sources,
};
use tether_common::warning::clear_warnings;
use tether_dom::{DomTree, NodeId};

pub use config::{ConfigError, PolyfillOptions};
pub use fallback::{Begin, FallbackSelector, Phase, Selection};
pub use geometry::{EdgeSizes, Rect, Size};
pub use oracle::LayoutOracle;
pub use scheduler::{Notification, Subscription, UpdateScheduler};
pub use snapshot::{BoundReference, BoundRuleModel, BoundTargetRule};
pub use static_layout::StaticLayout;
pub use validate::{AnchorValidator, PositioningValidator};

/// Result of [`Polyfill::polyfill`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PolyfillOutcome {
    /// Whether any source text was rewritten.
    pub changed: bool,
    /// Elements now kept up to date, in node order.
    pub targets: Vec<NodeId>,
}

/// Anchor positioning for one document.
///
/// Each call to [`Polyfill::polyfill`] starts over: the previous rule model
/// and subscriptions are discarded.
#[derive(Debug, Clone, Default)]
pub struct Polyfill {
    options: PolyfillOptions,
    rules: RuleModel,
    registry: AnchorNameRegistry,
    scheduler: UpdateScheduler,
}

impl Polyfill {
    /// A polyfill with no rules yet.
    #[must_use]
    pub fn new(options: PolyfillOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Rewrite `sources`, subscribe every element matching a target rule, and
    /// resolve all references.
    pub fn polyfill(
        &mut self,
        sources: &mut [StyleSource],
        dom: &mut DomTree,
        oracle: &dyn LayoutOracle,
    ) -> PolyfillOutcome {
        self.scheduler.stop_all();
        clear_warnings();

        // STEP 1: Rewrite the stylesheets with a fresh parse context.
        let output = rewrite_sources(sources, &self.options.rewrite_options());
        self.rules = output.rules;
        self.registry = output.registry;
        debug!(
            "polyfill: {} target rule(s), {} anchor name(s)",
            self.rules.len(),
            self.registry.names().count()
        );

        // STEP 2: Subscribe every element each target selector matches.
        for (selector, rule) in &self.rules {
            for target in query_selector_all(dom, selector) {
                let task = (!rule.fallbacks.is_empty()).then(|| {
                    FallbackSelector::new(target, rule, &self.options.marker_attribute)
                });
                self.scheduler.subscribe(target, selector, task);
            }
        }

        // STEP 3: Resolve everything once.
        let _ = self.update(dom, oracle);

        PolyfillOutcome {
            changed: output.changed,
            targets: self.scheduler.targets().collect(),
        }
    }

    /// Re-resolve every subscribed target with the default validator.
    pub fn update(
        &mut self,
        dom: &mut DomTree,
        oracle: &dyn LayoutOracle,
    ) -> BTreeMap<NodeId, Notification> {
        self.update_with(dom, oracle, &PositioningValidator)
    }

    /// Re-resolve every subscribed target, binding anchors with `validator`.
    ///
    /// Targets that left the document are unsubscribed first.
    ///
    /// Keys belong to selectors, not elements: when one selector matches
    /// several targets, the value resolved for the target with the highest
    /// [`NodeId`] is the one left on the root.
    pub fn update_with(
        &mut self,
        dom: &mut DomTree,
        oracle: &dyn LayoutOracle,
        validator: &dyn AnchorValidator,
    ) -> BTreeMap<NodeId, Notification> {
        let _ = self.scheduler.prune_disconnected(dom);
        let targets: Vec<NodeId> = self.scheduler.targets().collect();
        targets
            .into_iter()
            .map(|target| (target, self.refresh(dom, oracle, validator, target)))
            .collect()
    }

    /// React to a layout change affecting `target`.
    ///
    /// Dropped, not queued, while the target's fallback evaluation is in
    /// flight.
    pub fn on_layout_change(
        &mut self,
        dom: &mut DomTree,
        oracle: &dyn LayoutOracle,
        target: NodeId,
    ) -> Notification {
        if !dom.is_connected(target) {
            let _ = self.scheduler.stop(target);
            return Notification::NotSubscribed;
        }
        self.refresh(dom, oracle, &PositioningValidator, target)
    }

    /// Stop updating `target`. Returns whether it was subscribed.
    pub fn stop(&mut self, target: NodeId) -> bool {
        self.scheduler.stop(target)
    }

    /// Stop updating every target.
    pub fn stop_all(&mut self) {
        self.scheduler.stop_all();
    }

    /// The rule model of the last [`Polyfill::polyfill`] call.
    #[must_use]
    pub const fn rules(&self) -> &RuleModel {
        &self.rules
    }

    /// Anchor names of the last [`Polyfill::polyfill`] call.
    #[must_use]
    pub const fn registry(&self) -> &AnchorNameRegistry {
        &self.registry
    }

    /// The options in use.
    #[must_use]
    pub const fn options(&self) -> &PolyfillOptions {
        &self.options
    }

    /// Subscribed targets.
    #[must_use]
    pub const fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    /// `target`'s fallback task, for embedders that drive it step by step.
    pub fn task_mut(&mut self, target: NodeId) -> Option<&mut FallbackSelector> {
        self.scheduler.task_mut(target)
    }

    /// The rule model with each reference bound to its anchor element.
    #[must_use]
    pub fn bound_rules(&self, dom: &DomTree, oracle: &dyn LayoutOracle) -> BoundRuleModel {
        snapshot::bind_rules(dom, oracle, &PositioningValidator, &self.registry, &self.rules)
    }

    fn refresh(
        &mut self,
        dom: &mut DomTree,
        oracle: &dyn LayoutOracle,
        validator: &dyn AnchorValidator,
        target: NodeId,
    ) -> Notification {
        let Some(subscription) = self.scheduler.subscription(target) else {
            return Notification::NotSubscribed;
        };
        if subscription.task.as_ref().is_some_and(FallbackSelector::is_busy) {
            debug!("layout change for {target:?} dropped: evaluation in flight");
            return Notification::Dropped;
        }

        for selector in &subscription.selectors {
            let Some(rule) = self.rules.get(selector) else {
                continue;
            };
            for (property, reference) in rule.anchors() {
                let value = self.resolve_reference(dom, oracle, validator, target, property, reference);
                trace!("{} = {value}", reference.indirection_key);
                dom.set_root_property(&reference.indirection_key, &value);
            }
        }

        let selection = match self.scheduler.task_mut(target) {
            Some(task) => match task.begin() {
                Begin::Started => task.run(dom, oracle),
                Begin::Dropped => return Notification::Dropped,
            },
            None => None,
        };
        Notification::Updated { selection }
    }

    fn resolve_reference(
        &self,
        dom: &DomTree,
        oracle: &dyn LayoutOracle,
        validator: &dyn AnchorValidator,
        target: NodeId,
        property: &str,
        reference: &AnchorReference,
    ) -> String {
        let Some(property) = AnchoredProperty::parse(property) else {
            return reference.fallback_value.clone();
        };
        let anchor_rect = binder::bind(dom, oracle, validator, &self.registry, target, reference)
            .and_then(|anchor| resolve::anchor_rect_in_containing_block(dom, oracle, anchor, target));
        resolve::resolve(
            dom,
            oracle,
            &resolve::ResolveRequest {
                target,
                property,
                anchor_rect,
                measure: reference.measure,
                fallback: &reference.fallback_value,
                round_to_pixels: self.options.round_to_pixels,
            },
        )
    }
}
