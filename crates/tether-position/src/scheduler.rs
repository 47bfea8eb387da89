//! Which targets are kept up to date, and their fallback tasks.

use std::collections::BTreeMap;

use log::debug;
use tether_dom::{DomTree, NodeId};

use crate::fallback::{FallbackSelector, Selection};

/// What a target is subscribed for.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// The rule selectors the target matched, in rule-model order.
    pub selectors: Vec<String>,
    /// The target's fallback evaluation, when any matched rule has fallbacks.
    pub task: Option<FallbackSelector>,
}

/// Outcome of a layout-change notification for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// References were re-resolved; `selection` is the fallback outcome when
    /// the target has fallbacks.
    Updated {
        /// The settled fallback selection.
        selection: Option<Selection>,
    },
    /// The target's evaluation was in flight; nothing was done.
    Dropped,
    /// The target is not subscribed.
    NotSubscribed,
}

/// One subscription slot per target element.
#[derive(Debug, Clone, Default)]
pub struct UpdateScheduler {
    subscriptions: BTreeMap<NodeId, Subscription>,
}

impl UpdateScheduler {
    /// An empty scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subscriptions: BTreeMap::new(),
        }
    }

    /// Subscribe `target` for `selector`. A target matched by several rules
    /// keeps a single slot; the first task offered is kept.
    pub fn subscribe(&mut self, target: NodeId, selector: &str, task: Option<FallbackSelector>) {
        let subscription = self
            .subscriptions
            .entry(target)
            .or_insert_with(|| Subscription {
                selectors: Vec::new(),
                task: None,
            });
        if !subscription.selectors.iter().any(|s| s == selector) {
            subscription.selectors.push(selector.to_string());
        }
        if subscription.task.is_none() {
            subscription.task = task;
        }
    }

    /// Tear down `target`'s subscription. Stopping an unknown target is a
    /// no-op.
    pub fn stop(&mut self, target: NodeId) -> bool {
        self.subscriptions.remove(&target).is_some()
    }

    /// Tear down every subscription.
    pub fn stop_all(&mut self) {
        self.subscriptions.clear();
    }

    /// Stop every target that is no longer in the document.
    pub fn prune_disconnected(&mut self, dom: &DomTree) -> Vec<NodeId> {
        let gone: Vec<NodeId> = self
            .subscriptions
            .keys()
            .copied()
            .filter(|&target| !dom.is_connected(target))
            .collect();
        for target in &gone {
            debug!("{target:?} left the document; stopping updates");
            let _ = self.subscriptions.remove(target);
        }
        gone
    }

    /// Subscribed targets, in node order.
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.subscriptions.keys().copied()
    }

    /// Number of subscribed targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// `target`'s subscription.
    #[must_use]
    pub fn subscription(&self, target: NodeId) -> Option<&Subscription> {
        self.subscriptions.get(&target)
    }

    /// `target`'s fallback task.
    pub fn task_mut(&mut self, target: NodeId) -> Option<&mut FallbackSelector> {
        self.subscriptions.get_mut(&target)?.task.as_mut()
    }
}
