//! Choosing among a target's `@try` blocks by testing for overflow.
//!
//! [CSS Anchor Positioning § 4](https://drafts.csswg.org/css-anchor-position-1/#fallback)
//!
//! Each evaluation is an explicit state machine so that the embedder can
//! interleave it with layout: every [`FallbackSelector::step`] applies at most
//! one candidate and takes one overflow measurement.
//!
//! ```text
//!   Idle ──begin──▶ CheckingDefault ──fits──────────────────▶ Settled(Default)
//!                         │
//!                         ├─normal──▶ Iterating{k} ──fits───▶ Settled(Block k)
//!                         │              │  └──last─────────▶ Settled(Reverted)
//!                         │              └──k+1──┘
//!                         └─most-*──▶ Scoring{k, best} ─last─▶ Settled(Block best)
//! ```
//!
//! The `most-*` strategies compare the target's own box as laid out under
//! each block, not the area each block would make available. This is an
//! approximation of the intended behavior and is kept as is.

use log::{debug, trace};
use tether_css::{Axis, SelectionStrategy, TargetRule};
use tether_dom::{DomTree, NodeId};

use crate::oracle::LayoutOracle;

/// Where an evaluation is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// No evaluation has run yet.
    Idle,
    /// Measuring the target without any try block applied.
    CheckingDefault,
    /// `normal` order: trying block `next`.
    Iterating {
        /// Index of the block applied by the next step.
        next: usize,
    },
    /// `most-*` order: scoring block `next`.
    Scoring {
        /// Index of the block applied by the next step.
        next: usize,
        /// Best block so far and its visible extent.
        best: Option<(usize, f64)>,
    },
    /// The last evaluation finished.
    Settled(Selection),
}

/// The outcome of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The target fits without any try block.
    Default,
    /// The try block at this index is applied.
    Block(usize),
    /// No try block fits; the target is left in its default layout.
    Reverted,
}

/// Result of [`FallbackSelector::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// A new evaluation started.
    Started,
    /// An evaluation is already in flight; the request was dropped.
    Dropped,
}

/// Fallback evaluation for one target element.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackSelector {
    target: NodeId,
    block_ids: Vec<String>,
    order: SelectionStrategy,
    marker_attribute: String,
    phase: Phase,
}

impl FallbackSelector {
    /// A selector for `target` choosing among `rule`'s fallbacks.
    #[must_use]
    pub fn new(target: NodeId, rule: &TargetRule, marker_attribute: &str) -> Self {
        Self {
            target,
            block_ids: rule.fallbacks.iter().map(|block| block.id.clone()).collect(),
            order: rule.order,
            marker_attribute: marker_attribute.to_string(),
            phase: Phase::Idle,
        }
    }

    /// The element this selector positions.
    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The marker value of the block at `index`.
    #[must_use]
    pub fn block_id(&self, index: usize) -> Option<&str> {
        self.block_ids.get(index).map(String::as_str)
    }

    /// Whether an evaluation is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Settled(_))
    }

    /// Start an evaluation, unless one is already running.
    pub fn begin(&mut self) -> Begin {
        if self.is_busy() {
            debug!("fallback evaluation for {:?} in flight; dropping", self.target);
            return Begin::Dropped;
        }
        self.phase = Phase::CheckingDefault;
        Begin::Started
    }

    /// Advance by one measurement. Returns the selection once the evaluation
    /// settles, and `None` while it is still running or when none was begun.
    pub fn step(&mut self, dom: &mut DomTree, oracle: &dyn LayoutOracle) -> Option<Selection> {
        match self.phase {
            Phase::Idle | Phase::Settled(_) => None,
            Phase::CheckingDefault => {
                dom.remove_attribute(self.target, &self.marker_attribute);
                if self.fits(dom, oracle) || self.block_ids.is_empty() {
                    return Some(self.settle(Selection::Default));
                }
                self.phase = match self.order {
                    SelectionStrategy::Normal => Phase::Iterating { next: 0 },
                    _ => Phase::Scoring {
                        next: 0,
                        best: None,
                    },
                };
                None
            }
            Phase::Iterating { next } => {
                self.apply(dom, next);
                if self.fits(dom, oracle) {
                    return Some(self.settle(Selection::Block(next)));
                }
                if next + 1 >= self.block_ids.len() {
                    dom.remove_attribute(self.target, &self.marker_attribute);
                    return Some(self.settle(Selection::Reverted));
                }
                self.phase = Phase::Iterating { next: next + 1 };
                None
            }
            Phase::Scoring { next, best } => {
                self.apply(dom, next);
                let extent = self.visible_extent(dom, oracle);
                trace!("{:?}: block {next} shows {extent}px", self.target);
                let best = match best {
                    Some((_, best_extent)) if best_extent >= extent => best,
                    _ => Some((next, extent)),
                };
                if next + 1 < self.block_ids.len() {
                    self.phase = Phase::Scoring {
                        next: next + 1,
                        best,
                    };
                    return None;
                }
                let winner = best.map_or(0, |(index, _)| index);
                self.apply(dom, winner);
                Some(self.settle(Selection::Block(winner)))
            }
        }
    }

    /// Drive an evaluation to completion.
    pub fn run(&mut self, dom: &mut DomTree, oracle: &dyn LayoutOracle) -> Option<Selection> {
        // One step for the default check plus one per block.
        for _ in 0..=self.block_ids.len() {
            if let Some(selection) = self.step(dom, oracle) {
                return Some(selection);
            }
            if !self.is_busy() {
                break;
            }
        }
        None
    }

    fn settle(&mut self, selection: Selection) -> Selection {
        debug!("{:?} settled on {selection:?}", self.target);
        self.phase = Phase::Settled(selection);
        selection
    }

    fn apply(&self, dom: &mut DomTree, index: usize) {
        if let Some(id) = self.block_ids.get(index) {
            dom.set_attribute(self.target, &self.marker_attribute, id);
        }
    }

    /// Whether the target stays inside its containing block. A target that
    /// cannot be measured counts as fitting.
    fn fits(&self, dom: &DomTree, oracle: &dyn LayoutOracle) -> bool {
        let boundary = oracle.offset_parent(dom, self.target);
        oracle
            .measure_overflow(dom, self.target, boundary)
            .is_none_or(|overflow| !overflow.any_positive())
    }

    /// The part of the target's box inside its containing block, along the
    /// axis the strategy compares.
    fn visible_extent(&self, dom: &DomTree, oracle: &dyn LayoutOracle) -> f64 {
        let axis = match self.order {
            SelectionStrategy::MostWidth => Axis::Horizontal,
            SelectionStrategy::MostHeight => Axis::Vertical,
            SelectionStrategy::MostInlineSize => oracle.writing_mode(dom, self.target).inline_axis(),
            SelectionStrategy::MostBlockSize | SelectionStrategy::Normal => {
                oracle.writing_mode(dom, self.target).block_axis()
            }
        };
        let Some(rect) = oracle.measure_rect(dom, self.target) else {
            return 0.0;
        };
        let boundary = oracle.offset_parent(dom, self.target);
        let Some(overflow) = oracle.measure_overflow(dom, self.target, boundary) else {
            return rect.size(axis);
        };
        (rect.size(axis) - overflow.start(axis).max(0.0) - overflow.end(axis).max(0.0)).max(0.0)
    }
}
