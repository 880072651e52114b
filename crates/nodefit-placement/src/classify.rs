//! Node classification: does a node count toward capacity, and in which pool?
//!
//! An ordered decision list, first match wins:
//!
//! 1. down / offline / unreachable state → excluded
//! 2. not a compute or accelerator vnode → excluded
//! 3. accelerator (by queue or by name pattern) → accelerator pool
//! 4. serves a monitored queue → general pool
//! 5. serves only unmonitored queues → excluded
//! 6. no queue list at all → general pool
//!
//! Liveness is checked before purpose; a dead node's queues are irrelevant.

use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use nodefit_core::config::{AcceleratorDetection, PolicyConfig};
use nodefit_core::queues::{ACCELERATOR_QUEUE, MONITORED_QUEUES};
use nodefit_core::{NodeRecord, PoolKind};

/// Why a node was left out of capacity totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    DownOrOffline,
    NotAComputeNode,
    NoMonitoredQueues,
}

impl ExclusionReason {
    pub const ALL: [ExclusionReason; 3] = [
        ExclusionReason::DownOrOffline,
        ExclusionReason::NotAComputeNode,
        ExclusionReason::NoMonitoredQueues,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ExclusionReason::DownOrOffline => "down_or_offline",
            ExclusionReason::NotAComputeNode => "not_a_compute_node",
            ExclusionReason::NoMonitoredQueues => "no_monitored_queues",
        }
    }
}

/// Outcome of classifying one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Included(PoolKind),
    Excluded(ExclusionReason),
}

impl Classification {
    pub fn is_included(&self) -> bool {
        matches!(self, Classification::Included(_))
    }

    pub fn pool(&self) -> Option<PoolKind> {
        match self {
            Classification::Included(pool) => Some(*pool),
            Classification::Excluded(_) => None,
        }
    }

    pub fn reason(&self) -> Option<ExclusionReason> {
        match self {
            Classification::Included(_) => None,
            Classification::Excluded(reason) => Some(*reason),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AcceleratorMatcher {
    Queue(String),
    NamePattern(Regex),
}

impl AcceleratorMatcher {
    fn matches(&self, node: &NodeRecord) -> bool {
        match self {
            AcceleratorMatcher::Queue(queue) => node.serves(queue),
            AcceleratorMatcher::NamePattern(pattern) => pattern.is_match(&node.name),
        }
    }
}

/// Classification policy: how accelerators are detected and which
/// queues count as monitored.
#[derive(Debug, Clone)]
pub struct ClassifierPolicy {
    pub accelerator: AcceleratorMatcher,
    pub monitored: BTreeSet<String>,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            accelerator: AcceleratorMatcher::Queue(ACCELERATOR_QUEUE.to_string()),
            monitored: MONITORED_QUEUES.iter().map(|q| q.to_string()).collect(),
        }
    }
}

impl ClassifierPolicy {
    pub fn from_config(config: &PolicyConfig) -> Result<Self, regex::Error> {
        let accelerator = match config.accelerator_detection {
            AcceleratorDetection::Queue => AcceleratorMatcher::Queue(config.accelerator_queue.clone()),
            AcceleratorDetection::NamePattern => {
                AcceleratorMatcher::NamePattern(Regex::new(&config.accelerator_name_pattern)?)
            }
        };
        Ok(Self {
            accelerator,
            monitored: config.monitored_queues.iter().cloned().collect(),
        })
    }

    pub fn classify(&self, node: &NodeRecord) -> Classification {
        if node.state.is_unavailable() {
            return Classification::Excluded(ExclusionReason::DownOrOffline);
        }
        if !node.kind.is_compute() {
            return Classification::Excluded(ExclusionReason::NotAComputeNode);
        }
        if self.accelerator.matches(node) {
            return Classification::Included(PoolKind::Accelerator);
        }
        if node.queues.is_empty() || node.queues.iter().any(|q| self.monitored.contains(q)) {
            return Classification::Included(PoolKind::General);
        }
        Classification::Excluded(ExclusionReason::NoMonitoredQueues)
    }

    /// The pool a node would belong to, judged by the detection rule
    /// alone. Used to attribute offline nodes.
    pub fn infer_pool(&self, node: &NodeRecord) -> PoolKind {
        if self.accelerator.matches(node) {
            PoolKind::Accelerator
        } else {
            PoolKind::General
        }
    }
}
