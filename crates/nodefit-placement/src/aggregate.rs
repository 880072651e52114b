//! Capacity aggregation for the utilization report.
//!
//! A single pass folds every classified node into its pool. Offline
//! nodes are attributed to the pool their queues (or name) imply.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, trace};

use nodefit_core::config::PoolingMode;
use nodefit_core::{NodeRecord, PoolKind};

use crate::classify::{Classification, ClassifierPolicy, ExclusionReason};

/// Utilization at or above this percentage is shown as a warning.
pub const WARNING_THRESHOLD: f64 = 50.0;
/// Utilization above this percentage is critical.
pub const CRITICAL_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationTier {
    Normal,
    Warning,
    Critical,
}

impl UtilizationTier {
    pub fn for_percent(percent: f64) -> Self {
        if percent < WARNING_THRESHOLD {
            UtilizationTier::Normal
        } else if percent <= CRITICAL_THRESHOLD {
            UtilizationTier::Warning
        } else {
            UtilizationTier::Critical
        }
    }
}

/// Assigned vs. available for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Utilization {
    pub used: f64,
    pub total: f64,
    pub percent: f64,
    pub tier: UtilizationTier,
}

impl Utilization {
    /// `used / total * 100`; zero (not a division fault) when nothing is available.
    pub fn new(used: f64, total: f64) -> Self {
        if total > 0.0 {
            let percent = used / total * 100.0;
            Self {
                used,
                total,
                percent,
                tier: UtilizationTier::for_percent(percent),
            }
        } else {
            Self {
                used: 0.0,
                total: 0.0,
                percent: 0.0,
                tier: UtilizationTier::Normal,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total <= 0.0
    }
}

/// Running totals for one pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourcePool {
    pub included_nodes: u32,
    pub offline_nodes: u32,
    pub cores_available: u64,
    pub cores_assigned: u64,
    pub memory_available_mb: f64,
    pub memory_assigned_mb: f64,
    pub accelerators_available: u64,
    pub accelerators_assigned: u64,
    pub job_tags: BTreeSet<String>,
}

impl ResourcePool {
    fn add(&mut self, node: &NodeRecord, count_accelerators: bool) {
        self.included_nodes += 1;
        self.cores_available += u64::from(node.cores_available);
        self.cores_assigned += u64::from(node.cores_assigned);
        self.memory_available_mb += node.memory_available_mb;
        self.memory_assigned_mb += node.memory_assigned_mb;
        if count_accelerators {
            self.accelerators_available += u64::from(node.accelerators_available);
            self.accelerators_assigned += u64::from(node.accelerators_assigned);
        }
        self.job_tags.extend(node.job_tags.iter().cloned());
    }

    pub fn total_nodes(&self) -> u32 {
        self.included_nodes + self.offline_nodes
    }

    pub fn is_empty(&self) -> bool {
        self.total_nodes() == 0
    }

    pub fn cores(&self) -> Utilization {
        Utilization::new(self.cores_assigned as f64, self.cores_available as f64)
    }

    pub fn memory(&self) -> Utilization {
        Utilization::new(self.memory_assigned_mb, self.memory_available_mb)
    }

    pub fn accelerators(&self) -> Utilization {
        Utilization::new(
            self.accelerators_assigned as f64,
            self.accelerators_available as f64,
        )
    }

    pub fn job_count(&self) -> usize {
        self.job_tags.len()
    }
}

/// Nodes left out of the totals, grouped by reason in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExclusionLedger {
    entries: BTreeMap<ExclusionReason, Vec<String>>,
}

impl ExclusionLedger {
    fn record(&mut self, reason: ExclusionReason, node: &str) {
        self.entries.entry(reason).or_default().push(node.to_string());
    }

    pub fn count(&self, reason: ExclusionReason) -> usize {
        self.entries.get(&reason).map_or(0, Vec::len)
    }

    pub fn nodes(&self, reason: ExclusionReason) -> &[String] {
        self.entries.get(&reason).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExclusionReason, &[String])> {
        self.entries.iter().map(|(reason, nodes)| (*reason, nodes.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub pooling: PoolingMode,
    pub total_nodes: usize,
    pub general: ResourcePool,
    pub accelerator: ResourcePool,
    pub exclusions: ExclusionLedger,
}

impl ClusterSummary {
    pub fn pool(&self, kind: PoolKind) -> &ResourcePool {
        match kind {
            PoolKind::General => &self.general,
            PoolKind::Accelerator => &self.accelerator,
        }
    }

    pub fn offline_nodes(&self) -> u32 {
        self.general.offline_nodes + self.accelerator.offline_nodes
    }
}

/// Classify and fold every node into pool totals.
pub fn aggregate(
    nodes: &[NodeRecord],
    policy: &ClassifierPolicy,
    pooling: PoolingMode,
) -> ClusterSummary {
    let mut general = ResourcePool::default();
    let mut accelerator = ResourcePool::default();
    let mut exclusions = ExclusionLedger::default();

    let target = |kind: PoolKind| match (pooling, kind) {
        (PoolingMode::Separate, PoolKind::Accelerator) => PoolKind::Accelerator,
        _ => PoolKind::General,
    };

    for node in nodes {
        let classification = policy.classify(node);
        trace!(node = %node.name, ?classification, "classified");

        match classification {
            Classification::Included(kind) => {
                let pool = match target(kind) {
                    PoolKind::General => &mut general,
                    PoolKind::Accelerator => &mut accelerator,
                };
                pool.add(node, kind == PoolKind::Accelerator);
            }
            Classification::Excluded(reason) => {
                if reason == ExclusionReason::DownOrOffline {
                    match target(policy.infer_pool(node)) {
                        PoolKind::General => general.offline_nodes += 1,
                        PoolKind::Accelerator => accelerator.offline_nodes += 1,
                    }
                }
                exclusions.record(reason, &node.name);
            }
        }
    }

    debug!(
        nodes = nodes.len(),
        general = general.included_nodes,
        accelerator = accelerator.included_nodes,
        excluded = exclusions.total(),
        "aggregated cluster capacity"
    );

    ClusterSummary {
        pooling,
        total_nodes: nodes.len(),
        general,
        accelerator,
        exclusions,
    }
}
