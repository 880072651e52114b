//! Queue eligibility for a requested footprint.

use serde::Serialize;
use tracing::debug;

use nodefit_core::{QUEUE_TABLE, QueueSpec};

/// Queues that admit a footprint, plus the recommendation drawn from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSelection {
    pub eligible: Vec<&'static QueueSpec>,
    /// Highest-priority eligible regular queue.
    pub preferred: Option<&'static QueueSpec>,
    /// Time-limited queue that also admits the footprint. Advertised
    /// next to `preferred` rather than ranked against it.
    pub low_latency: Option<&'static QueueSpec>,
}

impl QueueSelection {
    /// True when no queue admits the footprint.
    pub fn is_rejected(&self) -> bool {
        self.eligible.is_empty()
    }

    pub fn eligible_names(&self) -> Vec<&'static str> {
        self.eligible.iter().map(|q| q.name).collect()
    }
}

/// Evaluate the built-in queue table.
pub fn resolve_queues(cores: u32, memory_gb: f64) -> QueueSelection {
    resolve_in(QUEUE_TABLE, cores, memory_gb)
}

/// Evaluate every queue in `table` independently.
pub fn resolve_in(table: &'static [QueueSpec], cores: u32, memory_gb: f64) -> QueueSelection {
    let eligible: Vec<&'static QueueSpec> =
        table.iter().filter(|q| q.admits(cores, memory_gb)).collect();

    let preferred = eligible
        .iter()
        .copied()
        .filter(|q| q.is_regular())
        .max_by_key(|q| q.priority);
    let low_latency = eligible.iter().copied().find(|q| !q.is_regular());

    debug!(
        cores,
        memory_gb,
        eligible = ?eligible.iter().map(|q| q.name).collect::<Vec<_>>(),
        preferred = preferred.map(|q| q.name),
        "resolved queue eligibility"
    );

    QueueSelection {
        eligible,
        preferred,
        low_latency,
    }
}
