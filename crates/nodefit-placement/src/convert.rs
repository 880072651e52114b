//! Conversions from inventory records to placement inputs.
//!
//! Bridges `nodefit_core::NodeRecord` to the scorer's [`NodeCapacity`],
//! and selects the records that may host a request at all.

use tracing::debug;

use nodefit_core::NodeRecord;

use crate::classify::ClassifierPolicy;
use crate::eligibility::QueueSelection;
use crate::scorer::NodeCapacity;

/// Convert a [`NodeRecord`] to its free/total capacity.
pub fn node_capacity(node: &NodeRecord) -> NodeCapacity {
    NodeCapacity {
        node_id: node.name.clone(),
        free_cores: node.free_cores(),
        free_memory_mb: node.free_memory_mb(),
        total_cores: node.cores_available,
        total_memory_mb: node.memory_available_mb,
    }
}

/// Included nodes that serve at least one eligible queue, in inventory order.
pub fn placement_candidates(
    records: &[NodeRecord],
    policy: &ClassifierPolicy,
    queues: &QueueSelection,
) -> Vec<NodeCapacity> {
    let eligible = queues.eligible_names();
    let candidates: Vec<NodeCapacity> = records
        .iter()
        .filter(|n| policy.classify(n).is_included() && n.serves_any(&eligible))
        .map(node_capacity)
        .collect();

    debug!(
        records = records.len(),
        candidates = candidates.len(),
        eligible = ?eligible,
        "selected placement candidates"
    );
    candidates
}
