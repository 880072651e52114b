//! Node scoring for placement alternatives.
//!
//! When no node can take the whole request, candidates are ranked by how
//! much of it they could take:
//! - **Fractional fit** (default): `min(core fraction, memory fraction) * 1000 + free cores`,
//!   each fraction capped at 1.0
//! - **Capacity**: plain free cores, then free memory, descending
//!
//! Nodes below a usefulness floor (some free cores and at least 5 GB free
//! memory, relaxed once to 2 GB) are not ranked at all.

use serde::Serialize;

use nodefit_core::PlacementRequest;
use nodefit_core::config::RankingStrategy;

/// Minimum free memory for a node to be worth suggesting.
pub const VIABLE_MEMORY_FLOOR_GB: f64 = 5.0;
/// Fallback floor used when no node clears [`VIABLE_MEMORY_FLOOR_GB`].
pub const RELAXED_MEMORY_FLOOR_GB: f64 = 2.0;
/// Most alternatives ever returned.
pub const MAX_ALTERNATIVES: usize = 5;

const MB_PER_GB: f64 = 1024.0;

/// Free and total capacity of one candidate node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCapacity {
    pub node_id: String,
    pub free_cores: u32,
    pub free_memory_mb: f64,
    pub total_cores: u32,
    pub total_memory_mb: f64,
}

impl NodeCapacity {
    pub fn free_memory_gb(&self) -> f64 {
        self.free_memory_mb / MB_PER_GB
    }

    pub fn has_cores_for(&self, req: &PlacementRequest) -> bool {
        self.free_cores >= req.cores
    }

    pub fn has_memory_for(&self, req: &PlacementRequest) -> bool {
        self.free_memory_mb >= req.memory_mb()
    }

    /// Both resources clear the request on this node.
    pub fn fits(&self, req: &PlacementRequest) -> bool {
        self.has_cores_for(req) && self.has_memory_for(req)
    }

    fn is_viable(&self, floor_gb: f64) -> bool {
        self.free_cores > 0 && self.free_memory_mb >= floor_gb * MB_PER_GB
    }
}

/// Scored alternative for a single node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeScore {
    pub node: NodeCapacity,
    /// Higher is better.
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Individual score components.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreBreakdown {
    /// Share of the requested cores the node has free, capped at 1.0.
    pub core_fraction: f64,
    /// Share of the requested memory the node has free, capped at 1.0.
    pub memory_fraction: f64,
}

/// Score one node against the request.
pub fn score_node(node: &NodeCapacity, req: &PlacementRequest) -> NodeScore {
    let core_fraction = (f64::from(node.free_cores) / f64::from(req.cores)).min(1.0);
    let memory_fraction = (node.free_memory_gb() / req.memory_gb).min(1.0);
    let score = core_fraction.min(memory_fraction) * 1000.0 + f64::from(node.free_cores);

    NodeScore {
        node: node.clone(),
        score,
        breakdown: ScoreBreakdown {
            core_fraction,
            memory_fraction,
        },
    }
}

/// Nodes worth suggesting, and the memory floor that selected them.
///
/// Returns `None` when no node clears even the relaxed floor.
pub fn viable_nodes(nodes: &[NodeCapacity]) -> Option<(f64, Vec<&NodeCapacity>)> {
    [VIABLE_MEMORY_FLOOR_GB, RELAXED_MEMORY_FLOOR_GB]
        .into_iter()
        .map(|floor| {
            let viable: Vec<&NodeCapacity> = nodes.iter().filter(|n| n.is_viable(floor)).collect();
            (floor, viable)
        })
        .find(|(_, viable)| !viable.is_empty())
}

/// Score the given nodes and return them best first, at most
/// [`MAX_ALTERNATIVES`] long. Ties keep input order.
pub fn rank_nodes(
    nodes: &[&NodeCapacity],
    req: &PlacementRequest,
    strategy: RankingStrategy,
) -> Vec<NodeScore> {
    let mut scores: Vec<NodeScore> = nodes.iter().map(|n| score_node(n, req)).collect();

    match strategy {
        RankingStrategy::FractionalFit => {
            scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        }
        RankingStrategy::Capacity => {
            scores.sort_by(|a, b| {
                b.node.free_cores.cmp(&a.node.free_cores).then(
                    b.node
                        .free_memory_mb
                        .partial_cmp(&a.node.free_memory_mb)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
            });
        }
    }

    scores.truncate(MAX_ALTERNATIVES);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(id: &str, free_cores: u32, free_gb: f64) -> NodeCapacity {
        NodeCapacity {
            node_id: id.to_string(),
            free_cores,
            free_memory_mb: free_gb * MB_PER_GB,
            total_cores: 64,
            total_memory_mb: 256.0 * MB_PER_GB,
        }
    }

    fn req(cores: u32, memory_gb: f64) -> PlacementRequest {
        PlacementRequest::new(cores, memory_gb).unwrap()
    }

    #[test]
    fn core_limited_score() {
        let s = score_node(&make_node("n1", 2, 10.0), &req(4, 8.0));
        assert_eq!(s.breakdown.core_fraction, 0.5);
        assert_eq!(s.breakdown.memory_fraction, 1.0);
        assert_eq!(s.score, 502.0);
    }

    #[test]
    fn fractions_are_capped() {
        let s = score_node(&make_node("n1", 64, 200.0), &req(4, 8.0));
        assert_eq!(s.score, 1000.0 + 64.0);
    }

    #[test]
    fn memory_fraction_uses_gigabytes() {
        let s = score_node(&make_node("n1", 8, 6.0), &req(8, 12.0));
        assert_eq!(s.breakdown.memory_fraction, 0.5);
        assert_eq!(s.score, 508.0);
    }

    #[test]
    fn fits_checks_both_resources() {
        let r = req(4, 10.0);
        assert!(make_node("n1", 4, 10.0).fits(&r));
        assert!(!make_node("n2", 3, 64.0).fits(&r));
        assert!(!make_node("n3", 32, 9.5).fits(&r));
    }

    #[test]
    fn viable_uses_default_floor_first() {
        let nodes = vec![make_node("n1", 4, 6.0), make_node("n2", 4, 3.0)];
        let (floor, viable) = viable_nodes(&nodes).unwrap();
        assert_eq!(floor, VIABLE_MEMORY_FLOOR_GB);
        assert_eq!(viable.len(), 1);
        assert_eq!(viable[0].node_id, "n1");
    }

    #[test]
    fn viable_relaxes_floor_once() {
        let nodes = vec![make_node("n1", 4, 3.0), make_node("n2", 4, 1.0)];
        let (floor, viable) = viable_nodes(&nodes).unwrap();
        assert_eq!(floor, RELAXED_MEMORY_FLOOR_GB);
        assert_eq!(viable.len(), 1);
    }

    #[test]
    fn viable_requires_free_cores() {
        let nodes = vec![make_node("n1", 0, 100.0), make_node("n2", 2, 1.5)];
        assert!(viable_nodes(&nodes).is_none());
    }

    #[test]
    fn rank_nodes_returns_sorted() {
        let nodes = [
            make_node("n1", 1, 50.0),  // 250 + 1
            make_node("n2", 3, 50.0),  // 750 + 3
            make_node("n3", 2, 50.0),  // 500 + 2
        ];
        let refs: Vec<&NodeCapacity> = nodes.iter().collect();
        let ranked = rank_nodes(&refs, &req(4, 8.0), RankingStrategy::FractionalFit);

        let ids: Vec<&str> = ranked.iter().map(|s| s.node.node_id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n3", "n1"]);
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn balanced_node_beats_lopsided_one() {
        // Many cores but little memory loses to a smaller, balanced node.
        let nodes = [make_node("wide", 64, 5.0), make_node("even", 16, 40.0)];
        let refs: Vec<&NodeCapacity> = nodes.iter().collect();
        let ranked = rank_nodes(&refs, &req(32, 52.0), RankingStrategy::FractionalFit);
        assert_eq!(ranked[0].node.node_id, "even");

        let ranked = rank_nodes(&refs, &req(32, 52.0), RankingStrategy::Capacity);
        assert_eq!(ranked[0].node.node_id, "wide");
    }

    #[test]
    fn capacity_strategy_breaks_ties_on_memory() {
        let nodes = [make_node("n1", 8, 10.0), make_node("n2", 8, 20.0)];
        let refs: Vec<&NodeCapacity> = nodes.iter().collect();
        let ranked = rank_nodes(&refs, &req(16, 28.0), RankingStrategy::Capacity);
        assert_eq!(ranked[0].node.node_id, "n2");
    }

    #[test]
    fn ties_keep_input_order() {
        let nodes = [make_node("a", 2, 50.0), make_node("b", 2, 50.0), make_node("c", 2, 50.0)];
        let refs: Vec<&NodeCapacity> = nodes.iter().collect();
        let ranked = rank_nodes(&refs, &req(4, 8.0), RankingStrategy::FractionalFit);
        let ids: Vec<&str> = ranked.iter().map(|s| s.node.node_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn at_most_five_alternatives() {
        let nodes: Vec<NodeCapacity> = (0..8).map(|i| make_node(&format!("n{i}"), i + 1, 50.0)).collect();
        let refs: Vec<&NodeCapacity> = nodes.iter().collect();
        let ranked = rank_nodes(&refs, &req(16, 8.0), RankingStrategy::FractionalFit);
        assert_eq!(ranked.len(), MAX_ALTERNATIVES);
        assert_eq!(ranked[0].node.node_id, "n7");
    }
}
