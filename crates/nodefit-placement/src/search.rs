//! Availability search: coordinates eligibility, candidates and scoring.
//!
//! Given a snapshot and a request, the search decides:
//! 1. Which candidate nodes can take the whole request right now
//! 2. If none, what is limiting and which nodes come closest
//! 3. For each close node, what the request formula could actually run there

use serde::Serialize;
use tracing::{debug, info};

use nodefit_core::config::RankingStrategy;
use nodefit_core::units::whole_gb;
use nodefit_core::{MemoryFormula, NodeRecord, PlacementRequest};

use crate::classify::ClassifierPolicy;
use crate::convert::placement_candidates;
use crate::eligibility::QueueSelection;
use crate::scorer::{NodeCapacity, rank_nodes, viable_nodes};

/// Which resource keeps the request from fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingFactor {
    /// Some node has the memory, none has the cores.
    Cores,
    /// Some node has the cores, none has the memory.
    Memory,
    /// No node clears either resource on its own.
    Both,
    /// Each resource clears somewhere, never on the same node.
    Combination,
}

/// Candidates that can take the whole request, most free cores first.
pub fn find_available(nodes: &[NodeCapacity], req: &PlacementRequest) -> Vec<NodeCapacity> {
    let mut fitting: Vec<NodeCapacity> = nodes.iter().filter(|n| n.fits(req)).cloned().collect();
    fitting.sort_by(|a, b| b.free_cores.cmp(&a.free_cores));
    fitting
}

pub fn diagnose(nodes: &[NodeCapacity], req: &PlacementRequest) -> LimitingFactor {
    let cores_clear = nodes.iter().any(|n| n.has_cores_for(req));
    let memory_clears = nodes.iter().any(|n| n.has_memory_for(req));
    match (cores_clear, memory_clears) {
        (true, false) => LimitingFactor::Memory,
        (false, true) => LimitingFactor::Cores,
        (false, false) => LimitingFactor::Both,
        (true, true) => LimitingFactor::Combination,
    }
}

/// What the request formula could run on a node, sized by its memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PracticalFit {
    pub cores: u32,
    pub memory_gb: u64,
}

/// Largest formula-sized job that fits the node's free whole gigabytes
/// and free cores. `None` when not even one core fits.
pub fn practical_fit(node: &NodeCapacity, formula: &MemoryFormula) -> Option<PracticalFit> {
    let free_gb = whole_gb(node.free_memory_mb) as f64;
    let cores = formula.cores_for(free_gb).min(node.free_cores);
    if cores == 0 {
        return None;
    }
    Some(PracticalFit {
        cores,
        memory_gb: formula.memory_for(cores).floor() as u64,
    })
}

/// A ranked near-miss.
#[derive(Debug, Clone, Serialize)]
pub struct Alternative {
    pub node: NodeCapacity,
    pub score: f64,
    pub practical: Option<PracticalFit>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Availability {
    /// No included node serves any eligible queue.
    NoCandidates,
    Fits { nodes: Vec<NodeCapacity> },
    NoFit {
        limiting: LimitingFactor,
        /// Memory floor the alternatives cleared; `None` when none did.
        floor_gb: Option<f64>,
        alternatives: Vec<Alternative>,
    },
}

impl Availability {
    pub fn fits(&self) -> bool {
        matches!(self, Availability::Fits { .. })
    }
}

/// Search the candidate set for the request.
pub fn search(
    nodes: &[NodeCapacity],
    req: &PlacementRequest,
    formula: &MemoryFormula,
    strategy: RankingStrategy,
) -> Availability {
    if nodes.is_empty() {
        return Availability::NoCandidates;
    }

    let fitting = find_available(nodes, req);
    if !fitting.is_empty() {
        info!(fitting = fitting.len(), cores = req.cores, memory_gb = req.memory_gb, "request fits");
        return Availability::Fits { nodes: fitting };
    }

    let limiting = diagnose(nodes, req);
    let Some((floor_gb, viable)) = viable_nodes(nodes) else {
        info!(?limiting, "no node fits and none is worth suggesting");
        return Availability::NoFit {
            limiting,
            floor_gb: None,
            alternatives: Vec::new(),
        };
    };

    let alternatives: Vec<Alternative> = rank_nodes(&viable, req, strategy)
        .into_iter()
        .map(|scored| {
            let practical = practical_fit(&scored.node, formula);
            debug!(
                node = %scored.node.node_id,
                score = scored.score,
                practical_cores = practical.map(|p| p.cores),
                "ranked alternative"
            );
            Alternative {
                node: scored.node,
                score: scored.score,
                practical,
            }
        })
        .collect();

    info!(?limiting, floor_gb, alternatives = alternatives.len(), "request does not fit");
    Availability::NoFit {
        limiting,
        floor_gb: Some(floor_gb),
        alternatives,
    }
}

/// Full answer for one `check`: the request, its queues and what the
/// cluster can do with it.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementAdvice {
    pub request: PlacementRequest,
    pub queues: QueueSelection,
    pub candidates: usize,
    pub availability: Availability,
}

impl PlacementAdvice {
    /// Select candidates from the snapshot and search them.
    pub fn evaluate(
        records: &[NodeRecord],
        policy: &ClassifierPolicy,
        request: PlacementRequest,
        queues: QueueSelection,
        formula: &MemoryFormula,
        strategy: RankingStrategy,
    ) -> Self {
        let nodes = placement_candidates(records, policy, &queues);
        let availability = search(&nodes, &request, formula, strategy);
        Self {
            request,
            queues,
            candidates: nodes.len(),
            availability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(id: &str, free_cores: u32, free_gb: f64) -> NodeCapacity {
        NodeCapacity {
            node_id: id.to_string(),
            free_cores,
            free_memory_mb: free_gb * 1024.0,
            total_cores: 64,
            total_memory_mb: 256.0 * 1024.0,
        }
    }

    fn req(cores: u32, memory_gb: f64) -> PlacementRequest {
        PlacementRequest::new(cores, memory_gb).unwrap()
    }

    #[test]
    fn available_sorted_by_free_cores() {
        let nodes = vec![
            make_node("n1", 8, 64.0),
            make_node("n2", 32, 64.0),
            make_node("n3", 2, 64.0),
            make_node("n4", 32, 16.0),
        ];
        let fitting = find_available(&nodes, &req(4, 10.0));
        let ids: Vec<&str> = fitting.iter().map(|n| n.node_id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n4", "n1"]);
    }

    #[test]
    fn fit_boundaries_are_inclusive() {
        let nodes = vec![make_node("n1", 4, 10.0)];
        assert_eq!(find_available(&nodes, &req(4, 10.0)).len(), 1);
    }

    #[test]
    fn diagnosis_outcomes() {
        let r = req(8, 20.0);
        assert_eq!(diagnose(&[make_node("a", 4, 64.0)], &r), LimitingFactor::Cores);
        assert_eq!(diagnose(&[make_node("a", 16, 8.0)], &r), LimitingFactor::Memory);
        assert_eq!(diagnose(&[make_node("a", 4, 8.0)], &r), LimitingFactor::Both);
        assert_eq!(
            diagnose(&[make_node("a", 16, 8.0), make_node("b", 4, 64.0)], &r),
            LimitingFactor::Combination
        );
    }

    #[test]
    fn practical_fit_uses_formula() {
        let f = MemoryFormula::default();
        // floor((10 - 4) / 1.5) = 4 cores -> 10 GB
        assert_eq!(
            practical_fit(&make_node("n1", 16, 10.7), &f),
            Some(PracticalFit { cores: 4, memory_gb: 10 })
        );
        // capped by free cores: 2 cores -> int(7.0) = 7 GB
        assert_eq!(
            practical_fit(&make_node("n1", 2, 10.0), &f),
            Some(PracticalFit { cores: 2, memory_gb: 7 })
        );
        // memory is truncated: 3 cores -> int(8.5) = 8 GB
        assert_eq!(
            practical_fit(&make_node("n1", 3, 64.0), &f),
            Some(PracticalFit { cores: 3, memory_gb: 8 })
        );
    }

    #[test]
    fn practical_fit_none_when_overhead_exceeds_memory() {
        let f = MemoryFormula::default();
        assert_eq!(practical_fit(&make_node("n1", 16, 5.0), &f), None);
        assert_eq!(practical_fit(&make_node("n1", 16, 3.0), &f), None);
    }

    #[test]
    fn search_reports_fit() {
        let nodes = vec![make_node("n1", 8, 64.0)];
        let outcome = search(&nodes, &req(4, 10.0), &MemoryFormula::default(), RankingStrategy::default());
        assert!(outcome.fits());
    }

    #[test]
    fn search_with_no_candidates() {
        let outcome = search(&[], &req(4, 10.0), &MemoryFormula::default(), RankingStrategy::default());
        assert!(matches!(outcome, Availability::NoCandidates));
    }

    #[test]
    fn search_without_viable_nodes() {
        let nodes = vec![make_node("n1", 0, 200.0), make_node("n2", 16, 1.0)];
        match search(&nodes, &req(4, 10.0), &MemoryFormula::default(), RankingStrategy::default()) {
            Availability::NoFit {
                limiting,
                floor_gb,
                alternatives,
            } => {
                assert_eq!(limiting, LimitingFactor::Combination);
                assert_eq!(floor_gb, None);
                assert!(alternatives.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
