//! nodefit engine: classification, aggregation, eligibility, ranking.
//!
//! This crate turns a parsed inventory snapshot into answers. It does NOT
//! fetch or parse snapshots (that's `nodefit-inventory`) and never
//! touches the scheduler; everything here is a pure function of its
//! inputs.
//!
//! # Components
//!
//! - **`classify`**: Node classifier (pool or exclusion reason)
//! - **`aggregate`**: Per-pool capacity totals and the exclusion ledger
//! - **`eligibility`**: Queue limits applied to a footprint
//! - **`scorer`**: Fractional-fit scoring and usefulness floors
//! - **`search`**: Availability search, diagnosis and alternatives
//! - **`convert`**: Node records to placement capacities

pub mod aggregate;
pub mod classify;
pub mod convert;
pub mod eligibility;
pub mod scorer;
pub mod search;

pub use aggregate::{ClusterSummary, ExclusionLedger, ResourcePool, Utilization, UtilizationTier, aggregate};
pub use classify::{AcceleratorMatcher, Classification, ClassifierPolicy, ExclusionReason};
pub use convert::{node_capacity, placement_candidates};
pub use eligibility::{QueueSelection, resolve_queues};
pub use scorer::{NodeCapacity, NodeScore, rank_nodes, score_node};
pub use search::{
    Alternative, Availability, LimitingFactor, PlacementAdvice, PracticalFit, diagnose, find_available,
    practical_fit, search,
};
