//! Node records and the small closed vocabularies used to classify them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single recognized node state flag.
///
/// PBS reports state as a comma-joined list (`job-busy,offline`); each
/// entry is parsed once into one of these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateFlag {
    Free,
    Busy,
    Offline,
    Down,
    /// `state-unknown`: the server has lost contact with the node.
    Unknown,
    Other,
}

impl StateFlag {
    pub fn parse(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "free" => StateFlag::Free,
            "busy" | "job-busy" | "job-exclusive" | "job-sharing" | "resv-exclusive" => {
                StateFlag::Busy
            }
            "offline" => StateFlag::Offline,
            "down" => StateFlag::Down,
            "state-unknown" | "unknown" => StateFlag::Unknown,
            _ => StateFlag::Other,
        }
    }

    /// Whether this flag makes the node unavailable for new work.
    pub fn is_unavailable(self) -> bool {
        matches!(self, StateFlag::Offline | StateFlag::Down | StateFlag::Unknown)
    }
}

/// Node state: the raw reported value plus its parsed flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub raw: String,
    pub flags: BTreeSet<StateFlag>,
}

impl NodeState {
    /// Parse a comma-joined state value such as `job-busy,offline`.
    pub fn parse(raw: &str) -> Self {
        Self::from_flags(raw.split(','))
    }

    /// Build a state from individual flag strings (the JSON list form).
    pub fn from_flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = flags
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        Self {
            flags: names.iter().map(|f| StateFlag::parse(f)).collect(),
            raw: names.join(","),
        }
    }

    pub fn contains(&self, flag: StateFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// True when any flag marks the node down, offline, or unreachable.
    pub fn is_unavailable(&self) -> bool {
        self.flags.iter().any(|f| f.is_unavailable())
    }
}

/// Declared node category (`resources_available.vntype`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    GeneralCompute,
    Accelerator,
    /// Login, storage, management, or a missing vntype.
    #[default]
    Unrecognized,
}

impl NodeKind {
    pub fn parse(vntype: &str) -> Self {
        match vntype.trim() {
            "compute_vnode" => NodeKind::GeneralCompute,
            "gpu_vnode" => NodeKind::Accelerator,
            _ => NodeKind::Unrecognized,
        }
    }

    pub fn is_compute(&self) -> bool {
        matches!(self, NodeKind::GeneralCompute | NodeKind::Accelerator)
    }
}

/// Aggregation bucket a node's resources are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    General,
    Accelerator,
}

impl PoolKind {
    pub fn label(&self) -> &'static str {
        match self {
            PoolKind::General => "general",
            PoolKind::Accelerator => "accelerator",
        }
    }
}

/// One node as reported by the inventory snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub state: NodeState,
    pub kind: NodeKind,
    /// Queues the node advertises (`resources_available.Qlist`).
    pub queues: Vec<String>,
    pub cores_available: u32,
    pub cores_assigned: u32,
    pub memory_available_mb: f64,
    pub memory_assigned_mb: f64,
    pub accelerators_available: u32,
    pub accelerators_assigned: u32,
    /// Distinct job identifiers running on the node.
    pub job_tags: BTreeSet<String>,
}

impl NodeRecord {
    /// An empty record: no state, unrecognized kind, zero resources.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: NodeState::default(),
            kind: NodeKind::default(),
            queues: Vec::new(),
            cores_available: 0,
            cores_assigned: 0,
            memory_available_mb: 0.0,
            memory_assigned_mb: 0.0,
            accelerators_available: 0,
            accelerators_assigned: 0,
            job_tags: BTreeSet::new(),
        }
    }

    /// Unassigned cores, clamped at zero when the source over-reports assignment.
    pub fn free_cores(&self) -> u32 {
        self.cores_available.saturating_sub(self.cores_assigned)
    }

    pub fn free_memory_mb(&self) -> f64 {
        (self.memory_available_mb - self.memory_assigned_mb).max(0.0)
    }

    pub fn serves(&self, queue: &str) -> bool {
        self.queues.iter().any(|q| q == queue)
    }

    pub fn serves_any<S: AsRef<str>>(&self, queues: &[S]) -> bool {
        queues.iter().any(|q| self.serves(q.as_ref()))
    }
}
