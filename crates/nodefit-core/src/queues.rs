//! The cluster's scheduling queues and their static admission limits.

use serde::Serialize;

/// Queues whose nodes count toward general compute capacity.
pub const MONITORED_QUEUES: &[&str] = &[
    "smallq",
    "mediumq",
    "largeq",
    "expressq",
    "bigmemq",
    "commercialq",
    "specialq",
    "benchmarkq",
];

/// Queue served by accelerator (GPU) nodes.
pub const ACCELERATOR_QUEUE: &str = "gpuq";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum QueueClass {
    /// Competes for the preferred-queue ranking.
    Regular,
    /// Time-limited queue advertised alongside the best regular queue.
    LowLatency { walltime_hours: u32 },
}

/// One row of the queue-limit table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueueSpec {
    pub name: &'static str,
    pub max_cores: u32,
    pub max_memory_gb: f64,
    /// Inclusive lower bound for high-memory-only queues.
    pub min_memory_gb: Option<f64>,
    /// Higher wins among eligible regular queues.
    pub priority: u32,
    pub class: QueueClass,
}

impl QueueSpec {
    /// Whether the queue's limits admit the footprint (all bounds inclusive).
    pub fn admits(&self, cores: u32, memory_gb: f64) -> bool {
        cores <= self.max_cores
            && memory_gb <= self.max_memory_gb
            && self.min_memory_gb.is_none_or(|min| memory_gb >= min)
    }

    pub fn is_regular(&self) -> bool {
        self.class == QueueClass::Regular
    }

    /// Short name shown to users (`smallq` → `small`).
    pub fn display_name(&self) -> &'static str {
        display_queue_name(self.name)
    }
}

/// Drop the trailing `q` PBS queue names carry.
pub fn display_queue_name(name: &str) -> &str {
    name.strip_suffix('q').unwrap_or(name)
}

pub const QUEUE_TABLE: &[QueueSpec] = &[
    QueueSpec {
        name: "expressq",
        max_cores: 4,
        max_memory_gb: 16.0,
        min_memory_gb: None,
        priority: 0,
        class: QueueClass::LowLatency { walltime_hours: 4 },
    },
    QueueSpec {
        name: "smallq",
        max_cores: 8,
        max_memory_gb: 4.0,
        min_memory_gb: None,
        priority: 4,
        class: QueueClass::Regular,
    },
    QueueSpec {
        name: "mediumq",
        max_cores: 16,
        max_memory_gb: 16.0,
        min_memory_gb: None,
        priority: 3,
        class: QueueClass::Regular,
    },
    QueueSpec {
        name: "largeq",
        max_cores: 128,
        max_memory_gb: 120.0,
        min_memory_gb: None,
        priority: 2,
        class: QueueClass::Regular,
    },
    QueueSpec {
        name: "bigmemq",
        max_cores: 32,
        max_memory_gb: 500.0,
        min_memory_gb: Some(130.0),
        priority: 1,
        class: QueueClass::Regular,
    },
];

pub fn queue(name: &str) -> Option<&'static QueueSpec> {
    QUEUE_TABLE.iter().find(|q| q.name == name)
}

/// The regular queue with the highest core ceiling, used to size
/// requests when no core count is given.
pub fn largest_regular_queue() -> &'static QueueSpec {
    QUEUE_TABLE
        .iter()
        .filter(|q| q.is_regular())
        .max_by_key(|q| q.max_cores)
        .unwrap_or(&QUEUE_TABLE[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_inclusive() {
        let small = queue("smallq").unwrap();
        assert!(small.admits(8, 4.0));
        assert!(!small.admits(9, 4.0));
        assert!(!small.admits(8, 4.01));
    }

    #[test]
    fn bigmem_enforces_minimum() {
        let bigmem = queue("bigmemq").unwrap();
        assert!(!bigmem.admits(16, 129.9));
        assert!(bigmem.admits(16, 130.0));
        assert!(bigmem.admits(32, 500.0));
        assert!(!bigmem.admits(32, 500.5));
    }

    #[test]
    fn display_names_drop_suffix() {
        assert_eq!(queue("expressq").unwrap().display_name(), "express");
        assert_eq!(display_queue_name("largeq"), "large");
        assert_eq!(display_queue_name("batch"), "batch");
    }

    #[test]
    fn largest_regular_is_largeq() {
        let largest = largest_regular_queue();
        assert_eq!(largest.name, "largeq");
        assert_eq!(largest.max_cores, 128);
    }

    #[test]
    fn express_is_not_regular() {
        assert!(!queue("expressq").unwrap().is_regular());
        assert!(QUEUE_TABLE.iter().filter(|q| q.is_regular()).count() == 4);
    }

    #[test]
    fn monitored_queues_cover_the_table() {
        for q in QUEUE_TABLE {
            assert!(MONITORED_QUEUES.contains(&q.name), "{} not monitored", q.name);
        }
        assert!(!MONITORED_QUEUES.contains(&ACCELERATOR_QUEUE));
    }

    #[test]
    fn queue_class_serializes_flat() {
        let express = serde_json::to_value(queue("expressq").unwrap()).unwrap();
        assert_eq!(express["class"]["kind"], "low_latency");
        assert_eq!(express["class"]["walltime_hours"], 4);

        let small = serde_json::to_value(queue("smallq").unwrap()).unwrap();
        assert_eq!(small["class"], serde_json::json!({"kind": "regular"}));
    }
}
