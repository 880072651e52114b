//! nodefit.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::queues::{ACCELERATOR_QUEUE, MONITORED_QUEUES};
use crate::request::MemoryFormula;
use crate::units::MemoryUnit;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodefitConfig {
    pub inventory: InventoryConfig,
    pub policy: PolicyConfig,
    pub request: RequestConfig,
}

/// Encoding of the inventory snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryFormat {
    /// JSON when the first non-blank character is `{`, block text otherwise.
    #[default]
    Auto,
    Block,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub format: InventoryFormat,
    pub unsuffixed_memory: MemoryUnit,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            command: "pbsnodes".to_string(),
            args: vec!["-a".to_string()],
            timeout_secs: 30,
            format: InventoryFormat::Auto,
            unsuffixed_memory: MemoryUnit::Bytes,
        }
    }
}

/// Whether accelerator nodes are reported separately or folded into general capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolingMode {
    #[default]
    Separate,
    Unified,
}

/// How a compute node is recognized as accelerator-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceleratorDetection {
    /// The node advertises the accelerator queue.
    #[default]
    Queue,
    /// The node name matches `accelerator_name_pattern`.
    NamePattern,
}

/// Ordering applied to alternatives when no node fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    #[default]
    FractionalFit,
    /// Plain (free cores, free memory) descending.
    Capacity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub pooling: PoolingMode,
    pub accelerator_detection: AcceleratorDetection,
    pub accelerator_queue: String,
    pub accelerator_name_pattern: String,
    pub monitored_queues: Vec<String>,
    pub ranking: RankingStrategy,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            pooling: PoolingMode::Separate,
            accelerator_detection: AcceleratorDetection::Queue,
            accelerator_queue: ACCELERATOR_QUEUE.to_string(),
            accelerator_name_pattern: "^gpu".to_string(),
            monitored_queues: MONITORED_QUEUES.iter().map(|q| q.to_string()).collect(),
            ranking: RankingStrategy::FractionalFit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub mem_per_core_gb: f64,
    pub overhead_gb: f64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        let formula = MemoryFormula::default();
        Self {
            mem_per_core_gb: formula.mem_per_core_gb,
            overhead_gb: formula.overhead_gb,
        }
    }
}

impl NodefitConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NodefitConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.inventory.command.trim().is_empty() {
            anyhow::bail!("inventory.command must not be empty");
        }
        if self.inventory.timeout_secs == 0 {
            anyhow::bail!("inventory.timeout_secs must be at least 1");
        }
        MemoryFormula::new(self.request.mem_per_core_gb, self.request.overhead_gb)?;
        Ok(())
    }

    pub fn formula(&self) -> anyhow::Result<MemoryFormula> {
        Ok(MemoryFormula::new(
            self.request.mem_per_core_gb,
            self.request.overhead_gb,
        )?)
    }
}
