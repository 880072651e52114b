//! Tolerant numeric parsing for cluster-reported values.
//!
//! PBS emits memory with mixed unit suffixes and occasionally reports
//! `<various>` for aggregated vnodes. Nothing here returns an error:
//! malformed values fall back to a default so one bad node cannot
//! abort the analysis.

use serde::{Deserialize, Serialize};

const MB_PER_TB: f64 = 1024.0 * 1024.0;
const MB_PER_GB: f64 = 1024.0;
const KB_PER_MB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Values the server uses when a resource has no single value.
const UNSPECIFIED: &[&str] = &["<various>", "various"];

/// How to interpret a memory value that carries no unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryUnit {
    #[default]
    Bytes,
    Megabytes,
}

impl MemoryUnit {
    /// Convert a bare magnitude in this unit to megabytes.
    pub fn to_megabytes(self, value: f64) -> f64 {
        if !value.is_finite() || value < 0.0 {
            return 0.0;
        }
        match self {
            MemoryUnit::Bytes => value / BYTES_PER_MB,
            MemoryUnit::Megabytes => value,
        }
    }
}

fn is_unspecified(text: &str) -> bool {
    UNSPECIFIED.contains(&text)
}

/// Parse a memory string (`498gb`, `263846224kb`, `1.5tb`) into megabytes.
///
/// Unsuffixed values are read in `unsuffixed`. Empty, unspecified,
/// negative, or non-numeric input yields `0.0`.
pub fn parse_memory_mb(text: &str, unsuffixed: MemoryUnit) -> f64 {
    let text = text.trim().to_ascii_lowercase();
    if text.is_empty() || is_unspecified(&text) {
        return 0.0;
    }

    let parse = |magnitude: &str| -> Option<f64> {
        magnitude
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
    };

    let megabytes = if let Some(v) = text.strip_suffix("tb") {
        parse(v).map(|v| v * MB_PER_TB)
    } else if let Some(v) = text.strip_suffix("gb") {
        parse(v).map(|v| v * MB_PER_GB)
    } else if let Some(v) = text.strip_suffix("mb") {
        parse(v)
    } else if let Some(v) = text.strip_suffix("kb") {
        parse(v).map(|v| v / KB_PER_MB)
    } else if let Some(v) = text.strip_suffix('b') {
        parse(v).map(|v| v / BYTES_PER_MB)
    } else {
        parse(&text).map(|v| unsuffixed.to_megabytes(v))
    };

    megabytes.unwrap_or(0.0)
}

/// Parse a non-negative integer count, substituting `default` for
/// empty, unspecified, or unparsable text.
pub fn parse_count(text: &str, default: u32) -> u32 {
    let text = text.trim();
    if text.is_empty() || is_unspecified(&text.to_ascii_lowercase()) {
        return default;
    }
    text.parse::<u32>().unwrap_or(default)
}

/// Whole gigabytes, rounded down.
pub fn whole_gb(megabytes: f64) -> u64 {
    if megabytes <= 0.0 || !megabytes.is_finite() {
        return 0;
    }
    (megabytes / MB_PER_GB).floor() as u64
}
