//! Job footprints and the linear cores→memory sizing formula.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queues::QueueSpec;

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("requested cores must be positive")]
    NonPositiveCores,

    #[error("requested memory must be a positive number of GB, got {0}")]
    NonPositiveMemory(f64),

    #[error("invalid memory formula: {mem_per_core_gb} GB/core + {overhead_gb} GB overhead")]
    InvalidFormula { mem_per_core_gb: f64, overhead_gb: f64 },
}

/// `memory_gb = cores * mem_per_core_gb + overhead_gb`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryFormula {
    pub mem_per_core_gb: f64,
    pub overhead_gb: f64,
}

impl Default for MemoryFormula {
    fn default() -> Self {
        Self {
            mem_per_core_gb: 1.5,
            overhead_gb: 4.0,
        }
    }
}

impl MemoryFormula {
    pub fn new(mem_per_core_gb: f64, overhead_gb: f64) -> Result<Self, RequestError> {
        let valid = mem_per_core_gb.is_finite()
            && mem_per_core_gb > 0.0
            && overhead_gb.is_finite()
            && overhead_gb >= 0.0;
        if !valid {
            return Err(RequestError::InvalidFormula {
                mem_per_core_gb,
                overhead_gb,
            });
        }
        Ok(Self {
            mem_per_core_gb,
            overhead_gb,
        })
    }

    pub fn memory_for(&self, cores: u32) -> f64 {
        f64::from(cores) * self.mem_per_core_gb + self.overhead_gb
    }

    /// Largest core count whose formula memory fits in `memory_gb`.
    pub fn cores_for(&self, memory_gb: f64) -> u32 {
        let cores = ((memory_gb - self.overhead_gb) / self.mem_per_core_gb).floor();
        if cores.is_finite() && cores > 0.0 {
            cores.min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }

    /// Maximum cores a queue can take under this formula, bounded by
    /// both its memory and its core ceilings.
    pub fn max_cores_for(&self, queue: &QueueSpec) -> u32 {
        self.cores_for(queue.max_memory_gb).min(queue.max_cores)
    }
}

/// A requested (cores, memory) footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementRequest {
    pub cores: u32,
    pub memory_gb: f64,
}

impl PlacementRequest {
    pub fn new(cores: u32, memory_gb: f64) -> Result<Self, RequestError> {
        if cores == 0 {
            return Err(RequestError::NonPositiveCores);
        }
        if !memory_gb.is_finite() || memory_gb <= 0.0 {
            return Err(RequestError::NonPositiveMemory(memory_gb));
        }
        Ok(Self { cores, memory_gb })
    }

    /// Size memory from the formula.
    pub fn from_formula(cores: u32, formula: &MemoryFormula) -> Result<Self, RequestError> {
        Self::new(cores, formula.memory_for(cores))
    }

    pub fn memory_mb(&self) -> f64 {
        self.memory_gb * 1024.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::queue;

    #[test]
    fn default_formula() {
        let f = MemoryFormula::default();
        assert_eq!(f.memory_for(4), 10.0);
        assert_eq!(f.memory_for(0), 4.0);
    }

    #[test]
    fn cores_for_rounds_down_and_clamps() {
        let f = MemoryFormula::default();
        assert_eq!(f.cores_for(10.0), 4);
        assert_eq!(f.cores_for(10.9), 4);
        assert_eq!(f.cores_for(3.0), 0);
    }

    #[test]
    fn auto_sizing_against_largeq() {
        let f = MemoryFormula::default();
        // (120 - 4) / 1.5 = 77.3
        assert_eq!(f.max_cores_for(queue("largeq").unwrap()), 77);

        let lean = MemoryFormula::new(0.5, 0.0).unwrap();
        assert_eq!(lean.max_cores_for(queue("largeq").unwrap()), 128);
    }

    #[test]
    fn rejects_bad_formula() {
        assert!(MemoryFormula::new(0.0, 4.0).is_err());
        assert!(MemoryFormula::new(1.5, -1.0).is_err());
        assert!(MemoryFormula::new(f64::NAN, 4.0).is_err());
    }

    #[test]
    fn request_validation() {
        assert_eq!(PlacementRequest::new(0, 8.0), Err(RequestError::NonPositiveCores));
        assert!(matches!(
            PlacementRequest::new(4, 0.0),
            Err(RequestError::NonPositiveMemory(_))
        ));
        let req = PlacementRequest::from_formula(4, &MemoryFormula::default()).unwrap();
        assert_eq!(req.memory_gb, 10.0);
        assert_eq!(req.memory_mb(), 10240.0);
    }
}
