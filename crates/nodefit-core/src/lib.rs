//! nodefit-core: shared vocabulary for the nodefit tools.
//!
//! - **`types`**: node records, parsed state flags, node kinds, pools
//! - **`units`**: tolerant memory/integer parsing
//! - **`queues`**: the static scheduling-queue table
//! - **`request`**: job footprints and the cores→memory formula
//! - **`config`**: `nodefit.toml` parsing

pub mod config;
pub mod queues;
pub mod request;
pub mod types;
pub mod units;

pub use config::NodefitConfig;
pub use queues::{QueueClass, QueueSpec, QUEUE_TABLE};
pub use request::{MemoryFormula, PlacementRequest, RequestError};
pub use types::*;
pub use units::{MemoryUnit, parse_count, parse_memory_mb};
