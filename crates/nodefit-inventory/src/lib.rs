//! nodefit-inventory: turns a node-inventory snapshot into [`NodeRecord`]s.
//!
//! # Components
//!
//! - **`block`**: `pbsnodes -a` text (unindented node name, indented `key = value`)
//! - **`json`**: `pbsnodes -a -F json` documents
//! - **`source`**: acquiring the snapshot from a command, file, or stdin
//!
//! [`parse_inventory`] selects the parser from an [`InventoryFormat`].
//!
//! [`NodeRecord`]: nodefit_core::NodeRecord

pub mod block;
pub mod error;
pub mod fields;
pub mod json;
pub mod source;

pub use error::{InventoryError, InventoryResult};
pub use source::{CommandSource, InventorySource};

use nodefit_core::config::InventoryFormat;
use nodefit_core::{MemoryUnit, NodeRecord};
use tracing::debug;

/// Caller conventions applied while parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub unsuffixed_memory: MemoryUnit,
}

/// Parse a snapshot in the given (or detected) format.
pub fn parse_inventory(
    text: &str,
    format: InventoryFormat,
    options: &ParseOptions,
) -> InventoryResult<Vec<NodeRecord>> {
    let format = match format {
        InventoryFormat::Auto => detect_format(text),
        explicit => explicit,
    };
    debug!(?format, bytes = text.len(), "parsing inventory snapshot");

    match format {
        InventoryFormat::Json => json::parse_json(text, options),
        _ => Ok(block::parse_block(text, options)),
    }
}

/// JSON when the first non-blank character opens an object.
pub fn detect_format(text: &str) -> InventoryFormat {
    if text.trim_start().starts_with('{') {
        InventoryFormat::Json
    } else {
        InventoryFormat::Block
    }
}
