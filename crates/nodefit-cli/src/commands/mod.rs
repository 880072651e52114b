//! Subcommand implementations and the plumbing they share.

pub mod check;
pub mod config;
pub mod stats;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::ValueEnum;
use tracing::{debug, info};

use nodefit_core::config::InventoryConfig;
use nodefit_core::{NodeRecord, NodefitConfig};
use nodefit_inventory::{InventoryError, InventorySource, ParseOptions, parse_inventory};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "nodefit.toml";

const EXIT_INVENTORY: u8 = 4;
const EXIT_OTHER: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub format: OutputFormat,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The request is admissible but no node can take it now.
    NoFit,
    /// No queue admits the request.
    Rejected,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::NoFit => 1,
            Outcome::Rejected => 3,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

/// Inventory failures exit 4; everything else 5.
fn error_code(err: &anyhow::Error) -> u8 {
    if err.chain().any(|cause| cause.is::<InventoryError>()) {
        EXIT_INVENTORY
    } else {
        EXIT_OTHER
    }
}

pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(error_code(err))
}

/// Load `--config`, else `./nodefit.toml` if present, else defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<NodefitConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
        None => {
            debug!("no config file, using defaults");
            return Ok(NodefitConfig::default());
        }
    };
    let config = NodefitConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Acquire and parse one inventory snapshot.
pub async fn load_inventory(
    input: Option<&Path>,
    config: &InventoryConfig,
) -> anyhow::Result<Vec<NodeRecord>> {
    let source = InventorySource::resolve(input.map(Path::to_path_buf), config);
    let text = source.read().await.context("could not read the node inventory")?;

    let options = ParseOptions {
        unsuffixed_memory: config.unsuffixed_memory,
    };
    let records = parse_inventory(&text, config.format, &options)
        .context("could not parse the node inventory")?;

    info!(nodes = records.len(), "inventory loaded");
    Ok(records)
}

/// Pretty-printed JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_codes() {
        assert_eq!(Outcome::Success.code(), 0);
        assert_eq!(Outcome::NoFit.code(), 1);
        assert_eq!(Outcome::Rejected.code(), 3);
    }

    #[test]
    fn inventory_errors_map_to_four() {
        let err = anyhow::Error::new(InventoryError::Interrupted).context("could not read the node inventory");
        assert_eq!(error_code(&err), EXIT_INVENTORY);

        let err = anyhow::anyhow!("inventory.timeout_secs must be at least 1");
        assert_eq!(error_code(&err), EXIT_OTHER);
    }

    #[test]
    fn explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodefit.toml");
        std::fs::write(&path, "[request]\nmem_per_core_gb = 2.0\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.request.mem_per_core_gb, 2.0);
        assert_eq!(config.request.overhead_gb, 4.0);
    }

    #[test]
    fn invalid_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[inventory]\ntimeout_secs = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
        assert_eq!(error_code(&err), EXIT_OTHER);
    }

    #[tokio::test]
    async fn inventory_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.txt");
        std::fs::write(
            &path,
            "cn001\n     state = free\n     resources_available.ncpus = 8\n",
        )
        .unwrap();

        let records = load_inventory(Some(&path), &InventoryConfig::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cores_available, 8);
    }

    #[tokio::test]
    async fn bad_json_inventory_is_an_inventory_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(&path, "{\"cn001\": ").unwrap();

        let err = load_inventory(Some(&path), &InventoryConfig::default()).await.unwrap_err();
        assert_eq!(error_code(&err), EXIT_INVENTORY);
    }
}
