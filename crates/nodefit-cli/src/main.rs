use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{GlobalArgs, OutputFormat};

#[derive(Parser)]
#[command(
    name = "nodefit",
    about = "Check PBS cluster capacity for a job request and report utilization",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to nodefit.toml (default: ./nodefit.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Read the node inventory from a saved dump instead of running
    /// the inventory command. `-` reads stdin.
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a core/memory request fits on the cluster now.
    ///
    /// With no core count, the largest request the biggest regular queue
    /// admits under the memory formula is checked. With no memory, it is
    /// derived as cores * mem-per-core + mem-overhead.
    Check {
        /// Cores required
        cores: Option<u32>,
        /// Memory required in GB
        memory_gb: Option<f64>,
        /// Memory per core in GB (default: 1.5)
        #[arg(long)]
        mem_per_core: Option<f64>,
        /// Fixed memory overhead in GB (default: 4.0)
        #[arg(long)]
        mem_overhead: Option<f64>,
        /// How to order alternatives when nothing fits
        #[arg(long, value_enum)]
        ranking: Option<RankingArg>,
    },
    /// Report cluster utilization by node pool.
    Stats {
        /// Report accelerator nodes separately or fold them into compute
        #[arg(long, value_enum)]
        pooling: Option<PoolingArg>,
        /// How accelerator nodes are recognized
        #[arg(long, value_enum)]
        accelerator_detection: Option<DetectionArg>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum RankingArg {
    FractionalFit,
    Capacity,
}

#[derive(Clone, Copy, ValueEnum)]
enum PoolingArg {
    Separate,
    Unified,
}

#[derive(Clone, Copy, ValueEnum)]
enum DetectionArg {
    Queue,
    NamePattern,
}

impl From<RankingArg> for nodefit_core::config::RankingStrategy {
    fn from(arg: RankingArg) -> Self {
        match arg {
            RankingArg::FractionalFit => Self::FractionalFit,
            RankingArg::Capacity => Self::Capacity,
        }
    }
}

impl From<PoolingArg> for nodefit_core::config::PoolingMode {
    fn from(arg: PoolingArg) -> Self {
        match arg {
            PoolingArg::Separate => Self::Separate,
            PoolingArg::Unified => Self::Unified,
        }
    }
}

impl From<DetectionArg> for nodefit_core::config::AcceleratorDetection {
    fn from(arg: DetectionArg) -> Self {
        match arg {
            DetectionArg::Queue => Self::Queue,
            DetectionArg::NamePattern => Self::NamePattern,
        }
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "nodefit=debug" } else { "nodefit=warn" };
    let mut filter = EnvFilter::from_default_env();
    if verbose || std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        filter = filter.add_directive(level.parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("Error: {err:#}");
        return commands::exit_code_for(&err);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    let global = GlobalArgs {
        config: cli.config,
        input: cli.input,
        format: cli.format,
    };

    let result = match cli.command {
        Commands::Check {
            cores,
            memory_gb,
            mem_per_core,
            mem_overhead,
            ranking,
        } => {
            let args = commands::check::CheckArgs {
                cores,
                memory_gb,
                mem_per_core,
                mem_overhead,
                ranking: ranking.map(Into::into),
            };
            commands::check::check(&global, args).await
        }
        Commands::Stats {
            pooling,
            accelerator_detection,
        } => {
            let args = commands::stats::StatsArgs {
                pooling: pooling.map(Into::into),
                accelerator_detection: accelerator_detection.map(Into::into),
            };
            commands::stats::stats(&global, args).await
        }
        Commands::Config => commands::config::show(&global),
    };

    match result {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            commands::exit_code_for(&err)
        }
    }
}
