//! `nodefit stats`: cluster utilization by node pool.

use std::io::{self, Write};

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use nodefit_core::config::{AcceleratorDetection, PoolingMode};
use nodefit_placement::{
    ClassifierPolicy, ClusterSummary, ExclusionLedger, ExclusionReason, ResourcePool, Utilization,
    aggregate,
};

use super::{GlobalArgs, Outcome, OutputFormat, load_config, load_inventory, print_json};
use crate::render::{Quantity, utilization};

/// Command-line overrides for the `[policy]` section.
#[derive(Debug, Clone, Default)]
pub struct StatsArgs {
    pub pooling: Option<PoolingMode>,
    pub accelerator_detection: Option<AcceleratorDetection>,
}

pub async fn stats(global: &GlobalArgs, args: StatsArgs) -> anyhow::Result<Outcome> {
    let mut config = load_config(global.config.as_deref())?;
    if let Some(pooling) = args.pooling {
        config.policy.pooling = pooling;
    }
    if let Some(detection) = args.accelerator_detection {
        config.policy.accelerator_detection = detection;
    }
    let policy = ClassifierPolicy::from_config(&config.policy)
        .context("invalid policy.accelerator_name_pattern")?;

    let records = load_inventory(global.input.as_deref(), &config.inventory).await?;
    let summary = aggregate(&records, &policy, config.policy.pooling);

    match global.format {
        OutputFormat::Json => print_json(&StatsReport::new(&summary))?,
        OutputFormat::Text => write_text(&mut io::stdout(), &summary)?,
    }
    Ok(Outcome::Success)
}

#[derive(Debug, Serialize)]
struct PoolReport<'a> {
    #[serde(flatten)]
    totals: &'a ResourcePool,
    jobs: usize,
    cores: Utilization,
    memory: Utilization,
    #[serde(skip_serializing_if = "Option::is_none")]
    accelerators: Option<Utilization>,
}

impl<'a> PoolReport<'a> {
    fn new(pool: &'a ResourcePool, with_accelerators: bool) -> Self {
        Self {
            totals: pool,
            jobs: pool.job_count(),
            cores: pool.cores(),
            memory: pool.memory(),
            accelerators: with_accelerators.then(|| pool.accelerators()),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatsReport<'a> {
    pooling: PoolingMode,
    total_nodes: usize,
    general: PoolReport<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accelerator: Option<PoolReport<'a>>,
    excluded: &'a ExclusionLedger,
}

impl<'a> StatsReport<'a> {
    fn new(summary: &'a ClusterSummary) -> Self {
        let unified = summary.pooling == PoolingMode::Unified;
        Self {
            pooling: summary.pooling,
            total_nodes: summary.total_nodes,
            general: PoolReport::new(&summary.general, unified),
            accelerator: (!unified).then(|| PoolReport::new(&summary.accelerator, true)),
            excluded: &summary.exclusions,
        }
    }
}

fn node_counts(pool: &ResourcePool) -> String {
    format!(
        "{} active, {} offline ({} total)",
        pool.included_nodes,
        pool.offline_nodes,
        pool.total_nodes()
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "node" } else { "nodes" }
}

/// The text utilization report.
fn write_text(out: &mut impl Write, summary: &ClusterSummary) -> io::Result<()> {
    let general = &summary.general;
    let accelerator = &summary.accelerator;

    writeln!(out, "{}", "CLUSTER UTILIZATION".bold())?;
    writeln!(out, "{}", "=".repeat(19))?;
    writeln!(out, "Compute Nodes: {}", node_counts(general))?;
    writeln!(out, "CPU:          {}", utilization(&general.cores(), Quantity::Count("cores")))?;
    writeln!(out, "Memory:       {}", utilization(&general.memory(), Quantity::Memory))?;
    if summary.pooling == PoolingMode::Unified && general.accelerators_available > 0 {
        writeln!(
            out,
            "GPUs:         {}",
            utilization(&general.accelerators(), Quantity::Count("devices"))
        )?;
    }

    if !accelerator.is_empty() {
        writeln!(out)?;
        writeln!(out, "GPU Nodes:    {}", node_counts(accelerator))?;
        writeln!(out, "CPU:          {}", utilization(&accelerator.cores(), Quantity::Count("cores")))?;
        writeln!(
            out,
            "GPUs:         {}",
            utilization(&accelerator.accelerators(), Quantity::Count("devices"))
        )?;
        writeln!(out, "GPU Memory:   {}", utilization(&accelerator.memory(), Quantity::Memory))?;
    }

    writeln!(out)?;
    if accelerator.job_count() > 0 {
        writeln!(
            out,
            "Jobs:         {} running (compute), {} running (GPU)",
            general.job_count(),
            accelerator.job_count()
        )?;
    } else {
        writeln!(out, "Jobs:         {} running", general.job_count())?;
    }

    let excluded = excluded_lines(&summary.exclusions);
    if !excluded.is_empty() {
        writeln!(out)?;
        writeln!(out, "Excluded:")?;
        for line in excluded {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(())
}

/// Offline nodes are already counted per pool and are not repeated here.
fn excluded_lines(ledger: &ExclusionLedger) -> Vec<String> {
    let describe = |reason: ExclusionReason, label: fn(&'static str) -> String| {
        let count = ledger.count(reason);
        (count > 0).then(|| {
            let mut names = ledger.nodes(reason).to_vec();
            names.sort();
            format!("{count} {} ({})", label(plural(count)), names.join(", "))
        })
    };

    [
        describe(ExclusionReason::NoMonitoredQueues, |noun| format!("{noun} with no monitored queues")),
        describe(ExclusionReason::NotAComputeNode, |noun| format!("non-compute {noun}")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodefit_core::config::InventoryFormat;
    use nodefit_inventory::{ParseOptions, parse_inventory};

    const CLUSTER: &str = include_str!("../../../nodefit-inventory/tests/fixtures/pbsnodes_a.txt");

    fn render_text(summary: &ClusterSummary) -> String {
        let mut buf = Vec::new();
        write_text(&mut buf, summary).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn summary(pooling: PoolingMode) -> ClusterSummary {
        let records = parse_inventory(CLUSTER, InventoryFormat::Block, &ParseOptions::default()).unwrap();
        aggregate(&records, &ClassifierPolicy::default(), pooling)
    }

    #[test]
    fn separate_pools_report() {
        colored::control::set_override(false);
        let text = render_text(&summary(PoolingMode::Separate));
        let expected = "\
CLUSTER UTILIZATION
===================
Compute Nodes: 2 active, 1 offline (3 total)
CPU:          32 used / 96 total cores (33.3%)
Memory:       125.0 GB used / 1.2 TB total (9.8%)

GPU Nodes:    1 active, 0 offline (1 total)
CPU:          12 used / 48 total cores (25.0%)
GPUs:         2 used / 4 total devices (50.0%)
GPU Memory:   64.0 GB used / 384.0 GB total (16.7%)

Jobs:         2 running (compute), 1 running (GPU)

Excluded:
  1 node with no monitored queues (cn004)
  1 non-compute node (login01)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn unified_report_has_one_pool() {
        colored::control::set_override(false);
        let text = render_text(&summary(PoolingMode::Unified));
        assert!(text.contains("Compute Nodes: 3 active, 1 offline (4 total)"));
        assert!(text.contains("CPU:          44 used / 144 total cores (30.6%)"));
        assert!(text.contains("GPUs:         2 used / 4 total devices (50.0%)"));
        assert!(!text.contains("GPU Nodes:"));
        assert!(text.contains("Jobs:         3 running\n"));
    }

    #[test]
    fn empty_cluster_report() {
        colored::control::set_override(false);
        let text = render_text(&aggregate(&[], &ClassifierPolicy::default(), PoolingMode::Separate));
        assert!(text.contains("Compute Nodes: 0 active, 0 offline (0 total)"));
        assert!(text.contains("CPU:          0 used / 0 total cores (0.0%)"));
        assert!(text.contains("Memory:       0 used / 0 total (0.0%)"));
        assert!(!text.contains("Excluded:"));
    }

    #[test]
    fn json_report_shape() {
        let summary = summary(PoolingMode::Separate);
        let value = serde_json::to_value(StatsReport::new(&summary)).unwrap();
        assert_eq!(value["general"]["included_nodes"], 2);
        assert_eq!(value["general"]["cores"]["percent"].as_f64().unwrap().round(), 33.0);
        assert_eq!(value["accelerator"]["accelerators"]["total"], 4.0);
        assert_eq!(value["excluded"]["down_or_offline"][0], "cn002");
        assert!(value["general"].get("accelerators").is_none());
    }
}
