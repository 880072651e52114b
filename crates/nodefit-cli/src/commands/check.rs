//! `nodefit check`: will a core/memory request fit on the cluster now?
//!
//! The request is sized and checked against queue limits before the
//! inventory is touched; a request no queue admits never runs the
//! inventory command.

use std::io::{self, Write};

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use nodefit_core::config::RankingStrategy;
use nodefit_core::queues::{QueueClass, QueueSpec, largest_regular_queue};
use nodefit_core::units::whole_gb;
use nodefit_core::{MemoryFormula, PlacementRequest};
use nodefit_placement::{
    Alternative, Availability, ClassifierPolicy, LimitingFactor, PlacementAdvice, QueueSelection,
    resolve_queues,
};

use super::{GlobalArgs, Outcome, OutputFormat, load_config, load_inventory, print_json};
use crate::render::plain_number;

#[derive(Debug, Clone, Default)]
pub struct CheckArgs {
    pub cores: Option<u32>,
    pub memory_gb: Option<f64>,
    pub mem_per_core: Option<f64>,
    pub mem_overhead: Option<f64>,
    pub ranking: Option<RankingStrategy>,
}

/// Core count picked when none was given.
#[derive(Debug, Clone, Copy, Serialize)]
struct AutoSizing {
    queue: &'static str,
    max_memory_gb: f64,
    max_cores: u32,
    cores: u32,
}

/// A sized request, before any queue or node is consulted.
#[derive(Debug, Clone, Copy)]
struct SizedRequest {
    request: PlacementRequest,
    formula: MemoryFormula,
    auto: Option<AutoSizing>,
}

fn size_request(args: &CheckArgs, formula: MemoryFormula) -> anyhow::Result<SizedRequest> {
    let (cores, auto) = match args.cores {
        Some(cores) => (cores, None),
        None => {
            let queue = largest_regular_queue();
            let cores = formula.max_cores_for(queue);
            let auto = AutoSizing {
                queue: queue.name,
                max_memory_gb: queue.max_memory_gb,
                max_cores: queue.max_cores,
                cores,
            };
            info!(queue = queue.name, cores, "auto-sized request");
            (cores, Some(auto))
        }
    };

    let request = match args.memory_gb {
        Some(memory_gb) => PlacementRequest::new(cores, memory_gb),
        None => PlacementRequest::from_formula(cores, &formula),
    }
    .context("invalid resource request")?;

    Ok(SizedRequest {
        request,
        formula,
        auto,
    })
}

pub async fn check(global: &GlobalArgs, args: CheckArgs) -> anyhow::Result<Outcome> {
    let config = load_config(global.config.as_deref())?;
    let formula = MemoryFormula::new(
        args.mem_per_core.unwrap_or(config.request.mem_per_core_gb),
        args.mem_overhead.unwrap_or(config.request.overhead_gb),
    )
    .context("invalid memory formula")?;
    let strategy = args.ranking.unwrap_or(config.policy.ranking);
    let policy = ClassifierPolicy::from_config(&config.policy)
        .context("invalid policy.accelerator_name_pattern")?;

    let sized = size_request(&args, formula)?;
    let request = sized.request;
    let queues = resolve_queues(request.cores, request.memory_gb);
    let text = global.format == OutputFormat::Text;

    if queues.is_rejected() {
        info!(cores = request.cores, memory_gb = request.memory_gb, "request exceeds every queue limit");
        if text {
            println!("{}", rejection_line(&request));
        } else {
            print_json(&CheckReport::rejected(&sized, &queues))?;
        }
        return Ok(Outcome::Rejected);
    }

    // The request preamble is printed before the inventory is fetched.
    if text {
        write_preamble(&mut io::stdout(), &sized, &queues)?;
    }

    let records = load_inventory(global.input.as_deref(), &config.inventory).await?;
    let advice = PlacementAdvice::evaluate(&records, &policy, request, queues, &formula, strategy);

    if text {
        write_availability(&mut io::stdout(), &advice)?;
    } else {
        print_json(&CheckReport::evaluated(&sized, &advice))?;
    }

    Ok(if advice.availability.fits() {
        Outcome::Success
    } else {
        Outcome::NoFit
    })
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_sized: Option<AutoSizing>,
    formula: MemoryFormula,
    rejected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    queues: Option<&'a QueueSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    advice: Option<&'a PlacementAdvice>,
    request: PlacementRequest,
}

impl<'a> CheckReport<'a> {
    fn rejected(sized: &SizedRequest, queues: &'a QueueSelection) -> Self {
        Self {
            auto_sized: sized.auto,
            formula: sized.formula,
            rejected: true,
            queues: Some(queues),
            advice: None,
            request: sized.request,
        }
    }

    fn evaluated(sized: &SizedRequest, advice: &'a PlacementAdvice) -> Self {
        Self {
            auto_sized: sized.auto,
            formula: sized.formula,
            rejected: false,
            queues: None,
            advice: Some(advice),
            request: sized.request,
        }
    }
}

fn whole(gb: f64) -> u64 {
    gb.trunc() as u64
}

fn rejection_line(request: &PlacementRequest) -> String {
    format!(
        "Error: Resource request ({} cores, {} GB) exceeds all queue limits",
        request.cores,
        whole(request.memory_gb)
    )
}

fn low_latency_label(queue: &QueueSpec) -> String {
    match queue.class {
        QueueClass::LowLatency { walltime_hours } => {
            format!("{} ({walltime_hours}hr limit)", queue.display_name())
        }
        QueueClass::Regular => queue.display_name().to_string(),
    }
}

fn recommendation(queues: &QueueSelection) -> Option<String> {
    match (queues.preferred, queues.low_latency) {
        (Some(regular), Some(express)) => Some(format!(
            "Recommended queues: {} or {}",
            regular.display_name(),
            low_latency_label(express)
        )),
        (Some(regular), None) => Some(format!("Recommended queue: {}", regular.display_name())),
        (None, Some(express)) => Some(format!("Recommended queue: {}", low_latency_label(express))),
        (None, None) => None,
    }
}

fn write_preamble(out: &mut impl Write, sized: &SizedRequest, queues: &QueueSelection) -> io::Result<()> {
    let request = &sized.request;

    if let Some(auto) = &sized.auto {
        writeln!(out, "Auto-calculated maximum: {} cores", auto.cores)?;
        writeln!(
            out,
            "Formula: ({} - {}) / {} = {} cores (capped at {})",
            auto.max_memory_gb,
            plain_number(sized.formula.overhead_gb),
            plain_number(sized.formula.mem_per_core_gb),
            auto.cores,
            auto.max_cores
        )?;
        writeln!(out)?;
    }

    writeln!(
        out,
        "Looking for {} cores and {} GB of memory",
        request.cores,
        whole(request.memory_gb)
    )?;
    if let Some(line) = recommendation(queues) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn diagnosis(limiting: LimitingFactor) -> &'static str {
    match limiting {
        LimitingFactor::Memory => "Memory is the limiting factor.",
        LimitingFactor::Cores => "Cores are the limiting factor.",
        LimitingFactor::Both => "Both cores and memory are limiting factors.",
        LimitingFactor::Combination => "No single node has both enough cores and enough memory.",
    }
}

fn alternative_line(alt: &Alternative) -> String {
    let node = &alt.node;
    let head = format!(
        "• {}: {} cores, {} GB available",
        node.node_id,
        node.free_cores,
        whole_gb(node.free_memory_mb)
    );
    match alt.practical {
        Some(fit) => format!("{head} → could run {} cores, {} GB", fit.cores, fit.memory_gb),
        None => format!("{head} → insufficient memory for any cores with your formula"),
    }
}

fn write_availability(out: &mut impl Write, advice: &PlacementAdvice) -> io::Result<()> {
    match &advice.availability {
        Availability::NoCandidates => {
            let names: Vec<&str> = advice.queues.eligible.iter().map(|q| q.display_name()).collect();
            writeln!(
                out,
                "No compute nodes found supporting eligible queues: {}",
                names.join(", ")
            )?;
        }
        Availability::Fits { nodes } => {
            writeln!(out, "Yes")?;
            for node in nodes {
                writeln!(
                    out,
                    "• {}: {} cores available, {} GB available",
                    node.node_id,
                    node.free_cores,
                    whole_gb(node.free_memory_mb)
                )?;
            }
        }
        Availability::NoFit {
            limiting,
            alternatives,
            ..
        } => {
            writeln!(out, "No, largest available allocations:")?;
            writeln!(out, "{}", diagnosis(*limiting))?;
            for alt in alternatives {
                writeln!(out, "{}", alternative_line(alt))?;
            }
        }
    }
    Ok(())
}
