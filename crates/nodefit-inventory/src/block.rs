//! `pbsnodes -a` block text parser.
//!
//! ```text
//! cn001
//!      Mom = cn001.cluster
//!      state = job-busy
//!      resources_available.ncpus = 64
//!      resources_available.mem = 263846224kb
//!      resources_available.Qlist = smallq,mediumq
//!      resources_available.vntype = compute_vnode
//!      resources_assigned.ncpus = 32
//!      jobs = 1234.pbs/0, 1234.pbs/1
//! ```
//!
//! An unindented line starts a node; indented `key = value` lines belong
//! to it. Blank lines, lines without `=`, and attributes this crate does
//! not use are skipped.

use nodefit_core::{NodeKind, NodeRecord, NodeState, parse_count, parse_memory_mb};
use tracing::{debug, trace};

use crate::ParseOptions;
use crate::fields::{parse_job_tags, parse_queue_list};

/// Parse block text. Every named node becomes one record.
pub fn parse_block(text: &str, options: &ParseOptions) -> Vec<NodeRecord> {
    let mut nodes = Vec::new();
    let mut current: Option<NodeRecord> = None;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if !line.starts_with(' ') && !line.starts_with('\t') {
            if let Some(node) = current.take() {
                nodes.push(node);
            }
            current = Some(NodeRecord::new(line.trim()));
            continue;
        }

        let Some(node) = current.as_mut() else {
            trace!(line, "attribute before first node, skipping");
            continue;
        };
        let Some((key, value)) = line.trim().split_once('=') else {
            trace!(node = %node.name, line, "attribute line without '=', skipping");
            continue;
        };
        apply_attribute(node, key.trim(), value.trim(), options);
    }

    if let Some(node) = current.take() {
        nodes.push(node);
    }

    debug!(nodes = nodes.len(), "parsed block inventory");
    nodes
}

fn apply_attribute(node: &mut NodeRecord, key: &str, value: &str, options: &ParseOptions) {
    match key.to_ascii_lowercase().as_str() {
        "state" => node.state = NodeState::parse(value),
        "jobs" => node.job_tags = parse_job_tags([value]),
        "resources_available.vntype" => node.kind = NodeKind::parse(value),
        "resources_available.qlist" => node.queues = parse_queue_list([value]),
        "resources_available.ncpus" => node.cores_available = parse_count(value, 0),
        "resources_assigned.ncpus" => node.cores_assigned = parse_count(value, 0),
        "resources_available.mem" => {
            node.memory_available_mb = parse_memory_mb(value, options.unsuffixed_memory)
        }
        "resources_assigned.mem" => {
            node.memory_assigned_mb = parse_memory_mb(value, options.unsuffixed_memory)
        }
        "resources_available.ngpus" => node.accelerators_available = parse_count(value, 0),
        "resources_assigned.ngpus" => node.accelerators_assigned = parse_count(value, 0),
        _ => {}
    }
}
