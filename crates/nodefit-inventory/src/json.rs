//! `pbsnodes -a -F json` parser.
//!
//! Accepts either the full envelope (`{"timestamp": ..., "nodes": {...}}`)
//! or a bare mapping from node name to node object. Numeric fields may
//! arrive as JSON numbers or strings; list fields as a list or a
//! comma-joined string. A field of the wrong type reads as absent.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use nodefit_core::{NodeKind, NodeRecord, NodeState, parse_count, parse_memory_mb};

use crate::ParseOptions;
use crate::error::{InventoryError, InventoryResult};
use crate::fields::{parse_job_tags, parse_queue_list};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Scalar {
    fn count(&self) -> u32 {
        match self {
            Scalar::Number(n) if n.is_finite() && *n >= 0.0 && n.fract() == 0.0 => {
                n.min(f64::from(u32::MAX)) as u32
            }
            Scalar::Text(text) => parse_count(text, 0),
            Scalar::Number(_) | Scalar::Other(_) => 0,
        }
    }

    fn memory_mb(&self, options: &ParseOptions) -> f64 {
        match self {
            Scalar::Number(n) => options.unsuffixed_memory.to_megabytes(*n),
            Scalar::Text(text) => parse_memory_mb(text, options.unsuffixed_memory),
            Scalar::Other(_) => 0.0,
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A list attribute. Non-string entries are ignored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlagList {
    One(String),
    Many(Vec<Value>),
    Other(Value),
}

impl FlagList {
    fn values(&self) -> Vec<&str> {
        match self {
            FlagList::One(value) => vec![value.as_str()],
            FlagList::Many(values) => values.iter().filter_map(Value::as_str).collect(),
            FlagList::Other(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct JsonResources {
    ncpus: Option<Scalar>,
    mem: Option<Scalar>,
    ngpus: Option<Scalar>,
    #[serde(rename = "Qlist", alias = "qlist")]
    qlist: Option<FlagList>,
    vntype: Option<Scalar>,
}

/// Resource tables that are not objects read as empty.
fn resources<'de, D>(deserializer: D) -> Result<JsonResources, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct JsonNode {
    state: Option<FlagList>,
    #[serde(default, deserialize_with = "resources")]
    resources_available: JsonResources,
    #[serde(default, deserialize_with = "resources")]
    resources_assigned: JsonResources,
    jobs: Option<FlagList>,
}

impl JsonNode {
    fn into_record(self, name: String, options: &ParseOptions) -> NodeRecord {
        let available = &self.resources_available;
        let assigned = &self.resources_assigned;

        let mut node = NodeRecord::new(name);
        if let Some(state) = &self.state {
            node.state = NodeState::from_flags(state.values().iter().flat_map(|v| v.split(',')));
        }
        if let Some(vntype) = available.vntype.as_ref().and_then(Scalar::text) {
            node.kind = NodeKind::parse(vntype);
        }
        if let Some(qlist) = &available.qlist {
            node.queues = parse_queue_list(qlist.values());
        }
        if let Some(jobs) = &self.jobs {
            node.job_tags = parse_job_tags(jobs.values());
        }
        node.cores_available = available.ncpus.as_ref().map_or(0, Scalar::count);
        node.cores_assigned = assigned.ncpus.as_ref().map_or(0, Scalar::count);
        node.memory_available_mb = available.mem.as_ref().map_or(0.0, |m| m.memory_mb(options));
        node.memory_assigned_mb = assigned.mem.as_ref().map_or(0.0, |m| m.memory_mb(options));
        node.accelerators_available = available.ngpus.as_ref().map_or(0, Scalar::count);
        node.accelerators_assigned = assigned.ngpus.as_ref().map_or(0, Scalar::count);
        node
    }
}

/// Find the node mapping, unwrapping the `pbsnodes -F json` envelope.
fn node_map(doc: Value) -> InventoryResult<Map<String, Value>> {
    let Value::Object(mut top) = doc else {
        return Err(InventoryError::Shape(
            "expected an object mapping node names to node attributes".to_string(),
        ));
    };

    let is_envelope = matches!(
        top.get("nodes"),
        Some(Value::Object(inner)) if !inner.contains_key("resources_available")
    );
    if is_envelope {
        if let Some(Value::Object(nodes)) = top.remove("nodes") {
            return Ok(nodes);
        }
    }
    Ok(top)
}

/// Parse a JSON snapshot.
///
/// Nodes with zero available cores and zero available memory are
/// bookkeeping-only sub-partitions and are dropped.
pub fn parse_json(text: &str, options: &ParseOptions) -> InventoryResult<Vec<NodeRecord>> {
    let doc: Value = serde_json::from_str(text)?;
    let nodes = node_map(doc)?;

    let mut records = Vec::with_capacity(nodes.len());
    let mut dropped = 0usize;
    for (name, value) in nodes {
        if !value.is_object() {
            debug!(key = %name, "skipping non-node entry");
            continue;
        }
        let node: JsonNode = match serde_json::from_value(value) {
            Ok(node) => node,
            Err(err) => {
                warn!(node = %name, error = %err, "skipping undecodable node entry");
                continue;
            }
        };
        let record = node.into_record(name, options);

        if record.cores_available == 0 && record.memory_available_mb == 0.0 {
            dropped += 1;
            continue;
        }
        records.push(record);
    }

    debug!(nodes = records.len(), dropped, "parsed JSON inventory");
    Ok(records)
}
