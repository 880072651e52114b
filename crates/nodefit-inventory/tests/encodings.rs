//! Block text and JSON dumps of the same cluster must yield the same records.

use nodefit_core::config::InventoryFormat;
use nodefit_core::{NodeKind, StateFlag};
use nodefit_inventory::{ParseOptions, parse_inventory};

const BLOCK: &str = include_str!("fixtures/pbsnodes_a.txt");
const JSON: &str = include_str!("fixtures/pbsnodes_a.json");

#[test]
fn both_encodings_agree() {
    let opts = ParseOptions::default();
    let mut block = parse_inventory(BLOCK, InventoryFormat::Auto, &opts).unwrap();
    let mut json = parse_inventory(JSON, InventoryFormat::Auto, &opts).unwrap();

    block.sort_by(|a, b| a.name.cmp(&b.name));
    json.sort_by(|a, b| a.name.cmp(&b.name));

    assert_eq!(block.len(), 6);
    assert_eq!(block, json);
}

#[test]
fn fixture_details() {
    let nodes = parse_inventory(BLOCK, InventoryFormat::Block, &ParseOptions::default()).unwrap();
    let by_name = |name: &str| nodes.iter().find(|n| n.name == name).unwrap();

    let cn001 = by_name("cn001");
    assert_eq!(cn001.free_cores(), 32);
    assert_eq!(cn001.memory_assigned_mb, 128000.0);
    assert_eq!(cn001.job_tags.len(), 2);

    assert!(by_name("cn002").state.contains(StateFlag::Offline));
    assert_eq!(by_name("cn003").memory_available_mb, 1_048_576.0);
    assert_eq!(by_name("login01").kind, NodeKind::Unrecognized);
    assert_eq!(by_name("gpu01").accelerators_assigned, 2);
}
