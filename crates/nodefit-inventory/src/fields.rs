//! List-valued attribute parsing shared by both snapshot encodings.

use std::collections::BTreeSet;

/// Split comma-joined entries into trimmed, non-empty items.
fn entries<'a, I>(values: I) -> impl Iterator<Item = &'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Queue names from one or more `Qlist` values, first occurrence order.
pub fn parse_queue_list<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut queues: Vec<String> = Vec::new();
    for queue in entries(values) {
        if !queues.iter().any(|q| q == queue) {
            queues.push(queue.to_string());
        }
    }
    queues
}

/// Distinct job identifiers from job-slot entries (`1234.pbs/0, 1234.pbs/1`).
///
/// Everything after the first `/` is the slot index and is dropped.
pub fn parse_job_tags<'a, I>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    entries(values)
        .map(|entry| entry.split_once('/').map_or(entry, |(id, _)| id).trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_list_trims_and_dedupes() {
        let queues = parse_queue_list([" smallq, mediumq,,smallq ,"]);
        assert_eq!(queues, vec!["smallq", "mediumq"]);
    }

    #[test]
    fn queue_list_empty() {
        assert!(parse_queue_list([""]).is_empty());
        assert!(parse_queue_list(std::iter::empty::<&str>()).is_empty());
    }

    #[test]
    fn job_tags_drop_slot_suffix() {
        let tags = parse_job_tags(["1234.pbs01/0, 1234.pbs01/1, 1240.pbs01/0"]);
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("1234.pbs01"));
        assert!(tags.contains("1240.pbs01"));
    }

    #[test]
    fn job_tags_from_list_and_bare_ids() {
        let tags = parse_job_tags(["77.server", "78.server/3", "/5", "  "]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["77.server", "78.server"]);
    }
}
