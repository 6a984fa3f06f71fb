//! Work list de-duplication and identifier collision detection

use std::collections::{HashMap, HashSet};

use crate::types::WorkItem;

/// Collapse a work list to unique items by [`WorkItem::identity_key`],
/// keeping the first occurrence of each key in input order.
///
/// Pure and idempotent: `dedupe(dedupe(x)) == dedupe(x)`.
pub fn dedupe(items: Vec<WorkItem>) -> Vec<WorkItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.identity_key()))
        .collect()
}

/// Distinct work items that would be written to the same output file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierCollision {
    /// The shared identifier
    pub identifier: String,
    /// Source URLs of every item mapping to it, in input order
    pub source_urls: Vec<String>,
}

/// Find identifiers shared by more than one item.
///
/// Two different reference URLs can end in the same path segment. Their
/// downloads then race for one target path and the later one is skipped as
/// already downloaded. Collisions are returned in first-seen order.
pub fn identifier_collisions(items: &[WorkItem]) -> Vec<IdentifierCollision> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<String>> = HashMap::new();

    for item in items {
        let sources = groups.entry(item.identifier()).or_insert_with(|| {
            order.push(item.identifier());
            Vec::new()
        });
        sources.push(item.source_url().to_string());
    }

    order
        .into_iter()
        .filter_map(|identifier| {
            let sources = groups.remove(identifier)?;
            (sources.len() > 1).then(|| IdentifierCollision {
                identifier: identifier.to_string(),
                source_urls: sources,
            })
        })
        .collect()
}
