//! Order-preserving algebra over result-ID lists.
//!
//! Every function here preserves first-seen order: the full-text engine
//! returns ids in relevance order, and that order must survive
//! deduplication, intersection, and hydration reordering.

use std::collections::{HashMap, HashSet};

/// Trim ids, drop blanks, and dedupe while preserving first-seen order.
pub fn dedupe_ids<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in raw {
        let id = id.as_ref().trim();
        if id.is_empty() || seen.contains(id) {
            continue;
        }
        seen.insert(id.to_owned());
        out.push(id.to_owned());
    }
    out
}

/// Filter `ids` to those present in `allowed`, keeping the order of `ids`.
pub fn intersect_preserving_order(ids: &[String], allowed: &[String]) -> Vec<String> {
    let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    ids.iter()
        .filter(|id| allowed.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Union of several id lists: each list's internal order is kept, and an id
/// appearing in more than one list stays where it was first seen.
pub fn merge_preserving_order<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for id in list {
            if seen.insert(id.as_str().to_owned()) {
                out.push(id.clone());
            }
        }
    }
    out
}

/// Reorder `items` to follow `ids` exactly.
///
/// Ids with no matching item are skipped rather than producing a gap, so a
/// record deleted between ID collection and hydration simply disappears.
pub fn order_by_ids<T, F>(items: Vec<T>, ids: &[String], id_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut by_id: HashMap<String, T> = items
        .into_iter()
        .map(|item| (id_of(&item).to_owned(), item))
        .collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
