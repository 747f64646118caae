//! Popularity and compression statistics over key-to-id maps.
//!
//! Every store exposes the same two measurements; the helpers here take a
//! flat iterator over the ids held by whichever maps the store owns.

use hashbrown::{HashMap, HashSet};

use crate::types::PointsToId;

/// How much of the pointer population is covered by the `n` most common
/// points-to sets.
///
/// Returns `(sum of the top-n occurrence counts, total non-empty entries)`.
/// Empty entries are skipped; ties between equally common sets are broken
/// arbitrarily.
pub fn top_n(ids: impl Iterator<Item = PointsToId>, n: usize) -> (u64, u64) {
    // How many pointers share each points-to set?
    let mut occurrences: HashMap<PointsToId, u64> = HashMap::new();
    let mut total = 0u64;
    for id in ids {
        if !id.is_empty_set() {
            *occurrences.entry(id).or_insert(0) += 1;
            total += 1;
        }
    }

    let mut counts: Vec<u64> = occurrences.into_values().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    let most_common: u64 = counts.iter().take(n).sum();
    (most_common, total)
}

/// Number of distinct ids observed, the empty id included if present.
///
/// Against the number of entries, this measures how well the cache
/// compresses the stored population.
pub fn in_use(ids: impl Iterator<Item = PointsToId>) -> u64 {
    let distinct: HashSet<PointsToId> = ids.collect();
    distinct.len() as u64
}
