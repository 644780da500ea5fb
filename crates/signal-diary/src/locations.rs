//! Recent and frequent locations, derived from the entry collection.
//!
//! Nothing here is cached. Every call walks the entries it is given, so the
//! index can never be stale relative to the store.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::entry::{LogEntry, UNSPECIFIED_LOCATION};

/// A location and how often it appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    /// The location text.
    pub location: String,
    /// Number of entries logged there.
    pub count: usize,
}

/// Read-only view over a newest-first entry slice.
#[derive(Debug, Clone, Copy)]
pub struct LocationIndex<'a> {
    entries: &'a [LogEntry],
}

impl<'a> LocationIndex<'a> {
    /// Build an index over `entries`, which must be newest first.
    #[must_use]
    pub fn new(entries: &'a [LogEntry]) -> Self {
        Self { entries }
    }

    /// Up to `n` distinct locations, most recently used first.
    ///
    /// Blank and unspecified locations are skipped.
    #[must_use]
    pub fn recent_locations(&self, n: usize) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.location.as_str())
            .filter(|l| is_named(l))
            .filter(|l| seen.insert(*l))
            .take(n)
            .collect()
    }

    /// Up to `n` locations used at least `threshold` times, most used first.
    ///
    /// Ties are ordered by location name.
    #[must_use]
    pub fn common_locations(&self, threshold: usize, n: usize) -> Vec<LocationCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in self.entries.iter().filter(|e| is_named(&e.location)) {
            *counts.entry(entry.location.as_str()).or_default() += 1;
        }

        let mut common: Vec<LocationCount> = counts
            .into_iter()
            .filter(|(_, count)| *count >= threshold)
            .map(|(location, count)| LocationCount {
                location: location.to_string(),
                count,
            })
            .collect();
        common.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.location.cmp(&b.location)));
        common.truncate(n);
        common
    }
}

fn is_named(location: &str) -> bool {
    !location.trim().is_empty() && location != UNSPECIFIED_LOCATION
}
