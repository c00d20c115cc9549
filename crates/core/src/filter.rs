//! Facet filtering over fetched file lists.
//!
//! A filter keeps a record when its facet carries at least one of the
//! accepted values. An empty accepted set is the "All" state and keeps
//! everything. Several facets combine as AND by narrowing one after another.

use crate::types::FileRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Keep only records whose `facet` matches at least one accepted value.
pub fn filter_by_facet<'a, I>(records: I, facet: &str, accepted: &BTreeSet<String>) -> Vec<FileRecord>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    let records = records.into_iter();
    if accepted.is_empty() {
        return records.cloned().collect();
    }

    records
        .filter(|record| record_matches(record, facet, accepted))
        .cloned()
        .collect()
}

fn record_matches(record: &FileRecord, facet: &str, accepted: &BTreeSet<String>) -> bool {
    match record.facet(facet) {
        Some(value) => accepted.iter().any(|candidate| value.matches(candidate)),
        None => false,
    }
}

/// Accepted values per facet, as chosen in the filter panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection {
    facets: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the accepted values for a facet.
    pub fn set<I, S>(&mut self, facet: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets
            .insert(facet.into(), values.into_iter().map(Into::into).collect());
    }

    /// Builder form of [`FilterSelection::set`].
    pub fn with<I, S>(mut self, facet: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(facet, values);
        self
    }

    /// Check or uncheck a single value.
    ///
    /// Returns true when the value is accepted after the toggle.
    pub fn toggle(&mut self, facet: &str, value: &str) -> bool {
        let values = self.facets.entry(facet.to_string()).or_default();
        if values.remove(value) {
            false
        } else {
            values.insert(value.to_string());
            true
        }
    }

    /// Accepted values for a facet, if any were ever set.
    pub fn accepted(&self, facet: &str) -> Option<&BTreeSet<String>> {
        self.facets.get(facet)
    }

    /// Whether any facet currently narrows the list.
    pub fn is_active(&self) -> bool {
        self.facets.values().any(|values| !values.is_empty())
    }

    /// Drop every accepted value.
    pub fn clear(&mut self) {
        self.facets.clear();
    }

    /// Iterate facets that narrow the list.
    pub fn active_facets(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.facets
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(facet, values)| (facet.as_str(), values))
    }

    /// Narrow `records` by every facet in turn.
    pub fn apply<'a, I>(&self, records: I) -> Vec<FileRecord>
    where
        I: IntoIterator<Item = &'a FileRecord>,
    {
        let mut narrowed: Vec<FileRecord> = records.into_iter().cloned().collect();
        for (facet, accepted) in self.active_facets() {
            narrowed = filter_by_facet(&narrowed, facet, accepted);
            log::debug!(
                "Facet '{}' kept {} record(s) for {} value(s)",
                facet,
                narrowed.len(),
                accepted.len()
            );
        }
        narrowed
    }
}
