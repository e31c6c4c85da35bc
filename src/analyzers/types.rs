//! Data types produced by the grouping pipeline.

use serde::Serialize;

use crate::analyzers::keys::GroupKey;
use crate::record::TripField;
use crate::stats::{FrequencyTable, StatSelection, StatSummary, Statistic};

/// Per-group result: numeric statistics or categorical counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupSummary {
    Stats(StatSummary),
    Frequencies(FrequencyTable),
}

impl GroupSummary {
    pub fn as_stats(&self) -> Option<&StatSummary> {
        match self {
            GroupSummary::Stats(s) => Some(s),
            GroupSummary::Frequencies(_) => None,
        }
    }

    pub fn as_frequencies(&self) -> Option<&FrequencyTable> {
        match self {
            GroupSummary::Frequencies(f) => Some(f),
            GroupSummary::Stats(_) => None,
        }
    }
}

/// One group in a [`GroupedSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupEntry {
    pub key: GroupKey,
    pub summary: GroupSummary,
}

/// Ordered per-group results, ready for a chart or table renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedSummary {
    pub entries: Vec<GroupEntry>,
}

impl GroupedSummary {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&GroupSummary> {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .map(|e| &e.summary)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.entries.iter().map(|e| &e.key)
    }

    /// Projects every numeric group onto the requested statistics, keeping group
    /// order. Frequency groups have no statistics and are skipped.
    pub fn select(&self, statistics: &[Statistic]) -> Vec<SelectedGroup> {
        self.entries
            .iter()
            .filter_map(|e| {
                e.summary.as_stats().map(|s| SelectedGroup {
                    key: e.key.clone(),
                    statistics: s.select(statistics),
                })
            })
            .collect()
    }
}

/// A group reduced to a chosen subset of statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedGroup {
    pub key: GroupKey,
    pub statistics: StatSelection,
}

/// Statistics for one numeric field over a whole record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: TripField,
    pub summary: StatSummary,
}

/// Wide-form weekday versus weekend comparison for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldComparison {
    pub field: TripField,
    pub weekday: StatSelection,
    pub weekend: StatSelection,
}

/// Whole-dataset descriptive report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    pub total_trips: usize,
    pub weekday_trips: usize,
    pub weekend_trips: usize,
    pub fields: Vec<FieldSummary>,
    pub rate_code: FrequencyTable,
    pub payment_type: FrequencyTable,
    pub trip_type: FrequencyTable,
}

/// A trip positioned by continuous pickup time of day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub hour: f64,
    pub value: f64,
}
