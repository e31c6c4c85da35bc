//! Descriptive statistics over numeric samples and categorical counts.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::analyzers::utility::{coefficient_of_variation, mean, median, range, variance};

/// Summary of one numeric sample set.
///
/// Empty input produces a summary where every field is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population variance (divisor `count`).
    pub variance: f64,
    pub std_dev: f64,
    pub range: f64,
    /// `std_dev / mean * 100`, or 0 when the mean is 0.
    pub coefficient_of_variation: f64,
}

impl StatSummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let avg = mean(samples);
        let var = variance(samples, avg);
        let sd = var.sqrt();

        StatSummary {
            count: samples.len(),
            mean: avg,
            median: median(samples),
            variance: var,
            std_dev: sd,
            range: range(samples),
            coefficient_of_variation: coefficient_of_variation(sd, avg),
        }
    }

    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Count => self.count as f64,
            Statistic::Mean => self.mean,
            Statistic::Median => self.median,
            Statistic::Variance => self.variance,
            Statistic::StdDev => self.std_dev,
            Statistic::Range => self.range,
            Statistic::CoefficientOfVariation => self.coefficient_of_variation,
        }
    }

    /// Projects the summary onto the requested statistics.
    pub fn select(&self, statistics: &[Statistic]) -> StatSelection {
        StatSelection(statistics.iter().map(|s| (*s, self.get(*s))).collect())
    }
}

/// Computes a [`StatSummary`] for a sample set.
pub fn aggregate(samples: &[f64]) -> StatSummary {
    StatSummary::from_samples(samples)
}

/// Names one field of a [`StatSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Count,
    Mean,
    Median,
    Variance,
    StdDev,
    Range,
    CoefficientOfVariation,
}

impl Statistic {
    pub const ALL: [Statistic; 7] = [
        Statistic::Count,
        Statistic::Mean,
        Statistic::Median,
        Statistic::Variance,
        Statistic::StdDev,
        Statistic::Range,
        Statistic::CoefficientOfVariation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Variance => "variance",
            Statistic::StdDev => "std_dev",
            Statistic::Range => "range",
            Statistic::CoefficientOfVariation => "coefficient_of_variation",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "cv" => Ok(Statistic::CoefficientOfVariation),
            "stddev" | "sd" => Ok(Statistic::StdDev),
            other => Statistic::ALL
                .into_iter()
                .find(|stat| stat.name() == other)
                .ok_or_else(|| format!("unknown statistic '{s}'")),
        }
    }
}

/// A subset of a [`StatSummary`], keyed by statistic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatSelection(pub BTreeMap<Statistic, f64>);

impl StatSelection {
    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        self.0.get(&statistic).copied()
    }
}

/// Occurrence counts per category, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push((label.to_string(), 1));
            }
        }
    }

    pub fn get(&self, label: &str) -> usize {
        self.index.get(label).map_or(0, |&pos| self.entries[pos].1)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(label, count)| (label.as_str(), *count))
    }

    /// Entries by count, highest first; ties keep first-seen order.
    pub fn sorted_by_count(&self) -> Vec<(&str, usize)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Counts the labels produced by `field` across `records`, skipping records with none.
pub fn frequency_table<'a, R, F>(records: impl IntoIterator<Item = &'a R>, field: F) -> FrequencyTable
where
    R: 'a,
    F: Fn(&R) -> Option<&str>,
{
    let mut table = FrequencyTable::new();
    for record in records {
        if let Some(label) = field(record) {
            table.record(label);
        }
    }
    table
}
