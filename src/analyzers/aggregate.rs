use crate::analyzers::keys::{GroupKey, GroupOrder, day_type, fractional_hour};
use crate::analyzers::types::{
    DatasetReport, FieldComparison, FieldSummary, GroupEntry, GroupSummary, GroupedSummary,
    ScatterPoint,
};
use crate::record::{CanonicalRecord, CategoricalField, TripField};
use crate::stats::{FrequencyTable, StatSummary, Statistic, aggregate, frequency_table};
use std::collections::BTreeMap;
use tracing::debug;

/// How groups are laid out in a [`GroupedSummary`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingOptions {
    pub order: GroupOrder,
    /// When set, every key in this domain gets an entry even if no record maps to it.
    pub zero_fill: Option<Vec<GroupKey>>,
}

impl GroupingOptions {
    pub fn with_order(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_zero_fill(mut self, domain: Vec<GroupKey>) -> Self {
        self.zero_fill = Some(domain);
        self
    }
}

/// Splits records by key. Records whose key function yields `None` are counted, not grouped.
fn partition<'a, R, K>(
    records: &'a [R],
    key_fn: K,
    options: &GroupingOptions,
) -> BTreeMap<GroupKey, Vec<&'a R>>
where
    K: Fn(&R) -> Option<GroupKey>,
{
    let mut groups: BTreeMap<GroupKey, Vec<&R>> = BTreeMap::new();

    if let Some(domain) = &options.zero_fill {
        for key in domain {
            groups.entry(key.clone()).or_default();
        }
    }

    let mut unkeyed = 0usize;
    for record in records {
        match key_fn(record) {
            Some(key) => groups.entry(key).or_default().push(record),
            None => unkeyed += 1,
        }
    }

    debug!(
        records = records.len(),
        groups = groups.len(),
        unkeyed,
        "Partitioned records"
    );

    groups
}

fn finish(mut entries: Vec<GroupEntry>, options: &GroupingOptions) -> GroupedSummary {
    entries.sort_by(|a, b| options.order.compare(&a.key, &b.key));
    GroupedSummary { entries }
}

/// Groups `records` by `key_fn` and summarizes the samples `value_fn` extracts from each group.
///
/// Samples for which `value_fn` returns `None` are left out of their group's statistics.
pub fn build_grouped_summary<R, K, V>(
    records: &[R],
    key_fn: K,
    value_fn: V,
    options: &GroupingOptions,
) -> GroupedSummary
where
    K: Fn(&R) -> Option<GroupKey>,
    V: Fn(&R) -> Option<f64>,
{
    let entries = partition(records, key_fn, options)
        .into_iter()
        .map(|(key, members)| {
            let samples: Vec<f64> = members.iter().filter_map(|r| value_fn(*r)).collect();
            GroupEntry {
                key,
                summary: GroupSummary::Stats(aggregate(&samples)),
            }
        })
        .collect();

    finish(entries, options)
}

/// Groups `records` by `key_fn` and counts the labels `label_fn` yields within each group.
pub fn build_grouped_frequencies<R, K, L>(
    records: &[R],
    key_fn: K,
    label_fn: L,
    options: &GroupingOptions,
) -> GroupedSummary
where
    K: Fn(&R) -> Option<GroupKey>,
    L: Fn(&R) -> Option<&str>,
{
    let entries = partition(records, key_fn, options)
        .into_iter()
        .map(|(key, members)| {
            let mut table = FrequencyTable::new();
            for record in members {
                if let Some(label) = label_fn(record) {
                    table.record(label);
                }
            }
            GroupEntry {
                key,
                summary: GroupSummary::Frequencies(table),
            }
        })
        .collect();

    finish(entries, options)
}

fn field_samples<'a>(
    records: impl IntoIterator<Item = &'a CanonicalRecord>,
    field: TripField,
) -> Vec<f64> {
    records.into_iter().filter_map(|r| field.value(r)).collect()
}

/// One [`StatSummary`] per field over the whole record set.
pub fn summarize_fields(records: &[CanonicalRecord], fields: &[TripField]) -> Vec<FieldSummary> {
    fields
        .iter()
        .map(|&field| FieldSummary {
            field,
            summary: aggregate(&field_samples(records, field)),
        })
        .collect()
}

/// Compares each field between weekday and weekend trips.
///
/// Trips without a pickup instant belong to neither side.
pub fn compare_day_types(
    records: &[CanonicalRecord],
    fields: &[TripField],
    statistics: &[Statistic],
) -> Vec<FieldComparison> {
    let (weekend, weekday): (Vec<&CanonicalRecord>, Vec<&CanonicalRecord>) = records
        .iter()
        .filter(|r| day_type(r).is_some())
        .partition(|r| r.is_weekend);

    debug!(
        weekday = weekday.len(),
        weekend = weekend.len(),
        "Comparing day types"
    );

    fields
        .iter()
        .map(|&field| FieldComparison {
            field,
            weekday: summarize_refs(&weekday, field).select(statistics),
            weekend: summarize_refs(&weekend, field).select(statistics),
        })
        .collect()
}

fn summarize_refs(records: &[&CanonicalRecord], field: TripField) -> StatSummary {
    aggregate(&field_samples(records.iter().copied(), field))
}

/// Trip counts, per-field statistics and categorical counts for a whole dataset.
pub fn describe(records: &[CanonicalRecord]) -> DatasetReport {
    let weekend_trips = records
        .iter()
        .filter(|r| r.pickup.is_some() && r.is_weekend)
        .count();
    let weekday_trips = records
        .iter()
        .filter(|r| r.pickup.is_some() && !r.is_weekend)
        .count();

    let counts = |field: CategoricalField| frequency_table(records, |r| field.label(r));

    DatasetReport {
        total_trips: records.len(),
        weekday_trips,
        weekend_trips,
        fields: summarize_fields(records, &TripField::ALL),
        rate_code: counts(CategoricalField::RateCode),
        payment_type: counts(CategoricalField::PaymentType),
        trip_type: counts(CategoricalField::TripType),
    }
}

/// Pairs each trip's fractional pickup hour with a field value.
///
/// Trips without a pickup, without the field, or with a zero value are skipped.
pub fn scatter_points(records: &[CanonicalRecord], field: TripField) -> Vec<ScatterPoint> {
    records
        .iter()
        .filter_map(|r| {
            let hour = fractional_hour(r)?;
            let value = field.value(r)?;
            (value != 0.0).then_some(ScatterPoint { hour, value })
        })
        .collect()
}
