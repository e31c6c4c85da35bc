//! Output formatting and persistence for trip statistics.
//!
//! Supports pretty-printing, JSON serialization, and CSV export. CSV rows are
//! flat so any table or chart tool can read them without knowing the nested
//! summary types.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{
    DatasetReport, FieldComparison, FieldSummary, GroupSummary, GroupedSummary, SelectedGroup,
};
use crate::stats::{FrequencyTable, StatSummary};
use csv::WriterBuilder;
use std::fmt::Write as _;
use std::fs::File;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Prints a value to stdout as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value to `path` as pretty-printed JSON, replacing any existing file.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    serde_json::to_writer_pretty(file, value)?;
    info!(path, "JSON written");
    Ok(())
}

/// One row per group of a statistics summary.
#[derive(Debug, Serialize)]
pub struct StatsRow {
    pub group: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub range: f64,
    pub coefficient_of_variation: f64,
}

impl StatsRow {
    fn new(group: String, s: &StatSummary) -> Self {
        Self {
            group,
            count: s.count,
            mean: s.mean,
            median: s.median,
            variance: s.variance,
            std_dev: s.std_dev,
            range: s.range,
            coefficient_of_variation: s.coefficient_of_variation,
        }
    }
}

/// One row per (group, category) pair of a frequency summary.
#[derive(Debug, Serialize)]
pub struct FrequencyRow {
    pub group: String,
    pub category: String,
    pub count: usize,
}

/// Long-form row of a group reduced to chosen statistics.
#[derive(Debug, Serialize)]
pub struct SelectedRow {
    pub group: String,
    pub statistic: String,
    pub value: f64,
}

/// Long-form comparison row: one value per field, day type and statistic.
#[derive(Debug, Serialize)]
pub struct ComparisonRow {
    pub field: String,
    pub day_type: &'static str,
    pub statistic: String,
    pub value: f64,
}

pub fn frequency_rows(summary: &GroupedSummary) -> Vec<FrequencyRow> {
    summary
        .entries
        .iter()
        .filter_map(|e| e.summary.as_frequencies().map(|t| (e.key.to_string(), t)))
        .flat_map(|(group, table)| table_rows(&group, table))
        .collect()
}

pub fn table_rows(group: &str, table: &FrequencyTable) -> Vec<FrequencyRow> {
    table
        .iter()
        .map(|(category, count)| FrequencyRow {
            group: group.to_string(),
            category: category.to_string(),
            count,
        })
        .collect()
}

pub fn field_rows(fields: &[FieldSummary]) -> Vec<StatsRow> {
    fields
        .iter()
        .map(|f| StatsRow::new(f.field.to_string(), &f.summary))
        .collect()
}

pub fn selected_rows(groups: &[SelectedGroup]) -> Vec<SelectedRow> {
    groups
        .iter()
        .flat_map(|g| {
            g.statistics.0.iter().map(|(statistic, value)| SelectedRow {
                group: g.key.to_string(),
                statistic: statistic.to_string(),
                value: *value,
            })
        })
        .collect()
}

pub fn comparison_rows(comparisons: &[FieldComparison]) -> Vec<ComparisonRow> {
    let mut rows = Vec::new();
    for c in comparisons {
        for (day_type, selection) in [("weekday", &c.weekday), ("weekend", &c.weekend)] {
            for (statistic, value) in &selection.0 {
                rows.push(ComparisonRow {
                    field: c.field.to_string(),
                    day_type,
                    statistic: statistic.to_string(),
                    value: *value,
                });
            }
        }
    }
    rows
}

/// Writes rows to a CSV file with a header line, replacing any existing file.
pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    debug!(path, rows = rows.len(), "Writing CSV");

    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path, rows = rows.len(), "CSV written");
    Ok(())
}

/// Renders a grouped summary as an aligned plain-text table.
pub fn format_grouped(summary: &GroupedSummary) -> String {
    let mut out = String::new();
    for entry in &summary.entries {
        match &entry.summary {
            GroupSummary::Stats(s) => {
                let _ = writeln!(
                    out,
                    "{:>10}  n={:<7} mean={:<10.2} median={:<10.2} sd={:<10.2} range={:<10.2} cv={:.2}%",
                    entry.key.to_string(),
                    s.count,
                    s.mean,
                    s.median,
                    s.std_dev,
                    s.range,
                    s.coefficient_of_variation
                );
            }
            GroupSummary::Frequencies(t) => {
                let counts: Vec<String> = t
                    .sorted_by_count()
                    .iter()
                    .map(|(label, count)| format!("{label}={count}"))
                    .collect();
                let _ = writeln!(
                    out,
                    "{:>10}  total={:<7} {}",
                    entry.key.to_string(),
                    t.total(),
                    counts.join(" ")
                );
            }
        }
    }
    out
}

/// Renders groups reduced to chosen statistics, one line per group.
pub fn format_selected(groups: &[SelectedGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        let values: Vec<String> = group
            .statistics
            .0
            .iter()
            .map(|(statistic, value)| format!("{statistic}={value:.2}"))
            .collect();
        let _ = writeln!(out, "{:>10}  {}", group.key.to_string(), values.join(" "));
    }
    out
}

/// Renders a whole-dataset report as plain text.
pub fn format_report(report: &DatasetReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total trips: {}", report.total_trips);
    let _ = writeln!(
        out,
        "Weekday trips: {} | Weekend trips: {}",
        report.weekday_trips, report.weekend_trips
    );

    let _ = writeln!(
        out,
        "\n{:<24} {:>8} {:>10} {:>10} {:>12} {:>10} {:>10} {:>8}",
        "field", "count", "mean", "median", "variance", "std_dev", "range", "cv%"
    );
    for f in &report.fields {
        let s = &f.summary;
        let _ = writeln!(
            out,
            "{:<24} {:>8} {:>10.2} {:>10.2} {:>12.2} {:>10.2} {:>10.2} {:>8.2}",
            f.field.to_string(),
            s.count,
            s.mean,
            s.median,
            s.variance,
            s.std_dev,
            s.range,
            s.coefficient_of_variation
        );
    }

    for (name, table) in [
        ("rate_code", &report.rate_code),
        ("payment_type", &report.payment_type),
        ("trip_type", &report.trip_type),
    ] {
        let counts: Vec<String> = table
            .iter()
            .map(|(label, count)| format!("{label}={count}"))
            .collect();
        let _ = writeln!(out, "\n{name}: {}", counts.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::keys::GroupKey;
    use crate::analyzers::types::GroupEntry;
    use crate::record::TripField;
    use crate::stats::{Statistic, aggregate};
    use std::env;
    use std::fs;
    use std::path::Path;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_summary() -> GroupedSummary {
        GroupedSummary {
            entries: vec![
                GroupEntry {
                    key: GroupKey::Hour(6),
                    summary: GroupSummary::Stats(aggregate(&[1.0, 3.0])),
                },
                GroupEntry {
                    key: GroupKey::Hour(7),
                    summary: GroupSummary::Stats(StatSummary::default()),
                },
            ],
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample_summary());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_summary()).unwrap();
    }

    fn sample_fields() -> Vec<FieldSummary> {
        vec![
            FieldSummary {
                field: TripField::TipAmount,
                summary: aggregate(&[1.0, 3.0]),
            },
            FieldSummary {
                field: TripField::Extra,
                summary: StatSummary::default(),
            },
        ]
    }

    #[test]
    fn test_field_rows() {
        let rows = field_rows(&sample_fields());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "tip_amount");
        assert_eq!(rows[0].mean, 2.0);
        assert_eq!(rows[1].count, 0);
    }

    #[test]
    fn test_frequency_rows() {
        let mut table = FrequencyTable::new();
        table.record("1");
        table.record("2");
        table.record("1");
        let summary = GroupedSummary {
            entries: vec![GroupEntry {
                key: GroupKey::Weekend(true),
                summary: GroupSummary::Frequencies(table),
            }],
        };

        let rows = frequency_rows(&summary);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "weekend");
        assert_eq!(rows[0].category, "1");
        assert_eq!(rows[0].count, 2);
    }

    #[test]
    fn test_comparison_rows() {
        let summary = aggregate(&[2.0, 4.0]);
        let comparisons = vec![FieldComparison {
            field: TripField::FareAmount,
            weekday: summary.select(&[Statistic::Mean, Statistic::Count]),
            weekend: summary.select(&[Statistic::Mean]),
        }];

        let rows = comparison_rows(&comparisons);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].field, "fare_amount");
        assert_eq!(rows[0].day_type, "weekday");
        assert_eq!(rows[2].day_type, "weekend");
        assert_eq!(rows[2].value, 3.0);
    }

    #[test]
    fn test_write_csv_writes_header_once() {
        let path = temp_path("taxi_trip_stats_test_groups.csv");
        let _ = fs::remove_file(&path);

        write_csv(&path, &field_rows(&sample_fields())).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("group,count,mean"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_csv_replaces_existing_file() {
        let path = temp_path("taxi_trip_stats_test_replace.csv");
        let rows = field_rows(&sample_fields());

        write_csv(&path, &rows).unwrap();
        write_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_round_trip() {
        let path = temp_path("taxi_trip_stats_test_summary.json");

        write_json(&path, &sample_summary()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["entries"][0]["key"], 6);
        assert_eq!(value["entries"][0]["summary"]["count"], 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_format_report() {
        let mut payments = FrequencyTable::new();
        payments.record("1");
        let report = DatasetReport {
            total_trips: 2,
            weekday_trips: 1,
            weekend_trips: 1,
            fields: vec![FieldSummary {
                field: TripField::TipAmount,
                summary: aggregate(&[1.0, 2.0]),
            }],
            rate_code: FrequencyTable::new(),
            payment_type: payments,
            trip_type: FrequencyTable::new(),
        };

        let text = format_report(&report);

        assert!(text.contains("Total trips: 2"));
        assert!(text.contains("tip_amount"));
        assert!(text.contains("payment_type: 1=1"));
    }

    #[test]
    fn test_selected_rows_and_text() {
        let groups = sample_summary().select(&[Statistic::Mean, Statistic::Count]);

        let rows = selected_rows(&groups);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].group, "6:00");
        assert_eq!(rows[0].statistic, "count");
        assert_eq!(rows[1].statistic, "mean");
        assert_eq!(rows[1].value, 2.0);

        let text = format_selected(&groups);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("count=2.00 mean=2.00"));
        assert!(!text.contains("median"));
    }

    #[test]
    fn test_format_grouped() {
        let text = format_grouped(&sample_summary());

        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("6:00"));
        assert!(text.contains("mean=2.00"));
    }
}
