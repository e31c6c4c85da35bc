//! CLI entry point for the taxi trip statistics tool.
//!
//! Loads a trip dump once, then prints or exports descriptive statistics,
//! grouped summaries, frequency tables, weekday/weekend comparisons, or
//! scatter points.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use taxi_trip_stats::analyzers::aggregate::{
    GroupingOptions, build_grouped_frequencies, build_grouped_summary, compare_day_types,
    describe, scatter_points,
};
use taxi_trip_stats::analyzers::keys::{GroupBy, GroupOrder};
use taxi_trip_stats::{
    config::ReportConfig,
    dataset::TripDataset,
    fetch::BasicClient,
    output::{
        comparison_rows, field_rows, format_grouped, format_report, format_selected,
        frequency_rows, print_json, selected_rows, table_rows, write_csv, write_json,
    },
    record::{CategoricalField, TimestampUnit, TripField},
    stats::{Statistic, frequency_table},
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "taxi_trip_stats")]
#[command(about = "Descriptive statistics over NYC taxi trip dumps", long_about = None)]
struct Cli {
    /// Path or URL of the trip dump (JSON array or JSON lines, optionally gzipped)
    #[arg(short, long, global = true)]
    source: Option<String>,

    /// JSON file with report defaults
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// How numeric timestamps are read: auto, seconds or milliseconds
    #[arg(long, global = true)]
    timestamp_unit: Option<TimestampUnit>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trip counts, per-field statistics and categorical counts for the whole dataset
    Describe {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Write the report as JSON to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Write the per-field statistics table as CSV to this file
        #[arg(long)]
        csv: Option<String>,
    },
    /// Statistics of one numeric field per group
    Group {
        /// hour, day-type, weekday, payment-type, trip-type or rate-code
        #[arg(short, long)]
        by: GroupBy,

        /// Numeric field to summarize
        #[arg(short, long, default_value = "tip_amount")]
        field: TripField,

        /// Emit every key of the grouping's domain, even unobserved ones
        #[arg(long)]
        zero_fill: bool,

        /// First hour when grouping by hour (e.g. 6 for 6..23, 0..5)
        #[arg(long)]
        hour_start: Option<u32>,

        /// Comma-separated statistics (defaults to the config's statistics)
        #[arg(long, value_delimiter = ',')]
        stats: Vec<Statistic>,

        /// CSV file to write the groups to
        #[arg(short, long)]
        output: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Counts of a categorical field, overall or per group
    Frequency {
        /// payment-type, trip-type or rate-code
        #[arg(short, long, default_value = "payment-type")]
        field: CategoricalField,

        /// Optional grouping (e.g. day-type)
        #[arg(short, long)]
        by: Option<GroupBy>,

        /// CSV file to write the counts to
        #[arg(short, long)]
        output: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Weekday versus weekend comparison of numeric fields
    Compare {
        /// Comma-separated fields (defaults to the config's fields)
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<TripField>,

        /// Comma-separated statistics (defaults to the config's statistics)
        #[arg(long, value_delimiter = ',')]
        stats: Vec<Statistic>,

        /// CSV file to write the comparison to
        #[arg(short, long)]
        output: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Fractional pickup hour against a numeric field, for scatter plots
    Scatter {
        #[arg(short, long, default_value = "tip_amount")]
        field: TripField,

        /// CSV file to write the points to; prints JSON when absent
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/taxi_trip_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("taxi_trip_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(unit) = cli.timestamp_unit {
        config.timestamp_unit = unit;
    }

    let source = cli
        .source
        .clone()
        .or_else(|| config.source.clone())
        .or_else(|| std::env::var("TAXI_DATA_SOURCE").ok())
        .unwrap_or_else(|| "taxi.json".to_string());

    let client = BasicClient::new()?;
    let mut dataset = TripDataset::new(source, config.normalize_options());
    dataset.load(&client).await?;
    let records = dataset.records()?;

    info!(records = records.len(), source = dataset.source(), "Records ready");

    match cli.command {
        Commands::Describe { json, output, csv } => {
            let report = describe(records);

            if let Some(path) = output {
                write_json(&path, &report)?;
            }
            if let Some(path) = csv {
                write_csv(&path, &field_rows(&report.fields))?;
            }
            if json {
                print_json(&report)?;
            } else {
                print!("{}", format_report(&report));
            }
        }
        Commands::Group {
            by,
            field,
            zero_fill,
            hour_start,
            stats,
            output,
            json,
        } => {
            let options = grouping_options(
                by,
                zero_fill || config.zero_fill,
                hour_start.or(config.hour_start),
            );
            let summary =
                build_grouped_summary(records, |r| by.key(r), |r| field.value(r), &options);

            let stats = if stats.is_empty() {
                config.statistics.clone()
            } else {
                stats
            };
            let selected = summary.select(&stats);

            info!(groups = summary.len(), field = %field, "Grouped summary built");

            if let Some(path) = output {
                write_csv(&path, &selected_rows(&selected))?;
            }
            if json {
                print_json(&selected)?;
            } else {
                print!("{}", format_selected(&selected));
            }
        }
        Commands::Frequency {
            field,
            by,
            output,
            json,
        } => match by {
            Some(by) => {
                let options = grouping_options(by, config.zero_fill, config.hour_start);
                let summary =
                    build_grouped_frequencies(records, |r| by.key(r), |r| field.label(r), &options);

                if let Some(path) = output {
                    write_csv(&path, &frequency_rows(&summary))?;
                }
                if json {
                    print_json(&summary)?;
                } else {
                    print!("{}", format_grouped(&summary));
                }
            }
            None => {
                let table = frequency_table(records, |r| field.label(r));

                if let Some(path) = output {
                    write_csv(&path, &table_rows("all", &table))?;
                }
                if json {
                    print_json(&table)?;
                } else {
                    for (label, count) in table.sorted_by_count() {
                        println!("{field} {label}: {count}");
                    }
                    println!("total: {}", table.total());
                }
            }
        },
        Commands::Compare {
            fields,
            stats,
            output,
            json,
        } => {
            let fields = if fields.is_empty() {
                config.fields.clone()
            } else {
                fields
            };
            let stats = if stats.is_empty() {
                config.statistics.clone()
            } else {
                stats
            };
            let comparison = compare_day_types(records, &fields, &stats);

            if let Some(path) = output {
                write_csv(&path, &comparison_rows(&comparison))?;
            }
            if json {
                print_json(&comparison)?;
            } else {
                for row in comparison_rows(&comparison) {
                    println!(
                        "{:<24} {:<8} {:<26} {:.2}",
                        row.field, row.day_type, row.statistic, row.value
                    );
                }
            }
        }
        Commands::Scatter { field, output } => {
            let points = scatter_points(records, field);
            info!(points = points.len(), field = %field, "Scatter points built");

            match output {
                Some(path) => write_csv(&path, &points)?,
                None => print_json(&points)?,
            }
        }
    }

    Ok(())
}

/// Builds ordering and zero-fill options for a grouping dimension.
fn grouping_options(by: GroupBy, zero_fill: bool, hour_start: Option<u32>) -> GroupingOptions {
    let mut options = GroupingOptions::default();

    if let (GroupBy::Hour, Some(start)) = (by, hour_start) {
        options = options.with_order(GroupOrder::hours_from(start));
    }

    if zero_fill {
        match by.domain() {
            Some(domain) => options = options.with_zero_fill(domain),
            None => warn!(?by, "Grouping has no fixed domain, ignoring zero-fill"),
        }
    }

    options
}
