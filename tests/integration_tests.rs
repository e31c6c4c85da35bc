use taxi_trip_stats::analyzers::aggregate::{
    GroupingOptions, build_grouped_frequencies, build_grouped_summary, compare_day_types,
    describe, scatter_points,
};
use taxi_trip_stats::analyzers::keys::{
    GroupKey, GroupOrder, day_type, hour_domain, hour_of_day, weekday,
};
use taxi_trip_stats::dataset::TripDataset;
use taxi_trip_stats::fetch::BasicClient;
use taxi_trip_stats::parser::parse_dump;
use taxi_trip_stats::record::{
    CanonicalRecord, CategoricalField, NormalizeOptions, TripField, normalize,
};
use taxi_trip_stats::stats::Statistic;

fn load_fixture() -> Vec<CanonicalRecord> {
    let bytes = include_bytes!("fixtures/green_trips_sample.json");
    let rows = parse_dump(bytes).expect("Failed to parse fixture");
    rows.iter().map(normalize).collect()
}

#[test]
fn test_full_pipeline_describe() {
    let records = load_fixture();
    let report = describe(&records);

    assert_eq!(report.total_trips, 8);
    assert_eq!(report.weekday_trips, 4);
    assert_eq!(report.weekend_trips, 3);

    assert_eq!(report.payment_type.get("1"), 5);
    assert_eq!(report.payment_type.get("2"), 2);
    assert_eq!(report.payment_type.get("3"), 1);
    assert_eq!(report.payment_type.total(), 8);

    assert_eq!(report.trip_type.get("null"), 1);
    assert_eq!(report.trip_type.total(), 7);
    assert_eq!(report.rate_code.get("5"), 1);

    let duration = report
        .fields
        .iter()
        .find(|f| f.field == TripField::TripDuration)
        .unwrap();
    assert_eq!(duration.summary.count, 5);
    assert_eq!(duration.summary.mean, 20.0);
    assert_eq!(duration.summary.median, 20.0);
    assert_eq!(duration.summary.variance, 50.0);

    let extra = report
        .fields
        .iter()
        .find(|f| f.field == TripField::Extra)
        .unwrap();
    assert_eq!(extra.summary.count, 6);
}

#[test]
fn test_mixed_timestamp_units_share_an_hour() {
    let records = load_fixture();

    assert_eq!(hour_of_day(&records[0]), Some(GroupKey::Hour(8)));
    assert_eq!(hour_of_day(&records[1]), Some(GroupKey::Hour(8)));
    assert_eq!(weekday(&records[0]), Some(GroupKey::Weekday(2)));
    assert_eq!(weekday(&records[3]), Some(GroupKey::Weekday(7)));
    assert_eq!(weekday(&records[4]), Some(GroupKey::Weekday(1)));
}

#[test]
fn test_tips_by_hour_from_six_with_zero_fill() {
    let records = load_fixture();
    let options = GroupingOptions::default()
        .with_order(GroupOrder::hours_from(6))
        .with_zero_fill(hour_domain());

    let summary = build_grouped_summary(
        &records,
        hour_of_day,
        |r| TripField::TipAmount.value(r),
        &options,
    );

    assert_eq!(summary.len(), 24);
    assert_eq!(summary.entries.first().map(|e| &e.key), Some(&GroupKey::Hour(6)));
    assert_eq!(summary.entries.last().map(|e| &e.key), Some(&GroupKey::Hour(5)));

    let eight = summary.get(&GroupKey::Hour(8)).unwrap().as_stats().unwrap();
    assert_eq!(eight.count, 3);
    assert!((eight.mean - 2.0 / 3.0).abs() < 1e-12);

    let midnight = summary.get(&GroupKey::Hour(0)).unwrap().as_stats().unwrap();
    assert_eq!(midnight.count, 0);
    assert_eq!(midnight.mean, 0.0);

    let counted: usize = summary
        .entries
        .iter()
        .filter_map(|e| e.summary.as_stats())
        .map(|s| s.count)
        .sum();
    // the trip without a pickup has no hour
    assert_eq!(counted, 7);
}

#[test]
fn test_payment_mix_by_day_type() {
    let records = load_fixture();

    let summary = build_grouped_frequencies(
        &records,
        day_type,
        |r| CategoricalField::PaymentType.label(r),
        &GroupingOptions::default(),
    );

    assert_eq!(
        summary.keys().cloned().collect::<Vec<_>>(),
        vec![GroupKey::Weekend(false), GroupKey::Weekend(true)]
    );

    let weekend = summary
        .get(&GroupKey::Weekend(true))
        .and_then(|s| s.as_frequencies())
        .unwrap();
    assert_eq!(weekend.get("1"), 2);
    assert_eq!(weekend.get("2"), 1);
}

#[test]
fn test_weekday_weekend_comparison() {
    let records = load_fixture();

    let comparison = compare_day_types(
        &records,
        &[TripField::TipAmount, TripField::FareAmount],
        &[Statistic::Count, Statistic::Mean],
    );

    let tips = &comparison[0];
    assert_eq!(tips.weekday.get(Statistic::Count), Some(4.0));
    assert_eq!(tips.weekday.get(Statistic::Mean), Some(1.5));
    let weekend_mean = tips.weekend.get(Statistic::Mean).unwrap();
    assert!((weekend_mean - 10.0 / 3.0).abs() < 1e-12);

    // "abc" fare collapses to 0
    let fares = &comparison[1];
    assert_eq!(fares.weekday.get(Statistic::Mean), Some(10.0));
}

#[test]
fn test_scatter_points_skip_zero_tips() {
    let records = load_fixture();

    let points = scatter_points(&records, TripField::TipAmount);

    assert_eq!(points.len(), 5);
    assert!(points.iter().all(|p| (0.0..24.0).contains(&p.hour)));
}

#[test]
fn test_normalization_is_idempotent() {
    let bytes = include_bytes!("fixtures/green_trips_sample.json");
    let rows = parse_dump(bytes).unwrap();

    for row in &rows {
        assert_eq!(normalize(row), normalize(row));
    }
}

#[tokio::test]
async fn test_dataset_loads_fixture_from_disk() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/green_trips_sample.json");
    let mut dataset = TripDataset::new(path, NormalizeOptions::default());

    assert!(dataset.records().is_err());

    let records = dataset.load(&BasicClient::new().unwrap()).await.unwrap();
    assert_eq!(records.len(), 8);
    assert!(dataset.is_loaded());
}
