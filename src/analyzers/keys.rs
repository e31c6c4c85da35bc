//! Grouping keys derived from canonical records.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::Serialize;

use crate::record::{CanonicalRecord, CategoricalField};

/// A value records are partitioned by.
///
/// Keys of the same variant compare naturally: hours ascending, weekday before
/// weekend, and categories numerically when both labels are numbers, otherwise
/// lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Hour(u32),
    Weekend(bool),
    Weekday(u8),
    Category(String),
}

impl GroupKey {
    fn variant_rank(&self) -> u8 {
        match self {
            GroupKey::Hour(_) => 0,
            GroupKey::Weekend(_) => 1,
            GroupKey::Weekday(_) => 2,
            GroupKey::Category(_) => 3,
        }
    }
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Hour(a), GroupKey::Hour(b)) => a.cmp(b),
            (GroupKey::Weekend(a), GroupKey::Weekend(b)) => a.cmp(b),
            (GroupKey::Weekday(a), GroupKey::Weekday(b)) => a.cmp(b),
            (GroupKey::Category(a), GroupKey::Category(b)) => compare_labels(a, b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Hour(h) => write!(f, "{h}:00"),
            GroupKey::Weekend(true) => f.write_str("weekend"),
            GroupKey::Weekend(false) => f.write_str("weekday"),
            GroupKey::Weekday(n) => write!(f, "{n}"),
            GroupKey::Category(label) => f.write_str(label),
        }
    }
}

/// Pickup hour (0-23, UTC).
pub fn hour_of_day(record: &CanonicalRecord) -> Option<GroupKey> {
    record.pickup.map(|p| GroupKey::Hour(p.hour()))
}

/// Weekday versus weekend. Records without a pickup have no day type.
pub fn day_type(record: &CanonicalRecord) -> Option<GroupKey> {
    record.pickup.map(|_| GroupKey::Weekend(record.is_weekend))
}

/// Day of week, Sunday = 1 through Saturday = 7.
pub fn weekday(record: &CanonicalRecord) -> Option<GroupKey> {
    record.weekday_number.map(GroupKey::Weekday)
}

pub fn category(record: &CanonicalRecord, field: CategoricalField) -> Option<GroupKey> {
    field
        .label(record)
        .map(|label| GroupKey::Category(label.to_string()))
}

pub fn payment_type(record: &CanonicalRecord) -> Option<GroupKey> {
    category(record, CategoricalField::PaymentType)
}

pub fn trip_type(record: &CanonicalRecord) -> Option<GroupKey> {
    category(record, CategoricalField::TripType)
}

pub fn rate_code(record: &CanonicalRecord) -> Option<GroupKey> {
    category(record, CategoricalField::RateCode)
}

/// Continuous pickup time of day, e.g. 19:30 becomes 19.5.
///
/// This is a positioning value for scatter plots, not a grouping key.
pub fn fractional_hour(record: &CanonicalRecord) -> Option<f64> {
    record
        .pickup
        .map(|p| p.hour() as f64 + p.minute() as f64 / 60.0)
}

/// All 24 hour keys in natural order.
pub fn hour_domain() -> Vec<GroupKey> {
    (0..24).map(GroupKey::Hour).collect()
}

/// The two day-type keys, weekday first.
pub fn day_type_domain() -> Vec<GroupKey> {
    vec![GroupKey::Weekend(false), GroupKey::Weekend(true)]
}

/// Weekday keys 1 through 7.
pub fn weekday_domain() -> Vec<GroupKey> {
    (1..=7).map(GroupKey::Weekday).collect()
}

/// Named dimension to group by, used where the key function is chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Hour,
    DayType,
    Weekday,
    Category(CategoricalField),
}

impl GroupBy {
    pub fn key(self, record: &CanonicalRecord) -> Option<GroupKey> {
        match self {
            GroupBy::Hour => hour_of_day(record),
            GroupBy::DayType => day_type(record),
            GroupBy::Weekday => weekday(record),
            GroupBy::Category(field) => category(record, field),
        }
    }

    /// Complete key domain for fixed dimensions; categories have none.
    pub fn domain(self) -> Option<Vec<GroupKey>> {
        match self {
            GroupBy::Hour => Some(hour_domain()),
            GroupBy::DayType => Some(day_type_domain()),
            GroupBy::Weekday => Some(weekday_domain()),
            GroupBy::Category(_) => None,
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "-").as_str() {
            "hour" => Ok(GroupBy::Hour),
            "day-type" => Ok(GroupBy::DayType),
            "weekday" => Ok(GroupBy::Weekday),
            other => other
                .parse::<CategoricalField>()
                .map(GroupBy::Category)
                .map_err(|_| format!("unknown grouping '{s}'")),
        }
    }
}

/// Output ordering of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupOrder {
    #[default]
    Natural,
    /// Keys in the listed order; unlisted keys follow in natural order.
    Explicit(Vec<GroupKey>),
}

impl GroupOrder {
    /// Hours rotated to begin at `start`, e.g. 6..=23 then 0..=5 for a day starting at 06:00.
    pub fn hours_from(start: u32) -> Self {
        let start = start % 24;
        GroupOrder::Explicit((0..24).map(|h| GroupKey::Hour((start + h) % 24)).collect())
    }

    pub fn compare(&self, a: &GroupKey, b: &GroupKey) -> Ordering {
        match self {
            GroupOrder::Natural => a.cmp(b),
            GroupOrder::Explicit(keys) => {
                let rank = |k: &GroupKey| keys.iter().position(|x| x == k).unwrap_or(keys.len());
                rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawRecord, normalize};
    use serde_json::json;

    fn record_at(ts: i64) -> CanonicalRecord {
        let mut raw = RawRecord::new();
        raw.insert("lpep_pickup_datetime".into(), json!(ts));
        raw.insert("payment_type".into(), json!(1));
        normalize(&raw)
    }

    #[test]
    fn test_hour_of_day() {
        // 2023-11-14 22:13:20 UTC
        let record = record_at(1_700_000_000);

        assert_eq!(hour_of_day(&record), Some(GroupKey::Hour(22)));
        assert_eq!(weekday(&record), Some(GroupKey::Weekday(3)));
        assert_eq!(day_type(&record), Some(GroupKey::Weekend(false)));
    }

    #[test]
    fn test_fractional_hour() {
        // 2023-01-01 19:30:00 UTC
        let record = record_at(1_672_601_400);

        assert_eq!(fractional_hour(&record), Some(19.5));
    }

    #[test]
    fn test_keys_without_pickup() {
        let record = normalize(&RawRecord::new());

        assert_eq!(hour_of_day(&record), None);
        assert_eq!(day_type(&record), None);
        assert_eq!(weekday(&record), None);
        assert_eq!(fractional_hour(&record), None);
        assert_eq!(payment_type(&record), None);
    }

    #[test]
    fn test_category_key() {
        let record = record_at(1_700_000_000);

        assert_eq!(payment_type(&record), Some(GroupKey::Category("1".into())));
        assert_eq!(trip_type(&record), None);
    }

    #[test]
    fn test_hours_from_six() {
        let order = GroupOrder::hours_from(6);
        let mut keys = hour_domain();
        keys.sort_by(|a, b| order.compare(a, b));

        let hours: Vec<u32> = keys
            .iter()
            .map(|k| match k {
                GroupKey::Hour(h) => *h,
                _ => unreachable!(),
            })
            .collect();
        let expected: Vec<u32> = (6..24).chain(0..6).collect();
        assert_eq!(hours, expected);
    }

    #[test]
    fn test_explicit_order_puts_unlisted_last() {
        let order = GroupOrder::Explicit(vec![
            GroupKey::Category("2".into()),
            GroupKey::Category("1".into()),
        ]);
        let mut keys = vec![
            GroupKey::Category("5".into()),
            GroupKey::Category("1".into()),
            GroupKey::Category("3".into()),
            GroupKey::Category("2".into()),
        ];
        keys.sort_by(|a, b| order.compare(a, b));

        assert_eq!(
            keys,
            vec![
                GroupKey::Category("2".into()),
                GroupKey::Category("1".into()),
                GroupKey::Category("3".into()),
                GroupKey::Category("5".into()),
            ]
        );
    }

    #[test]
    fn test_natural_order_sorts_numeric_labels_as_numbers() {
        let mut keys: Vec<GroupKey> = ["10", "2", "null", "99", "1"]
            .into_iter()
            .map(|l| GroupKey::Category(l.to_string()))
            .collect();

        keys.sort_by(|a, b| GroupOrder::Natural.compare(a, b));

        let labels: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, vec!["1", "2", "10", "99", "null"]);
    }

    #[test]
    fn test_group_by_parse_and_domain() {
        assert_eq!("hour".parse::<GroupBy>(), Ok(GroupBy::Hour));
        assert_eq!("day_type".parse::<GroupBy>(), Ok(GroupBy::DayType));
        assert_eq!(
            "payment-type".parse::<GroupBy>(),
            Ok(GroupBy::Category(CategoricalField::PaymentType))
        );
        assert!("month".parse::<GroupBy>().is_err());

        assert_eq!(GroupBy::Hour.domain().map(|d| d.len()), Some(24));
        assert_eq!(GroupBy::Weekday.domain().map(|d| d.len()), Some(7));
        assert_eq!(GroupBy::Category(CategoricalField::TripType).domain(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(GroupKey::Hour(6).to_string(), "6:00");
        assert_eq!(GroupKey::Weekend(true).to_string(), "weekend");
        assert_eq!(GroupKey::Weekend(false).to_string(), "weekday");
    }
}
