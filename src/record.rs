//! Trip record normalization.
//!
//! Rows arrive from a JSON dump or a query result set as open-ended maps with
//! inconsistent typing: numbers as strings, timestamps in seconds in one export
//! and milliseconds in another, fields missing entirely. [`normalize`] turns
//! each row into a fixed-shape [`CanonicalRecord`] so everything downstream can
//! work against named fields only.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw trip row as produced by the loader.
pub type RawRecord = Map<String, Value>;

/// Raw timestamps below this are read as seconds since the epoch.
pub const SECONDS_THRESHOLD: f64 = 1e12;

/// How numeric timestamps in a raw record are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampUnit {
    /// Values below [`SECONDS_THRESHOLD`] are seconds, everything else milliseconds.
    #[default]
    Auto,
    Seconds,
    Milliseconds,
}

impl FromStr for TimestampUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "s" | "seconds" => Ok(Self::Seconds),
            "ms" | "milliseconds" => Ok(Self::Milliseconds),
            other => Err(format!("unknown timestamp unit '{other}'")),
        }
    }
}

/// Options controlling [`normalize_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub timestamp_unit: TimestampUnit,
}

/// Fixed-schema trip record.
///
/// Numeric core fields are never NaN: absent or unparseable input becomes 0.
/// Surcharges and categories stay `None` when the source row lacks the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub passenger_count: f64,
    pub trip_distance: f64,
    pub fare_amount: f64,
    pub tip_amount: f64,
    pub total_amount: f64,

    pub extra: Option<f64>,
    pub mta_tax: Option<f64>,
    pub tolls_amount: Option<f64>,
    pub improvement_surcharge: Option<f64>,
    pub congestion_surcharge: Option<f64>,

    pub payment_type: Option<String>,
    pub trip_type: Option<String>,
    pub rate_code: Option<String>,

    pub pickup: Option<DateTime<Utc>>,
    pub dropoff: Option<DateTime<Utc>>,
    pub trip_duration_minutes: Option<i64>,
    pub is_weekend: bool,
    /// UTC day of week of the pickup, Sunday = 1 through Saturday = 7.
    pub weekday_number: Option<u8>,
}

/// Normalizes a raw row using [`TimestampUnit::Auto`].
pub fn normalize(raw: &RawRecord) -> CanonicalRecord {
    normalize_with(raw, &NormalizeOptions::default())
}

pub fn normalize_with(raw: &RawRecord, options: &NormalizeOptions) -> CanonicalRecord {
    let pickup = raw
        .get("lpep_pickup_datetime")
        .and_then(|v| decode_instant(v, options.timestamp_unit));
    let dropoff = raw
        .get("lpep_dropoff_datetime")
        .and_then(|v| decode_instant(v, options.timestamp_unit));

    let weekday_number = pickup.map(|p| p.weekday().number_from_sunday() as u8);
    let is_weekend = matches!(weekday_number, Some(1) | Some(7));

    CanonicalRecord {
        passenger_count: number_field(raw, "passenger_count"),
        trip_distance: number_field(raw, "trip_distance"),
        fare_amount: number_field(raw, "fare_amount"),
        tip_amount: number_field(raw, "tip_amount"),
        total_amount: number_field(raw, "total_amount"),

        extra: raw.get("extra").map(coerce_number),
        mta_tax: raw.get("mta_tax").map(coerce_number),
        tolls_amount: raw.get("tolls_amount").map(coerce_number),
        improvement_surcharge: raw.get("improvement_surcharge").map(coerce_number),
        congestion_surcharge: raw.get("congestion_surcharge").map(coerce_number),

        payment_type: raw.get("payment_type").map(coerce_label),
        trip_type: raw.get("trip_type").map(coerce_label),
        rate_code: raw.get("RatecodeID").map(coerce_label),

        pickup,
        dropoff,
        trip_duration_minutes: trip_duration_minutes(pickup, dropoff),
        is_weekend,
        weekday_number,
    }
}

fn number_field(raw: &RawRecord, key: &str) -> f64 {
    raw.get(key).map(coerce_number).unwrap_or(0.0)
}

/// Reads a JSON value as a number, `None` when it has no numeric reading.
fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().ok()?
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => return None,
    };
    n.is_finite().then_some(n)
}

/// Coerces a JSON value to a finite number, collapsing anything else to 0.
pub fn coerce_number(value: &Value) -> f64 {
    numeric(value).unwrap_or(0.0)
}

/// Coerces a JSON value to the string used as a category label.
///
/// Integral floats drop their fraction so `1.0` and `1` land in the same bucket.
pub fn coerce_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Decodes a raw timestamp value into a UTC instant.
///
/// Zero, null and non-numeric values have no instant. RFC 3339 strings and
/// `YYYY-MM-DD HH:MM:SS` strings (read as UTC) are accepted as well.
pub fn decode_instant(value: &Value, unit: TimestampUnit) -> Option<DateTime<Utc>> {
    if let Value::String(s) = value {
        let trimmed = s.trim();
        if trimmed.parse::<f64>().is_err() {
            return parse_datetime_str(trimmed);
        }
    }

    let raw = match value {
        Value::Number(_) | Value::String(_) => numeric(value)?,
        _ => return None,
    };
    if raw == 0.0 {
        return None;
    }

    let millis = match unit {
        TimestampUnit::Auto if raw < SECONDS_THRESHOLD => raw * 1000.0,
        TimestampUnit::Auto | TimestampUnit::Milliseconds => raw,
        TimestampUnit::Seconds => raw * 1000.0,
    };
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }

    DateTime::from_timestamp_millis(millis.trunc() as i64)
}

fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Whole minutes between pickup and dropoff, `None` unless the trip has positive length.
pub fn trip_duration_minutes(
    pickup: Option<DateTime<Utc>>,
    dropoff: Option<DateTime<Utc>>,
) -> Option<i64> {
    let (pickup, dropoff) = (pickup?, dropoff?);
    let minutes = (dropoff - pickup).num_milliseconds() as f64 / 60_000.0;
    if minutes <= 0.0 {
        return None;
    }
    Some(minutes.round() as i64)
}

/// Numeric trip fields that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripField {
    PassengerCount,
    TripDistance,
    FareAmount,
    Extra,
    MtaTax,
    TipAmount,
    TollsAmount,
    ImprovementSurcharge,
    TotalAmount,
    CongestionSurcharge,
    TripDuration,
}

impl TripField {
    pub const ALL: [TripField; 11] = [
        TripField::PassengerCount,
        TripField::TripDistance,
        TripField::FareAmount,
        TripField::Extra,
        TripField::MtaTax,
        TripField::TipAmount,
        TripField::TollsAmount,
        TripField::ImprovementSurcharge,
        TripField::TotalAmount,
        TripField::CongestionSurcharge,
        TripField::TripDuration,
    ];

    /// Fields shown in the weekday/weekend comparison charts.
    pub const HEADLINE: [TripField; 5] = [
        TripField::TripDistance,
        TripField::FareAmount,
        TripField::TipAmount,
        TripField::TotalAmount,
        TripField::TripDuration,
    ];

    pub const SURCHARGES: [TripField; 4] = [
        TripField::Extra,
        TripField::MtaTax,
        TripField::ImprovementSurcharge,
        TripField::CongestionSurcharge,
    ];

    /// Extracts the field's sample from a record.
    ///
    /// `None` means the record contributes nothing to this field's statistics:
    /// an absent surcharge or a trip without a usable duration.
    pub fn value(self, record: &CanonicalRecord) -> Option<f64> {
        match self {
            TripField::PassengerCount => Some(record.passenger_count),
            TripField::TripDistance => Some(record.trip_distance),
            TripField::FareAmount => Some(record.fare_amount),
            TripField::TipAmount => Some(record.tip_amount),
            TripField::TotalAmount => Some(record.total_amount),
            TripField::Extra => record.extra,
            TripField::MtaTax => record.mta_tax,
            TripField::TollsAmount => record.tolls_amount,
            TripField::ImprovementSurcharge => record.improvement_surcharge,
            TripField::CongestionSurcharge => record.congestion_surcharge,
            TripField::TripDuration => record.trip_duration_minutes.map(|m| m as f64),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TripField::PassengerCount => "passenger_count",
            TripField::TripDistance => "trip_distance",
            TripField::FareAmount => "fare_amount",
            TripField::Extra => "extra",
            TripField::MtaTax => "mta_tax",
            TripField::TipAmount => "tip_amount",
            TripField::TollsAmount => "tolls_amount",
            TripField::ImprovementSurcharge => "improvement_surcharge",
            TripField::TotalAmount => "total_amount",
            TripField::CongestionSurcharge => "congestion_surcharge",
            TripField::TripDuration => "trip_duration",
        }
    }
}

impl fmt::Display for TripField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TripField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        TripField::ALL
            .into_iter()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| format!("unknown trip field '{s}'"))
    }
}

/// Categorical trip fields that can be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    PaymentType,
    TripType,
    RateCode,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::RateCode,
        CategoricalField::PaymentType,
        CategoricalField::TripType,
    ];

    pub fn label(self, record: &CanonicalRecord) -> Option<&str> {
        match self {
            CategoricalField::PaymentType => record.payment_type.as_deref(),
            CategoricalField::TripType => record.trip_type.as_deref(),
            CategoricalField::RateCode => record.rate_code.as_deref(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::PaymentType => "payment_type",
            CategoricalField::TripType => "trip_type",
            CategoricalField::RateCode => "rate_code",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CategoricalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "payment_type" => Ok(Self::PaymentType),
            "trip_type" => Ok(Self::TripType),
            "rate_code" | "RatecodeID" => Ok(Self::RateCode),
            _ => Err(format!("unknown categorical field '{s}'")),
        }
    }
}
