//! Grouped statistics over canonical trip records.
//!
//! Records are partitioned by a grouping key (hour of day, day type, weekday or
//! a categorical field), each partition is summarized, and the groups are
//! emitted in a caller-chosen order. Everything here is a pure function of its
//! inputs; loading and rendering live elsewhere.

pub mod aggregate;
pub mod keys;
pub mod types;
pub mod utility;
