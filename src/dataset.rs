//! Load-once cache of normalized trip records.
//!
//! The dataset is fetched and normalized the first time it is needed and then
//! handed to every report from memory. The cache is an explicit value owned by
//! the caller; the aggregation functions never reach for it themselves.

use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::fetch::{HttpClient, load_source};
use crate::parser::parse_dump;
use crate::record::{CanonicalRecord, NormalizeOptions, RawRecord, normalize_with};

pub struct TripDataset {
    source: String,
    options: NormalizeOptions,
    records: Option<Vec<CanonicalRecord>>,
}

impl TripDataset {
    pub fn new(source: impl Into<String>, options: NormalizeOptions) -> Self {
        Self {
            source: source.into(),
            options,
            records: None,
        }
    }

    /// Builds an already-loaded dataset from raw rows.
    pub fn from_raw(rows: &[RawRecord], options: NormalizeOptions) -> Self {
        Self {
            source: String::from("<memory>"),
            options,
            records: Some(normalize_all(rows, &options)),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.records.is_some()
    }

    /// Fetches, parses and normalizes the source unless that has already happened.
    #[tracing::instrument(skip(self, client), fields(source = %self.source))]
    pub async fn load<C: HttpClient>(&mut self, client: &C) -> Result<&[CanonicalRecord]> {
        if self.records.is_none() {
            let bytes = load_source(client, &self.source).await?;
            let rows = parse_dump(&bytes)?;
            let records = normalize_all(&rows, &self.options);
            info!(rows = rows.len(), "Dataset loaded and normalized");
            self.records = Some(records);
        } else {
            debug!("Dataset already loaded, reusing cached records");
        }

        self.records()
    }

    /// Records from a previous [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// Fails if the dataset has not been loaded yet.
    pub fn records(&self) -> Result<&[CanonicalRecord]> {
        self.records
            .as_deref()
            .ok_or_else(|| anyhow!("dataset '{}' not loaded; call load() first", self.source))
    }

    /// Drops cached records so the next [`load`](Self::load) fetches again.
    pub fn invalidate(&mut self) {
        self.records = None;
    }
}

fn normalize_all(rows: &[RawRecord], options: &NormalizeOptions) -> Vec<CanonicalRecord> {
    rows.iter().map(|row| normalize_with(row, options)).collect()
}
