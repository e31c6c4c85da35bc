//! Parser for exported trip dumps.

use std::io::Read;

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use serde_json::Value;

use crate::record::RawRecord;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes a trip dump into raw records.
///
/// Accepts a JSON array of objects (pandas `orient='records'`) or one JSON
/// object per line. Gzip-compressed input is detected by its magic bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid JSON, or if any row is not an object.
pub fn parse_dump(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut decoded)
            .context("failed to decompress gzip dump")?;
        return parse_dump(&decoded);
    }

    let text = std::str::from_utf8(bytes).context("dump is not valid UTF-8")?;
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with('[') {
        let rows: Vec<Value> = serde_json::from_str(trimmed).context("invalid JSON array")?;
        return rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| into_record(row, i))
            .collect();
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let row: Value =
                serde_json::from_str(line).with_context(|| format!("invalid JSON on line {}", i + 1))?;
            into_record(row, i)
        })
        .collect()
}

fn into_record(row: Value, position: usize) -> Result<RawRecord> {
    match row {
        Value::Object(map) => Ok(map),
        other => bail!(
            "row {} is not an object (found {})",
            position,
            kind(&other)
        ),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
