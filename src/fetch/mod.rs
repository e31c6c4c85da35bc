//! Retrieval of trip dumps from disk or over HTTP.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::{debug, info};

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// Returns `true` when `source` names an HTTP(S) resource rather than a local path.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Loads dump bytes from a local file path or an HTTP(S) URL.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        fetch_bytes(client, source)
            .await
            .with_context(|| format!("failed to download {source}"))?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("failed to read {source}"))?
    };

    info!(bytes = bytes.len(), "Dump loaded");
    debug!(remote = is_remote(source), "Dump source");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/taxi.json"));
        assert!(is_remote("http://localhost:8080/taxi.json"));
        assert!(!is_remote("data/taxi.json"));
        assert!(!is_remote("httpdocs/taxi.json"));
    }

    #[tokio::test]
    async fn test_load_source_reads_local_file() {
        let path = format!("{}/taxi_trip_stats_fetch_local.json", env::temp_dir().display());
        fs::write(&path, b"[]").unwrap();

        let bytes = load_source(&BasicClient::new().unwrap(), &path).await.unwrap();
        assert_eq!(bytes, b"[]");

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_source_missing_file() {
        let result = load_source(&BasicClient::new().unwrap(), "/nonexistent/taxi.json").await;
        assert!(result.is_err());
    }
}
