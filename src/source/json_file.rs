use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ingest::{self, RawNote, RawTrade};
use crate::models::{AnnotationMap, TradeRecord};
use crate::source::TradeSource;

/// Reads a JSON array of journal rows and, optionally, a JSON array of
/// notes. Rows go through `ingest`, so aliased exports load as-is.
pub struct JsonFileSource {
    trades_path: PathBuf,
    notes_path: Option<PathBuf>,
    broker_tz: Tz,
}

impl JsonFileSource {
    pub fn new(trades_path: impl Into<PathBuf>, broker_tz: Tz) -> Self {
        Self {
            trades_path: trades_path.into(),
            notes_path: None,
            broker_tz,
        }
    }

    pub fn with_notes(mut self, notes_path: impl Into<PathBuf>) -> Self {
        self.notes_path = Some(notes_path.into());
        self
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let body = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("Failed to parse {}", path.display()))
}

#[async_trait]
impl TradeSource for JsonFileSource {
    async fn fetch_trades(&self) -> Result<Vec<TradeRecord>> {
        let rows: Vec<RawTrade> = read_json(&self.trades_path).await?;
        info!("Loaded {} rows from {}", rows.len(), self.trades_path.display());
        Ok(ingest::normalize_batch(&rows, self.broker_tz))
    }

    async fn fetch_annotations(&self) -> Result<AnnotationMap> {
        let Some(path) = &self.notes_path else {
            return Ok(AnnotationMap::new());
        };
        let notes: Vec<RawNote> = read_json(path).await?;
        Ok(ingest::annotations(&notes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("journal-analytics-{}-{}", std::process::id(), name));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_and_normalizes_rows() {
        let trades = temp_file(
            "trades.json",
            r#"[
                {"ticket": 1, "pair": "EURUSD", "side": "BUY", "profit": 10.0, "datetime": "2024-01-15 10:00:00"},
                {"ticket": 2, "pair": "BALANCE", "profit": 5000.0, "datetime": "2024-01-15 09:00:00"}
            ]"#,
        );
        let notes = temp_file("notes.json", r#"[{"ticket": 1, "tags": ["Trend"]}]"#);

        let source = JsonFileSource::new(&trades, chrono_tz::UTC).with_notes(&notes);
        let loaded = source.fetch_trades().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "1");

        let map = source.fetch_annotations().await.unwrap();
        assert_eq!(map["1"].tags, vec!["Trend".to_string()]);

        std::fs::remove_file(trades).ok();
        std::fs::remove_file(notes).ok();
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let source = JsonFileSource::new("/nonexistent/trades.json", chrono_tz::UTC);
        let err = source.fetch_trades().await.unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn no_notes_path_means_no_notes() {
        let source = JsonFileSource::new("/unused.json", chrono_tz::UTC);
        assert!(source.fetch_annotations().await.unwrap().is_empty());
    }
}
