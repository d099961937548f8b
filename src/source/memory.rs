use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AnnotationMap, TradeAnnotation, TradeRecord};
use crate::source::TradeSource;

/// A source over trades that are already normalized and held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    trades: Vec<TradeRecord>,
    notes: AnnotationMap,
}

impl MemorySource {
    pub fn new(trades: Vec<TradeRecord>) -> Self {
        Self {
            trades,
            notes: AnnotationMap::new(),
        }
    }

    pub fn with_note(mut self, id: &str, note: TradeAnnotation) -> Self {
        self.notes.insert(id.to_string(), note);
        self
    }
}

#[async_trait]
impl TradeSource for MemorySource {
    async fn fetch_trades(&self) -> Result<Vec<TradeRecord>> {
        Ok(self.trades.clone())
    }

    async fn fetch_annotations(&self) -> Result<AnnotationMap> {
        Ok(self.notes.clone())
    }
}
