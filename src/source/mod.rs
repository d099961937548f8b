pub mod json_file;
pub mod memory;

pub use json_file::JsonFileSource;
pub use memory::MemorySource;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AnnotationMap, TradeRecord};

/// Supplies the closed-trade history and its journal notes.
#[async_trait]
pub trait TradeSource: Send + Sync {
    async fn fetch_trades(&self) -> Result<Vec<TradeRecord>>;
    async fn fetch_annotations(&self) -> Result<AnnotationMap>;
}
