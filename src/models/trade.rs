use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::side::Side;

/// A closed trade in canonical form. Produced once by `ingest` and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    #[serde(default)]
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: DateTime<Utc>,
    pub profit: f64,
    #[serde(default)]
    pub pips: Option<f64>,
    #[serde(default)]
    pub open_price: Option<f64>,
    #[serde(default)]
    pub close_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub strategy: Option<String>,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.profit > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.profit < 0.0
    }

    /// Time the position was entered, falling back to the close when the
    /// open timestamp is unknown.
    pub fn entry_time(&self) -> DateTime<Utc> {
        self.open_time.unwrap_or(self.close_time)
    }

    pub fn holding_minutes(&self) -> Option<f64> {
        self.open_time
            .map(|open| (self.close_time - open).num_seconds() as f64 / 60.0)
    }

    pub fn holding_hours(&self) -> Option<f64> {
        self.holding_minutes().map(|m| m / 60.0)
    }

    /// Realized price distance over stop distance, sign-adjusted for side.
    /// `None` when there is no usable stop.
    pub fn r_multiple(&self) -> Option<f64> {
        let stop = self.stop_loss.filter(|s| *s != 0.0)?;
        let entry = self.open_price?;
        let exit = self.close_price?;

        let risk = (entry - stop).abs();
        if risk == 0.0 {
            return None;
        }

        Some((exit - entry) / risk * self.side.sign())
    }

    pub fn strategy_label(&self) -> &str {
        match self.strategy.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => "untagged",
        }
    }
}

/// Journal notes attached to a trade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeAnnotation {
    #[serde(default)]
    pub entry_basis: Vec<String>,
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub market: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TradeAnnotation {
    /// First free tag that belongs to `vocabulary`.
    pub fn strategy_tag<'a>(&'a self, vocabulary: &[String]) -> Option<&'a str> {
        self.tags
            .iter()
            .find(|t| vocabulary.iter().any(|v| v == *t))
            .map(|t| t.as_str())
    }
}

pub type AnnotationMap = HashMap<String, TradeAnnotation>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TradeBuilder;

    #[test]
    fn long_r_multiple() {
        let t = TradeBuilder::new("1", 100.0)
            .prices(1000.0, 1250.0)
            .stop(900.0)
            .build();
        assert!((t.r_multiple().unwrap() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn short_r_multiple_is_sign_flipped() {
        let t = TradeBuilder::new("1", 100.0)
            .side(Side::Short)
            .prices(1000.0, 1250.0)
            .stop(1100.0)
            .build();
        assert!((t.r_multiple().unwrap() + 2.5).abs() < 1e-9);
    }

    #[test]
    fn no_stop_means_no_r() {
        let t = TradeBuilder::new("1", 100.0).prices(1.0, 2.0).build();
        assert!(t.r_multiple().is_none());

        let zero_stop = TradeBuilder::new("2", 100.0).prices(1.0, 2.0).stop(0.0).build();
        assert!(zero_stop.r_multiple().is_none());

        let at_entry = TradeBuilder::new("3", 100.0).prices(1.0, 2.0).stop(1.0).build();
        assert!(at_entry.r_multiple().is_none());
    }

    #[test]
    fn strategy_tag_uses_vocabulary_order_of_tags() {
        let vocab = vec!["Trend".to_string(), "Range".to_string()];
        let note = TradeAnnotation {
            tags: vec!["fomo".into(), "Range".into(), "Trend".into()],
            ..Default::default()
        };
        assert_eq!(note.strategy_tag(&vocab), Some("Range"));
        assert_eq!(TradeAnnotation::default().strategy_tag(&vocab), None);
    }

    #[test]
    fn blank_strategy_is_untagged() {
        let t = TradeBuilder::new("1", -5.0).strategy("  ").build();
        assert_eq!(t.strategy_label(), "untagged");
    }
}
