use chrono::{DateTime, Duration, Utc};

use crate::config::{default_strategy_tags, Config, SessionWindow, SimilarityConfig};
use crate::models::{Side, TradeAnnotation, TradeRecord};

/// 2024-01-15 (a Monday) 00:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

/// Builder for canonical trades. Defaults: EURUSD long, opened 30 minutes
/// before close, closing at `base_time()`.
pub struct TradeBuilder {
    trade: TradeRecord,
}

impl TradeBuilder {
    pub fn new(id: &str, profit: f64) -> Self {
        let close = base_time();
        Self {
            trade: TradeRecord {
                id: id.to_string(),
                symbol: "EURUSD".to_string(),
                side: Side::Long,
                open_time: Some(close - Duration::minutes(30)),
                close_time: close,
                profit,
                pips: None,
                open_price: None,
                close_price: None,
                stop_loss: None,
                take_profit: None,
                strategy: None,
            },
        }
    }

    pub fn symbol(mut self, symbol: &str) -> Self {
        self.trade.symbol = symbol.to_string();
        self
    }

    pub fn side(mut self, side: Side) -> Self {
        self.trade.side = side;
        self
    }

    /// Sets close time and keeps the current holding duration.
    pub fn closed_at(mut self, close: DateTime<Utc>) -> Self {
        let hold = self
            .trade
            .open_time
            .map(|o| self.trade.close_time - o);
        self.trade.close_time = close;
        self.trade.open_time = hold.map(|h| close - h);
        self
    }

    pub fn held(mut self, minutes: i64) -> Self {
        self.trade.open_time = Some(self.trade.close_time - Duration::minutes(minutes));
        self
    }

    pub fn no_open_time(mut self) -> Self {
        self.trade.open_time = None;
        self
    }

    pub fn prices(mut self, open: f64, close: f64) -> Self {
        self.trade.open_price = Some(open);
        self.trade.close_price = Some(close);
        self
    }

    pub fn stop(mut self, stop: f64) -> Self {
        self.trade.stop_loss = Some(stop);
        self
    }

    pub fn pips(mut self, pips: f64) -> Self {
        self.trade.pips = Some(pips);
        self
    }

    pub fn strategy(mut self, strategy: &str) -> Self {
        self.trade.strategy = Some(strategy.to_string());
        self
    }

    pub fn build(self) -> TradeRecord {
        self.trade
    }
}

/// One trade per profit, closing an hour apart from `base_time()`.
pub fn hourly_trades(profits: &[f64]) -> Vec<TradeRecord> {
    profits
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            TradeBuilder::new(&format!("t{}", i + 1), p)
                .closed_at(base_time() + Duration::hours(i as i64))
                .build()
        })
        .collect()
}

/// One trade per profit, closing a day apart from `base_time()`.
pub fn daily_trades(profits: &[f64]) -> Vec<TradeRecord> {
    profits
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            TradeBuilder::new(&format!("t{}", i + 1), p)
                .closed_at(base_time() + Duration::days(i as i64) + Duration::hours(12))
                .build()
        })
        .collect()
}

pub fn note(entry: &[&str], technical: &[&str], market: &[&str], tags: &[&str]) -> TradeAnnotation {
    let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
    TradeAnnotation {
        entry_basis: owned(entry),
        technical: owned(technical),
        market: owned(market),
        tags: owned(tags),
    }
}

/// A Config suitable for testing: everything in UTC, default limits.
pub fn default_test_config() -> Config {
    Config {
        display_timezone: chrono_tz::UTC,
        broker_timezone: chrono_tz::UTC,
        preferred_session: SessionWindow::default(),
        strategy_tags: default_strategy_tags(),
        similarity: SimilarityConfig::default(),
        panel_timeout_secs: 5,
        log_level: "ERROR".to_string(),
    }
}
