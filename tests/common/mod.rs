use chrono::{DateTime, Duration, Utc};
use journal_analytics::config::{default_strategy_tags, Config, SessionWindow, SimilarityConfig};
use journal_analytics::models::{Side, TradeRecord};

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// One EURUSD long per profit, a day apart, opened at 09:00 and closed at 11:00 UTC.
pub fn make_trades(profits: &[f64]) -> Vec<TradeRecord> {
    profits
        .iter()
        .enumerate()
        .map(|(i, &profit)| {
            let close = base_time() + Duration::days(i as i64) + Duration::hours(11);
            TradeRecord {
                id: format!("T{}", i + 1),
                symbol: "EURUSD".to_string(),
                side: Side::Long,
                open_time: Some(close - Duration::hours(2)),
                close_time: close,
                profit,
                pips: None,
                open_price: Some(1.1000),
                close_price: Some(if profit >= 0.0 { 1.1020 } else { 1.0990 }),
                stop_loss: Some(1.0990),
                take_profit: None,
                strategy: None,
            }
        })
        .collect()
}

pub fn test_config() -> Config {
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
