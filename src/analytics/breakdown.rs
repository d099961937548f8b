use serde::{Deserialize, Serialize};

use crate::models::TradeRecord;

/// Stand-in for an unbounded profit factor (no losing trades).
pub const PROFIT_FACTOR_CAP: f64 = 999.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub key: String,
    /// Loss magnitude (positive).
    pub loss: f64,
    pub trades: usize,
}

/// Sums loss magnitude of `trades` per key, largest first, keeping at most
/// `limit` rows. Trades whose key is `None` are left out. Ties keep the
/// order in which keys first appeared.
pub fn loss_breakdown<'a, I, F>(trades: I, key: F, limit: usize) -> Vec<LossBreakdown>
where
    I: IntoIterator<Item = &'a TradeRecord>,
    F: Fn(&TradeRecord) -> Option<String>,
{
    let mut rows: Vec<LossBreakdown> = Vec::new();

    for t in trades.into_iter().filter(|t| t.is_loss()) {
        let Some(k) = key(t) else {
            continue;
        };
        match rows.iter_mut().find(|r| r.key == k) {
            Some(row) => {
                row.loss += t.profit.abs();
                row.trades += 1;
            }
            None => rows.push(LossBreakdown {
                key: k,
                loss: t.profit.abs(),
                trades: 1,
            }),
        }
    }

    rows.sort_by(|a, b| b.loss.total_cmp(&a.loss));
    rows.truncate(limit);
    rows
}

/// Gross profit over gross loss magnitude, capped at `PROFIT_FACTOR_CAP`.
pub fn profit_factor<'a, I>(trades: I) -> f64
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let (gross_profit, gross_loss) = trades.into_iter().fold((0.0, 0.0), |(gp, gl), t| {
        if t.profit > 0.0 {
            (gp + t.profit, gl)
        } else {
            (gp, gl + t.profit.abs())
        }
    });

    if gross_loss > 0.0 {
        (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
    } else if gross_profit > 0.0 {
        PROFIT_FACTOR_CAP
    } else {
        0.0
    }
}

/// Division that yields 0 for an empty denominator.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 && denominator.is_finite() {
        numerator / denominator
    } else {
        0.0
    }
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
