use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::breakdown::{loss_breakdown, profit_factor, LossBreakdown};
use super::equity::DrawdownAnalyzer;
use crate::models::buckets::{local_hour, local_weekday, weekday_label};
use crate::models::{StreakSlot, TradeRecord};

const REPORT_BREAKDOWN_LIMIT: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub max_win_streak: usize,
    pub max_win_anchor_date: Option<NaiveDate>,
    pub max_loss_streak: usize,
    pub max_loss_anchor_date: Option<NaiveDate>,
}

/// A maximal run of consecutive losing trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossStreakSequence {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub count: usize,
    /// Sum of profit over the run (negative).
    pub total_loss: f64,
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakScan {
    pub summary: StreakSummary,
    /// Every loss run, largest `|total_loss|` first.
    pub loss_sequences: Vec<LossStreakSequence>,
}

/// Drill-down over the loss streaks of one time-of-day slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossStreakReport {
    pub slot: StreakSlot,
    pub total_trades: usize,
    pub sequence_count: usize,
    pub max_streak: usize,
    pub total_loss: f64,
    pub avg_loss: f64,
    pub avg_holding_minutes: f64,
    pub profit_factor: f64,
    pub by_instrument: Vec<LossBreakdown>,
    pub by_strategy: Vec<LossBreakdown>,
    pub by_weekday: Vec<LossBreakdown>,
    pub sequences: Vec<LossStreakSequence>,
}

pub struct StreakDetector {
    pub tz: Tz,
}

impl StreakDetector {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// One pass over `trades` in close-time order producing both the global
    /// summary and the ranked loss runs.
    pub fn scan(&self, trades: &[TradeRecord]) -> StreakScan {
        let sorted = DrawdownAnalyzer::chronological(trades);

        let mut summary = StreakSummary::default();
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut run: Vec<&TradeRecord> = Vec::new();
        let mut sequences = Vec::new();

        for t in sorted {
            let date = self.date_of(t.close_time);

            if t.profit > 0.0 {
                wins += 1;
                losses = 0;
                if wins > summary.max_win_streak {
                    summary.max_win_streak = wins;
                    summary.max_win_anchor_date = Some(date);
                }
            } else if t.profit < 0.0 {
                losses += 1;
                wins = 0;
                if losses > summary.max_loss_streak {
                    summary.max_loss_streak = losses;
                    summary.max_loss_anchor_date = Some(date);
                }
            } else {
                wins = 0;
                losses = 0;
            }

            if t.is_loss() {
                run.push(t);
            } else if !run.is_empty() {
                sequences.push(self.close_run(&run));
                run.clear();
            }
        }

        if !run.is_empty() {
            sequences.push(self.close_run(&run));
        }

        sequences.sort_by(|a, b| b.total_loss.abs().total_cmp(&a.total_loss.abs()));

        StreakScan {
            summary,
            loss_sequences: sequences,
        }
    }

    pub fn summary(&self, trades: &[TradeRecord]) -> StreakSummary {
        self.scan(trades).summary
    }

    pub fn loss_sequences(&self, trades: &[TradeRecord]) -> Vec<LossStreakSequence> {
        self.scan(trades).loss_sequences
    }

    /// Trades whose entry hour falls in `slot`, falling back to the close
    /// hour when the entry time is unknown.
    pub fn trades_in_slot(&self, trades: &[TradeRecord], slot: StreakSlot) -> Vec<TradeRecord> {
        trades
            .iter()
            .filter(|t| StreakSlot::from_hour(local_hour(t.entry_time(), self.tz)) == slot)
            .cloned()
            .collect()
    }

    pub fn scan_slot(&self, trades: &[TradeRecord], slot: StreakSlot) -> StreakScan {
        self.scan(&self.trades_in_slot(trades, slot))
    }

    pub fn slot_report(&self, trades: &[TradeRecord], slot: StreakSlot) -> LossStreakReport {
        let tz = self.tz;
        let in_slot = self.trades_in_slot(trades, slot);
        let scan = self.scan(&in_slot);

        let streak_trades: Vec<&TradeRecord> = scan
            .loss_sequences
            .iter()
            .flat_map(|s| s.trades.iter())
            .collect();

        let total_loss: f64 = streak_trades.iter().map(|t| t.profit).sum();
        let avg_loss = if streak_trades.is_empty() {
            0.0
        } else {
            total_loss / streak_trades.len() as f64
        };
        let avg_holding_minutes = if streak_trades.is_empty() {
            0.0
        } else {
            streak_trades
                .iter()
                .map(|t| t.holding_minutes().unwrap_or(0.0))
                .sum::<f64>()
                / streak_trades.len() as f64
        };

        LossStreakReport {
            slot,
            total_trades: in_slot.len(),
            sequence_count: scan.loss_sequences.len(),
            max_streak: scan.loss_sequences.iter().map(|s| s.count).max().unwrap_or(0),
            total_loss,
            avg_loss,
            avg_holding_minutes,
            profit_factor: profit_factor(&in_slot),
            by_instrument: loss_breakdown(
                streak_trades.iter().copied(),
                |t| Some(t.symbol.clone()),
                REPORT_BREAKDOWN_LIMIT,
            ),
            by_strategy: loss_breakdown(
                streak_trades.iter().copied(),
                |t| Some(t.strategy_label().to_string()),
                REPORT_BREAKDOWN_LIMIT,
            ),
            by_weekday: loss_breakdown(
                streak_trades.iter().copied(),
                |t| Some(weekday_label(local_weekday(t.entry_time(), tz)).to_string()),
                REPORT_BREAKDOWN_LIMIT,
            ),
            sequences: scan.loss_sequences,
        }
    }

    fn close_run(&self, run: &[&TradeRecord]) -> LossStreakSequence {
        let first = run[0];
        let last = run[run.len() - 1];
        LossStreakSequence {
            start_date: self.date_of(first.close_time),
            end_date: self.date_of(last.close_time),
            start_time: first.close_time,
            end_time: last.close_time,
            count: run.len(),
            total_loss: run.iter().map(|t| t.profit).sum(),
            trades: run.iter().map(|t| (*t).clone()).collect(),
        }
    }

    fn date_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.tz).date_naive()
    }
}
