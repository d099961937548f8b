use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::breakdown::{loss_breakdown, LossBreakdown};
use crate::models::buckets::{local_hour, local_weekday, weekday_label};
use crate::models::{SessionBucket, TradeRecord};

const BREAKDOWN_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Position in chronological order.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub peak: f64,
    pub drawdown: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Loss magnitude summed over the losing trades in the episode.
    pub total_loss: f64,
    /// Net profit over every trade in the episode.
    pub net_profit: f64,
    pub duration_days: i64,
    pub trade_count: usize,
    pub instrument_count: usize,
    pub strategy_count: usize,
    pub by_instrument: Vec<LossBreakdown>,
    pub by_strategy_tag: Vec<LossBreakdown>,
    pub by_weekday: Vec<LossBreakdown>,
    pub by_time_bucket: Vec<LossBreakdown>,
    pub avg_holding_hours: f64,
    pub trades: Vec<TradeRecord>,
}

impl DrawdownEpisode {
    pub fn is_empty(&self) -> bool {
        self.trade_count == 0
    }
}

/// Builds the realized-equity curve and explains the drawdown around a
/// point in time. Dates and time buckets are taken in `tz`.
pub struct DrawdownAnalyzer {
    pub tz: Tz,
}

impl DrawdownAnalyzer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Trades in close-time order. Equal timestamps keep input order.
    pub fn chronological(trades: &[TradeRecord]) -> Vec<&TradeRecord> {
        let mut sorted: Vec<&TradeRecord> = trades.iter().collect();
        sorted.sort_by_key(|t| t.close_time);
        sorted
    }

    pub fn build_series(trades: &[TradeRecord]) -> Vec<EquityPoint> {
        Self::series_of(&Self::chronological(trades))
    }

    fn series_of(sorted: &[&TradeRecord]) -> Vec<EquityPoint> {
        let mut equity = 0.0;
        let mut peak = 0.0f64;

        sorted
            .iter()
            .enumerate()
            .map(|(index, t)| {
                equity += t.profit;
                peak = peak.max(equity);
                EquityPoint {
                    index,
                    timestamp: t.close_time,
                    equity,
                    peak,
                    drawdown: peak - equity,
                }
            })
            .collect()
    }

    /// Largest peak-to-trough drop of realized equity.
    pub fn max_drawdown(trades: &[TradeRecord]) -> f64 {
        Self::build_series(trades)
            .iter()
            .map(|p| p.drawdown)
            .fold(0.0, f64::max)
    }

    pub fn find_episode(&self, trades: &[TradeRecord], query: DateTime<Utc>) -> DrawdownEpisode {
        let sorted = Self::chronological(trades);
        let series = Self::series_of(&sorted);

        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return DrawdownEpisode::default();
        };

        let query_date = self.date_of(query);
        if query_date < self.date_of(first.timestamp) || query_date > self.date_of(last.timestamp) {
            debug!("Episode query {} outside data range", query);
            return DrawdownEpisode::default();
        }

        // A recovery trade closes the episode before it, so it resolves to that one.
        let nearest = nearest_index(&series, query);
        let (anchor, recovery) = if series[nearest].drawdown > 0.0 {
            (nearest, None)
        } else if nearest > 0 && series[nearest - 1].drawdown > 0.0 {
            (nearest - 1, Some(nearest))
        } else {
            return DrawdownEpisode::default();
        };

        let mut start = anchor;
        while start > 0 && series[start - 1].drawdown > 0.0 {
            start -= 1;
        }

        let episode_peak = series[start].peak;
        let end = match recovery {
            Some(end) => end,
            None => {
                let mut end = anchor;
                while end < series.len() - 1 && series[end].equity < episode_peak {
                    end += 1;
                }
                end
            }
        };

        debug!(
            "Drawdown episode [{}..={}] around index {} (peak {:.2})",
            start, end, nearest, episode_peak
        );

        self.summarize(&sorted[start..=end], start, end)
    }

    fn summarize(&self, members: &[&TradeRecord], start: usize, end: usize) -> DrawdownEpisode {
        let tz = self.tz;
        let first = members[0];
        let last = members[members.len() - 1];
        let start_date = self.date_of(first.close_time);
        let end_date = self.date_of(last.close_time);

        let losses: Vec<&TradeRecord> = members.iter().copied().filter(|t| t.is_loss()).collect();
        let total_loss: f64 = losses.iter().map(|t| t.profit.abs()).sum();
        let net_profit: f64 = members.iter().map(|t| t.profit).sum();

        let instrument_count = members
            .iter()
            .map(|t| t.symbol.as_str())
            .collect::<HashSet<_>>()
            .len();
        let strategy_count = members
            .iter()
            .map(|t| t.strategy_label())
            .collect::<HashSet<_>>()
            .len();

        let holding: Vec<f64> = losses
            .iter()
            .filter_map(|t| t.holding_hours())
            .filter(|h| *h > 0.0)
            .collect();
        let avg_holding_hours = if holding.is_empty() {
            0.0
        } else {
            holding.iter().sum::<f64>() / holding.len() as f64
        };

        DrawdownEpisode {
            start_index: start,
            end_index: end,
            start_time: Some(first.close_time),
            end_time: Some(last.close_time),
            start_date: Some(start_date),
            end_date: Some(end_date),
            total_loss,
            net_profit,
            duration_days: (end_date - start_date).num_days() + 1,
            trade_count: members.len(),
            instrument_count,
            strategy_count,
            by_instrument: loss_breakdown(
                losses.iter().copied(),
                |t| Some(t.symbol.clone()),
                BREAKDOWN_LIMIT,
            ),
            by_strategy_tag: loss_breakdown(
                losses.iter().copied(),
                |t| Some(t.strategy_label().to_string()),
                BREAKDOWN_LIMIT,
            ),
            by_weekday: loss_breakdown(
                losses.iter().copied(),
                |t| Some(weekday_label(local_weekday(t.close_time, tz)).to_string()),
                BREAKDOWN_LIMIT,
            ),
            by_time_bucket: loss_breakdown(
                losses.iter().copied(),
                |t| Some(SessionBucket::from_hour(local_hour(t.close_time, tz)).to_string()),
                BREAKDOWN_LIMIT,
            ),
            avg_holding_hours,
            trades: members.iter().map(|t| (*t).clone()).collect(),
        }
    }

    fn date_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.tz).date_naive()
    }
}

/// Index of the point closest to `query`; ties go to the earlier point.
fn nearest_index(series: &[EquityPoint], query: DateTime<Utc>) -> usize {
    let mut best = 0;
    let mut best_diff = (series[0].timestamp - query).num_milliseconds().abs();
    for (i, p) in series.iter().enumerate().skip(1) {
        let diff = (p.timestamp - query).num_milliseconds().abs();
        if diff < best_diff {
            best = i;
            best_diff = diff;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{base_time, daily_trades, hourly_trades, ts, TradeBuilder};
    use chrono::Duration;

    fn analyzer() -> DrawdownAnalyzer {
        DrawdownAnalyzer::new(chrono_tz::UTC)
    }

    #[test]
    fn peak_non_decreasing_and_drawdown_non_negative() {
        let trades = hourly_trades(&[50.0, -80.0, 20.0, 100.0, -10.0, -5.0, 300.0, -400.0]);
        let series = DrawdownAnalyzer::build_series(&trades);
        assert_eq!(series.len(), trades.len());
        for w in series.windows(2) {
            assert!(w[1].peak >= w[0].peak);
        }
        for p in &series {
            assert!(p.drawdown >= 0.0);
            assert!((p.drawdown - (p.peak - p.equity)).abs() < 1e-9);
        }
    }

    #[test]
    fn series_sorted_by_close_time_stable_on_ties() {
        let same = base_time();
        let trades = vec![
            TradeBuilder::new("late", 5.0).closed_at(same + Duration::hours(1)).build(),
            TradeBuilder::new("a", 1.0).closed_at(same).build(),
            TradeBuilder::new("b", 2.0).closed_at(same).build(),
        ];
        let sorted = DrawdownAnalyzer::chronological(&trades);
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "late"]);
    }

    #[test]
    fn losing_first_trade_is_a_drawdown_from_zero() {
        let trades = hourly_trades(&[-20.0]);
        let series = DrawdownAnalyzer::build_series(&trades);
        assert_eq!(series[0].peak, 0.0);
        assert!((series[0].drawdown - 20.0).abs() < 1e-9);
    }

    #[test]
    fn max_drawdown_of_sequence() {
        let trades = hourly_trades(&[100.0, -50.0, -30.0, 20.0, -10.0]);
        assert!((DrawdownAnalyzer::max_drawdown(&trades) - 80.0).abs() < 1e-9);
        assert_eq!(DrawdownAnalyzer::max_drawdown(&[]), 0.0);
    }

    #[test]
    fn episode_spans_from_first_underwater_trade_to_recovery() {
        // equity: 100, 50, 20, 40, 130, 120
        let trades = daily_trades(&[100.0, -50.0, -30.0, 20.0, 90.0, -10.0]);
        let query = ts("2024-01-17T12:00:00Z"); // the -30 trade
        let ep = analyzer().find_episode(&trades, query);

        assert_eq!(ep.start_index, 1);
        assert_eq!(ep.end_index, 4);
        assert_eq!(ep.trade_count, 4);
        assert_eq!(ep.start_date, NaiveDate::from_ymd_opt(2024, 1, 16));
        assert_eq!(ep.end_date, NaiveDate::from_ymd_opt(2024, 1, 19));
        assert_eq!(ep.duration_days, 4);
        assert!((ep.total_loss - 80.0).abs() < 1e-9);
        assert!((ep.net_profit - 30.0).abs() < 1e-9);
    }

    #[test]
    fn episode_without_recovery_runs_to_end_of_data() {
        let trades = daily_trades(&[100.0, -50.0, 10.0, -30.0]);
        let ep = analyzer().find_episode(&trades, ts("2024-01-16T12:00:00Z"));
        assert_eq!(ep.start_index, 1);
        assert_eq!(ep.end_index, 3);
    }

    #[test]
    fn query_at_zero_drawdown_gives_empty_episode() {
        let trades = daily_trades(&[100.0, -50.0, 60.0]);
        let ep = analyzer().find_episode(&trades, ts("2024-01-15T12:00:00Z"));
        assert!(ep.is_empty());
        assert_eq!(ep.total_loss, 0.0);
        assert!(ep.by_instrument.is_empty());
        assert!(ep.start_date.is_none());
    }

    #[test]
    fn empty_or_out_of_range_gives_empty_episode() {
        assert!(analyzer().find_episode(&[], base_time()).is_empty());

        let trades = daily_trades(&[-10.0, -10.0]);
        assert!(analyzer()
            .find_episode(&trades, ts("2023-06-01T00:00:00Z"))
            .is_empty());
        assert!(analyzer()
            .find_episode(&trades, ts("2025-06-01T00:00:00Z"))
            .is_empty());
    }

    #[test]
    fn nearest_point_tie_prefers_earlier() {
        let trades = hourly_trades(&[-10.0, 5.0, 50.0]);
        let series = DrawdownAnalyzer::build_series(&trades);
        let midpoint = base_time() + Duration::minutes(30);
        assert_eq!(nearest_index(&series, midpoint), 0);
    }

    #[test]
    fn requery_inside_episode_is_idempotent() {
        let trades = daily_trades(&[100.0, -50.0, -30.0, 20.0, -5.0, 90.0, 10.0]);
        let a = DrawdownAnalyzer::new(chrono_tz::UTC);
        let first = a.find_episode(&trades, ts("2024-01-17T12:00:00Z"));
        assert!(!first.is_empty());

        let start = first.start_time.unwrap();
        let end = first.end_time.unwrap();
        let mut at = start;
        while at <= end {
            assert_eq!(a.find_episode(&trades, at), first, "query {}", at);
            at += Duration::hours(1);
        }
    }

    #[test]
    fn query_on_recovery_trade_returns_the_closed_episode() {
        // equity: 100, 50, 20, 40, 130, 120
        let trades = daily_trades(&[100.0, -50.0, -30.0, 20.0, 90.0, -10.0]);
        let a = analyzer();
        let first = a.find_episode(&trades, ts("2024-01-17T12:00:00Z"));
        assert_eq!((first.start_index, first.end_index), (1, 4));

        let near_end = a.find_episode(&trades, ts("2024-01-19T11:00:00Z"));
        assert_eq!(near_end, first);
        let on_end = a.find_episode(&trades, ts("2024-01-19T12:00:00Z"));
        assert_eq!(on_end.trade_count, 4);
    }

    #[test]
    fn consecutive_highs_give_empty_episode() {
        let trades = daily_trades(&[100.0, 50.0, -10.0]);
        assert!(analyzer()
            .find_episode(&trades, ts("2024-01-16T12:00:00Z"))
            .is_empty());
    }

    #[test]
    fn overnight_loss_is_bucketed_by_close_time() {
        let trades = vec![
            TradeBuilder::new("1", 50.0).closed_at(base_time()).build(),
            // Opened Mon 23:00, closed Tue 10:00.
            TradeBuilder::new("2", -40.0)
                .closed_at(ts("2024-01-16T10:00:00Z"))
                .held(11 * 60)
                .build(),
        ];
        let ep = analyzer().find_episode(&trades, ts("2024-01-16T10:00:00Z"));
        assert_eq!(ep.by_weekday.len(), 1);
        assert_eq!(ep.by_weekday[0].key, "Tue");
        assert_eq!(ep.by_time_bucket[0].key, "morning");
    }

    #[test]
    fn breakdowns_cover_losing_trades_only() {
        let close = base_time() + Duration::hours(12);
        let trades = vec![
            TradeBuilder::new("1", 100.0).closed_at(close).build(),
            TradeBuilder::new("2", -60.0)
                .symbol("USDJPY")
                .strategy("Breakout")
                .closed_at(close + Duration::days(1))
                .held(120)
                .build(),
            TradeBuilder::new("3", 10.0)
                .symbol("GBPUSD")
                .closed_at(close + Duration::days(2))
                .build(),
            TradeBuilder::new("4", -30.0)
                .closed_at(close + Duration::days(3))
                .held(60)
                .no_open_time()
                .build(),
        ];
        let ep = analyzer().find_episode(&trades, close + Duration::days(1));

        assert_eq!(ep.trade_count, 3);
        assert_eq!(ep.instrument_count, 3);
        assert_eq!(ep.strategy_count, 2);
        assert_eq!(ep.by_instrument[0].key, "USDJPY");
        assert_eq!(ep.by_instrument[1].key, "EURUSD");
        assert_eq!(ep.by_strategy_tag[0].key, "Breakout");
        assert_eq!(ep.by_strategy_tag[1].key, "untagged");
        // Keyed on close time, so trade 4 counts despite its missing entry.
        assert_eq!(ep.by_weekday.len(), 2);
        assert_eq!(ep.by_weekday[0].key, "Tue");
        assert_eq!(ep.by_weekday[1].key, "Thu");
        assert_eq!(ep.by_time_bucket.len(), 1);
        assert_eq!(ep.by_time_bucket[0].key, "afternoon");
        assert!((ep.by_time_bucket[0].loss - 90.0).abs() < 1e-9);
        assert!((ep.avg_holding_hours - 2.0).abs() < 1e-9);
    }
}
