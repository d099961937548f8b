use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

use crate::config::{Config, SimilarityConfig};
use crate::models::buckets::{local_hour, local_weekday};
use crate::models::{
    AnnotationMap, HoldingBucket, MatchSession, RBucket, TradeAnnotation, TradeRecord,
};

const SESSION_WEIGHT: u32 = 10;
const WEEKDAY_WEIGHT: u32 = 10;
const HOLDING_WEIGHT: u32 = 10;
const R_BUCKET_WEIGHT: u32 = 10;
const ENTRY_BASIS_WEIGHT: u32 = 15;
const TECHNICAL_WEIGHT: u32 = 15;
const MARKET_WEIGHT: u32 = 10;
const STRATEGY_WEIGHT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarTrade {
    pub id: String,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: DateTime<Utc>,
    pub profit: f64,
    pub pips: Option<f64>,
    pub r_value: Option<f64>,
    pub score: u32,
    pub strategy_tag: Option<String>,
}

/// Categorical features of one trade.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Features {
    session: Option<MatchSession>,
    weekday: Option<Weekday>,
    holding: Option<HoldingBucket>,
    r_bucket: RBucket,
}

pub struct SimilarityMatcher {
    pub tz: Tz,
    pub strategy_tags: Vec<String>,
    pub limits: SimilarityConfig,
}

impl SimilarityMatcher {
    pub fn new(tz: Tz, strategy_tags: Vec<String>, limits: SimilarityConfig) -> Self {
        Self {
            tz,
            strategy_tags,
            limits,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.display_timezone,
            cfg.strategy_tags.clone(),
            cfg.similarity.clone(),
        )
    }

    /// Same symbol and side as `base`, excluding `base` itself, most recent
    /// close first, at most `pool_cap` trades.
    pub fn candidate_pool(&self, history: &[TradeRecord], base: &TradeRecord) -> Vec<TradeRecord> {
        let mut pool: Vec<TradeRecord> = history
            .iter()
            .filter(|t| t.symbol == base.symbol && t.side == base.side && t.id != base.id)
            .cloned()
            .collect();
        pool.sort_by_key(|t| Reverse(t.close_time));
        pool.truncate(self.limits.pool_cap);
        pool
    }

    /// Looks up `base_id` in `history` and ranks its candidate pool.
    /// `None` when the id is unknown.
    pub fn find_for_id(
        &self,
        history: &[TradeRecord],
        base_id: &str,
        notes: &AnnotationMap,
    ) -> Option<Vec<SimilarTrade>> {
        let base = history.iter().find(|t| t.id == base_id)?;
        let pool = self.candidate_pool(history, base);
        Some(self.find_similar(base, notes.get(base_id), &pool, notes))
    }

    pub fn find_similar(
        &self,
        base: &TradeRecord,
        base_note: Option<&TradeAnnotation>,
        pool: &[TradeRecord],
        notes: &AnnotationMap,
    ) -> Vec<SimilarTrade> {
        let base_features = self.features(base);

        let mut scored: Vec<SimilarTrade> = pool
            .iter()
            .map(|candidate| {
                let note = notes.get(&candidate.id);
                let score = self.score_with(&base_features, base_note, candidate, note);
                SimilarTrade {
                    id: candidate.id.clone(),
                    open_time: candidate.open_time,
                    close_time: candidate.close_time,
                    profit: candidate.profit,
                    pips: candidate.pips,
                    r_value: candidate.r_multiple(),
                    score,
                    strategy_tag: note
                        .and_then(|n| n.strategy_tag(&self.strategy_tags))
                        .map(str::to_string),
                }
            })
            .collect();

        scored.sort_by_key(|s| Reverse(s.score));

        let strong = scored
            .iter()
            .filter(|s| s.score >= self.limits.min_score)
            .count();

        if strong >= self.limits.min_strong_matches {
            scored.retain(|s| s.score >= self.limits.min_score);
        } else {
            debug!(
                "Only {} candidates reach score {}, returning closest available",
                strong, self.limits.min_score
            );
        }
        scored.truncate(self.limits.max_results);
        scored
    }

    pub fn score(
        &self,
        base: &TradeRecord,
        base_note: Option<&TradeAnnotation>,
        candidate: &TradeRecord,
        candidate_note: Option<&TradeAnnotation>,
    ) -> u32 {
        self.score_with(&self.features(base), base_note, candidate, candidate_note)
    }

    fn score_with(
        &self,
        base: &Features,
        base_note: Option<&TradeAnnotation>,
        candidate: &TradeRecord,
        candidate_note: Option<&TradeAnnotation>,
    ) -> u32 {
        let other = self.features(candidate);
        let mut score = 0;

        if same(base.session, other.session) {
            score += SESSION_WEIGHT;
        }
        if same(base.weekday, other.weekday) {
            score += WEEKDAY_WEIGHT;
        }
        if same(base.holding, other.holding) {
            score += HOLDING_WEIGHT;
        }
        if base.r_bucket == other.r_bucket {
            score += R_BUCKET_WEIGHT;
        }

        if let (Some(a), Some(b)) = (base_note, candidate_note) {
            if intersects(&a.entry_basis, &b.entry_basis) {
                score += ENTRY_BASIS_WEIGHT;
            }
            if intersects(&a.technical, &b.technical) {
                score += TECHNICAL_WEIGHT;
            }
            if intersects(&a.market, &b.market) {
                score += MARKET_WEIGHT;
            }
            let base_tag = a.strategy_tag(&self.strategy_tags);
            if base_tag.is_some() && base_tag == b.strategy_tag(&self.strategy_tags) {
                score += STRATEGY_WEIGHT;
            }
        }

        score
    }

    fn features(&self, t: &TradeRecord) -> Features {
        Features {
            session: t
                .open_time
                .map(|o| MatchSession::from_hour(local_hour(o, self.tz))),
            weekday: t.open_time.map(|o| local_weekday(o, self.tz)),
            holding: t.holding_minutes().map(HoldingBucket::from_minutes),
            r_bucket: RBucket::from_r(t.r_multiple()),
        }
    }
}

fn same<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter().any(|x| b.contains(x))
}

/// Edges of the R-multiple histogram; bin `i` covers `[EDGES[i-1], EDGES[i])`.
const R_HISTOGRAM_EDGES: [f64; 7] = [-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RHistogramBin {
    pub label: String,
    pub count: usize,
}

/// Outcome summary of a similar-trade result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarTradeStats {
    pub count: usize,
    pub win_rate: f64,
    pub avg_profit: f64,
    pub avg_r: f64,
    /// Largest profit among the matches; negative when every match lost.
    pub max_win: f64,
    pub max_loss: f64,
    pub r_histogram: Vec<RHistogramBin>,
}

impl SimilarTradeStats {
    pub fn from_matches(matches: &[SimilarTrade]) -> Self {
        let mut r_histogram: Vec<RHistogramBin> = histogram_labels()
            .into_iter()
            .map(|label| RHistogramBin { label, count: 0 })
            .collect();

        if matches.is_empty() {
            return Self {
                r_histogram,
                ..Default::default()
            };
        }

        let n = matches.len() as f64;
        let wins = matches.iter().filter(|m| m.profit > 0.0).count();
        let rs: Vec<f64> = matches.iter().filter_map(|m| m.r_value).collect();

        for r in &rs {
            let bin = R_HISTOGRAM_EDGES.iter().filter(|edge| *r >= **edge).count();
            r_histogram[bin].count += 1;
        }

        Self {
            count: matches.len(),
            win_rate: wins as f64 / n * 100.0,
            avg_profit: matches.iter().map(|m| m.profit).sum::<f64>() / n,
            avg_r: if rs.is_empty() {
                0.0
            } else {
                rs.iter().sum::<f64>() / rs.len() as f64
            },
            max_win: matches.iter().map(|m| m.profit).fold(f64::MIN, f64::max),
            max_loss: matches.iter().map(|m| m.profit).fold(f64::MAX, f64::min),
            r_histogram,
        }
    }
}

fn histogram_labels() -> Vec<String> {
    let mut labels = vec![format!("<{}R", R_HISTOGRAM_EDGES[0])];
    for w in R_HISTOGRAM_EDGES.windows(2) {
        labels.push(format!("{}R..{}R", w[0], w[1]));
    }
    labels.push(format!(">={}R", R_HISTOGRAM_EDGES[R_HISTOGRAM_EDGES.len() - 1]));
    labels
}
