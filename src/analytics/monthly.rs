use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::breakdown::{ratio, round1, round2};
use super::equity::DrawdownAnalyzer;
use crate::config::{Config, SessionWindow};
use crate::models::buckets::local_hour;
use crate::models::TradeRecord;

const SCORE_MAX: f64 = 10.0;
/// Losses up to this multiple of the average loss count as cut on time.
const LOSS_CUT_MULTIPLE: f64 = 1.5;

/// Calendar month key, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(ts: DateTime<Utc>, tz: Tz) -> Self {
        let local = ts.with_timezone(&tz);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year: i32 = y.parse().map_err(|_| format!("bad year in '{}'", s))?;
        let month: u32 = m.parse().map_err(|_| format!("bad month in '{}'", s))?;
        if y.len() != 4 || !(1..=12).contains(&month) {
            return Err(format!("expected YYYY-MM, got '{}'", s));
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillTier {
    S,
    A,
    B,
    C,
    D,
}

impl SkillTier {
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 9.0 {
            SkillTier::S
        } else if overall >= 7.5 {
            SkillTier::A
        } else if overall >= 6.0 {
            SkillTier::B
        } else if overall >= 4.0 {
            SkillTier::C
        } else {
            SkillTier::D
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillTier::S => "S: professional",
            SkillTier::A => "A: advanced",
            SkillTier::B => "B: intermediate",
            SkillTier::C => "C: beginner",
            SkillTier::D => "D: novice",
        }
    }
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            Rating::Excellent
        } else if score >= 7.0 {
            Rating::Good
        } else if score >= 5.0 {
            Rating::Fair
        } else {
            Rating::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyScores {
    pub entry_skill: f64,
    pub drawdown_control: f64,
    pub risk_reward: f64,
    pub risk_management: f64,
    pub profit_stability: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySkillDetail {
    pub win_rate: f64,
    pub session_match_rate: f64,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownDetail {
    pub max_drawdown: f64,
    pub dd_ratio: f64,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRewardDetail {
    pub rr_ratio: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskManagementDetail {
    pub loss_cut_rate: f64,
    pub max_loss: f64,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityDetail {
    pub positive_months: usize,
    pub total_months: usize,
    pub monthly_positive_rate: f64,
    pub avg_monthly_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDetails {
    pub entry_skill: EntrySkillDetail,
    pub drawdown_control: DrawdownDetail,
    pub risk_reward: RiskRewardDetail,
    pub risk_management: RiskManagementDetail,
    pub profit_stability: StabilityDetail,
}

impl Default for EvaluationDetails {
    fn default() -> Self {
        Self {
            entry_skill: EntrySkillDetail {
                win_rate: 0.0,
                session_match_rate: 0.0,
                rating: Rating::NeedsImprovement,
            },
            drawdown_control: DrawdownDetail {
                max_drawdown: 0.0,
                dd_ratio: 0.0,
                rating: Rating::NeedsImprovement,
            },
            risk_reward: RiskRewardDetail {
                rr_ratio: 0.0,
                avg_win: 0.0,
                avg_loss: 0.0,
            },
            risk_management: RiskManagementDetail {
                loss_cut_rate: 0.0,
                max_loss: 0.0,
                rating: Rating::NeedsImprovement,
            },
            profit_stability: StabilityDetail {
                positive_months: 0,
                total_months: 0,
                monthly_positive_rate: 0.0,
                avg_monthly_profit: 0.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEvaluation {
    pub scores: MonthlyScores,
    pub details: EvaluationDetails,
    pub level: SkillTier,
}

impl MonthlyEvaluation {
    pub fn empty() -> Self {
        Self {
            scores: MonthlyScores::default(),
            details: EvaluationDetails::default(),
            level: SkillTier::D,
        }
    }
}

pub struct MonthlyScorer {
    pub tz: Tz,
    pub preferred_session: SessionWindow,
}

impl MonthlyScorer {
    pub fn new(tz: Tz, preferred_session: SessionWindow) -> Self {
        Self {
            tz,
            preferred_session,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.display_timezone, cfg.preferred_session)
    }

    pub fn trades_in_month(&self, history: &[TradeRecord], month: MonthKey) -> Vec<TradeRecord> {
        history
            .iter()
            .filter(|t| MonthKey::of(t.close_time, self.tz) == month)
            .cloned()
            .collect()
    }

    pub fn evaluate_month(&self, history: &[TradeRecord], month: MonthKey) -> MonthlyEvaluation {
        let month_trades = self.trades_in_month(history, month);
        debug!("Scoring {}: {} trades", month, month_trades.len());
        self.evaluate(&month_trades, history)
    }

    /// Scores `month_trades`; `history` feeds the profit-stability term.
    pub fn evaluate(&self, month_trades: &[TradeRecord], history: &[TradeRecord]) -> MonthlyEvaluation {
        if month_trades.is_empty() {
            return MonthlyEvaluation::empty();
        }

        let n = month_trades.len() as f64;

        // Entry
        let wins: Vec<f64> = month_trades
            .iter()
            .filter(|t| t.is_win())
            .map(|t| t.profit)
            .collect();
        let losses: Vec<f64> = month_trades
            .iter()
            .filter(|t| t.is_loss())
            .map(|t| t.profit.abs())
            .collect();
        let win_rate = wins.len() as f64 / n * 100.0;
        // No entry time counts as a miss but stays in the denominator.
        let in_session = month_trades
            .iter()
            .filter_map(|t| t.open_time)
            .filter(|&o| self.preferred_session.contains(local_hour(o, self.tz)))
            .count();
        let session_match_rate = in_session as f64 / n * 100.0;

        // Drawdown
        let max_drawdown = DrawdownAnalyzer::max_drawdown(month_trades);
        let turnover: f64 = month_trades.iter().map(|t| t.profit.abs()).sum();
        let dd_ratio = ratio(max_drawdown, turnover) * 100.0;

        // Risk/reward
        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);
        let rr_ratio = ratio(avg_win, avg_loss);

        // Loss cutting
        let loss_cut_rate = if losses.is_empty() {
            100.0
        } else {
            let cut = losses
                .iter()
                .filter(|l| **l <= avg_loss * LOSS_CUT_MULTIPLE)
                .count();
            cut as f64 / losses.len() as f64 * 100.0
        };
        let max_loss = losses.iter().copied().fold(0.0, f64::max);

        // Stability over the full history
        let mut monthly: BTreeMap<MonthKey, f64> = BTreeMap::new();
        for t in history {
            *monthly.entry(MonthKey::of(t.close_time, self.tz)).or_default() += t.profit;
        }
        let total_months = monthly.len();
        let positive_months = monthly.values().filter(|p| **p > 0.0).count();
        let positive_share = ratio(positive_months as f64, total_months as f64);
        let avg_monthly_profit = ratio(monthly.values().sum(), total_months as f64);

        let entry_skill = clamp_score(win_rate / 10.0 + session_match_rate / 20.0);
        let drawdown_control = clamp_score(SCORE_MAX - dd_ratio / 2.0);
        let risk_reward = clamp_score(rr_ratio * 3.0);
        let risk_management = clamp_score(loss_cut_rate / 10.0);
        let profit_stability = clamp_score(positive_share * SCORE_MAX);

        let overall = round1(
            (entry_skill + drawdown_control + risk_reward + risk_management + profit_stability)
                / 5.0,
        );

        MonthlyEvaluation {
            scores: MonthlyScores {
                entry_skill: round1(entry_skill),
                drawdown_control: round1(drawdown_control),
                risk_reward: round1(risk_reward),
                risk_management: round1(risk_management),
                profit_stability: round1(profit_stability),
                overall,
            },
            details: EvaluationDetails {
                entry_skill: EntrySkillDetail {
                    win_rate: round1(win_rate),
                    session_match_rate: round1(session_match_rate),
                    rating: Rating::from_score(entry_skill),
                },
                drawdown_control: DrawdownDetail {
                    max_drawdown: round2(max_drawdown),
                    dd_ratio: round1(dd_ratio),
                    rating: Rating::from_score(drawdown_control),
                },
                risk_reward: RiskRewardDetail {
                    rr_ratio: round2(rr_ratio),
                    avg_win: round2(avg_win),
                    avg_loss: round2(avg_loss),
                },
                risk_management: RiskManagementDetail {
                    loss_cut_rate: round1(loss_cut_rate),
                    max_loss: round2(max_loss),
                    rating: Rating::from_score(risk_management),
                },
                profit_stability: StabilityDetail {
                    positive_months,
                    total_months,
                    monthly_positive_rate: round1(positive_share * 100.0),
                    avg_monthly_profit: round2(avg_monthly_profit),
                },
            },
            level: SkillTier::from_overall(overall),
        }
    }
}

fn clamp_score(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, SCORE_MAX)
    } else {
        0.0
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}
