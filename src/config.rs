use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_STRATEGY_TAGS: &[&str] = &["Trend", "Pullback", "Breakout", "Range", "Reversal"];

/// Inclusive hour window (display timezone) counted as the trader's
/// preferred session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl SessionWindow {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour <= self.end_hour
        } else {
            // Wraps midnight (e.g. 22-3)
            hour >= self.start_hour || hour <= self.end_hour
        }
    }

    /// Parses `"9-16"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.split_once('-')?;
        let start_hour: u32 = start.trim().parse().ok()?;
        let end_hour: u32 = end.trim().parse().ok()?;
        if start_hour > 23 || end_hour > 23 {
            return None;
        }
        Some(Self {
            start_hour,
            end_hour,
        })
    }
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Most-recent candidates considered per query.
    pub pool_cap: usize,
    /// Score at which a candidate counts as a strong match.
    pub min_score: u32,
    /// Strong matches needed before weaker candidates are dropped.
    pub min_strong_matches: usize,
    pub max_results: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            pool_cap: 200,
            min_score: 30,
            min_strong_matches: 3,
            max_results: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Time
    pub display_timezone: Tz,
    pub broker_timezone: Tz,

    // Scoring
    pub preferred_session: SessionWindow,
    pub strategy_tags: Vec<String>,

    // Similarity
    pub similarity: SimilarityConfig,

    // Dashboard
    pub panel_timeout_secs: u64,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let defaults = SimilarityConfig::default();

        let strategy_tags: Vec<String> = env("STRATEGY_TAGS", &DEFAULT_STRATEGY_TAGS.join(","))
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Config {
            display_timezone: env("JOURNAL_TIMEZONE", "Asia/Tokyo")
                .parse()
                .unwrap_or(chrono_tz::Asia::Tokyo),
            broker_timezone: env("BROKER_TIMEZONE", "UTC")
                .parse()
                .unwrap_or(chrono_tz::UTC),
            preferred_session: SessionWindow::parse(&env("PREFERRED_SESSION", "9-16"))
                .unwrap_or_default(),
            strategy_tags: if strategy_tags.is_empty() {
                default_strategy_tags()
            } else {
                strategy_tags
            },
            similarity: SimilarityConfig {
                pool_cap: env("SIMILARITY_POOL_CAP", "200")
                    .parse()
                    .unwrap_or(defaults.pool_cap),
                min_score: env("SIMILARITY_MIN_SCORE", "30")
                    .parse()
                    .unwrap_or(defaults.min_score),
                min_strong_matches: env("SIMILARITY_MIN_STRONG", "3")
                    .parse()
                    .unwrap_or(defaults.min_strong_matches),
                max_results: env("SIMILARITY_MAX_RESULTS", "50")
                    .parse()
                    .unwrap_or(defaults.max_results),
            },
            panel_timeout_secs: env("PANEL_TIMEOUT_SECS", "5").parse().unwrap_or(5),
            log_level: env("LOG_LEVEL", "INFO"),
        }
    }

    /// `None` when panels may run unbounded.
    pub fn panel_timeout(&self) -> Option<Duration> {
        (self.panel_timeout_secs > 0).then(|| Duration::from_secs(self.panel_timeout_secs))
    }
}

pub fn default_strategy_tags() -> Vec<String> {
    DEFAULT_STRATEGY_TAGS.iter().map(|t| t.to_string()).collect()
}
