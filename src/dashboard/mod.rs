pub mod report;

pub use report::{DashboardReport, DrawdownPanel, MonthlyPanel, SimilarPanel};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analytics::{
    DrawdownAnalyzer, MonthKey, MonthlyScorer, SimilarTradeStats, SimilarityMatcher, StreakDetector,
};
use crate::config::Config;
use crate::models::{AnnotationMap, StreakSlot, TradeRecord};
use crate::source::TradeSource;

/// What the dashboard should drill into. Panels whose query is absent are
/// not run.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub episode_at: Option<DateTime<Utc>>,
    pub month: Option<MonthKey>,
    pub similar_to: Option<String>,
    pub slot: Option<StreakSlot>,
}

/// Runs `job` on the blocking pool, bounded by `limit` when set. A panel
/// that times out or panics yields `None`.
pub async fn run_panel<T, F>(name: &'static str, limit: Option<Duration>, job: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);

    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("Panel {} timed out after {:?}", name, limit);
                return None;
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(value) => {
            debug!("Panel {} done", name);
            Some(value)
        }
        Err(e) => {
            warn!("Panel {} failed: {}", name, e);
            None
        }
    }
}

/// Loads trades and notes from `source` and computes every requested panel
/// concurrently.
pub async fn build_report(
    cfg: &Config,
    source: &dyn TradeSource,
    req: &DashboardRequest,
) -> Result<DashboardReport> {
    let trades = source
        .fetch_trades()
        .await
        .context("Failed to load trades")?;
    let notes = source
        .fetch_annotations()
        .await
        .context("Failed to load trade notes")?;

    info!(
        "Building dashboard over {} trades ({} with notes)",
        trades.len(),
        notes.len()
    );

    Ok(compute(cfg, Arc::new(trades), Arc::new(notes), req).await)
}

/// Panel fan-out over already loaded data.
pub async fn compute(
    cfg: &Config,
    trades: Arc<Vec<TradeRecord>>,
    notes: Arc<AnnotationMap>,
    req: &DashboardRequest,
) -> DashboardReport {
    let limit = cfg.panel_timeout();
    let tz = cfg.display_timezone;

    let drawdown = {
        let trades = Arc::clone(&trades);
        let episode_at = req.episode_at;
        run_panel("drawdown", limit, move || {
            let analyzer = DrawdownAnalyzer::new(tz);
            DrawdownPanel {
                max_drawdown: DrawdownAnalyzer::max_drawdown(&trades),
                episode: episode_at.map(|at| analyzer.find_episode(&trades, at)),
            }
        })
    };

    let streaks = {
        let trades = Arc::clone(&trades);
        run_panel("streaks", limit, move || StreakDetector::new(tz).scan(&trades))
    };

    let slot_report = {
        let trades = Arc::clone(&trades);
        let slot = req.slot;
        async move {
            let slot = slot?;
            run_panel("slot", limit, move || {
                StreakDetector::new(tz).slot_report(&trades, slot)
            })
            .await
        }
    };

    let similar = {
        let trades = Arc::clone(&trades);
        let notes = Arc::clone(&notes);
        let matcher = SimilarityMatcher::from_config(cfg);
        let base_id = req.similar_to.clone();
        async move {
            let base_id = base_id?;
            run_panel("similar", limit, move || {
                let Some(matches) = matcher.find_for_id(&trades, &base_id, &notes) else {
                    warn!("Trade {} not found, no similar trades", base_id);
                    return None;
                };
                Some(SimilarPanel {
                    stats: SimilarTradeStats::from_matches(&matches),
                    base_id,
                    matches,
                })
            })
            .await
            .flatten()
        }
    };

    let monthly = {
        let trades = Arc::clone(&trades);
        let scorer = MonthlyScorer::from_config(cfg);
        let month = req.month;
        async move {
            let month = month?;
            run_panel("monthly", limit, move || MonthlyPanel {
                month,
                evaluation: scorer.evaluate_month(&trades, month),
            })
            .await
        }
    };

    let (drawdown, streaks, slot_report, similar, monthly) =
        tokio::join!(drawdown, streaks, slot_report, similar, monthly);

    DashboardReport {
        trade_count: trades.len(),
        drawdown,
        streaks,
        slot_report,
        similar,
        monthly,
    }
}
