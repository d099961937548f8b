use serde::Serialize;

use crate::analytics::breakdown::LossBreakdown;
use crate::analytics::{
    DrawdownEpisode, LossStreakReport, MonthKey, MonthlyEvaluation, SimilarTrade,
    SimilarTradeStats, StreakScan,
};

const SHOWN_SEQUENCES: usize = 5;
const SHOWN_MATCHES: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct DrawdownPanel {
    pub max_drawdown: f64,
    pub episode: Option<DrawdownEpisode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarPanel {
    pub base_id: String,
    pub matches: Vec<SimilarTrade>,
    pub stats: SimilarTradeStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyPanel {
    pub month: MonthKey,
    pub evaluation: MonthlyEvaluation,
}

/// Combined dashboard output. A `None` panel was either not requested or
/// did not finish.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub trade_count: usize,
    pub drawdown: Option<DrawdownPanel>,
    pub streaks: Option<StreakScan>,
    pub slot_report: Option<LossStreakReport>,
    pub similar: Option<SimilarPanel>,
    pub monthly: Option<MonthlyPanel>,
}

impl DashboardReport {
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(70));
        println!("  TRADE JOURNAL DASHBOARD");
        println!("{}", "=".repeat(70));
        println!("  Trades:      {}", self.trade_count);

        if let Some(dd) = &self.drawdown {
            println!();
            println!("  DRAWDOWN");
            println!("  ───────────────────────────────────");
            println!("  Max DD:      {:.2}", dd.max_drawdown);
            match &dd.episode {
                Some(ep) if !ep.is_empty() => print_episode(ep),
                Some(_) => println!("  Episode:     none at the queried time"),
                None => {}
            }
        }

        if let Some(scan) = &self.streaks {
            let s = &scan.summary;
            println!();
            println!("  STREAKS");
            println!("  ───────────────────────────────────");
            println!(
                "  Max wins:    {} ({})",
                s.max_win_streak,
                date_or_dash(s.max_win_anchor_date)
            );
            println!(
                "  Max losses:  {} ({})",
                s.max_loss_streak,
                date_or_dash(s.max_loss_anchor_date)
            );
            for seq in scan.loss_sequences.iter().take(SHOWN_SEQUENCES) {
                println!(
                    "  {} → {}: {} trades | {:+.2}",
                    seq.start_date, seq.end_date, seq.count, seq.total_loss
                );
            }
        }

        if let Some(r) = &self.slot_report {
            println!();
            println!("  LOSS STREAKS: {}", r.slot);
            println!("  ───────────────────────────────────");
            println!("  Trades:      {}", r.total_trades);
            println!("  Sequences:   {} (longest {})", r.sequence_count, r.max_streak);
            println!("  Total Loss:  {:+.2}", r.total_loss);
            println!("  Avg Loss:    {:+.2}", r.avg_loss);
            println!("  Avg Hold:    {:.0} min", r.avg_holding_minutes);
            println!("  Profit Factor: {:.2}", r.profit_factor);
            print_breakdown("By symbol", &r.by_instrument);
            print_breakdown("By strategy", &r.by_strategy);
            print_breakdown("By weekday", &r.by_weekday);
        }

        if let Some(sim) = &self.similar {
            let st = &sim.stats;
            println!();
            println!("  SIMILAR TO {}", sim.base_id);
            println!("  ───────────────────────────────────");
            println!("  Matches:     {}", st.count);
            println!("  Win Rate:    {:.1}%", st.win_rate);
            println!("  Avg Profit:  {:+.2}", st.avg_profit);
            println!("  Avg R:       {:+.2}", st.avg_r);
            for m in sim.matches.iter().take(SHOWN_MATCHES) {
                println!(
                    "  {:>10}: score {:>3} | {:+.2} | {}",
                    m.id,
                    m.score,
                    m.profit,
                    m.close_time.format("%Y-%m-%d")
                );
            }
        }

        if let Some(mp) = &self.monthly {
            let s = &mp.evaluation.scores;
            println!();
            println!("  MONTH {}", mp.month);
            println!("  ───────────────────────────────────");
            println!("  Entry:       {:.1}", s.entry_skill);
            println!("  Drawdown:    {:.1}", s.drawdown_control);
            println!("  Risk/Reward: {:.1}", s.risk_reward);
            println!("  Risk Mgmt:   {:.1}", s.risk_management);
            println!("  Stability:   {:.1}", s.profit_stability);
            println!("  Overall:     {:.1} ({})", s.overall, mp.evaluation.level);
        }

        println!("{}", "=".repeat(70));
    }
}

fn print_episode(ep: &DrawdownEpisode) {
    println!(
        "  Episode:     {} to {} ({} days, {} trades)",
        date_or_dash(ep.start_date),
        date_or_dash(ep.end_date),
        ep.duration_days,
        ep.trade_count
    );
    println!("  Total Loss:  {:.2}", ep.total_loss);
    println!("  Net:         {:+.2}", ep.net_profit);
    println!("  Avg Hold:    {:.1} h (losers)", ep.avg_holding_hours);
    print_breakdown("By symbol", &ep.by_instrument);
    print_breakdown("By strategy", &ep.by_strategy_tag);
    print_breakdown("By weekday", &ep.by_weekday);
    print_breakdown("By time", &ep.by_time_bucket);
}

fn print_breakdown(title: &str, rows: &[LossBreakdown]) {
    if rows.is_empty() {
        return;
    }
    println!("  {}:", title);
    for row in rows {
        println!("  {:>14}: {} trades | -{:.2}", row.key, row.trades, row.loss);
    }
}

fn date_or_dash(d: Option<chrono::NaiveDate>) -> String {
    d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
