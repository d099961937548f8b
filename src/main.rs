use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use journal_analytics::analytics::MonthKey;
use journal_analytics::config::Config;
use journal_analytics::dashboard::{self, DashboardRequest};
use journal_analytics::ingest::parse_timestamp;
use journal_analytics::models::StreakSlot;
use journal_analytics::source::JsonFileSource;

#[derive(Parser)]
#[command(author, version, about = "Trading-journal analytics", long_about = None)]
struct Cli {
    /// Journal export: a JSON array of trade rows.
    trades: PathBuf,

    /// Per-trade notes: a JSON array keyed by ticket.
    #[arg(long, global = true)]
    notes: Option<PathBuf>,

    /// Print the report as JSON instead of the text summary.
    #[arg(long, global = true)]
    json: bool,

    /// Defaults to a dashboard with only the always-on panels.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drawdown episode around a time (display timezone).
    Episode { at: String },
    /// Win/loss streaks, optionally drilled into a time slot.
    Streaks {
        #[arg(value_parser = parse_slot)]
        slot: Option<StreakSlot>,
    },
    /// Trades similar to the given one.
    Similar { id: String },
    /// Monthly skill evaluation.
    Month { month: MonthKey },
    /// Every requested panel at once.
    Dashboard(DashboardArgs),
}

#[derive(Args, Default)]
struct DashboardArgs {
    #[arg(long)]
    at: Option<String>,
    #[arg(long)]
    month: Option<MonthKey>,
    #[arg(long)]
    similar: Option<String>,
    /// One of asia-morning, asia-afternoon, europe-early, europe-late, ny-early, ny-late.
    #[arg(long, value_parser = parse_slot)]
    slot: Option<StreakSlot>,
}

fn parse_slot(raw: &str) -> Result<StreakSlot, String> {
    StreakSlot::parse(raw).ok_or_else(|| format!("unknown slot '{}'", raw))
}

impl Commands {
    fn into_dashboard_args(self) -> DashboardArgs {
        match self {
            Commands::Episode { at } => DashboardArgs {
                at: Some(at),
                ..Default::default()
            },
            Commands::Streaks { slot } => DashboardArgs {
                slot,
                ..Default::default()
            },
            Commands::Similar { id } => DashboardArgs {
                similar: Some(id),
                ..Default::default()
            },
            Commands::Month { month } => DashboardArgs {
                month: Some(month),
                ..Default::default()
            },
            Commands::Dashboard(args) => args,
        }
    }
}

impl DashboardArgs {
    fn into_request(self, cfg: &Config) -> Result<DashboardRequest> {
        let episode_at = match self.at {
            Some(raw) => Some(
                parse_timestamp(&raw, cfg.display_timezone)
                    .with_context(|| format!("Unrecognized timestamp '{}'", raw))?,
            ),
            None => None,
        };
        Ok(DashboardRequest {
            episode_at,
            month: self.month,
            similar_to: self.similar,
            slot: self.slot,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let request = cli
        .command
        .map(Commands::into_dashboard_args)
        .unwrap_or_default()
        .into_request(&cfg)?;

    info!(
        "Journal timezone {}, broker timezone {}",
        cfg.display_timezone, cfg.broker_timezone
    );

    let mut source = JsonFileSource::new(cli.trades, cfg.broker_timezone);
    if let Some(notes) = cli.notes {
        source = source.with_notes(notes);
    }

    let report = dashboard::build_report(&cfg, &source, &request).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_summary();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn request(args: &[&str]) -> DashboardRequest {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut cfg = Config::from_env();
        cfg.display_timezone = chrono_tz::UTC;
        cli.command
            .map(Commands::into_dashboard_args)
            .unwrap_or_default()
            .into_request(&cfg)
            .unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_path_requests_no_optional_panels() {
        let req = request(&["journal-analytics", "trades.json"]);
        assert!(req.episode_at.is_none());
        assert!(req.month.is_none());
        assert!(req.similar_to.is_none());
        assert!(req.slot.is_none());
    }

    #[test]
    fn subcommands_map_to_one_panel() {
        let req = request(&["journal-analytics", "trades.json", "month", "2024-03"]);
        assert_eq!(req.month.map(|m| m.to_string()), Some("2024-03".to_string()));

        let req = request(&["journal-analytics", "trades.json", "streaks", "ny-late"]);
        assert_eq!(req.slot, Some(StreakSlot::NyLate));

        let req = request(&["journal-analytics", "trades.json", "similar", "1001"]);
        assert_eq!(req.similar_to.as_deref(), Some("1001"));

        let req = request(&["journal-analytics", "trades.json", "episode", "2024-01-17 12:00"]);
        assert!(req.episode_at.is_some());
    }

    #[test]
    fn dashboard_flags_and_global_options() {
        let cli = Cli::try_parse_from([
            "journal-analytics",
            "trades.json",
            "dashboard",
            "--month",
            "2024-01",
            "--slot",
            "asia-morning",
            "--json",
            "--notes",
            "notes.json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.notes, Some(PathBuf::from("notes.json")));
        let Some(Commands::Dashboard(args)) = cli.command else {
            panic!("expected dashboard");
        };
        assert_eq!(args.slot, Some(StreakSlot::AsiaMorning));
        assert!(args.month.is_some());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(Cli::try_parse_from(["journal-analytics", "t.json", "month", "2024-13"]).is_err());
        assert!(Cli::try_parse_from(["journal-analytics", "t.json", "streaks", "lunch"]).is_err());
        assert!(Cli::try_parse_from(["journal-analytics"]).is_err());
    }
}
