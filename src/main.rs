use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use readiness::logging::init_logging;
use readiness::sport_readiness::categorize;
use readiness::{
    AlgorithmVersion, AthleteHistory, ConfigError, DailyReport, EngineConfig, ReadinessCategory,
    ReadinessEngine, ReadinessError, SportStatus,
};

/// Readiness - daily training readiness from activity and health history
///
/// Reads a JSON history export (activities, health snapshots, events) and
/// reports the readiness score, per-sport guidance and training phase.
#[derive(Parser)]
#[command(name = "readiness")]
#[command(version)]
#[command(about = "Training readiness CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Scoring algorithm (v1, v2); defaults to the configured version
    #[arg(short, long, global = true)]
    algorithm: Option<AlgorithmVersion>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Readiness score for one day
    Score {
        /// History file (JSON)
        #[arg(short = 'H', long)]
        history: PathBuf,

        /// Day to score (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scores for a date range
    Range {
        #[arg(short = 'H', long)]
        history: PathBuf,

        /// Range start (YYYY-MM-DD)
        #[arg(short, long)]
        from: String,

        /// Range end (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        to: Option<String>,

        /// Also print weekly summaries
        #[arg(short, long)]
        weekly: bool,

        #[arg(long)]
        json: bool,
    },

    /// Current training phase and the plan for the next priority event
    Phase {
        #[arg(short = 'H', long)]
        history: PathBuf,

        #[arg(short, long)]
        date: Option<String>,

        /// Print the dated phase plan
        #[arg(short, long)]
        plan: bool,
    },

    /// Go / no-go per sport profile
    Sports {
        #[arg(short = 'H', long)]
        history: PathBuf,

        #[arg(short, long)]
        date: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

#[derive(Tabled)]
struct FactorRow {
    #[tabled(rename = "Factor")]
    name: String,
    #[tabled(rename = "Points")]
    value: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Score")]
    score: u8,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "ACWR")]
    acwr: String,
    #[tabled(rename = "Phase")]
    phase: String,
}

#[derive(Tabled)]
struct SportRow {
    #[tabled(rename = "Sport")]
    sport: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Blockers")]
    blockers: String,
}

#[derive(Tabled)]
struct WeekRow {
    #[tabled(rename = "Week")]
    week: String,
    #[tabled(rename = "Sessions")]
    sessions: usize,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Load")]
    load: String,
    #[tabled(rename = "Avg readiness")]
    readiness: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(EngineConfig::default_config_path);
    let (config, fallback_reason) = if cli.config.is_some() {
        let config = EngineConfig::load_from_file(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        (config, None)
    } else {
        EngineConfig::load_or_default(&config_path)
    };

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config).context("Failed to initialise logging")?;

    match fallback_reason {
        Some(ReadinessError::Config(ConfigError::FileNotFound { .. })) => {
            tracing::info!(path = %config_path.display(), "no config file, using defaults");
        }
        Some(e) => {
            tracing::warn!(
                path = %config_path.display(),
                error = %e,
                "Using default configuration"
            );
        }
        None => {}
    }

    let version = cli.algorithm.unwrap_or(config.default_version);

    match cli.command {
        Commands::Score {
            history,
            date,
            json,
        } => {
            let engine = build_engine(config)?;
            let history = load_history(&history)?;
            let date = parse_date_or_today(date.as_deref())?;
            let report = score_with_trend(&engine, &history, date, version)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Range {
            history,
            from,
            to,
            weekly,
            json,
        } => {
            let engine = build_engine(config)?;
            let history = load_history(&history)?;
            let from = parse_date(&from)?;
            let to = parse_date_or_today(to.as_deref())?;
            let reports = engine.compute_range(&history, from, to, version)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
                return Ok(());
            }

            let rows: Vec<DayRow> = reports
                .iter()
                .map(|r| DayRow {
                    date: r.readiness.date.to_string(),
                    score: r.readiness.score,
                    category: r.readiness.category.to_string(),
                    acwr: if r.readiness.acwr.sufficient_history {
                        format!("{:.2}", r.readiness.acwr.ratio)
                    } else {
                        "-".to_string()
                    },
                    phase: r.phase.phase.display_name().to_string(),
                })
                .collect();
            print_table(rows);

            if weekly {
                let weeks = engine.weekly_trends(&history, &reports, from, to)?;
                println!("\n{}", "Weekly summary".cyan().bold());
                let rows: Vec<WeekRow> = weeks
                    .iter()
                    .map(|w| WeekRow {
                        week: format!("{} - {}", w.week_start, w.week_end),
                        sessions: w.activity_count,
                        hours: format!("{:.1}", w.total_hours),
                        load: format!("{:.0}", w.total_load),
                        readiness: w
                            .avg_readiness
                            .map(|r| format!("{:.0}", r))
                            .unwrap_or_else(|| "-".to_string()),
                    })
                    .collect();
                print_table(rows);
            }
        }

        Commands::Phase {
            history,
            date,
            plan,
        } => {
            let engine = build_engine(config)?;
            let history = load_history(&history)?;
            let date = parse_date_or_today(date.as_deref())?;
            let status = engine.detect_phase(&history.events, date);

            println!(
                "{} {}",
                "Phase:".bold(),
                status.phase.display_name().magenta().bold()
            );
            match (&status.event, status.weeks_out) {
                (Some(event), Some(weeks)) => {
                    println!(
                        "Next priority event: {} ({}, {}-race) in {:.1} weeks",
                        event.name.bold(),
                        event.date,
                        event.priority,
                        weeks
                    );
                    if plan {
                        println!();
                        for block in engine.generate_plan(event) {
                            println!("  {}  {} to {}", block.name, block.start_date, block.end_date);
                        }
                    }
                }
                _ => println!("No upcoming A or B event"),
            }
        }

        Commands::Sports { history, date } => {
            let engine = build_engine(config)?;
            let history = load_history(&history)?;
            let date = parse_date_or_today(date.as_deref())?;
            let report = score_with_trend(&engine, &history, date, version)?;
            print_sports(&report);
        }

        Commands::Config { action } => run_config(action, config, config_path)?,
    }

    Ok(())
}

fn build_engine(config: EngineConfig) -> Result<ReadinessEngine> {
    ReadinessEngine::new(config).map_err(|e| anyhow::anyhow!(e.user_message()))
}

fn run_config(action: ConfigAction, mut config: EngineConfig, path: PathBuf) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            config.save_to_file(&path)?;
            println!("{} {}", "✓ Wrote".green(), path.display());
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Score `date` after the three days before it so the trend adjustment has data
fn score_with_trend(
    engine: &ReadinessEngine,
    history: &AthleteHistory,
    date: NaiveDate,
    version: AlgorithmVersion,
) -> Result<DailyReport> {
    let reports = engine.compute_range(history, date - Duration::days(3), date, version)?;
    reports
        .into_iter()
        .last()
        .context("Range unexpectedly produced no reports")
}

fn load_history(path: &Path) -> Result<AthleteHistory> {
    AthleteHistory::load_json(path)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("Failed to read history from {}", path.display()))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

fn parse_date_or_today(s: Option<&str>) -> Result<NaiveDate> {
    match s {
        Some(s) => parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn colored_category(category: ReadinessCategory) -> ColoredString {
    let label = category.to_string();
    match category {
        ReadinessCategory::High => label.green().bold(),
        ReadinessCategory::Moderate => label.green(),
        ReadinessCategory::Low => label.yellow(),
        ReadinessCategory::Recovery => label.red(),
        ReadinessCategory::Rest => label.red().bold(),
    }
}

fn print_report(report: &DailyReport) {
    let result = &report.readiness;
    println!(
        "{} {}  {} ({})",
        "Readiness".bold(),
        result.date,
        result.score.to_string().bold(),
        colored_category(result.category)
    );
    println!("{}", result.guidance.recommendation);

    let rows: Vec<FactorRow> = result
        .factors
        .iter()
        .map(|f| FactorRow {
            name: f.name.clone(),
            value: format!("{:+.1}", f.value),
            detail: f.detail.clone(),
        })
        .collect();
    if !rows.is_empty() {
        print_table(rows);
    }

    if result.acwr.sufficient_history {
        println!(
            "{} {:.2} ({}): {}",
            "ACWR".bold(),
            result.acwr.ratio,
            result.acwr.zone,
            result.acwr.zone.description()
        );
    }
    println!("{} {}", "Fatigue:".bold(), result.fatigue.fractions.recommendation());

    if !result.guidance.avoid.is_empty() {
        println!("{} {}", "Avoid:".red(), result.guidance.avoid.join(", "));
    }
    if !result.guidance.suggested.is_empty() {
        println!("{} {}", "Try:".green(), result.guidance.suggested.join(", "));
    }
    println!(
        "{} {}",
        "Phase:".bold(),
        report.phase.phase.display_name()
    );
}

fn print_sports(report: &DailyReport) {
    let rows: Vec<SportRow> = report
        .readiness
        .sport_readiness
        .iter()
        .map(|(sport, status)| SportRow {
            sport: sport.display_name().to_string(),
            status: match status.status {
                SportStatus::Ready => status.status.to_string().green().to_string(),
                SportStatus::Caution => status.status.to_string().yellow().to_string(),
                SportStatus::NotReady => status.status.to_string().red().to_string(),
            },
            blockers: status.blockers.join("; "),
        })
        .collect();
    print_table(rows);

    let categories = categorize(&report.readiness.sport_readiness);
    println!(
        "{} ready, {} caution, {} not ready",
        categories.ready.len(),
        categories.caution.len(),
        categories.not_ready.len()
    );
}
