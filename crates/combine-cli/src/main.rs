// `combine` entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr; stdout carries JSON)
// 2. Load config/combine.toml, copying defaults on first run
// 3. Build the engine (standards and positions, with any overrides)
// 4. Run the requested command

mod cli;

use std::path::Path;

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use combine_core::config::{self, EngineConfig};
use combine_core::history::snapshot_as_of;
use combine_core::roster::load_roster;
use combine_core::{DerivedDataset, Engine, Metric, ProcessOptions, RawDataset, Sport};

use cli::{Cli, Command};

/// Output document for `combine process`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    as_of: Option<NaiveDate>,
    dataset: &'a DerivedDataset,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let config = load_engine_config(&cwd)?;
    let engine = Engine::from_config(&config, &cwd).context("failed to load standards data")?;

    match cli.command {
        Command::Process {
            roster,
            out,
            age_adjusted,
            body_adjusted,
            cohorts,
            as_of,
            pretty,
        } => {
            let raw = read_roster(&roster)?;
            let raw = match as_of {
                Some(date) => snapshot_as_of(&raw, date),
                None => raw,
            };
            let options = ProcessOptions {
                age_adjusted: config.options.age_adjusted || age_adjusted,
                body_adjusted: config.options.body_adjusted || body_adjusted,
                cohort_mode: config.options.cohort_mode || cohorts,
            };

            let dataset = engine.process(&raw, &options);
            let report = Report {
                generated_at: Utc::now(),
                as_of,
                dataset: &dataset,
            };
            let json = if pretty {
                serde_json::to_string_pretty(&report)
            } else {
                serde_json::to_string(&report)
            }
            .context("failed to serialize report")?;

            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Report written to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Audit { roster } => {
            let raw = read_roster(&roster)?;
            let dataset = engine.process(&raw, &config.options);
            print_audit(&dataset);
        }
        Command::Standards { sport } => {
            let sports = match sport {
                Some(name) => match Sport::parse(&name) {
                    Some(s) => vec![s],
                    None => bail!("unknown sport '{name}'"),
                },
                None => Sport::ALL.to_vec(),
            };
            print_standards(&engine, &sports);
        }
    }

    Ok(())
}

/// Use `config/combine.toml` when the working directory has one (or has
/// `defaults/` to create it from); otherwise run on built-in defaults.
fn load_engine_config(base_dir: &Path) -> anyhow::Result<EngineConfig> {
    if !base_dir.join("defaults").is_dir() && !base_dir.join("config").is_dir() {
        info!("No config/ or defaults/ directory; using built-in defaults");
        return Ok(EngineConfig::default());
    }
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: age_adjusted={}, body_adjusted={}, cohorts={}",
        config.options.age_adjusted, config.options.body_adjusted, config.options.cohort_mode
    );
    Ok(config)
}

fn read_roster(path: &Path) -> anyhow::Result<RawDataset> {
    let raw = load_roster(path)
        .with_context(|| format!("failed to load roster {}", path.display()))?;
    info!(
        "Loaded {} athletes ({} test sessions) from {}",
        raw.athletes.len(),
        raw.sessions.len(),
        path.display()
    );
    Ok(raw)
}

fn print_audit(dataset: &DerivedDataset) {
    println!("Warnings ({}):", dataset.warnings.len());
    for w in &dataset.warnings {
        println!("  {:<14} n={:<3} {}", w.metric.key(), w.count, w.message);
    }
    println!("Flags ({}):", dataset.flags.len());
    for f in &dataset.flags {
        let id = f.athlete_id.as_deref().unwrap_or("-");
        println!("  {} ({id}): {}", f.athlete_name, f.message);
    }
}

fn print_standards(engine: &Engine, sports: &[Sport]) {
    let standards = &engine.registry().standards;
    for sport in sports {
        let Some(groups) = standards.tables.get(sport) else {
            continue;
        };
        println!("{sport}");
        for (group, metrics) in groups {
            println!("  {group}");
            for metric in Metric::ALL {
                let Some(t) = metrics.get(&metric) else {
                    continue;
                };
                let direction = if metric.invert() { "<=" } else { ">=" };
                println!(
                    "    {:<24} {:<7} {direction} {:>8} {:>8} {:>8} {:>8}",
                    metric.label(),
                    metric.unit(),
                    t[0],
                    t[1],
                    t[2],
                    t[3]
                );
            }
        }
    }
}

/// Log to stderr so stdout stays machine-readable.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("combine=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
