// Command-line arguments.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Derived metrics for athletic testing rosters.
#[derive(Debug, Parser)]
#[command(name = "combine")]
#[command(about = "Compute physics, percentile and graded metrics for a testing roster")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process a roster and emit the annotated dataset as JSON
    Process {
        /// Roster file (.json dataset document or .csv)
        roster: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Scale grade thresholds by school grade
        #[arg(long)]
        age_adjusted: bool,

        /// Scale grade thresholds by weight and height band
        #[arg(long)]
        body_adjusted: bool,

        /// Rank athletes within like-for-like cohorts
        #[arg(long)]
        cohorts: bool,

        /// Rebuild the roster from test sessions up to this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print data-quality warnings and plausibility flags for a roster
    Audit {
        /// Roster file (.json dataset document or .csv)
        roster: PathBuf,
    },
    /// Print the active standards tables
    Standards {
        /// Only this sport
        #[arg(long)]
        sport: Option<String>,
    },
}
