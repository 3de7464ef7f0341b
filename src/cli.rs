use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "tower bracket enumeration and difficulty analysis")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Enumerate brackets now and store them
    Enumerate {
        /// League slug or name (repeatable, defaults to every tracked league)
        #[arg(short, long = "league")]
        leagues: Vec<String>,
        /// Tournament date (YYYY-MM-DD, defaults to the latest completed tournament)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Run one full enumerate-and-analyze cycle
    Analyze {
        /// Tournament date (YYYY-MM-DD, defaults to the latest completed tournament)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Run cycles periodically until interrupted
    Schedule,
    /// Show the latest difficulty report for a player
    Report {
        #[arg(short, long)]
        player: String,
        /// League slug or name
        #[arg(short, long)]
        league: String,
        /// List every stored report instead of only the latest
        #[arg(long)]
        history: bool,
    },
    /// Show statistics of a league's latest snapshot
    Stats {
        /// League slug or name
        #[arg(short, long)]
        league: String,
    },
    /// Register a tracked run submission
    RecordRun {
        #[arg(short, long)]
        player: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        tier: u32,
        #[arg(short, long)]
        wave: u32,
        /// Submission time (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
