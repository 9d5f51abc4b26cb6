use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::analysis::QueryParams;

#[derive(Parser, Debug)]
#[command(name = "presence")]
#[command(about = "Region-visit segmentation for device location pings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (JSON); defaults apply when it does not exist
    #[arg(short, long, global = true, default_value = "presence.json")]
    pub config: PathBuf,

    /// SQLite database path (overrides settings and PRESENCE_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// CSV dataset seeded into an empty store (overrides settings and PRESENCE_DATASET)
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a CSV dataset into the reading store
    Ingest {
        /// Dataset to load; falls back to the configured dataset
        csv: Option<PathBuf>,
    },
    /// List filtered raw readings
    Locations(FilterArgs),
    /// Segment filtered readings into scored region visits
    Analysis(FilterArgs),
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Location text substring
    #[arg(long)]
    pub region: Option<String>,

    /// Single day (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Exact activity label
    #[arg(long)]
    pub activity: Option<String>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Output zone: UTC, +HH:MM / -HH:MM, or an IANA name like America/New_York
    #[arg(long)]
    pub timezone: Option<String>,
}

impl From<FilterArgs> for QueryParams {
    fn from(args: FilterArgs) -> Self {
        Self {
            region: args.region,
            date: args.date,
            activity: args.activity,
            start_date: args.start_date,
            end_date: args.end_date,
            timezone: args.timezone,
        }
    }
}
