mod analysis;
mod cli;
mod db;
mod error;
mod ingest;
mod models;
mod segmentation;
mod settings;
mod store;
mod summary;
mod utils;

use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info};

pub use analysis::{
    analyze_readings, get_analysis, get_locations, parse_timezone, AnalysisController,
    AnalysisReport, CommandResponse, LocationsReport, OutputZone, QueryParams,
};
pub use db::{Coordinates, Database, LocationReading};
pub use error::AnalysisError;
pub use ingest::{
    extract_region, load_csv, read_readings, seed_database, signal_strength, IngestReport,
};
pub use models::{Segment, Transition};
pub use segmentation::{
    compute_confidence, group_readings, segment_readings, ReadingGroup, SegmentationConfig,
};
pub use settings::Settings;
pub use store::{is_time_ordered, sort_readings, InMemoryStore, ReadingFilter, ReadingStore};
pub use summary::{
    region_breakdown, summarize_readings, summarize_segments, DateRange, RegionBreakdown,
    RegionStatistics, Summary,
};

use cli::{Cli, Command};

pub(crate) struct AppState {
    pub(crate) controller: AnalysisController<Database>,
    pub(crate) settings: Settings,
}

impl AppState {
    fn open(settings: Settings) -> Result<Self> {
        let database = Database::new(settings.database_path.clone())?;
        Ok(Self {
            controller: AnalysisController::new(database, settings.segmentation.clone()),
            settings,
        })
    }

    fn db(&self) -> &Database {
        self.controller.store()
    }

    /// Seed an empty store from the configured dataset, if any. A dataset
    /// that fails to load is logged and the store is queried as it stands.
    async fn seed(&self) {
        let Some(path) = &self.settings.dataset_path else {
            return;
        };
        match seed_database(self.db(), path).await {
            Ok(0) => {}
            Ok(inserted) => info!("Seeded {inserted} readings from {}", path.display()),
            Err(err) => error!("Failed to seed reading store from {}: {err:#}", path.display()),
        }
    }
}

async fn dispatch(state: &AppState, command: Command) -> Result<CommandResponse> {
    match command {
        Command::Ingest { csv } => {
            let path = csv
                .or_else(|| state.settings.dataset_path.clone())
                .ok_or_else(|| anyhow!("no dataset given and none configured"))?;
            let report = load_csv(&path)?;
            let inserted = state.db().insert_readings(&report.readings).await?;
            Ok(CommandResponse {
                status: 200,
                body: serde_json::json!({
                    "success": true,
                    "data": {
                        "inserted": inserted,
                        "skipped": report.skipped,
                    },
                }),
            })
        }
        Command::Locations(args) => {
            state.seed().await;
            Ok(get_locations(
                &state.controller,
                &QueryParams::from(args),
                &state.settings.default_timezone,
            )
            .await)
        }
        Command::Analysis(args) => {
            state.seed().await;
            Ok(get_analysis(
                &state.controller,
                &QueryParams::from(args),
                &state.settings.default_timezone,
            )
            .await)
        }
    }
}

fn execute(cli: Cli) -> Result<CommandResponse> {
    let settings = Settings::load(&cli.config)?
        .with_env()
        .with_overrides(cli.db, cli.dataset);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let state = AppState::open(settings)?;
        dispatch(&state, cli.command).await
    })
}

pub fn run() -> ExitCode {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let response = match execute(cli) {
        Ok(response) => response,
        Err(err) => {
            error!("presence failed: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&response.body) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => {
            error!("failed to render response: {err}");
            return ExitCode::FAILURE;
        }
    }

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
