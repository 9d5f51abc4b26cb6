pub mod commands;
mod controller;

pub use commands::{
    get_analysis, get_locations, parse_timezone, CommandResponse, OutputZone, QueryParams,
};
pub use controller::{analyze_readings, AnalysisController, AnalysisReport, LocationsReport};
