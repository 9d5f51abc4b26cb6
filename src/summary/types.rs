use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Counts and time span over one request's readings or segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Summary {
    pub total_records: usize,
    pub unique_regions: usize,
    pub time_periods: usize,
    /// `None` when there was nothing to summarize.
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStatistics {
    pub reading_count: usize,
    pub hours_spent: f64,
    pub percentage_of_readings: f64,
}

/// Per-region totals, keyed and listed in name order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RegionBreakdown {
    pub regions: Vec<String>,
    pub statistics: BTreeMap<String, RegionStatistics>,
}
