use anyhow::{Context, Result};
use serde::Serialize;

use crate::db::models::LocationReading;
use crate::models::Segment;
use crate::segmentation::{segment_readings, SegmentationConfig};
use crate::store::{sort_readings, ReadingFilter, ReadingStore};
use crate::summary::{region_breakdown, summarize_readings, summarize_segments, RegionBreakdown, Summary};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub segments: Vec<Segment>,
    pub summary: Summary,
    pub regions: RegionBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationsReport {
    pub readings: Vec<LocationReading>,
    pub summary: Summary,
}

/// Sort, segment, score and summarize one batch of readings.
///
/// The sort is part of the pipeline: callers may pass readings in any order.
pub fn analyze_readings(
    mut readings: Vec<LocationReading>,
    config: &SegmentationConfig,
) -> Result<AnalysisReport> {
    sort_readings(&mut readings);

    let segments = segment_readings(readings, config).context("segmentation failed")?;
    let summary = summarize_segments(&segments);
    let regions = region_breakdown(&segments);

    Ok(AnalysisReport {
        segments,
        summary,
        regions,
    })
}

/// Runs requests against an injected reading store.
pub struct AnalysisController<S> {
    store: S,
    config: SegmentationConfig,
}

impl<S: ReadingStore> AnalysisController<S> {
    pub fn new(store: S, config: SegmentationConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub async fn list_locations(&self, filter: &ReadingFilter) -> Result<LocationsReport> {
        let mut readings = self
            .store
            .fetch(filter)
            .await
            .context("failed to load readings")?;
        sort_readings(&mut readings);

        crate::log_info!("Listing {} readings for {:?}", readings.len(), filter);

        let summary = summarize_readings(&readings);
        Ok(LocationsReport { readings, summary })
    }

    pub async fn analyze(&self, filter: &ReadingFilter) -> Result<AnalysisReport> {
        let readings = self
            .store
            .fetch(filter)
            .await
            .context("failed to load readings")?;

        let reading_count = readings.len();
        let report = analyze_readings(readings, &self.config)?;

        crate::log_info!(
            "Analyzed {} readings into {} segments across {} regions",
            reading_count,
            report.summary.time_periods,
            report.summary.unique_regions
        );

        Ok(report)
    }
}
