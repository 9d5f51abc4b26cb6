use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};

use crate::db::models::LocationReading;
use crate::models::{Segment, Transition};
use crate::segmentation::config::SegmentationConfig;
use crate::segmentation::scoring::{average_accuracy, compute_confidence};

const ENABLE_LOGS: bool = false;

/// A run of consecutive readings sharing one region label.
#[derive(Debug, Clone)]
pub struct ReadingGroup {
    pub region: String,
    pub readings: Vec<LocationReading>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub closed_by: Transition,
}

impl ReadingGroup {
    fn open(reading: LocationReading) -> Self {
        Self {
            region: reading.region.clone(),
            start_time: reading.timestamp,
            end_time: reading.timestamp,
            readings: vec![reading],
            closed_by: Transition::FinalPeriod,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }

    pub fn reading_count(&self) -> usize {
        self.readings.len()
    }
}

/// Main segmentation function: sorted readings in, scored segments out.
pub fn segment_readings(
    readings: Vec<LocationReading>,
    config: &SegmentationConfig,
) -> Result<Vec<Segment>> {
    let groups = group_readings(readings, config)?;
    Ok(groups.iter().map(|group| score_group(group, config)).collect())
}

/// Group consecutive readings by region.
///
/// Input must be ascending by timestamp; an out-of-order reading is an
/// error rather than a silently wrong partition.
pub fn group_readings(
    readings: Vec<LocationReading>,
    config: &SegmentationConfig,
) -> Result<Vec<ReadingGroup>> {
    if readings.is_empty() {
        return Ok(Vec::new());
    }

    // Limits too large for chrono never split anything.
    let max_gap = config
        .max_gap_secs
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(Duration::try_seconds);

    let mut groups = Vec::new();
    let mut current_group: Option<ReadingGroup> = None;

    for (index, reading) in readings.into_iter().enumerate() {
        match &mut current_group {
            Some(group) if reading.timestamp < group.end_time => {
                bail!(
                    "readings out of order at index {index}: {} precedes {}",
                    reading.timestamp,
                    group.end_time
                );
            }
            Some(group) if group.region == reading.region => {
                let gap = reading.timestamp - group.end_time;
                if max_gap.is_some_and(|limit| gap > limit) {
                    crate::log_debug!(
                        "Splitting {} run after {}s gap",
                        group.region,
                        gap.num_seconds()
                    );
                    group.closed_by = Transition::TimeGap;
                    if let Some(closed) = current_group.replace(ReadingGroup::open(reading)) {
                        groups.push(closed);
                    }
                } else {
                    group.end_time = reading.timestamp;
                    group.readings.push(reading);
                }
            }
            Some(group) => {
                group.closed_by = Transition::RegionChange;
                if let Some(closed) = current_group.replace(ReadingGroup::open(reading)) {
                    groups.push(closed);
                }
            }
            None => {
                current_group = Some(ReadingGroup::open(reading));
            }
        }
    }

    // Push final group
    if let Some(group) = current_group {
        groups.push(group);
    }

    crate::log_debug!("Grouped readings into {} runs", groups.len());

    Ok(groups)
}

/// Turn a closed run into a scored segment.
pub fn score_group(group: &ReadingGroup, config: &SegmentationConfig) -> Segment {
    Segment {
        start_time: group.start_time,
        end_time: group.end_time,
        region: group.region.clone(),
        confidence: compute_confidence(group.reading_count(), config),
        consecutive_readings: group.reading_count(),
        average_accuracy: average_accuracy(&group.readings),
        transition: group.closed_by,
    }
}
