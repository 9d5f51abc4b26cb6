mod types;

pub use types::{DateRange, RegionBreakdown, RegionStatistics, Summary};

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::db::models::LocationReading;
use crate::models::Segment;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Summary of a segmented view.
pub fn summarize_segments(segments: &[Segment]) -> Summary {
    let regions: HashSet<&str> = segments.iter().map(|s| s.region.as_str()).collect();

    Summary {
        total_records: segments.iter().map(|s| s.consecutive_readings).sum(),
        unique_regions: regions.len(),
        time_periods: segments.len(),
        date_range: date_range(
            segments
                .iter()
                .flat_map(|s| [s.start_time, s.end_time]),
        ),
    }
}

/// Summary of the raw, unsegmented view. `time_periods` is always zero.
pub fn summarize_readings(readings: &[LocationReading]) -> Summary {
    let regions: HashSet<&str> = readings.iter().map(|r| r.region.as_str()).collect();

    Summary {
        total_records: readings.len(),
        unique_regions: regions.len(),
        time_periods: 0,
        date_range: date_range(readings.iter().map(|r| r.timestamp)),
    }
}

/// Reading counts, dwell hours and share of readings per region.
pub fn region_breakdown(segments: &[Segment]) -> RegionBreakdown {
    let total: usize = segments.iter().map(|s| s.consecutive_readings).sum();

    let mut counts: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for segment in segments {
        let entry = counts.entry(segment.region.clone()).or_insert((0, 0.0));
        entry.0 += segment.consecutive_readings;
        entry.1 += segment.duration().num_seconds() as f64 / SECONDS_PER_HOUR;
    }

    let statistics: BTreeMap<String, RegionStatistics> = counts
        .into_iter()
        .map(|(region, (reading_count, hours))| {
            let percentage = if total > 0 {
                reading_count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (
                region,
                RegionStatistics {
                    reading_count,
                    hours_spent: round2(hours),
                    percentage_of_readings: round2(percentage),
                },
            )
        })
        .collect();

    RegionBreakdown {
        regions: statistics.keys().cloned().collect(),
        statistics,
    }
}

fn date_range(timestamps: impl Iterator<Item = DateTime<Utc>>) -> Option<DateRange> {
    timestamps.fold(None, |range, ts| match range {
        None => Some(DateRange { start: ts, end: ts }),
        Some(DateRange { start, end }) => Some(DateRange {
            start: start.min(ts),
            end: end.max(ts),
        }),
    })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transition;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn segment(region: &str, start: u32, end: u32, count: usize) -> Segment {
        Segment {
            start_time: at(start),
            end_time: at(end),
            region: region.into(),
            confidence: 70,
            consecutive_readings: count,
            average_accuracy: None,
            transition: Transition::RegionChange,
        }
    }

    #[test]
    fn empty_input_degenerates_to_zeros() {
        let summary = summarize_segments(&[]);
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.date_range, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["date_range"].is_null());
        assert_eq!(json["total_records"], 0);

        assert_eq!(summarize_readings(&[]), Summary::default());
        assert_eq!(region_breakdown(&[]), RegionBreakdown::default());
    }

    #[test]
    fn segment_summary_counts() {
        let segments = vec![
            segment("California", 9, 11, 3),
            segment("Nevada", 12, 12, 1),
        ];
        let summary = summarize_segments(&segments);
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.unique_regions, 2);
        assert_eq!(summary.time_periods, 2);
        assert_eq!(
            summary.date_range,
            Some(DateRange {
                start: at(9),
                end: at(12)
            })
        );
    }

    #[test]
    fn repeated_regions_count_once() {
        let segments = vec![
            segment("NY", 1, 2, 2),
            segment("NJ", 3, 3, 1),
            segment("NY", 4, 5, 2),
        ];
        let summary = summarize_segments(&segments);
        assert_eq!(summary.unique_regions, 2);
        assert_eq!(summary.time_periods, 3);
    }

    #[test]
    fn reading_summary_uses_raw_counts() {
        let readings = vec![
            LocationReading::new(at(8), "NY"),
            LocationReading::new(at(6) + Duration::minutes(30), "NJ"),
            LocationReading::new(at(7), "NY"),
        ];
        let summary = summarize_readings(&readings);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.unique_regions, 2);
        assert_eq!(summary.time_periods, 0);
        let range = summary.date_range.unwrap();
        assert_eq!(range.start, at(6) + Duration::minutes(30));
        assert_eq!(range.end, at(8));
    }

    #[test]
    fn breakdown_rounds_hours_and_percentages() {
        let segments = vec![
            segment("NY", 1, 2, 2),
            segment("NJ", 3, 3, 1),
            segment("NY", 4, 6, 3),
        ];
        let breakdown = region_breakdown(&segments);
        assert_eq!(breakdown.regions, vec!["NJ".to_string(), "NY".to_string()]);

        let ny = &breakdown.statistics["NY"];
        assert_eq!(ny.reading_count, 5);
        assert_eq!(ny.hours_spent, 3.0);
        assert_eq!(ny.percentage_of_readings, 83.33);

        let nj = &breakdown.statistics["NJ"];
        assert_eq!(nj.hours_spent, 0.0);
        assert_eq!(nj.percentage_of_readings, 16.67);
    }
}
