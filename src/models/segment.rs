use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Why a segment was closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    RegionChange,
    TimeGap,
    FinalPeriod,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::RegionChange => "region_change",
            Transition::TimeGap => "time_gap",
            Transition::FinalPeriod => "final_period",
        }
    }
}

/// One inferred visit: a maximal run of consecutive same-region readings.
/// Computed per request and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub region: String,
    pub confidence: u8,
    pub consecutive_readings: usize,
    pub average_accuracy: Option<f64>,
    pub transition: Transition,
}

impl Segment {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn transition_serializes_snake_case() {
        let json = serde_json::to_string(&Transition::RegionChange).unwrap();
        assert_eq!(json, "\"region_change\"");
        assert_eq!(Transition::FinalPeriod.as_str(), "final_period");
    }

    #[test]
    fn duration_spans_first_to_last_reading() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let segment = Segment {
            start_time: start,
            end_time: start + Duration::hours(2),
            region: "California".into(),
            confidence: 80,
            consecutive_readings: 3,
            average_accuracy: None,
            transition: Transition::RegionChange,
        };
        assert_eq!(segment.duration().num_minutes(), 120);
    }
}
