use chrono::NaiveDate;
use serde::Serialize;

use crate::db::models::LocationReading;

/// Retrieval filter understood by every `ReadingStore`.
///
/// Dates are UTC calendar days. `start_date` and `end_date` are both
/// inclusive of the whole day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadingFilter {
    /// Substring of the reported location text, ASCII case-insensitive.
    pub region: Option<String>,
    pub date: Option<NaiveDate>,
    /// Exact activity label.
    pub activity: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReadingFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, reading: &LocationReading) -> bool {
        let day = reading.timestamp.date_naive();

        if let Some(region) = &self.region {
            let needle = region.to_ascii_lowercase();
            if !reading.location.to_ascii_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(activity) = &self.activity {
            if reading.activity.as_deref() != Some(activity.as_str()) {
                return false;
            }
        }
        if self.date.is_some_and(|date| day != date) {
            return false;
        }
        if self.start_date.is_some_and(|start| day < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| day > end) {
            return false;
        }
        true
    }
}
