use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    analysis::{AnalysisController, AnalysisReport, LocationsReport},
    db::models::{Coordinates, LocationReading},
    error::AnalysisError,
    models::{Segment, Transition},
    store::{ReadingFilter, ReadingStore},
    summary::{round2, RegionBreakdown, Summary},
};

const ENABLE_LOGS: bool = true;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw request parameters as they arrive from a query string or CLI flags.
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryParams {
    pub region: Option<String>,
    pub date: Option<String>,
    pub activity: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub timezone: Option<String>,
}

impl QueryParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "region" => &mut params.region,
                "date" => &mut params.date,
                "activity" => &mut params.activity,
                "start_date" => &mut params.start_date,
                "end_date" => &mut params.end_date,
                "timezone" => &mut params.timezone,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }

    pub fn to_filter(&self) -> Result<ReadingFilter, AnalysisError> {
        let filter = ReadingFilter {
            region: non_empty(&self.region).map(str::to_string),
            date: parse_day("date", &self.date)?,
            activity: non_empty(&self.activity).map(str::to_string),
            start_date: parse_day("start_date", &self.start_date)?,
            end_date: parse_day("end_date", &self.end_date)?,
        };

        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(AnalysisError::validation(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }

        Ok(filter)
    }

    /// Zone used to render timestamps, falling back to `default_timezone`.
    pub fn zone(&self, default_timezone: &str) -> Result<(String, OutputZone), AnalysisError> {
        let name = non_empty(&self.timezone).unwrap_or(default_timezone);
        parse_timezone(name)
            .map(|zone| (name.to_string(), zone))
            .ok_or_else(|| AnalysisError::validation(format!("Invalid timezone: {name}")))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_day(field: &str, value: &Option<String>) -> Result<Option<NaiveDate>, AnalysisError> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                AnalysisError::validation(format!(
                    "Invalid {field} format: {raw}. Use YYYY-MM-DD"
                ))
            }),
    }
}

/// Zone output timestamps are rendered in. Named zones follow their
/// daylight-saving rules, so the offset can differ between readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputZone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl OutputZone {
    pub fn render(&self, at: &DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Fixed(offset) => at.with_timezone(offset),
            Self::Named(tz) => at.with_timezone(tz).fixed_offset(),
        }
    }
}

/// `Z`, a fixed `+HH:MM` / `-HH:MM` offset, or an IANA name such as
/// `UTC` or `America/New_York`.
pub fn parse_timezone(value: &str) -> Option<OutputZone> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("utc") || value.eq_ignore_ascii_case("z") {
        return Some(OutputZone::Named(Tz::UTC));
    }
    if value.starts_with(['+', '-']) {
        return value.parse::<FixedOffset>().ok().map(OutputZone::Fixed);
    }
    value.parse::<Tz>().ok().map(OutputZone::Named)
}

/// Status code plus JSON body, ready for whatever transport sits in front.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub status: u16,
    pub body: Value,
}

impl CommandResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn from_error(err: AnalysisError) -> Self {
        match &err {
            AnalysisError::Validation(message) => {
                crate::log_warn!("Rejected request: {message}");
            }
            AnalysisError::Internal(source) => {
                crate::log_error!("Request failed: {source:#}");
            }
        }
        Self {
            status: err.status_code(),
            body: json!({
                "success": false,
                "error": err.public_message(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[derive(Serialize)]
struct ReadingView<'a> {
    id: Option<i64>,
    timestamp: DateTime<FixedOffset>,
    location: &'a str,
    region: &'a str,
    activity: Option<&'a str>,
    accuracy: Option<f64>,
    coordinates: Coordinates,
    accuracy_level: Option<f64>,
    signal_strength: Option<f64>,
}

impl<'a> ReadingView<'a> {
    fn new(reading: &'a LocationReading, zone: &OutputZone) -> Self {
        Self {
            id: reading.id,
            timestamp: zone.render(&reading.timestamp),
            location: &reading.location,
            region: &reading.region,
            activity: reading.activity.as_deref(),
            accuracy: reading.accuracy,
            coordinates: reading.coordinates,
            accuracy_level: reading.accuracy_level,
            signal_strength: reading.signal_strength,
        }
    }
}

#[derive(Serialize)]
struct SegmentView<'a> {
    start_time: DateTime<FixedOffset>,
    end_time: DateTime<FixedOffset>,
    region: &'a str,
    confidence: u8,
    consecutive_readings: usize,
    average_accuracy: Option<f64>,
    transition_type: Transition,
}

impl<'a> SegmentView<'a> {
    fn new(segment: &'a Segment, zone: &OutputZone) -> Self {
        Self {
            start_time: zone.render(&segment.start_time),
            end_time: zone.render(&segment.end_time),
            region: &segment.region,
            confidence: segment.confidence,
            consecutive_readings: segment.consecutive_readings,
            average_accuracy: segment.average_accuracy.map(round2),
            transition_type: segment.transition,
        }
    }
}

#[derive(Serialize)]
struct DateRangeView {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

#[derive(Serialize)]
struct SummaryView {
    total_records: usize,
    unique_regions: usize,
    time_periods: usize,
    date_range: Option<DateRangeView>,
}

impl SummaryView {
    fn new(summary: &Summary, zone: &OutputZone) -> Self {
        Self {
            total_records: summary.total_records,
            unique_regions: summary.unique_regions,
            time_periods: summary.time_periods,
            date_range: summary.date_range.map(|range| DateRangeView {
                start: zone.render(&range.start),
                end: zone.render(&range.end),
            }),
        }
    }
}

fn locations_body(
    report: &LocationsReport,
    filter: &ReadingFilter,
    timezone: &str,
    zone: &OutputZone,
) -> Value {
    let data: Vec<ReadingView> = report
        .readings
        .iter()
        .map(|reading| ReadingView::new(reading, zone))
        .collect();

    json!({
        "success": true,
        "data": data,
        "metadata": {
            "summary": SummaryView::new(&report.summary, zone),
            "timezone": timezone,
            "filters_applied": filter,
        },
    })
}

fn analysis_body(
    report: &AnalysisReport,
    filter: &ReadingFilter,
    timezone: &str,
    zone: &OutputZone,
) -> Value {
    let segments: Vec<SegmentView> = report
        .segments
        .iter()
        .map(|segment| SegmentView::new(segment, zone))
        .collect();
    let RegionBreakdown {
        regions,
        statistics,
    } = &report.regions;

    json!({
        "success": true,
        "data": {
            "segments": segments,
            "summary": SummaryView::new(&report.summary, zone),
        },
        "metadata": {
            "regions": regions,
            "region_statistics": statistics,
            "timezone": timezone,
            "filters_applied": filter,
        },
    })
}

/// Filtered raw readings plus an unsegmented summary.
pub async fn get_locations<S: ReadingStore>(
    controller: &AnalysisController<S>,
    params: &QueryParams,
    default_timezone: &str,
) -> CommandResponse {
    let result = async {
        let filter = params.to_filter()?;
        let (timezone, zone) = params.zone(default_timezone)?;
        let report = controller.list_locations(&filter).await?;
        Ok::<_, AnalysisError>(locations_body(&report, &filter, &timezone, &zone))
    }
    .await;

    match result {
        Ok(body) => CommandResponse::ok(body),
        Err(err) => CommandResponse::from_error(err),
    }
}

/// Segments with confidence scores plus summary and per-region statistics.
pub async fn get_analysis<S: ReadingStore>(
    controller: &AnalysisController<S>,
    params: &QueryParams,
    default_timezone: &str,
) -> CommandResponse {
    let result = async {
        let filter = params.to_filter()?;
        let (timezone, zone) = params.zone(default_timezone)?;
        let report = controller.analyze(&filter).await?;
        Ok::<_, AnalysisError>(analysis_body(&report, &filter, &timezone, &zone))
    }
    .await;

    match result {
        Ok(body) => CommandResponse::ok(body),
        Err(err) => CommandResponse::from_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::SegmentationConfig;
    use crate::store::InMemoryStore;
    use anyhow::anyhow;
    use chrono::{TimeZone, Utc};
    use std::future::Future;

    fn controller() -> AnalysisController<InMemoryStore> {
        let at = |hour| Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        let store = InMemoryStore::new(vec![
            LocationReading::new(at(9), "California")
                .with_activity("stationary")
                .with_accuracy(20.0),
            LocationReading::new(at(10), "California")
                .with_activity("stationary")
                .with_accuracy(25.0),
            LocationReading::new(at(11), "California").with_activity("stationary"),
            LocationReading::new(at(12), "Nevada").with_activity("stationary"),
        ]);
        AnalysisController::new(store, SegmentationConfig::default())
    }

    struct FailingStore;

    impl ReadingStore for FailingStore {
        fn fetch(
            &self,
            _filter: &ReadingFilter,
        ) -> impl Future<Output = anyhow::Result<Vec<LocationReading>>> + Send {
            async { Err(anyhow!("database is locked")) }
        }
    }

    #[test]
    fn from_pairs_ignores_unknown_keys() {
        let params = QueryParams::from_pairs([
            ("region", "NY"),
            ("page", "2"),
            ("start_date", "2024-01-01"),
        ]);
        assert_eq!(params.region.as_deref(), Some("NY"));
        assert_eq!(params.start_date.as_deref(), Some("2024-01-01"));
        assert!(params.timezone.is_none());
    }

    #[test]
    fn empty_values_are_absent() {
        let params = QueryParams::from_pairs([("region", " "), ("date", "")]);
        assert!(params.to_filter().unwrap().is_empty());
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let params = QueryParams::from_pairs([("start_date", "01/02/2024")]);
        let err = params.to_filter().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_string(),
            "Invalid start_date format: 01/02/2024. Use YYYY-MM-DD"
        );

        let inverted = QueryParams::from_pairs([
            ("start_date", "2024-02-01"),
            ("end_date", "2024-01-01"),
        ]);
        assert!(matches!(
            inverted.to_filter(),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn timezone_parsing() {
        let fixed = |secs| FixedOffset::east_opt(secs).map(OutputZone::Fixed);
        assert_eq!(parse_timezone("UTC"), Some(OutputZone::Named(Tz::UTC)));
        assert_eq!(parse_timezone("z"), Some(OutputZone::Named(Tz::UTC)));
        assert_eq!(parse_timezone("+05:30"), fixed(19_800));
        assert_eq!(parse_timezone("-04:00"), fixed(-14_400));
        assert_eq!(
            parse_timezone("America/New_York"),
            Some(OutputZone::Named(Tz::America__New_York))
        );
        assert_eq!(parse_timezone("+5:30"), None);
        assert_eq!(parse_timezone("Mars/Olympus"), None);
        assert_eq!(parse_timezone(""), None);
    }

    #[test]
    fn named_zone_follows_daylight_saving() {
        let zone = parse_timezone("America/New_York").unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 17, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 16, 0, 0).unwrap();
        assert_eq!(zone.render(&winter).to_rfc3339(), "2024-01-15T12:00:00-05:00");
        assert_eq!(zone.render(&summer).to_rfc3339(), "2024-07-15T12:00:00-04:00");
    }

    #[tokio::test]
    async fn analysis_envelope() {
        let response = get_analysis(&controller(), &QueryParams::default(), "UTC").await;
        assert!(response.is_success());

        let body = &response.body;
        assert_eq!(body["success"], true);
        let segments = body["data"]["segments"].as_array().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0]["region"], "California");
        assert_eq!(segments[0]["confidence"], 80);
        assert_eq!(segments[0]["consecutive_readings"], 3);
        assert_eq!(segments[0]["average_accuracy"], 22.5);
        assert_eq!(segments[0]["transition_type"], "region_change");
        assert_eq!(segments[0]["start_time"], "2024-01-01T09:00:00+00:00");
        assert_eq!(segments[1]["confidence"], 70);

        let summary = &body["data"]["summary"];
        assert_eq!(summary["total_records"], 4);
        assert_eq!(summary["unique_regions"], 2);
        assert_eq!(summary["time_periods"], 2);

        assert_eq!(body["metadata"]["regions"], json!(["California", "Nevada"]));
        assert_eq!(body["metadata"]["timezone"], "UTC");
    }

    #[tokio::test]
    async fn timestamps_follow_requested_offset() {
        let params = QueryParams::from_pairs([("timezone", "-05:00")]);
        let response = get_locations(&controller(), &params, "UTC").await;
        assert!(response.is_success());
        assert_eq!(
            response.body["data"][0]["timestamp"],
            "2024-01-01T04:00:00-05:00"
        );
        assert_eq!(response.body["data"][0]["location"], "California");
        assert_eq!(response.body["metadata"]["summary"]["total_records"], 4);
    }

    #[tokio::test]
    async fn named_timezone_is_accepted() {
        let params = QueryParams::from_pairs([("timezone", "America/New_York")]);
        let response = get_locations(&controller(), &params, "UTC").await;
        assert_eq!(response.status, 200);
        assert_eq!(
            response.body["data"][0]["timestamp"],
            "2024-01-01T04:00:00-05:00"
        );
        assert_eq!(response.body["metadata"]["timezone"], "America/New_York");
    }

    #[tokio::test]
    async fn empty_result_is_success() {
        let params = QueryParams::from_pairs([("region", "Oregon")]);
        let response = get_analysis(&controller(), &params, "UTC").await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["data"]["segments"], json!([]));
        assert_eq!(response.body["data"]["summary"]["total_records"], 0);
        assert!(response.body["data"]["summary"]["date_range"].is_null());
    }

    #[tokio::test]
    async fn invalid_timezone_is_bad_request() {
        let params = QueryParams::from_pairs([("timezone", "Mars/Olympus")]);
        let response = get_locations(&controller(), &params, "UTC").await;
        assert_eq!(response.status, 400);
        assert_eq!(
            response.body,
            json!({"success": false, "error": "Invalid timezone: Mars/Olympus"})
        );
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let controller = AnalysisController::new(FailingStore, SegmentationConfig::default());
        let response = get_analysis(&controller, &QueryParams::default(), "UTC").await;
        assert_eq!(response.status, 500);
        assert_eq!(response.body["success"], false);
        assert_eq!(
            response.body["error"],
            "internal error while processing request"
        );
        assert!(response.body.get("data").is_none());
    }
}
