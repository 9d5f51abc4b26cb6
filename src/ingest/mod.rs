//! CSV dataset ingestion.
//!
//! Required columns: `date`, `location`, `latitude`, `longitude`, `accuracy`.
//! `activity` is optional. The secondary accuracy indicator is read from an
//! `accuracy.1` column, or from a second `accuracy` column when the export
//! repeats the header. The region label is derived from the `location`
//! text. Rows that fail to parse are logged and skipped.

mod region;
mod signal;

pub use region::extract_region;
pub use signal::signal_strength;

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::db::{models::LocationReading, Database};

const ENABLE_LOGS: bool = true;

const REQUIRED_COLUMNS: [&str; 5] = ["date", "location", "latitude", "longitude", "accuracy"];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M",
];

#[derive(Debug, Default)]
pub struct IngestReport {
    pub readings: Vec<LocationReading>,
    pub skipped: usize,
}

struct Columns {
    date: usize,
    location: usize,
    latitude: usize,
    longitude: usize,
    accuracy: usize,
    activity: Option<usize>,
    accuracy_level: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut repeated_accuracy = None;
        for (position, name) in headers.iter().enumerate() {
            if name == "accuracy" && index.contains_key("accuracy") {
                repeated_accuracy.get_or_insert(position);
                continue;
            }
            index.entry(name).or_insert(position);
        }

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !index.contains_key(column))
            .collect();
        if !missing.is_empty() {
            bail!("Missing required columns: {}", missing.join(", "));
        }

        Ok(Self {
            date: index["date"],
            location: index["location"],
            latitude: index["latitude"],
            longitude: index["longitude"],
            accuracy: index["accuracy"],
            activity: index.get("activity").copied(),
            accuracy_level: index.get("accuracy.1").copied().or(repeated_accuracy),
        })
    }
}

/// Timestamps in the dataset carry no zone and are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(anyhow!("unrecognized timestamp '{raw}'"))
}

fn field<'r>(record: &'r StringRecord, index: usize) -> Option<&'r str> {
    record.get(index).map(str::trim).filter(|value| !value.is_empty())
}

fn number(record: &StringRecord, index: usize, name: &str) -> Result<f64> {
    let raw = field(record, index).ok_or_else(|| anyhow!("{name} is empty"))?;
    raw.parse::<f64>()
        .with_context(|| format!("{name} '{raw}' is not a number"))
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<LocationReading> {
    let timestamp = parse_timestamp(field(record, columns.date).unwrap_or_default())?;
    let location = field(record, columns.location).ok_or_else(|| anyhow!("location is empty"))?;
    let region = extract_region(location)
        .ok_or_else(|| anyhow!("location '{location}' names no region"))?;

    let accuracy_level = match columns.accuracy_level.and_then(|i| field(record, i)) {
        Some(raw) => Some(
            raw.parse::<f64>()
                .with_context(|| format!("accuracy level '{raw}' is not a number"))?,
        ),
        None => None,
    };

    let mut reading = LocationReading::new(timestamp, region)
        .with_location(location)
        .with_accuracy(number(record, columns.accuracy, "accuracy")?)
        .with_coordinates(
            number(record, columns.latitude, "latitude")?,
            number(record, columns.longitude, "longitude")?,
        );
    reading.activity = columns
        .activity
        .and_then(|i| field(record, i))
        .map(str::to_string);
    reading.accuracy_level = accuracy_level;
    reading.signal_strength = accuracy_level.map(signal_strength);

    Ok(reading)
}

pub fn read_readings<R: Read>(source: R) -> Result<IngestReport> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers().context("failed to read CSV header")?.clone();
    let columns = Columns::from_headers(&headers)?;

    let mut report = IngestReport::default();
    for (line, record) in reader.records().enumerate() {
        // header is line 1
        let line = line + 2;
        let parsed = record
            .with_context(|| format!("malformed CSV record on line {line}"))
            .and_then(|record| parse_row(&record, &columns));

        match parsed {
            Ok(reading) => report.readings.push(reading),
            Err(err) => {
                crate::log_warn!("Skipping line {line}: {err:#}");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

pub fn load_csv(path: &Path) -> Result<IngestReport> {
    let file =
        File::open(path).with_context(|| format!("failed to open dataset {}", path.display()))?;
    let report =
        read_readings(file).with_context(|| format!("failed to load {}", path.display()))?;

    crate::log_info!(
        "Parsed {} readings from {} ({} skipped)",
        report.readings.len(),
        path.display(),
        report.skipped
    );

    Ok(report)
}

/// Load `path` into `db` unless the store already holds readings.
/// Returns how many readings were inserted.
pub async fn seed_database(db: &Database, path: &Path) -> Result<usize> {
    let existing = db.count_readings().await?;
    if existing > 0 {
        crate::log_info!("Reading store already holds {existing} readings; skipping ingestion");
        return Ok(0);
    }

    let report = load_csv(path)?;
    db.insert_readings(&report.readings).await
}
