use std::future::Future;

use anyhow::{Context, Result};
use rusqlite::{params, types::Value, Row};

use crate::db::{
    connection::Database,
    helpers::{conversion_error, format_datetime, format_day, parse_datetime, to_usize},
    models::{Coordinates, LocationReading},
};
use crate::store::{ReadingFilter, ReadingStore};

const SELECT_COLUMNS: &str = "SELECT
        id,
        timestamp,
        location,
        region,
        activity,
        accuracy,
        latitude,
        longitude,
        accuracy_level,
        signal_strength
    FROM location_readings";

fn row_to_reading(row: &Row) -> Result<LocationReading, rusqlite::Error> {
    let timestamp_str: String = row.get("timestamp")?;

    Ok(LocationReading {
        id: row.get("id")?,
        timestamp: parse_datetime(&timestamp_str, "timestamp").map_err(conversion_error)?,
        location: row.get("location")?,
        region: row.get("region")?,
        activity: row.get("activity")?,
        accuracy: row.get("accuracy")?,
        coordinates: Coordinates {
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
        },
        accuracy_level: row.get("accuracy_level")?,
        signal_strength: row.get("signal_strength")?,
    })
}

/// Builds the WHERE clause and its positional values for `filter`.
fn filter_clause(filter: &ReadingFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(region) = &filter.region {
        // instr/lower keeps `%` and `_` literal, unlike LIKE.
        conditions.push("instr(lower(location), lower(?)) > 0");
        values.push(Value::Text(region.clone()));
    }
    if let Some(activity) = &filter.activity {
        conditions.push("activity = ?");
        values.push(Value::Text(activity.clone()));
    }
    if let Some(date) = &filter.date {
        conditions.push("day = ?");
        values.push(Value::Text(format_day(date)));
    }
    if let Some(start) = &filter.start_date {
        conditions.push("day >= ?");
        values.push(Value::Text(format_day(start)));
    }
    if let Some(end) = &filter.end_date {
        conditions.push("day <= ?");
        values.push(Value::Text(format_day(end)));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

impl Database {
    /// Batch insert readings in one transaction. Returns how many were written.
    pub async fn insert_readings(&self, readings: &[LocationReading]) -> Result<usize> {
        let readings = readings.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO location_readings (
                        timestamp,
                        day,
                        location,
                        region,
                        activity,
                        accuracy,
                        latitude,
                        longitude,
                        accuracy_level,
                        signal_strength
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )?;

                for reading in &readings {
                    stmt.execute(params![
                        format_datetime(&reading.timestamp),
                        format_day(&reading.timestamp.date_naive()),
                        reading.location,
                        reading.region,
                        reading.activity,
                        reading.accuracy,
                        reading.coordinates.latitude,
                        reading.coordinates.longitude,
                        reading.accuracy_level,
                        reading.signal_strength,
                    ])
                    .with_context(|| {
                        format!("failed to insert reading at {}", reading.timestamp)
                    })?;
                }
            }

            tx.commit().context("failed to commit reading batch")?;
            Ok(readings.len())
        })
        .await
    }

    /// Load readings matching `filter`, ordered by timestamp then arrival.
    pub async fn get_readings(&self, filter: ReadingFilter) -> Result<Vec<LocationReading>> {
        self.execute(move |conn| {
            let (clause, values) = filter_clause(&filter);
            let sql = format!("{SELECT_COLUMNS}{clause} ORDER BY timestamp ASC, id ASC");
            let mut stmt = conn.prepare(&sql)?;

            let readings_iter =
                stmt.query_map(rusqlite::params_from_iter(values), |row| row_to_reading(row))?;

            let mut readings = Vec::new();
            for reading_result in readings_iter {
                readings.push(reading_result?);
            }

            Ok(readings)
        })
        .await
    }

    pub async fn count_readings(&self) -> Result<usize> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM location_readings", [], |row| row.get(0))?;
            to_usize(count, "reading count")
        })
        .await
    }
}

impl ReadingStore for Database {
    fn fetch(
        &self,
        filter: &ReadingFilter,
    ) -> impl Future<Output = Result<Vec<LocationReading>>> + Send {
        self.get_readings(filter.clone())
    }
}
