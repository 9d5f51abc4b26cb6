//! Reading store seam.
//!
//! The analysis pipeline never opens storage itself; it receives something
//! implementing [`ReadingStore`]. `Database` is the SQLite implementation and
//! [`InMemoryStore`] backs tests and fixtures.

mod filter;
mod memory;

use std::future::Future;

use anyhow::Result;

use crate::db::models::LocationReading;

pub use filter::ReadingFilter;
pub use memory::InMemoryStore;

pub trait ReadingStore {
    /// Readings matching `filter`, ascending by timestamp with arrival order
    /// breaking ties.
    fn fetch(
        &self,
        filter: &ReadingFilter,
    ) -> impl Future<Output = Result<Vec<LocationReading>>> + Send;
}

/// Stable sort by timestamp. Equal timestamps keep their relative order.
pub fn sort_readings(readings: &mut [LocationReading]) {
    readings.sort_by_key(|reading| reading.timestamp);
}

pub fn is_time_ordered(readings: &[LocationReading]) -> bool {
    readings
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp)
}
