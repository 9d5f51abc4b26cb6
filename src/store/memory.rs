use std::future::Future;

use anyhow::Result;

use super::{sort_readings, ReadingFilter, ReadingStore};
use crate::db::models::LocationReading;

/// Fixture store holding readings in arrival order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    readings: Vec<LocationReading>,
}

impl InMemoryStore {
    pub fn new(readings: Vec<LocationReading>) -> Self {
        let mut store = Self::default();
        for reading in readings {
            store.insert(reading);
        }
        store
    }

    pub fn insert(&mut self, mut reading: LocationReading) {
        if reading.id.is_none() {
            reading.id = Some(self.readings.len() as i64 + 1);
        }
        self.readings.push(reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl ReadingStore for InMemoryStore {
    fn fetch(
        &self,
        filter: &ReadingFilter,
    ) -> impl Future<Output = Result<Vec<LocationReading>>> + Send {
        let mut matched: Vec<LocationReading> = self
            .readings
            .iter()
            .filter(|reading| filter.matches(reading))
            .cloned()
            .collect();
        sort_readings(&mut matched);
        async move { Ok(matched) }
    }
}
