//! In-memory `GeoBackend` doubles.
//!
//! None of these talk to a server; they let the seeding and benchmark
//! loops run inside unit and integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use geo_common::{Coordinate, GeoError, GeoResult};
use storage::{GeoBackend, RadiusQuery};

/// Records every member added and answers radius queries with a
/// flat-earth distance check (good enough for tests).
#[derive(Default)]
pub struct MemoryGeoBackend {
    sets: Mutex<HashMap<String, HashMap<String, (f64, f64)>>>,
    adds: AtomicU64,
    queries: AtomicU64,
}

impl MemoryGeoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct members stored under `key`.
    pub fn len(&self, key: &str) -> usize {
        self.sets
            .lock()
            .map(|sets| sets.get(key).map(|s| s.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }

    /// Every stored member of `key` as coordinates.
    pub fn members(&self, key: &str) -> Vec<Coordinate> {
        self.sets
            .lock()
            .map(|sets| {
                sets.get(key)
                    .map(|s| {
                        s.values()
                            .map(|&(lon, lat)| Coordinate::new(lon, lat))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Total `geo_add` calls, including duplicates.
    pub fn add_calls(&self) -> u64 {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoBackend for MemoryGeoBackend {
    async fn geo_add(&self, key: &str, coord: &Coordinate) -> GeoResult<i64> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        let mut sets = self
            .sets
            .lock()
            .map_err(|e| GeoError::Internal(e.to_string()))?;
        let previous = sets
            .entry(key.to_string())
            .or_default()
            .insert(coord.name.clone(), (coord.longitude, coord.latitude));
        Ok(if previous.is_none() { 1 } else { 0 })
    }

    async fn geo_radius(
        &self,
        key: &str,
        longitude: f64,
        latitude: f64,
        query: &RadiusQuery,
    ) -> GeoResult<Vec<String>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let sets = self
            .sets
            .lock()
            .map_err(|e| GeoError::Internal(e.to_string()))?;

        // ~111 km per degree; the unit is ignored beyond km.
        let radius_deg = query.radius / 111.0;
        let Some(set) = sets.get(key) else {
            return Ok(Vec::new());
        };
        Ok(set
            .iter()
            .filter(|(_, pos)| {
                let (lon, lat) = **pos;
                let (dx, dy) = (lon - longitude, lat - latitude);
                (dx * dx + dy * dy).sqrt() <= radius_deg
            })
            .map(|(name, _)| name.clone())
            .take(query.count as usize)
            .collect())
    }
}

/// Fails every call with a command error.
#[derive(Default)]
pub struct FailingGeoBackend {
    calls: AtomicU64,
}

impl FailingGeoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoBackend for FailingGeoBackend {
    async fn geo_add(&self, _key: &str, _coord: &Coordinate) -> GeoResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GeoError::Connection("connection refused".to_string()))
    }

    async fn geo_radius(
        &self,
        _key: &str,
        _longitude: f64,
        _latitude: f64,
        _query: &RadiusQuery,
    ) -> GeoResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GeoError::Connection("connection refused".to_string()))
    }
}

/// Fails every `every`th call (1-based), succeeding otherwise.
pub struct FlakyGeoBackend {
    every: u64,
    calls: AtomicU64,
}

impl FlakyGeoBackend {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        n % self.every == 0
    }
}

#[async_trait]
impl GeoBackend for FlakyGeoBackend {
    async fn geo_add(&self, _key: &str, _coord: &Coordinate) -> GeoResult<i64> {
        if self.should_fail() {
            Err(GeoError::Timeout)
        } else {
            Ok(1)
        }
    }

    async fn geo_radius(
        &self,
        _key: &str,
        _longitude: f64,
        _latitude: f64,
        _query: &RadiusQuery,
    ) -> GeoResult<Vec<String>> {
        if self.should_fail() {
            Err(GeoError::Timeout)
        } else {
            Ok(Vec::new())
        }
    }
}
