//! The store operations the benchmark depends on.

use async_trait::async_trait;

use geo_common::{Coordinate, GeoResult};

use crate::geo::RadiusQuery;

/// Geo set operations used by the seeding and benchmark phases.
#[async_trait]
pub trait GeoBackend: Send + Sync {
    /// Add one member to the geo set at `key`. Returns the number of new members.
    async fn geo_add(&self, key: &str, coord: &Coordinate) -> GeoResult<i64>;

    /// Members of `key` within the query radius of the given point.
    async fn geo_radius(
        &self,
        key: &str,
        longitude: f64,
        latitude: f64,
        query: &RadiusQuery,
    ) -> GeoResult<Vec<String>>;
}
