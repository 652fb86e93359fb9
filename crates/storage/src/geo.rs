//! Geo commands issued against the store.

use async_trait::async_trait;
use redis::RedisResult;
use serde::{Deserialize, Serialize};

use geo_common::{Coordinate, DistanceUnit, GeoResult};

use crate::backend::GeoBackend;
use crate::pool::GeoPool;

/// Parameters of a `GEORADIUS` query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusQuery {
    pub radius: f64,
    pub unit: DistanceUnit,
    /// Maximum number of members returned
    pub count: u32,
}

impl Default for RadiusQuery {
    fn default() -> Self {
        Self {
            radius: 10.0,
            unit: DistanceUnit::Km,
            count: 100,
        }
    }
}

/// Geo set client backed by the connection pool.
#[derive(Clone)]
pub struct GeoStore {
    pool: GeoPool,
}

impl GeoStore {
    pub fn new(pool: GeoPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &GeoPool {
        &self.pool
    }

    /// Round-trip a PING on a pooled connection.
    pub async fn ping(&self) -> GeoResult<()> {
        let mut conn = self.pool.get().await?;
        let result: RedisResult<String> = redis::cmd("PING").query_async(&mut *conn).await;
        result.map(|_| ()).map_err(|e| conn.fail(e))
    }

    /// `GEOADD key longitude latitude member`
    pub async fn geo_add(&self, key: &str, coord: &Coordinate) -> GeoResult<i64> {
        let mut conn = self.pool.get().await?;
        let result: RedisResult<i64> = redis::cmd("GEOADD")
            .arg(key)
            .arg(coord.longitude)
            .arg(coord.latitude)
            .arg(&coord.name)
            .query_async(&mut *conn)
            .await;
        result.map_err(|e| conn.fail(e))
    }

    /// `GEORADIUS key longitude latitude radius unit COUNT n`
    pub async fn geo_radius(
        &self,
        key: &str,
        longitude: f64,
        latitude: f64,
        query: &RadiusQuery,
    ) -> GeoResult<Vec<String>> {
        let mut conn = self.pool.get().await?;
        let result: RedisResult<Vec<String>> = redis::cmd("GEORADIUS")
            .arg(key)
            .arg(longitude)
            .arg(latitude)
            .arg(query.radius)
            .arg(query.unit.as_str())
            .arg("COUNT")
            .arg(query.count)
            .query_async(&mut *conn)
            .await;
        result.map_err(|e| conn.fail(e))
    }
}

#[async_trait]
impl GeoBackend for GeoStore {
    async fn geo_add(&self, key: &str, coord: &Coordinate) -> GeoResult<i64> {
        GeoStore::geo_add(self, key, coord).await
    }

    async fn geo_radius(
        &self,
        key: &str,
        longitude: f64,
        latitude: f64,
        query: &RadiusQuery,
    ) -> GeoResult<Vec<String>> {
        GeoStore::geo_radius(self, key, longitude, latitude, query).await
    }
}
