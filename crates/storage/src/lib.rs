//! Store access for the geo load test.
//!
//! Provides:
//! - A small connection pool over Redis-protocol stores
//! - Typed wrappers around the geo commands the benchmark issues
//! - The `GeoBackend` trait the benchmark is written against

pub mod backend;
pub mod geo;
pub mod pool;

#[cfg(test)]
mod testing;

pub use backend::GeoBackend;
pub use geo::{GeoStore, RadiusQuery};
pub use pool::{GeoPool, PoolConfig, PoolStats, PooledConnection};
