//! Common types shared by the geo load-test crates.

pub mod bounds;
pub mod coord;
pub mod error;
pub mod unit;

pub use bounds::GeoBounds;
pub use coord::Coordinate;
pub use error::{GeoError, GeoResult};
pub use unit::DistanceUnit;
