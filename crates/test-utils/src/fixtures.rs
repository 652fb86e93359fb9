//! Common test fixtures for geo load-test tests.

use geo_common::{Coordinate, GeoBounds};

/// Common bounds definitions for testing.
pub mod bounds {
    use geo_common::GeoBounds;

    /// The default generation box (73..136 E, 3..54 N)
    pub fn default_box() -> GeoBounds {
        GeoBounds::default()
    }

    /// A one-degree box around central Beijing
    pub fn beijing() -> GeoBounds {
        GeoBounds::new(116.0, 117.0, 39.5, 40.5)
    }

    /// A box only a few micro-degrees wide, to force collisions
    pub fn tiny() -> GeoBounds {
        GeoBounds::new(10.0, 10.000002, 20.0, 20.000002)
    }

    /// Inverted longitude (min > max)
    pub fn inverted() -> GeoBounds {
        GeoBounds::new(136.0, 73.0, 3.0, 54.0)
    }
}

/// A handful of well-known points inside the default bounds.
pub fn sample_coordinates() -> Vec<Coordinate> {
    vec![
        Coordinate::new(116.397123, 39.904211), // Beijing
        Coordinate::new(121.473701, 31.230416), // Shanghai
        Coordinate::new(113.264385, 23.129112), // Guangzhou
        Coordinate::new(104.065735, 30.659462), // Chengdu
        Coordinate::new(87.617733, 43.792818),  // Urumqi
    ]
}

/// Check that every sample fixture is inside the given bounds.
pub fn all_within(coords: &[Coordinate], bounds: &GeoBounds) -> bool {
    coords.iter().all(|c| bounds.contains(c.longitude, c.latitude))
}
