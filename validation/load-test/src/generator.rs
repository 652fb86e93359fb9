//! Random coordinate generation.

use geo_common::{Coordinate, GeoBounds};
use rand::prelude::*;
use std::ops::Range;

/// Generates coordinates uniformly inside a bounding box, at micro-degree
/// precision.
pub struct CoordinateGenerator {
    bounds: GeoBounds,
    rng: StdRng,
    lon_micro: Range<i64>,
    lat_micro: Range<i64>,
}

impl CoordinateGenerator {
    /// Create a generator. A seed makes the sequence reproducible.
    pub fn new(bounds: GeoBounds, seed: Option<u64>) -> Self {
        // Use seed if provided for reproducible runs, otherwise use entropy
        let rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        let (lon_lo, lon_hi) = bounds.lon_micro_range();
        let (lat_lo, lat_hi) = bounds.lat_micro_range();

        // Unvalidated boxes narrower than a micro-degree still yield a point
        Self {
            bounds,
            rng,
            lon_micro: lon_lo..lon_hi.max(lon_lo + 1),
            lat_micro: lat_lo..lat_hi.max(lat_lo + 1),
        }
    }

    /// Generator for one of several parallel workers.
    ///
    /// Seeded runs give each worker its own stream derived from the base
    /// seed, so workers do not replay each other's coordinates.
    pub fn for_worker(bounds: GeoBounds, seed: Option<u64>, worker: usize) -> Self {
        let seed = seed.map(|s| s.wrapping_add((worker as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)));
        Self::new(bounds, seed)
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// Next coordinate inside the bounds.
    pub fn next_coordinate(&mut self) -> Coordinate {
        let lon = self.rng.gen_range(self.lon_micro.clone());
        let lat = self.rng.gen_range(self.lat_micro.clone());
        Coordinate::from_micro_degrees(lon, lat)
    }
}

impl Iterator for CoordinateGenerator {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Coordinate> {
        Some(self.next_coordinate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_coords_within, assert_micro_precision, bounds};

    #[test]
    fn test_coordinates_within_default_bounds() {
        let b = bounds::default_box();
        let mut gen = CoordinateGenerator::new(b, Some(42));
        for _ in 0..10_000 {
            let c = gen.next_coordinate();
            assert_coords_within!(&c, &b);
            assert_micro_precision!(c.longitude);
            assert_micro_precision!(c.latitude);
        }
    }

    #[test]
    fn test_coordinates_within_small_bounds() {
        let b = bounds::beijing();
        for c in CoordinateGenerator::new(b, None).take(1_000) {
            assert_coords_within!(&c, &b);
        }
    }

    #[test]
    fn test_name_matches_values() {
        let mut gen = CoordinateGenerator::new(GeoBounds::default(), Some(1));
        let c = gen.next_coordinate();
        assert_eq!(c.name, format!("{:.6}{:.6}", c.longitude, c.latitude));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a: Vec<_> = CoordinateGenerator::new(GeoBounds::default(), Some(99))
            .take(20)
            .collect();
        let b: Vec<_> = CoordinateGenerator::new(GeoBounds::default(), Some(99))
            .take(20)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_workers_get_distinct_streams() {
        let a: Vec<_> = CoordinateGenerator::for_worker(GeoBounds::default(), Some(5), 0)
            .take(10)
            .collect();
        let b: Vec<_> = CoordinateGenerator::for_worker(GeoBounds::default(), Some(5), 1)
            .take(10)
            .collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tiny_bounds_stay_inside() {
        let b = bounds::tiny();
        for c in CoordinateGenerator::new(b, Some(3)).take(100) {
            assert_coords_within!(&c, &b);
        }
    }

    #[test]
    fn test_fractional_micro_bounds_stay_inside() {
        let b = GeoBounds::new(10.0000004, 10.0000026, 20.0000004, 20.0000026);
        assert!(b.validate().is_ok());

        let outside = CoordinateGenerator::new(b, Some(1))
            .take(1_000)
            .filter(|c| !b.contains(c.longitude, c.latitude))
            .count();
        assert_eq!(outside, 0);
    }
}
