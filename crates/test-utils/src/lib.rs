//! Shared test utilities for the geo load-test workspace.
//!
//! This crate provides common testing infrastructure including:
//! - In-memory `GeoBackend` doubles (recording, failing, flaky)
//! - Coordinate fixtures
//! - Float and bounds assertion macros
//! - Paths to the shipped scenario files
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```

pub mod backends;
pub mod fixtures;
pub mod paths;

// Re-export commonly used items at the crate root
pub use backends::*;
pub use fixtures::*;
pub use paths::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert a coordinate lies inside a `GeoBounds` (half-open).
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_coords_within;
///
/// assert_coords_within!(&coord, &GeoBounds::default());
/// ```
#[macro_export]
macro_rules! assert_coords_within {
    ($coord:expr, $bounds:expr) => {{
        let coord = $coord;
        let bounds = $bounds;
        if !bounds.contains(coord.longitude, coord.latitude) {
            panic!(
                "assertion failed: coordinate ({}, {}) outside bounds {:?}",
                coord.longitude, coord.latitude, bounds
            );
        }
    }};
}

/// Assert a value carries at most six decimal places.
#[macro_export]
macro_rules! assert_micro_precision {
    ($value:expr) => {{
        let value: f64 = $value as f64;
        let scaled = value * 1_000_000.0;
        if (scaled - scaled.round()).abs() > 1e-6 {
            panic!(
                "assertion failed: `{:?}` has more than six decimal places",
                value
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    use geo_common::{Coordinate, GeoBounds};

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_coords_within_passes() {
        assert_coords_within!(&Coordinate::new(100.0, 30.0), &GeoBounds::default());
    }

    #[test]
    #[should_panic(expected = "outside bounds")]
    fn test_assert_coords_within_fails() {
        assert_coords_within!(&Coordinate::new(-100.0, 30.0), &GeoBounds::default());
    }

    #[test]
    fn test_assert_micro_precision() {
        assert_micro_precision!(116.397123);
        assert_micro_precision!(73.0);
    }

    #[test]
    #[should_panic(expected = "six decimal places")]
    fn test_assert_micro_precision_fails() {
        assert_micro_precision!(116.3971234);
    }
}
