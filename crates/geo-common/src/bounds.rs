//! Geographic bounds for generated coordinates.

use serde::{Deserialize, Serialize};

use crate::coord::MICRO_DEGREES;
use crate::{GeoError, GeoResult};

/// Latitude limit of the store's geo index (web mercator).
pub const MAX_GEO_LATITUDE: f64 = 85.05112878;

/// Longitude limit of the store's geo index.
pub const MAX_GEO_LONGITUDE: f64 = 180.0;

/// Half-open box `[min, max)` that generated coordinates are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Default for GeoBounds {
    /// Longitude 73 to 136, latitude 3 to 54.
    fn default() -> Self {
        Self {
            min_lon: 73.0,
            max_lon: 136.0,
            min_lat: 3.0,
            max_lat: 54.0,
        }
    }
}

impl GeoBounds {
    /// Create bounds from min/max longitude and latitude.
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// Check the bounds are non-empty and inside the range the store can index.
    pub fn validate(&self) -> GeoResult<()> {
        let finite = [self.min_lon, self.max_lon, self.min_lat, self.max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GeoError::InvalidBounds("values must be finite".to_string()));
        }
        if self.min_lon >= self.max_lon {
            return Err(GeoError::InvalidBounds(format!(
                "min_lon {} must be below max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat >= self.max_lat {
            return Err(GeoError::InvalidBounds(format!(
                "min_lat {} must be below max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lon < -MAX_GEO_LONGITUDE || self.max_lon > MAX_GEO_LONGITUDE {
            return Err(GeoError::InvalidBounds(format!(
                "longitude must lie within [-{0}, {0}]",
                MAX_GEO_LONGITUDE
            )));
        }
        if self.min_lat < -MAX_GEO_LATITUDE || self.max_lat > MAX_GEO_LATITUDE {
            return Err(GeoError::InvalidBounds(format!(
                "latitude must lie within [-{0}, {0}]",
                MAX_GEO_LATITUDE
            )));
        }
        let (lon_lo, lon_hi) = self.lon_micro_range();
        let (lat_lo, lat_hi) = self.lat_micro_range();
        if lon_lo >= lon_hi || lat_lo >= lat_hi {
            return Err(GeoError::InvalidBounds(
                "bounds must contain at least one whole micro-degree".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if a point falls inside the bounds. Max edges are exclusive.
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        longitude >= self.min_lon
            && longitude < self.max_lon
            && latitude >= self.min_lat
            && latitude < self.max_lat
    }

    /// Whole micro-degree longitudes inside the bounds, as `[lo, hi)`.
    pub fn lon_micro_range(&self) -> (i64, i64) {
        (micro_at_or_above(self.min_lon), micro_at_or_above(self.max_lon))
    }

    /// Whole micro-degree latitudes inside the bounds, as `[lo, hi)`.
    pub fn lat_micro_range(&self) -> (i64, i64) {
        (micro_at_or_above(self.min_lat), micro_at_or_above(self.max_lat))
    }
}

/// Smallest whole micro-degree `m` with `m / 1e6 >= degrees`.
///
/// Checked against the same division `Coordinate::from_micro_degrees` does,
/// so fractional micro-degree edges never let a value slip outside.
fn micro_at_or_above(degrees: f64) -> i64 {
    let micro = (degrees * MICRO_DEGREES).round() as i64;
    if (micro as f64) / MICRO_DEGREES < degrees {
        micro + 1
    } else {
        micro
    }
}
