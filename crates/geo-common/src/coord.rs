//! Coordinate records inserted into and queried against the geo set.

use serde::{Deserialize, Serialize};

/// Number of decimal places kept for generated coordinates.
pub const COORD_PRECISION: u32 = 6;

/// Scale factor between degrees and integer micro-degrees.
pub const MICRO_DEGREES: f64 = 1_000_000.0;

/// A longitude/latitude pair with the member name it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
    pub name: String,
}

impl Coordinate {
    /// Create a coordinate, deriving its member name from the formatted values.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            name: member_name(longitude, latitude),
        }
    }

    /// Build a coordinate from integer micro-degrees.
    pub fn from_micro_degrees(longitude: i64, latitude: i64) -> Self {
        Self::new(longitude as f64 / MICRO_DEGREES, latitude as f64 / MICRO_DEGREES)
    }
}

/// Member name for a coordinate: both values at six decimals, concatenated.
pub fn member_name(longitude: f64, latitude: f64) -> String {
    format!("{:.6}{:.6}", longitude, latitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_name() {
        let c = Coordinate::new(116.397123, 39.904211);
        assert_eq!(c.name, "116.39712339.904211");
    }

    #[test]
    fn test_member_name_pads_to_six_decimals() {
        assert_eq!(member_name(73.0, 3.5), "73.0000003.500000");
    }

    #[test]
    fn test_from_micro_degrees() {
        let c = Coordinate::from_micro_degrees(73_000_001, 53_999_999);
        assert_eq!(c.longitude, 73.000001);
        assert_eq!(c.latitude, 53.999999);
        assert_eq!(c.name, "73.00000153.999999");
    }
}
