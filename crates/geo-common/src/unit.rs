//! Distance units accepted by radius queries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::GeoError;

/// Unit of the radius passed to a proximity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    M,
    #[default]
    Km,
    Mi,
    Ft,
}

impl DistanceUnit {
    /// The token the store expects on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::M => "m",
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
            DistanceUnit::Ft => "ft",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceUnit {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m" => Ok(DistanceUnit::M),
            "km" => Ok(DistanceUnit::Km),
            "mi" => Ok(DistanceUnit::Mi),
            "ft" => Ok(DistanceUnit::Ft),
            other => Err(GeoError::InvalidConfig(format!(
                "unknown distance unit '{}', expected one of m, km, mi, ft",
                other
            ))),
        }
    }
}
