//! Device Location Values
//!
//! Coordinates in decimal degrees and the two ways a mocked location can be
//! given to the device: explicit coordinates or a free-text address that the
//! device cloud geocodes.

use crate::result::{DeviceError, DeviceResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tolerance, in degrees, when comparing two locations
pub const COORDINATE_EPSILON: f64 = 1e-6;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude (-90.0 to 90.0)
    pub latitude: f64,
    /// Longitude (-180.0 to 180.0)
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> DeviceResult<Self> {
        let raw = format!("{latitude},{longitude}");
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid(&raw, "latitude must be between -90 and 90 degrees"));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid(
                &raw,
                "longitude must be between -180 and 180 degrees",
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse `lat,long`
    pub fn parse(value: &str) -> DeviceResult<Self> {
        let mut parts = value.split(',');
        let (Some(lat), Some(long), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid(value, "expected 'latitude,longitude'"));
        };
        let latitude = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(value, "latitude is not a decimal number"))?;
        let longitude = long
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(value, "longitude is not a decimal number"))?;
        Self::new(latitude, longitude).map_err(|_| invalid(value, "coordinates out of range"))
    }

    /// Check whether two positions are the same within [`COORDINATE_EPSILON`]
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        (self.latitude - other.latitude).abs() < COORDINATE_EPSILON
            && (self.longitude - other.longitude).abs() < COORDINATE_EPSILON
    }
}

impl FromStr for Coordinates {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

fn invalid(value: &str, reason: &str) -> DeviceError {
    DeviceError::InvalidCoordinates {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Location to mock on the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationSpec {
    /// Explicit coordinates
    Coordinates(Coordinates),
    /// Address resolved by the device cloud's geocoder
    Address(String),
}

impl LocationSpec {
    /// Parameter name the device cloud expects for this kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Coordinates(_) => "coordinates",
            Self::Address(_) => "address",
        }
    }

    /// Parameter value sent to the device cloud
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::Coordinates(c) => c.to_string(),
            Self::Address(a) => a.clone(),
        }
    }
}
