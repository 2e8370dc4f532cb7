//! Firestore GeoPoint type
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/Shared.Types/LatLng`

use crate::error::FirestoreError;
use serde::{Deserialize, Serialize};

use super::native_value::{NativeMap, NativeValue};

/// Geographic point (latitude/longitude)
///
/// Doubles as the wire payload of `geoPointValue`. The backend omits zero
/// coordinates, hence the field defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (range: -90 to 90)
    #[serde(default)]
    pub latitude: f64,

    /// Longitude in degrees (range: -180 to 180)
    #[serde(default)]
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FirestoreError> {
        // Validate latitude (error cases first)
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(FirestoreError::InvalidArgument(format!(
                "latitude must be in range [-90, 90], got {}",
                latitude
            )));
        }

        // Validate longitude (error cases first)
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(FirestoreError::InvalidArgument(format!(
                "longitude must be in range [-180, 180], got {}",
                longitude
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Native object shape `{longitude, latitude}`, which the codec classifies as a geo point
    pub fn to_native(&self) -> NativeValue {
        let mut map = NativeMap::new();
        map.insert("longitude".to_string(), NativeValue::Double(self.longitude));
        map.insert("latitude".to_string(), NativeValue::Double(self.latitude));
        NativeValue::Object(map)
    }

    /// Read a geo point out of a native object exposing numeric `longitude` and `latitude`
    pub fn from_native_map(map: &NativeMap) -> Option<Self> {
        let longitude = map.get("longitude").and_then(NativeValue::as_f64)?;
        let latitude = map.get("latitude").and_then(NativeValue::as_f64)?;
        Some(Self {
            latitude,
            longitude,
        })
    }
}

impl From<GeoPoint> for NativeValue {
    fn from(point: GeoPoint) -> Self {
        point.to_native()
    }
}
