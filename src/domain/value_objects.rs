//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::Deserialize;
use std::fmt;

/// Rejected coordinate pair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinates: latitude={latitude}, longitude={longitude}")]
pub struct InvalidCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A resolved point on the map.
///
/// Latitude is within -90..=90 and longitude within -180..=180, both finite.
/// Every constructor goes through [`GeoPoint::new`] (deserialization
/// included), so a point is never made from a partial provider answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
    /// Label shown to the user (the extracted phrase, not the provider's address)
    display_title: String,
}

impl GeoPoint {
    /// Build a point, validating both coordinates.
    ///
    /// # Examples
    /// ```
    /// use placefinder::domain::GeoPoint;
    ///
    /// let p = GeoPoint::new(43.7, -79.4, "Toronto").unwrap();
    /// assert_eq!(p.title(), "Toronto");
    /// assert!(GeoPoint::new(f64::NAN, 0.0, "nowhere").is_err());
    /// ```
    pub fn new(
        latitude: f64,
        longitude: f64,
        display_title: impl Into<String>,
    ) -> Result<Self, InvalidCoordinates> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
            display_title: display_title.into(),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn title(&self) -> &str {
        &self.display_title
    }

    /// `[latitude, longitude]`, the order map widgets expect.
    pub fn coordinates(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// Unchecked wire shape of a [`GeoPoint`].
#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
    display_title: String,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = InvalidCoordinates;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude, raw.display_title)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.4}, {:.4})",
            self.display_title, self.latitude, self.longitude
        )
    }
}
