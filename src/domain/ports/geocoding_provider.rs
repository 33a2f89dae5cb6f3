//! Geocoding Provider Port
//!
//! Defines the interface for turning a place name into coordinates.

use crate::domain::entities::GeocodeMatch;
use async_trait::async_trait;

/// Failure talking to the geocoding provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request timed out")]
    Timeout,
    #[error("geocoding service error: {0}")]
    Service(String),
    #[error("invalid geocoding response: {0}")]
    InvalidResponse(String),
}

impl GeocodeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Provider of place-name lookups.
///
/// This is an outbound port that abstracts the third-party geocoder.
/// Candidates come back best first; an empty list means no match.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Look up `place` and return candidate matches, best first.
    async fn geocode(&self, place: &str) -> Result<Vec<GeocodeMatch>, GeocodeError>;

    /// Provider identifier, e.g. `openstreetmap`.
    fn name(&self) -> &'static str;
}
