//! Nominatim Geocoder
//!
//! Implements GeocodingProvider using the OpenStreetMap Nominatim search API.

use crate::domain::entities::GeocodeMatch;
use crate::domain::ports::{GeocodeError, GeocodingProvider};
use async_trait::async_trait;
use serde::Deserialize;

/// Public OpenStreetMap instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// OpenStreetMap Nominatim geocoder.
///
/// Asks for a single result; Nominatim orders results by importance, so the
/// first one is the best match. Nominatim's usage policy requires an
/// identifying User-Agent and at most one request per second, which the
/// [`GeocodeClient`](crate::application::GeocodeClient) in front of this
/// adapter enforces.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Create a geocoder against `base_url` identifying as `user_agent`.
    pub fn new(base_url: &str, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch and parse the search results for `place`.
    async fn search(&self, place: &str) -> Result<Vec<NominatimPlace>, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::GATEWAY_TIMEOUT {
            return Err(GeocodeError::Timeout);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("nominatim search failed: {} - {}", status, body);
            return Err(GeocodeError::Service(format!("status {}", status)));
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                GeocodeError::Timeout
            } else {
                GeocodeError::InvalidResponse(e.to_string())
            }
        })
    }
}

/// One entry of Nominatim's `format=json` answer. Coordinates are strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimPlace {
    fn into_match(self) -> Result<GeocodeMatch, GeocodeError> {
        let latitude: f64 = self
            .lat
            .trim()
            .parse()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad latitude '{}'", self.lat)))?;
        let longitude: f64 = self
            .lon
            .trim()
            .parse()
            .map_err(|_| GeocodeError::InvalidResponse(format!("bad longitude '{}'", self.lon)))?;

        let mut m = GeocodeMatch::new(latitude, longitude);
        m.display_name = self.display_name;
        Ok(m)
    }
}

fn map_transport_error(e: reqwest::Error) -> GeocodeError {
    if e.is_timeout() {
        GeocodeError::Timeout
    } else {
        GeocodeError::Service(e.to_string())
    }
}

#[async_trait]
impl GeocodingProvider for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
        let places = self.search(place).await?;
        tracing::debug!("nominatim returned {} result(s) for '{}'", places.len(), place);

        places.into_iter().map(NominatimPlace::into_match).collect()
    }

    fn name(&self) -> &'static str {
        "openstreetmap"
    }
}
