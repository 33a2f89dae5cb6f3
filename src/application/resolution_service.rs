//! Resolution Service - Main application use case
//!
//! Turns free-form user text into a point on the map: extract the location
//! phrase, then geocode it. This is the single seam the inbound adapter
//! depends on.

use crate::application::GeocodeClient;
use crate::domain::entities::{Query, ResolutionResult};
use crate::domain::ports::LocationExtractor;
use std::sync::Arc;

/// Resolution pipeline - extractor then geocoder.
///
/// States: Received → Extracting → ExtractionFailed, or
/// Extracting → Geocoding → Success / NotFound / ProviderError.
pub struct ResolutionService {
    extractor: Arc<dyn LocationExtractor>,
    geocoder: Arc<GeocodeClient>,
}

impl ResolutionService {
    /// Create a new resolution service.
    ///
    /// `geocoder` should be the process-wide client so its rate limit also
    /// covers direct lookups.
    pub fn new(extractor: Arc<dyn LocationExtractor>, geocoder: Arc<GeocodeClient>) -> Self {
        Self {
            extractor,
            geocoder,
        }
    }

    pub fn geocoder(&self) -> &Arc<GeocodeClient> {
        &self.geocoder
    }

    /// Resolve raw user text to exactly one outcome.
    ///
    /// Blank text, a failed extractor call and an empty extraction all
    /// short-circuit to `ExtractionFailed` without touching the geocoder.
    pub async fn resolve(&self, text: &str) -> ResolutionResult {
        let Some(query) = Query::new(text) else {
            tracing::debug!("blank query, skipping extraction");
            return ResolutionResult::ExtractionFailed;
        };

        let location = match self.extractor.extract(&query).await {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!("extraction failed for '{}': {}", query.as_str(), e);
                return ResolutionResult::ExtractionFailed;
            }
        };
        if location.is_empty() {
            tracing::info!("no location found in query '{}'", query.as_str());
            return ResolutionResult::ExtractionFailed;
        }

        tracing::info!("extracted location: {}", location.phrase());

        let result = self.geocoder.lookup(location.phrase()).await;
        tracing::debug!("resolved '{}' -> {}", query.as_str(), result.label());

        result
    }
}
