//! Geocode Client - Rate-limited single-best-match lookup
//!
//! Wraps a geocoding provider behind the shared rate limiter and an explicit
//! deadline, and classifies every provider outcome into a [`ResolutionResult`].

use crate::domain::entities::{GeocodeMatch, ProviderErrorKind, ResolutionResult};
use crate::domain::ports::{GeocodeError, GeocodingProvider};
use crate::domain::value_objects::GeoPoint;
use crate::infrastructure::RateLimiter;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Default minimum spacing between provider calls (Nominatim usage policy).
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);
/// Default provider deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

type ProviderFuture =
    Pin<Box<dyn Future<Output = Result<Vec<GeocodeMatch>, GeocodeError>> + Send>>;
type ProviderCall = Box<dyn Fn(String) -> ProviderFuture + Send + Sync>;

/// Geocoding client shared by every caller of the provider.
///
/// Build one per process and hand out `Arc<GeocodeClient>`: the rate limit
/// only holds across callers that share the same instance.
pub struct GeocodeClient {
    limiter: RateLimiter<ProviderCall>,
    provider_name: &'static str,
    timeout: Duration,
}

impl GeocodeClient {
    /// Create a new geocode client.
    ///
    /// # Arguments
    /// * `provider` - The geocoding backend
    /// * `min_delay` - Minimum time between the starts of two provider calls
    /// * `timeout` - Deadline for a single provider call, not counting the
    ///   rate-limit wait
    pub fn new(provider: Arc<dyn GeocodingProvider>, min_delay: Duration, timeout: Duration) -> Self {
        let provider_name = provider.name();

        let call: ProviderCall = Box::new(move |place: String| -> ProviderFuture {
            let provider = provider.clone();
            Box::pin(async move {
                match tokio::time::timeout(timeout, provider.geocode(&place)).await {
                    Ok(result) => result,
                    Err(_) => Err(GeocodeError::Timeout),
                }
            })
        });

        Self {
            limiter: RateLimiter::new(call, min_delay),
            provider_name,
            timeout,
        }
    }

    /// Create a client with the default delay and timeout.
    pub fn with_defaults(provider: Arc<dyn GeocodingProvider>) -> Self {
        Self::new(provider, DEFAULT_MIN_DELAY, DEFAULT_TIMEOUT)
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    pub fn min_delay(&self) -> Duration {
        self.limiter.min_delay()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look up `phrase` and keep only the best match.
    ///
    /// Returns `Success`, `NotFound` or `ProviderError`; never
    /// `ExtractionFailed`. The point's title is the phrase itself, not the
    /// provider's formatted address.
    pub async fn lookup(&self, phrase: &str) -> ResolutionResult {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return ResolutionResult::NotFound;
        }

        let matches = match self.limiter.call(phrase.to_string()).await {
            Ok(matches) => matches,
            Err(e) => {
                let kind = classify(&e);
                tracing::warn!(
                    "geocoding '{}' via {} failed ({}): {}",
                    phrase,
                    self.provider_name,
                    kind,
                    e
                );
                return ResolutionResult::ProviderError {
                    kind,
                    location_text: phrase.to_string(),
                };
            }
        };

        let Some(best) = matches.into_iter().next() else {
            tracing::debug!("no geocoding match for '{}'", phrase);
            return ResolutionResult::NotFound;
        };

        match GeoPoint::new(best.latitude, best.longitude, phrase) {
            Ok(point) => {
                tracing::debug!(
                    "geocoded '{}' -> {} (provider name: {:?})",
                    phrase,
                    point,
                    best.display_name
                );
                ResolutionResult::Success(point)
            }
            Err(e) => {
                tracing::warn!("provider returned unusable match for '{}': {}", phrase, e);
                ResolutionResult::ProviderError {
                    kind: ProviderErrorKind::Service,
                    location_text: phrase.to_string(),
                }
            }
        }
    }
}

fn classify(err: &GeocodeError) -> ProviderErrorKind {
    if err.is_timeout() {
        ProviderErrorKind::Timeout
    } else {
        ProviderErrorKind::Service
    }
}
