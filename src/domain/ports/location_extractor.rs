//! Location Extractor Port
//!
//! Defines the interface for pulling a location phrase out of free text.

use crate::domain::entities::{ExtractedLocation, Query};
use async_trait::async_trait;

/// Failure talking to the extraction service.
///
/// An empty answer is not an error: it comes back as an empty
/// [`ExtractedLocation`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("language model request timed out")]
    Timeout,
    #[error("language model service error: {0}")]
    Service(String),
    #[error("invalid language model response: {0}")]
    InvalidResponse(String),
}

/// Extractor for the location named in a user utterance.
///
/// This is an outbound port that abstracts the language model.
/// Implementations may use OpenAI, a local model, or a fixed table in tests.
#[async_trait]
pub trait LocationExtractor: Send + Sync {
    /// Identify the location mentioned in `query`.
    ///
    /// Makes at most one outbound call and never retries.
    async fn extract(&self, query: &Query) -> Result<ExtractedLocation, ExtractionError>;
}
