//! Domain Entities - Core business objects
//!
//! These entities carry a request from raw user text to a resolved point.
//! They have no external dependencies and contain only business logic.

use crate::domain::value_objects::GeoPoint;
use std::fmt;

/// Raw text typed or spoken by the user.
///
/// Never empty: surrounding whitespace is trimmed and blank input is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
}

impl Query {
    /// Returns `None` for empty or whitespace-only text.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            text: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// The phrase a language model identified as the location reference.
///
/// An empty phrase means extraction ran and found nothing, which is
/// different from extraction never being attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLocation {
    phrase: String,
}

impl ExtractedLocation {
    /// Normalize untrusted model output into a phrase.
    ///
    /// Trims whitespace and strips a single pair of wrapping quotes.
    pub fn from_model_output(raw: Option<&str>) -> Self {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        let unquoted = strip_wrapping_quotes(trimmed).trim();
        Self {
            phrase: unquoted.to_string(),
        }
    }

    /// Extraction ran but produced nothing usable.
    pub fn empty() -> Self {
        Self {
            phrase: String::new(),
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn is_empty(&self) -> bool {
        self.phrase.is_empty()
    }
}

fn strip_wrapping_quotes(s: &str) -> &str {
    for (open, close) in [('"', '"'), ('\'', '\''), ('`', '`'), ('“', '”')] {
        if s.len() >= open.len_utf8() + close.len_utf8() && s.starts_with(open) && s.ends_with(close)
        {
            return &s[open.len_utf8()..s.len() - close.len_utf8()];
        }
    }
    s
}

/// One candidate returned by a geocoding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub latitude: f64,
    pub longitude: f64,
    /// Provider's formatted address, kept for logging only
    pub display_name: Option<String>,
}

impl GeocodeMatch {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Why the geocoding provider could not answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// The provider did not answer in time
    Timeout,
    /// Network failure, bad status or malformed body
    Service,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving a query. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult {
    /// The phrase resolved to a point
    Success(GeoPoint),
    /// The provider had no match for the phrase
    NotFound,
    /// No location phrase could be identified
    ExtractionFailed,
    /// The provider failed while looking up `location_text`
    ProviderError {
        kind: ProviderErrorKind,
        location_text: String,
    },
}

impl ResolutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::NotFound => "not_found",
            Self::ExtractionFailed => "extraction_failed",
            Self::ProviderError { kind, .. } => match kind {
                ProviderErrorKind::Timeout => "provider_timeout",
                ProviderErrorKind::Service => "provider_service",
            },
        }
    }

    /// Chat sidebar message for this outcome.
    pub fn narration(&self) -> String {
        match self {
            Self::Success(point) => {
                format!("I've found {} and marked it on the map.", point.title())
            }
            Self::ExtractionFailed => {
                "I couldn't identify a location in that message.".to_string()
            }
            Self::NotFound => "I couldn't find a match for that place.".to_string(),
            Self::ProviderError { .. } => {
                "The map service is unavailable right now, please try again.".to_string()
            }
        }
    }
}
