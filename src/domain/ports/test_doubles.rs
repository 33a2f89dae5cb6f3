//! In-memory port implementations for unit tests.

use super::{ExtractionError, GeocodeError, GeocodingProvider, LocationExtractor};
use crate::domain::entities::{ExtractedLocation, GeocodeMatch, Query};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Extractor answering from a fixed table; unknown queries yield nothing.
pub struct MockExtractor {
    answers: HashMap<String, Result<Option<String>, ExtractionError>>,
    calls: AtomicUsize,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_answer(mut self, query: &str, raw: &str) -> Self {
        self.answers
            .insert(query.to_string(), Ok(Some(raw.to_string())));
        self
    }

    pub fn with_error(mut self, query: &str, err: ExtractionError) -> Self {
        self.answers.insert(query.to_string(), Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationExtractor for MockExtractor {
    async fn extract(&self, query: &Query) -> Result<ExtractedLocation, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.answers.get(query.as_str()) {
            Some(Ok(raw)) => Ok(ExtractedLocation::from_model_output(raw.as_deref())),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(ExtractedLocation::empty()),
        }
    }
}

/// Geocoder answering from a fixed table; unknown places have no match.
pub struct MockGeocoder {
    places: HashMap<String, Result<Vec<GeocodeMatch>, GeocodeError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    started: Mutex<Vec<Instant>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            places: HashMap::new(),
            delay: None,
            calls: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn with_place(mut self, place: &str, latitude: f64, longitude: f64) -> Self {
        self.places.insert(
            place.to_string(),
            Ok(vec![GeocodeMatch::new(latitude, longitude)]),
        );
        self
    }

    pub fn with_matches(mut self, place: &str, matches: Vec<GeocodeMatch>) -> Self {
        self.places.insert(place.to_string(), Ok(matches));
        self
    }

    pub fn with_error(mut self, place: &str, err: GeocodeError) -> Self {
        self.places.insert(place.to_string(), Err(err));
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Instants at which each call started.
    pub fn started(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeocodingProvider for MockGeocoder {
    async fn geocode(&self, place: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().push(Instant::now());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.places.get(place).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
