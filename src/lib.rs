//! placefinder Library
//!
//! This module exposes the placefinder components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{GeocodeClient, ResolutionService};
pub use config::{load_config, Config};
pub use domain::entities::{ExtractedLocation, GeocodeMatch, ProviderErrorKind, Query, ResolutionResult};
pub use domain::ports::{ExtractionError, GeocodeError, GeocodingProvider, LocationExtractor};
pub use domain::value_objects::GeoPoint;
pub use infrastructure::RateLimiter;
