//! Domain Layer
//!
//! Entities, value objects and the ports the application depends on.

pub mod entities;
pub mod ports;
pub mod value_objects;

pub use entities::{ExtractedLocation, GeocodeMatch, ProviderErrorKind, Query, ResolutionResult};
pub use value_objects::{GeoPoint, InvalidCoordinates};
