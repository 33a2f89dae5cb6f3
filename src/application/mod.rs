//! Application Layer
//!
//! Use cases composed from the domain ports.

pub mod geocode_client;
pub mod resolution_service;

pub use geocode_client::GeocodeClient;
pub use resolution_service::ResolutionService;
