mod geocoding_provider;
mod location_extractor;

pub use geocoding_provider::{GeocodeError, GeocodingProvider};
pub use location_extractor::{ExtractionError, LocationExtractor};

#[cfg(test)]
pub(crate) mod test_doubles;
