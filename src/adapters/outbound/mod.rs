mod nominatim_geocoder;
mod openai_location_extractor;

pub use nominatim_geocoder::{NominatimGeocoder, DEFAULT_NOMINATIM_URL};
pub use openai_location_extractor::OpenAiLocationExtractor;
