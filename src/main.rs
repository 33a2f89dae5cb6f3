//! placefinder - Location resolution backend for the map UI
//!
//! This is the composition root that wires together all the components.

use placefinder::adapters::inbound::ApiServer;
use placefinder::adapters::outbound::{NominatimGeocoder, OpenAiLocationExtractor};
use placefinder::application::{GeocodeClient, ResolutionService};
use placefinder::config::{load_config, GeocoderProvider};
use placefinder::domain::ports::GeocodingProvider;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting placefinder listen={} geocoder={} model={}",
        cfg.listen_addr,
        cfg.geocoder_provider,
        cfg.llm_model
    );

    // ===== COMPOSITION ROOT =====

    // 1. Create outbound adapters

    // Geocoding provider
    let provider: Arc<dyn GeocodingProvider> = match cfg.geocoder_provider {
        GeocoderProvider::OpenStreetMap => {
            Arc::new(NominatimGeocoder::new(&cfg.geocoder_url, &cfg.user_agent)?)
        }
    };

    // Language model
    if cfg.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, language model requests are sent unauthenticated");
    }
    let extractor = Arc::new(OpenAiLocationExtractor::new(
        cfg.openai_base_url.clone(),
        cfg.openai_api_key.clone(),
        cfg.llm_model.clone(),
        cfg.llm_timeout(),
    )?);

    // 2. Create application services. One geocode client for the whole
    // process so both routes draw from the same rate limit.
    let geocoder = Arc::new(GeocodeClient::new(
        provider,
        cfg.geocoder_min_delay(),
        cfg.geocoder_timeout(),
    ));
    tracing::info!(
        "geocoder rate limit: one request every {:?}, timeout {:?}",
        geocoder.min_delay(),
        geocoder.timeout()
    );

    let resolver = Arc::new(ResolutionService::new(extractor, geocoder));

    // 3. Create inbound adapter and run
    let server = ApiServer::new(cfg.listen_addr, resolver);

    server.run().await
}
