use crate::adapters::outbound::DEFAULT_NOMINATIM_URL;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported geocoding backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderProvider {
    OpenStreetMap,
}

impl GeocoderProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "openstreetmap",
        }
    }
}

impl FromStr for GeocoderProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openstreetmap" | "osm" | "nominatim" => Ok(Self::OpenStreetMap),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for GeocoderProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown geocoder provider '{0}' (supported: openstreetmap)")]
    UnknownProvider(String),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // HTTP server
    pub listen_addr: String,
    pub debug: bool,

    // Language model
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub llm_model: String,
    pub llm_timeout_ms: u64,

    // Geocoder
    pub geocoder_provider: GeocoderProvider,
    pub geocoder_url: String,
    pub geocoder_timeout_ms: u64,
    pub geocoder_min_delay: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            debug: false,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            llm_timeout_ms: 30_000,
            geocoder_provider: GeocoderProvider::OpenStreetMap,
            geocoder_url: DEFAULT_NOMINATIM_URL.to_string(),
            geocoder_timeout_ms: 10_000,
            geocoder_min_delay: Duration::from_secs(1),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Build the config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let listen_addr = lookup("PLACEFINDER_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

        let debug = lookup("DEBUG").is_some();

        // Language model settings
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());

        let openai_base_url = lookup("OPENAI_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.openai_base_url);

        let llm_model = lookup("PLACEFINDER_LLM_MODEL").unwrap_or(defaults.llm_model);

        let llm_timeout_ms = parse_or(
            &lookup,
            "PLACEFINDER_LLM_TIMEOUT_MS",
            defaults.llm_timeout_ms,
        )?;

        // Geocoder settings
        let geocoder_provider = match lookup("PLACEFINDER_GEOCODER_PROVIDER") {
            Some(v) => v.parse()?,
            None => defaults.geocoder_provider,
        };

        let geocoder_url = lookup("PLACEFINDER_GEOCODER_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.geocoder_url);

        let geocoder_timeout_ms = parse_or(
            &lookup,
            "PLACEFINDER_GEOCODER_TIMEOUT_MS",
            defaults.geocoder_timeout_ms,
        )?;

        let geocoder_min_delay = match lookup("PLACEFINDER_GEOCODER_MIN_DELAY_SECS") {
            Some(value) => parse_secs(&value).ok_or(ConfigError::InvalidValue {
                key: "PLACEFINDER_GEOCODER_MIN_DELAY_SECS",
                value,
            })?,
            None => defaults.geocoder_min_delay,
        };

        let user_agent = lookup("PLACEFINDER_USER_AGENT").unwrap_or(defaults.user_agent);

        Ok(Config {
            listen_addr,
            debug,
            openai_api_key,
            openai_base_url,
            llm_model,
            llm_timeout_ms,
            geocoder_provider,
            geocoder_url,
            geocoder_timeout_ms,
            geocoder_min_delay,
            user_agent,
        })
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_millis(self.geocoder_timeout_ms)
    }

    pub fn geocoder_min_delay(&self) -> Duration {
        self.geocoder_min_delay
    }
}

fn default_user_agent() -> String {
    format!("placefinder/{}", env!("CARGO_PKG_VERSION"))
}

/// Fractional seconds; negative, non-finite and overflowing values are refused.
fn parse_secs(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

/// Load configuration from the environment, reading `.env` first if present.
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(path) = dotenv::dotenv() {
        tracing::debug!("loaded environment from {}", path.display());
    }

    let cfg = Config::from_lookup(|key| std::env::var(key).ok())?;
    Ok(cfg)
}
