//! Service configuration loaded from a JSON config file.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://jade-puppy-e1cab9.netlify.app",
    "http://localhost:5173",
];

/// Gemini API key. Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// On-disk shape of the config file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    server_port: String,
    #[serde(default)]
    gemini_api_key: String,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    allowed_origins: Option<Vec<String>>,
    max_body_bytes: Option<usize>,
    max_concurrent_requests: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub gemini_api_key: ApiKey,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub max_concurrent_requests: Option<usize>,
}

impl Config {
    /// Load the config file, then apply the `PORT` environment override.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "cannot open config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let port_override = std::env::var("PORT").ok();
        Self::from_json(&contents, port_override.as_deref())
    }

    /// Parse and validate config JSON. `port_override` wins over
    /// `server_port` when present and non-empty.
    pub fn from_json(contents: &str, port_override: Option<&str>) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(contents)
            .map_err(|e| Error::Config(format!("cannot decode config file: {}", e)))?;

        let port = match port_override.map(str::trim).filter(|p| !p.is_empty()) {
            Some(port) => {
                tracing::info!("Using port {} from PORT environment variable", port);
                port.to_string()
            }
            None => raw.server_port.trim().to_string(),
        };
        if port.is_empty() {
            return Err(Error::Config(
                "server_port must be specified in config".to_string(),
            ));
        }
        let server_port = parse_port(&port)?;

        let gemini_api_key = ApiKey::new(raw.gemini_api_key.trim());
        if gemini_api_key.is_empty() {
            return Err(Error::Config(
                "gemini_api_key must be specified in config".to_string(),
            ));
        }

        let gemini_model = raw
            .gemini_model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let gemini_base_url = raw
            .gemini_base_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        let allowed_origins = raw.allowed_origins.unwrap_or_else(|| {
            DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect()
        });

        if raw.max_concurrent_requests == Some(0) {
            return Err(Error::Config(
                "max_concurrent_requests must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            server_port,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            allowed_origins,
            max_body_bytes: raw.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
            max_concurrent_requests: raw.max_concurrent_requests,
        })
    }
}

fn parse_port(port: &str) -> Result<u16> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(Error::Config(format!(
            "server_port '{}' is not a valid TCP port",
            port
        ))),
        Ok(p) => Ok(p),
    }
}
