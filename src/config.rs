use actix_web::http::header::HeaderName;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub host: String,
    pub port: u16,
    pub actor_header: HeaderName,
    pub allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("SERVER_PORT", "8000");
        let port = port.parse().map_err(|_| ConfigError::InvalidPort {
            key: "SERVER_PORT",
            value: port,
        })?;

        let actor_header = var("ACTOR_HEADER", "x-actor");
        let actor_header = HeaderName::from_bytes(actor_header.as_bytes()).map_err(|_| {
            ConfigError::InvalidHeader {
                key: "ACTOR_HEADER",
                value: actor_header.clone(),
            }
        })?;

        Ok(Config {
            mongodb_uri: var("MONGODB_URI", "mongodb://localhost:27017"),
            mongodb_database: var("MONGODB_DATABASE", "registry"),
            host: var("SERVER_HOST", "127.0.0.1"),
            port,
            actor_header,
            allowed_origin: lookup("ALLOWED_ORIGIN").filter(|origin| !origin.is_empty()),
        })
    }
}
