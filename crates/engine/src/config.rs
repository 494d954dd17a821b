//! Engine configuration from the environment

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
#[error("Invalid listen address {0}")]
pub struct ConfigError(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated origins, or `*`; CORS is off when unset
    pub cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let port = lookup("SERVER_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            cors_allowed_origins,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cors_allowed_origins, None);
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn port_falls_back_to_port_var() {
        let config = ServerConfig::from_lookup(|name| match name {
            "PORT" => Some("8080".to_string()),
            "CORS_ALLOWED_ORIGINS" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_allowed_origins, None);
    }

    #[test]
    fn unparseable_port_uses_default() {
        let config = ServerConfig::from_lookup(|name| {
            (name == "SERVER_PORT").then(|| "eighty".to_string())
        });
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn bad_host_is_rejected() {
        let config = ServerConfig::from_lookup(|name| {
            (name == "SERVER_HOST").then(|| "not a host".to_string())
        });
        assert!(config.socket_addr().is_err());
    }
}
