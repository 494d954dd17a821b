//! Player configuration from the environment

use std::time::Duration;

use thiserror::Error;
use url::Url;

use vademecum_domain::{DomainError, SessionId, UserId};

use crate::infrastructure::http_client::DEFAULT_API_URL;
use crate::infrastructure::websocket::DEFAULT_HEARTBEAT_INTERVAL;

/// Default push endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:3000/ws";

pub const WS_URL_VAR: &str = "VADEMECUM_WS_URL";
pub const API_URL_VAR: &str = "VADEMECUM_API_URL";
pub const USER_ID_VAR: &str = "VADEMECUM_USER_ID";
pub const SESSION_ID_VAR: &str = "VADEMECUM_SESSION_ID";
pub const HEARTBEAT_SECS_VAR: &str = "VADEMECUM_HEARTBEAT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} is not a valid id: {source}")]
    InvalidId {
        var: &'static str,
        #[source]
        source: DomainError,
    },
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub ws_url: Url,
    pub api_url: String,
    pub user_id: UserId,
    /// Session to join; a new one is created when unset
    pub session_id: Option<SessionId>,
    pub heartbeat_interval: Duration,
}

impl PlayerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let ws_url_raw = var(WS_URL_VAR).unwrap_or_else(|| DEFAULT_WS_URL.to_string());
        let ws_url = Url::parse(&ws_url_raw).map_err(|source| ConfigError::InvalidUrl {
            var: WS_URL_VAR,
            source,
        })?;

        let api_url = var(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&api_url).map_err(|source| ConfigError::InvalidUrl {
            var: API_URL_VAR,
            source,
        })?;

        let user_id = var(USER_ID_VAR)
            .ok_or(ConfigError::Missing(USER_ID_VAR))?
            .parse()
            .map_err(|source| ConfigError::InvalidId {
                var: USER_ID_VAR,
                source,
            })?;

        let session_id = var(SESSION_ID_VAR)
            .map(|raw| raw.parse())
            .transpose()
            .map_err(|source| ConfigError::InvalidId {
                var: SESSION_ID_VAR,
                source,
            })?;

        let heartbeat_interval = match var(HEARTBEAT_SECS_VAR) {
            None => DEFAULT_HEARTBEAT_INTERVAL,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidSeconds {
                        var: HEARTBEAT_SECS_VAR,
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            ws_url,
            api_url,
            user_id,
            session_id,
            heartbeat_interval,
        })
    }
}
