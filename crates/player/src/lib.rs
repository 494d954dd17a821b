//! Vade Mecum player client.
//!
//! Session connection management, the push-fed session cache, and the HTTP
//! store adapter. The character facade and stat computation live in
//! `vademecum-domain`.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;

pub use application::{CharacterService, ServiceError, SessionService};
pub use config::PlayerConfig;
