//! Vade Mecum engine library.
//!
//! Reference record store and push server for Vade Mecum sessions.
//!
//! ## Structure
//!
//! - `app` - use cases over the store, with push fan-out
//! - `infrastructure/` - in-memory store and system adapters
//! - `api/` - HTTP and WebSocket entry points
//! - `config` - environment configuration

pub mod api;
pub mod app;
pub mod config;
pub mod infrastructure;

pub use app::App;
