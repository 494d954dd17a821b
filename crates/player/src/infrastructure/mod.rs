//! Infrastructure layer - adapters for the store, the push socket and the
//! local session cache.

pub mod cache;
pub mod http_client;
pub mod websocket;

pub use cache::{CacheUpdate, SessionCache};
pub use http_client::{HttpStore, DEFAULT_API_URL};
pub use websocket::{ConnectionManager, ConnectionState, TungsteniteTransport};
