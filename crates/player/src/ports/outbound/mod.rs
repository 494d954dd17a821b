//! Outbound ports - Interfaces for external services
//!
//! Application services talk to the record store and the push socket only
//! through these traits; infrastructure provides the adapters.

pub mod push_transport;
pub mod store_port;

pub use push_transport::{ConnectionError, PushLink, PushTransport};
pub use store_port::{StoreError, StorePort};

#[cfg(test)]
pub use store_port::MockStorePort;
