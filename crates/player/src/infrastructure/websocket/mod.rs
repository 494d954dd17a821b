//! Push connection: lifecycle manager and socket adapter

mod connection_manager;
mod transport;

pub use connection_manager::{
    ConnectionManager, ConnectionState, ConnectionToken, DEFAULT_HEARTBEAT_INTERVAL,
};
pub use transport::TungsteniteTransport;
