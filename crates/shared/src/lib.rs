//! Vade Mecum Protocol - Types shared by the engine and the player
//!
//! - Push-event envelope (`{event, data}`) and client control messages
//! - The `{detail}` failure body
//! - HTTP request bodies
//!
//! Pure data types and serialization; no I/O.

pub mod messages;
pub mod requests;
pub mod responses;

pub use messages::{ClientMessage, EventEnvelope, EventType, ProtocolError, ServerEvent};
pub use requests::{
    CreateRollRequest, CreateSessionRequest, UpdateEncounterRequest, UpdateSessionRequest,
    USER_ID_HEADER,
};
pub use responses::{
    ErrorBody, HealthResponse, INVALID_QUERY_PARAMS_DETAIL, UNAUTHORIZED_DETAIL,
};
