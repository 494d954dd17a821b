//! Application layer - use cases over the store and push ports

pub mod error;
pub mod services;

pub use error::ServiceError;
pub use services::{CharacterService, SessionService};
