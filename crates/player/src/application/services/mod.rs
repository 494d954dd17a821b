//! Application services
//!
//! Services depend on port traits, not concrete infrastructure
//! implementations.

pub mod character_service;
pub mod session_service;

pub use character_service::CharacterService;
pub use session_service::SessionService;
