//! Infrastructure - the in-memory record store and system adapters.

pub mod clock;
pub mod memory;
pub mod ports;

pub use clock::SystemClock;
pub use memory::MemoryStore;
