//! State management with actor pattern
//!
//! StateManager owns the SQLite store and processes messages via channels, so
//! every write (and every daily rollup) is applied one at a time.

mod manager;
mod messages;

pub use manager::StateManager;
pub use messages::{StateCommand, StateError, StateResponse};
