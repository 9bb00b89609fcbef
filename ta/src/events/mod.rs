//! Task progress events and the sinks that deliver them

mod hub;
mod types;

pub use hub::{ListenerHub, ListenerId, NotificationSink, NullSink};
pub use types::TaskEvent;
