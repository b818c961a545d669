//! Topic-based event bus for runtime events.
//!
//! Hosts subscribe to the topics they render (chat notifications, UI
//! refresh, audit logs) and ignore the rest.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{RaidEvent, RemovalEvent, SessionEvent, SweepEvent};
