//! Host-loop driver for the reclamation rules.
//!
//! This crate wires `reclaim-core` into something a server loop can embed:
//! [`Runtime`] owns the world, the engine, live sessions and in-flight sweeps,
//! turns host input into commands, and publishes what happened on a
//! topic-based [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream hosts interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`oracle`] bundles the collaborators lent to the engine on each command
pub mod api;
pub mod events;
pub mod oracle;
pub mod runtime;

mod scheduler;

pub use api::{CommandOutcome, Result, RuntimeError};
pub use events::{Event, EventBus, RaidEvent, RemovalEvent, SessionEvent, SweepEvent, Topic};
pub use oracle::OracleManager;
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
