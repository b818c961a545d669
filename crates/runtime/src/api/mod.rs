//! Types hosts interact with when driving the runtime.

mod errors;
mod outcome;

pub use errors::{Result, RuntimeError};
pub use outcome::CommandOutcome;
