//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the session table, the removal pipeline and sweep
//! scheduling so hosts can bubble them up with consistent context.
use thiserror::Error;

use reclaim_core::{
    ActorId, ErrorSeverity, ReclaimError, RemovalError, SessionError, SweepKind,
};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Removal(#[from] RemovalError),

    #[error("actor {actor} may not run {kind} sweeps")]
    SweepNotPermitted { actor: ActorId, kind: SweepKind },

    #[error("actor {0} not found")]
    UnknownActor(ActorId),
}

impl RuntimeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Session(err) => err.severity(),
            Self::Removal(err) => err.severity(),
            Self::SweepNotPermitted { .. } => ErrorSeverity::Recoverable,
            Self::UnknownActor(_) => ErrorSeverity::Validation,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Session(err) => err.error_code(),
            Self::Removal(err) => err.error_code(),
            Self::SweepNotPermitted { .. } => "RUNTIME_SWEEP_NOT_PERMITTED",
            Self::UnknownActor(_) => "RUNTIME_UNKNOWN_ACTOR",
        }
    }
}
