use crate::error::{ErrorSeverity, ReclaimError};
use crate::state::ActorId;

use super::SessionMode;

/// Reasons an activation or session command is refused.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("{actor} lacks the permission for {mode} sessions")]
    MissingPermission { actor: ActorId, mode: SessionMode },

    #[error("the tool is globally disabled")]
    OverrideActive,

    #[error("{actor} must wait {remaining_secs}s before activating again")]
    CoolingDown { actor: ActorId, remaining_secs: u64 },

    #[error("{0} is not connected or cannot interact")]
    ActorUnavailable(ActorId),

    #[error("{0} has no active session")]
    NoSession(ActorId),
}

impl ReclaimError for SessionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingPermission { .. } | Self::ActorUnavailable(_) | Self::NoSession(_) => {
                ErrorSeverity::Validation
            }
            Self::OverrideActive | Self::CoolingDown { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingPermission { .. } => "SESSION_MISSING_PERMISSION",
            Self::OverrideActive => "SESSION_OVERRIDE_ACTIVE",
            Self::CoolingDown { .. } => "SESSION_COOLING_DOWN",
            Self::ActorUnavailable(_) => "SESSION_ACTOR_UNAVAILABLE",
            Self::NoSession(_) => "SESSION_NOT_FOUND",
        }
    }
}
