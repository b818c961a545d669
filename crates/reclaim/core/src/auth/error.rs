use crate::error::{ErrorSeverity, ReclaimError};
use crate::pricing::CostEntry;
use crate::state::EntityId;

/// Why the authorization chain refused a removal.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DenyReason {
    #[error("nothing to remove")]
    NoTarget,

    #[error("{0} is already destroyed")]
    Destroyed(EntityId),

    #[error("target is {distance:.1}m away (max {max:.1}m)")]
    OutOfRange { distance: f32, max: f32 },

    #[error("'{0}' cannot be removed")]
    NotRemovable(String),

    #[error("{0}")]
    Vetoed(String),

    #[error("target is at {health:.0}% health (needs {threshold:.0}%)")]
    TooDamaged { health: f32, threshold: f32 },

    #[error("removal blocked by a recent raid for {remaining_secs}s")]
    RaidBlocked { remaining_secs: u64 },

    #[error("target is {age:.0}s old (max {max_age:.0}s)")]
    TooOld { age: f64, max_age: f64 },

    #[error("target age is unknown")]
    UnknownAge,

    #[error("container is not empty")]
    ContainerNotEmpty,

    #[error("cannot afford removal")]
    CannotAfford { missing: Vec<CostEntry> },

    #[error("target belongs to someone else")]
    NotOwner,

    #[error("no building privilege over the target's structure")]
    NoStructurePrivilege,

    #[error("cannot open lock on {0}")]
    LockedOut(EntityId),

    #[error("something is hidden under the target")]
    Concealed,
}

impl ReclaimError for DenyReason {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoTarget | Self::Destroyed(_) | Self::OutOfRange { .. } => {
                ErrorSeverity::Validation
            }
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoTarget => "AUTH_NO_TARGET",
            Self::Destroyed(_) => "AUTH_DESTROYED",
            Self::OutOfRange { .. } => "AUTH_OUT_OF_RANGE",
            Self::NotRemovable(_) => "AUTH_NOT_REMOVABLE",
            Self::Vetoed(_) => "AUTH_VETOED",
            Self::TooDamaged { .. } => "AUTH_TOO_DAMAGED",
            Self::RaidBlocked { .. } => "AUTH_RAID_BLOCKED",
            Self::TooOld { .. } => "AUTH_TOO_OLD",
            Self::UnknownAge => "AUTH_UNKNOWN_AGE",
            Self::ContainerNotEmpty => "AUTH_CONTAINER_NOT_EMPTY",
            Self::CannotAfford { .. } => "AUTH_CANNOT_AFFORD",
            Self::NotOwner => "AUTH_NOT_OWNER",
            Self::NoStructurePrivilege => "AUTH_NO_STRUCTURE_PRIVILEGE",
            Self::LockedOut(_) => "AUTH_LOCKED_OUT",
            Self::Concealed => "AUTH_CONCEALED",
        }
    }
}
