//! Error types for the removal pipeline.

use crate::error::{ErrorContext, ErrorSeverity, ReclaimError};
use crate::pricing::{PaymentError, PricingError};
use crate::session::SessionError;
use crate::state::{ActorId, EntityId};

/// Failures that abort a removal attempt.
///
/// Denials and insufficient funds are ordinary outcomes, not errors; see
/// [`super::RemovalOutcome`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RemovalError {
    #[error("actor {0} not found")]
    ActorNotFound(ActorId),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("pricing failed: {0}")]
    Pricing(#[from] PricingError),

    #[error("payment failed: {0}")]
    Payment(#[from] PaymentError),

    /// The target disappeared between authorization and deletion.
    #[error("target {entity} vanished before it could be removed")]
    TargetVanished {
        entity: EntityId,
        context: ErrorContext,
    },
}

impl RemovalError {
    pub fn target_vanished(actor: ActorId, entity: EntityId) -> Self {
        Self::TargetVanished {
            entity,
            context: ErrorContext::new()
                .with_actor(actor)
                .with_entity(entity)
                .with_message("nothing was charged"),
        }
    }
}

impl ReclaimError for RemovalError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ActorNotFound(_) => ErrorSeverity::Validation,
            Self::Session(err) => err.severity(),
            Self::Pricing(err) => err.severity(),
            Self::Payment(err) => err.severity(),
            Self::TargetVanished { .. } => ErrorSeverity::Internal,
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::TargetVanished { context, .. } => Some(context),
            _ => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ActorNotFound(_) => "REMOVAL_ACTOR_NOT_FOUND",
            Self::Session(err) => err.error_code(),
            Self::Pricing(err) => err.error_code(),
            Self::Payment(err) => err.error_code(),
            Self::TargetVanished { .. } => "REMOVAL_TARGET_VANISHED",
        }
    }
}
