//! Oracle access errors.

use crate::error::{ErrorSeverity, ReclaimError};

/// Errors raised when a required collaborator was not wired into the env.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("TargetOracle not available")]
    TargetNotAvailable,

    #[error("ItemOracle not available")]
    ItemsNotAvailable,

    #[error("ConstructionOracle not available")]
    ConstructionNotAvailable,

    /// Item definition was not found by short name.
    #[error("item definition '{0}' not found")]
    ItemNotFound(String),
}

impl ReclaimError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            TargetNotAvailable | ItemsNotAvailable | ConstructionNotAvailable => {
                ErrorSeverity::Fatal
            }
            ItemNotFound(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            TargetNotAvailable => "ORACLE_TARGET_NOT_AVAILABLE",
            ItemsNotAvailable => "ORACLE_ITEMS_NOT_AVAILABLE",
            ConstructionNotAvailable => "ORACLE_CONSTRUCTION_NOT_AVAILABLE",
            ItemNotFound(_) => "ORACLE_ITEM_NOT_FOUND",
        }
    }
}
