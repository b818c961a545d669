//! Pricing and payment errors.

use crate::error::{ErrorSeverity, ReclaimError};
use crate::state::Grade;

use super::CostEntry;

/// Errors raised while resolving a quote.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PricingError {
    /// A percentage grade rule applies but the nominal build cost is unknown.
    #[error("no build cost known for '{prefab}' at grade {grade}")]
    MissingBuildCost { prefab: String, grade: Grade },

    /// A refund entry names neither an item nor a currency anything can credit.
    #[error("refund of '{prefab}' names unknown currency '{currency}'")]
    UnknownRefundCurrency { prefab: String, currency: String },
}

impl ReclaimError for PricingError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingBuildCost { .. } | Self::UnknownRefundCurrency { .. } => {
                ErrorSeverity::Internal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingBuildCost { .. } => "PRICING_MISSING_BUILD_COST",
            Self::UnknownRefundCurrency { .. } => "PRICING_UNKNOWN_REFUND_CURRENCY",
        }
    }
}

/// Errors raised while charging an actor.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PaymentError {
    /// At least one currency of the price set cannot be paid.
    #[error("cannot afford {} currencies", missing.len())]
    Insufficient { missing: Vec<CostEntry> },

    /// A withdrawal failed after the affordability check passed.
    ///
    /// Everything charged before the failure has been returned.
    #[error("withdrawal of '{currency}' failed; payment rolled back")]
    WithdrawFailed { currency: String },
}

impl ReclaimError for PaymentError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Insufficient { .. } => "PAYMENT_INSUFFICIENT",
            Self::WithdrawFailed { .. } => "PAYMENT_WITHDRAW_FAILED",
        }
    }
}
