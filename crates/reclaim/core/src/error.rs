//! Common error infrastructure for reclaim-core.
//!
//! Domain-specific errors (`AuthError`, `PaymentError`, `SessionError`, ...)
//! live next to the components that raise them. They all implement
//! [`ReclaimError`] so callers can classify failures without matching on every
//! variant.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each component has its own error type with specific variants
//! - **Rich Context**: Errors carry the actor / entity they concern
//! - **Severity Classification**: Errors are categorized for recovery strategies

use crate::state::{ActorId, EntityId};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the actor may retry later or with another target
/// - **Validation**: invalid input (missing target, unknown actor)
/// - **Internal**: inconsistent tables or templates, needs investigation
/// - **Fatal**: the host wiring is broken and the engine cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with same or alternative input.
    ///
    /// Examples: raid block active, insufficient funds, sweep already running
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: no target under the crosshair, actor not found
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: item definition missing for a refund, build cost missing
    Internal,

    /// Fatal error - engine cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Actor that triggered the error (if applicable).
    pub actor: Option<ActorId>,

    /// Entity the operation was aimed at (if applicable).
    pub entity: Option<EntityId>,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            actor: None,
            entity: None,
            message: None,
        }
    }

    /// Attaches an actor to this context (builder pattern).
    #[must_use]
    pub const fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attaches an entity to this context (builder pattern).
    #[must_use]
    pub const fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all reclaim-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Include `ErrorContext` in variants that need debugging info
/// - Classify severity based on recoverability, not impact
pub trait ReclaimError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
