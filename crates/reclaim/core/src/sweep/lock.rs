use std::collections::BTreeMap;

use crate::error::{ErrorSeverity, ReclaimError};
use crate::state::EntityId;

use super::SweepKind;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SweepError {
    #[error("a {0} sweep is already running")]
    AlreadyRunning(SweepKind),

    #[error("sweep seed {0} does not exist")]
    SeedNotFound(EntityId),
}

impl ReclaimError for SweepError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyRunning(_) => ErrorSeverity::Recoverable,
            Self::SeedNotFound(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning(_) => "SWEEP_ALREADY_RUNNING",
            Self::SeedNotFound(_) => "SWEEP_SEED_NOT_FOUND",
        }
    }
}

/// One running-flag per sweep kind, tagged with a generation.
///
/// A sweep holds the generation it acquired; once the lock is cancelled or
/// re-acquired the stale holder sees a mismatch and stops.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepLocks {
    running: BTreeMap<SweepKind, u64>,
    next_generation: u64,
}

impl SweepLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock for `kind`, returning the holder's generation.
    ///
    /// # Errors
    ///
    /// [`SweepError::AlreadyRunning`] while another sweep of `kind` holds it.
    pub fn acquire(&mut self, kind: SweepKind) -> Result<u64, SweepError> {
        if self.running.contains_key(&kind) {
            return Err(SweepError::AlreadyRunning(kind));
        }
        self.next_generation += 1;
        self.running.insert(kind, self.next_generation);
        Ok(self.next_generation)
    }

    /// Releases the lock if `generation` still holds it.
    pub fn release(&mut self, kind: SweepKind, generation: u64) -> bool {
        if self.is_current(kind, generation) {
            self.running.remove(&kind);
            true
        } else {
            false
        }
    }

    /// Clears the lock regardless of holder; the running sweep stops at its next step.
    pub fn cancel(&mut self, kind: SweepKind) -> bool {
        self.running.remove(&kind).is_some()
    }

    pub fn is_current(&self, kind: SweepKind, generation: u64) -> bool {
        self.running.get(&kind) == Some(&generation)
    }

    pub fn is_running(&self, kind: SweepKind) -> bool {
        self.running.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_holder_per_kind() {
        let mut locks = SweepLocks::new();
        let area = locks.acquire(SweepKind::WholeArea).unwrap();
        assert_eq!(
            locks.acquire(SweepKind::WholeArea),
            Err(SweepError::AlreadyRunning(SweepKind::WholeArea))
        );
        assert!(locks.acquire(SweepKind::ConnectedStructure).is_ok());

        assert!(locks.release(SweepKind::WholeArea, area));
        assert!(!locks.is_running(SweepKind::WholeArea));
    }

    #[test]
    fn cancelled_generation_cannot_release_new_holder() {
        let mut locks = SweepLocks::new();
        let stale = locks.acquire(SweepKind::WholeArea).unwrap();
        assert!(locks.cancel(SweepKind::WholeArea));
        let fresh = locks.acquire(SweepKind::WholeArea).unwrap();

        assert!(!locks.release(SweepKind::WholeArea, stale));
        assert!(locks.is_current(SweepKind::WholeArea, fresh));
    }
}
