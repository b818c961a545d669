use reclaim_core::{CostEntry, DenyReason, SweepKind};

/// Host-facing result of a removal or sweep command.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    /// The entity was removed; the session has uses left.
    Success,
    /// A batch sweep was scheduled and will advance on later ticks.
    SweepStarted(SweepKind),
    /// The removal succeeded and used up the session's last charge.
    LimitReached,
    AlreadyRunning(SweepKind),
    NotAuthorized(DenyReason),
    InsufficientFunds(Vec<CostEntry>),
    /// Trigger arrived inside the session's repeat interval.
    Throttled { wait: f64 },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::SweepStarted(_) | Self::LimitReached
        )
    }
}
