//! Per-actor tool sessions.
//!
//! A session moves `Active(mode) -> Disabled(reason)`; an actor without an
//! entry in the [`SessionTable`] is inactive. Sessions are advanced once per
//! host frame by [`SessionTable::tick`].
mod error;
mod table;

pub use error::SessionError;
pub use table::SessionTable;

use crate::env::LayerMask;
use crate::state::{ActorId, EntityId, Permissions, Timestamp};
use crate::sweep::SweepKind;

/// Operating mode of a session.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SessionMode {
    Normal,
    Admin,
    BatchAll,
    Structure,
    External,
}

impl SessionMode {
    /// Sweep started by a trigger in this mode, if it is a batch mode.
    pub const fn sweep_kind(self) -> Option<SweepKind> {
        match self {
            Self::BatchAll => Some(SweepKind::WholeArea),
            Self::Structure => Some(SweepKind::ConnectedStructure),
            Self::External => Some(SweepKind::ExternalSurface),
            Self::Normal | Self::Admin => None,
        }
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Operator modes skip ownership, pricing and safety rules.
    pub const fn is_privileged(self) -> bool {
        !matches!(self, Self::Normal)
    }

    /// Layers the target query may hit.
    pub const fn layers(self) -> LayerMask {
        match self {
            Self::External => LayerMask::CONSTRUCTION,
            _ => LayerMask::all(),
        }
    }
}

impl Permissions {
    /// Permission an actor needs to activate `mode`.
    pub const fn for_mode(mode: SessionMode) -> Permissions {
        match mode {
            SessionMode::Normal => Permissions::NORMAL,
            SessionMode::Admin => Permissions::ADMIN,
            SessionMode::BatchAll => Permissions::BATCH_ALL,
            SessionMode::Structure => Permissions::STRUCTURE,
            SessionMode::External => Permissions::EXTERNAL,
        }
    }
}

/// Why a session stopped.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum DisableReason {
    Timeout,
    Disconnected,
    InteractionBlocked,
    Deactivated,
    Replaced,
    LimitReached,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    Active,
    Disabled(DisableReason),
}

/// Activation arguments.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionParams {
    pub mode: SessionMode,
    /// Lifetime in seconds.
    pub duration: f64,
    /// Removals before the session ends; 0 means unlimited.
    pub max_count: u32,
    /// Minimum seconds between two triggers.
    pub interval: f64,
    pub pay: bool,
    pub refund: bool,
    pub reset_on_success: bool,
}

impl SessionParams {
    /// Unlimited session; only normal sessions pay and refund by default.
    pub fn new(mode: SessionMode, duration: f64) -> Self {
        let normal = matches!(mode, SessionMode::Normal);
        Self {
            mode,
            duration,
            max_count: 0,
            interval: 0.0,
            pay: normal,
            refund: normal,
            reset_on_success: false,
        }
    }

    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_payment(mut self, pay: bool, refund: bool) -> Self {
        self.pay = pay;
        self.refund = refund;
        self
    }

    pub fn with_reset_on_success(mut self, reset: bool) -> Self {
        self.reset_on_success = reset;
        self
    }
}

/// Trigger arrived before the session's interval elapsed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Throttled {
    pub wait: f64,
}

/// One actor's live tool session.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub actor: ActorId,
    pub params: SessionParams,
    remaining: f64,
    removed: u32,
    last_trigger: Option<Timestamp>,
    target: Option<EntityId>,
    state: SessionState,
}

impl Session {
    pub fn new(actor: ActorId, params: SessionParams) -> Self {
        Self {
            actor,
            remaining: params.duration,
            params,
            removed: 0,
            last_trigger: None,
            target: None,
            state: SessionState::Active,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.params.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Seconds left before the session times out.
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn removed(&self) -> u32 {
        self.removed
    }

    /// Entity under the actor's view as of the last tick.
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }

    pub fn disable(&mut self, reason: DisableReason) {
        if self.is_active() {
            self.state = SessionState::Disabled(reason);
        }
    }

    /// Advances the countdown by `dt` seconds and checks the actor's state.
    pub fn tick(&mut self, dt: f64, connected: bool, interaction_blocked: bool) -> SessionState {
        if !self.is_active() {
            return self.state;
        }

        self.remaining = (self.remaining - dt).max(0.0);
        if self.remaining <= 0.0 {
            self.disable(DisableReason::Timeout);
        } else if !connected {
            self.disable(DisableReason::Disconnected);
        } else if interaction_blocked {
            self.disable(DisableReason::InteractionBlocked);
        }
        self.state
    }

    /// Accepts a trigger at `now` unless the interval has not elapsed yet.
    pub fn try_trigger(&mut self, now: Timestamp) -> Result<(), Throttled> {
        if let Some(last) = self.last_trigger {
            let elapsed = now.since(last);
            if elapsed < self.params.interval {
                return Err(Throttled {
                    wait: self.params.interval - elapsed,
                });
            }
        }
        self.last_trigger = Some(now);
        Ok(())
    }

    /// Counts a successful removal; returns the new state.
    pub fn record_success(&mut self) -> SessionState {
        self.removed += 1;
        if self.params.reset_on_success {
            self.remaining = self.params.duration;
        }
        if self.params.max_count != 0 && self.removed >= self.params.max_count {
            self.disable(DisableReason::LimitReached);
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_resets_remaining_time() {
        let params = SessionParams::new(SessionMode::Normal, 60.0).with_reset_on_success(true);
        let mut session = Session::new(ActorId(1), params);

        session.tick(50.0, true, false);
        assert_eq!(session.remaining(), 10.0);
        session.record_success();
        assert_eq!(session.remaining(), 60.0);
    }

    #[test]
    fn unlimited_sessions_never_hit_the_limit() {
        let mut session = Session::new(ActorId(1), SessionParams::new(SessionMode::Admin, 60.0));
        for _ in 0..10_000 {
            assert_eq!(session.record_success(), SessionState::Active);
        }
    }

    #[test]
    fn limit_disables_after_max_count() {
        let params = SessionParams::new(SessionMode::Normal, 60.0).with_max_count(2);
        let mut session = Session::new(ActorId(1), params);

        assert_eq!(session.record_success(), SessionState::Active);
        assert_eq!(
            session.record_success(),
            SessionState::Disabled(DisableReason::LimitReached)
        );
    }

    #[test]
    fn tick_reports_timeout_before_disconnect() {
        let mut session = Session::new(ActorId(1), SessionParams::new(SessionMode::Normal, 1.0));
        assert_eq!(
            session.tick(2.0, false, true),
            SessionState::Disabled(DisableReason::Timeout)
        );

        let mut session = Session::new(ActorId(1), SessionParams::new(SessionMode::Normal, 10.0));
        assert_eq!(
            session.tick(1.0, true, true),
            SessionState::Disabled(DisableReason::InteractionBlocked)
        );
    }

    #[test]
    fn triggers_are_rate_limited() {
        let params = SessionParams::new(SessionMode::Normal, 60.0).with_interval(0.5);
        let mut session = Session::new(ActorId(1), params);

        assert!(session.try_trigger(Timestamp::from_secs(1.0)).is_ok());
        let throttled = session.try_trigger(Timestamp::from_secs(1.2)).unwrap_err();
        assert!((throttled.wait - 0.3).abs() < 1e-9);
        assert!(session.try_trigger(Timestamp::from_secs(1.5)).is_ok());
    }

    #[test]
    fn modes_map_to_permissions_and_sweeps() {
        assert_eq!(
            Permissions::for_mode(SessionMode::BatchAll),
            Permissions::BATCH_ALL
        );
        assert_eq!(SessionMode::Structure.sweep_kind(), Some(SweepKind::ConnectedStructure));
        assert_eq!(SessionMode::Normal.sweep_kind(), None);
        assert_eq!("batch_all".parse::<SessionMode>().unwrap(), SessionMode::BatchAll);
    }
}
