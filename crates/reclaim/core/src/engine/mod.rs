//! Removal pipeline.
//!
//! [`ReclaimEngine`] is the single owner of the rule configuration, the raid
//! blocker and the sweep locks. It is built explicitly by the host and passed
//! by reference; every removal flows through
//! authorize → pay → delete → refund, and nothing is mutated unless every
//! earlier stage succeeded.

mod errors;

pub use errors::RemovalError;

use crate::auth::{AuthContext, DenyReason, authorize};
use crate::config::ReclaimConfig;
use crate::env::ReclaimEnv;
use crate::pricing::{
    CostEntry, PaymentError, RefundOutcome, RefundPlan, RemovalQuote, collect, plan_refund,
    resolve_quote,
};
use crate::raid::{RaidBlockRecord, RaidBlocker};
use crate::session::{
    DisableReason, Session, SessionError, SessionParams, SessionState, SessionTable,
};
use crate::state::{ActorId, EntityId, Timestamp, WorldState};
use crate::sweep::{
    Sweep, SweepError, SweepFilter, SweepKind, SweepLocks, SweepRequest, SweepStatus,
};

/// What a completed single removal did.
#[derive(Clone, Debug, PartialEq)]
pub struct RemovalReceipt {
    pub entity: EntityId,
    pub display_name: String,
    pub charged: Vec<CostEntry>,
    pub refund: RefundOutcome,
    /// Container stacks spilled on the ground with the entity.
    pub spilled: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RemovalOutcome {
    Removed(RemovalReceipt),
    NotAuthorized(DenyReason),
    InsufficientFunds(Vec<CostEntry>),
}

/// Result of a session trigger.
#[derive(Clone, Debug, PartialEq)]
pub enum TriggerOutcome {
    /// One entity removed; `ended` is set when this use exhausted the session.
    Removed {
        receipt: RemovalReceipt,
        ended: Option<DisableReason>,
    },
    /// A batch-mode trigger started a sweep the caller must drive.
    SweepStarted {
        sweep: Box<Sweep>,
        ended: Option<DisableReason>,
    },
    NotAuthorized(DenyReason),
    InsufficientFunds(Vec<CostEntry>),
    AlreadyRunning(SweepKind),
    /// Trigger arrived before the session's interval elapsed.
    Throttled { wait: f64 },
}

pub struct ReclaimEngine {
    config: ReclaimConfig,
    raid: RaidBlocker,
    locks: SweepLocks,
}

impl ReclaimEngine {
    pub fn new(config: ReclaimConfig) -> Self {
        Self {
            raid: RaidBlocker::new(config.raid_block.clone()),
            config,
            locks: SweepLocks::new(),
        }
    }

    pub fn config(&self) -> &ReclaimConfig {
        &self.config
    }

    pub fn raid(&self) -> &RaidBlocker {
        &self.raid
    }

    pub fn locks(&self) -> &SweepLocks {
        &self.locks
    }

    // ===== sessions =====

    /// Activates a session for `actor`.
    ///
    /// # Errors
    ///
    /// See [`SessionTable::activate`]; unknown actors are unavailable.
    pub fn activate(
        &self,
        world: &WorldState,
        sessions: &mut SessionTable,
        actor: ActorId,
        params: SessionParams,
        now: Timestamp,
    ) -> Result<Option<Session>, SessionError> {
        let actor = world
            .actor(actor)
            .ok_or(SessionError::ActorUnavailable(actor))?;
        sessions.activate(actor, params, &self.config.session, now)
    }

    pub fn tick_sessions(
        &self,
        world: &WorldState,
        sessions: &mut SessionTable,
        env: &ReclaimEnv<'_>,
        dt: f64,
        now: Timestamp,
    ) -> Vec<Session> {
        sessions.tick(world, env, &self.config.session, dt, now)
    }

    /// Handles a trigger input from `actor`'s session.
    ///
    /// `target` overrides the target the session acquired on its last tick.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoSession`] without a live session, plus everything
    /// [`Self::attempt_removal`] can fail with.
    pub fn trigger(
        &mut self,
        world: &mut WorldState,
        sessions: &mut SessionTable,
        actor: ActorId,
        target: Option<EntityId>,
        now: Timestamp,
        env: &ReclaimEnv<'_>,
    ) -> Result<TriggerOutcome, RemovalError> {
        let session = sessions
            .get_mut(actor)
            .filter(|session| session.is_active())
            .ok_or(SessionError::NoSession(actor))?;
        if let Err(throttled) = session.try_trigger(now) {
            return Ok(TriggerOutcome::Throttled {
                wait: throttled.wait,
            });
        }
        let params = session.params.clone();
        let target = target.or(session.target());

        let outcome = match params.mode.sweep_kind() {
            Some(kind) => self.trigger_sweep(world, actor, target, kind, &params, now, env)?,
            None => match self.attempt_removal(world, actor, target, &params, now, env)? {
                RemovalOutcome::Removed(receipt) => TriggerOutcome::Removed {
                    receipt,
                    ended: None,
                },
                RemovalOutcome::NotAuthorized(reason) => TriggerOutcome::NotAuthorized(reason),
                RemovalOutcome::InsufficientFunds(missing) => {
                    TriggerOutcome::InsufficientFunds(missing)
                }
            },
        };

        Ok(match outcome {
            TriggerOutcome::Removed { receipt, .. } => TriggerOutcome::Removed {
                receipt,
                ended: count_use(sessions, actor, now),
            },
            TriggerOutcome::SweepStarted { sweep, .. } => TriggerOutcome::SweepStarted {
                sweep,
                ended: count_use(sessions, actor, now),
            },
            other => other,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn trigger_sweep(
        &mut self,
        world: &WorldState,
        actor: ActorId,
        target: Option<EntityId>,
        kind: SweepKind,
        params: &SessionParams,
        now: Timestamp,
        env: &ReclaimEnv<'_>,
    ) -> Result<TriggerOutcome, RemovalError> {
        let requester = world.actor(actor).ok_or(RemovalError::ActorNotFound(actor))?;
        let Some(seed) = target.and_then(|id| world.entity(id)) else {
            return Ok(TriggerOutcome::NotAuthorized(DenyReason::NoTarget));
        };

        let quote = RemovalQuote::default();
        let ctx = AuthContext {
            world,
            actor: requester,
            entity: seed,
            mode: params.mode,
            pay: false,
            quote: &quote,
            config: &self.config,
            raid: &self.raid,
            env: *env,
            now,
        };
        if let Err(reason) = authorize(&ctx) {
            return Ok(TriggerOutcome::NotAuthorized(reason));
        }

        let request = match kind {
            SweepKind::WholeArea => SweepRequest::WholeArea {
                origin: seed.position,
                filter: SweepFilter::any(),
            },
            SweepKind::ExternalSurface => SweepRequest::ExternalSurface { seed: seed.id },
            SweepKind::ConnectedStructure => SweepRequest::ConnectedStructure { seed: seed.id },
        };
        match self.start_sweep(world, request, actor) {
            Ok(sweep) => Ok(TriggerOutcome::SweepStarted {
                sweep: Box::new(sweep),
                ended: None,
            }),
            Err(SweepError::AlreadyRunning(kind)) => Ok(TriggerOutcome::AlreadyRunning(kind)),
            Err(SweepError::SeedNotFound(_)) => {
                Ok(TriggerOutcome::NotAuthorized(DenyReason::NoTarget))
            }
        }
    }

    // ===== single removal =====

    /// Removes `target` on behalf of `actor`, atomically.
    ///
    /// Denials and shortfalls come back as outcomes with the world untouched.
    ///
    /// # Errors
    ///
    /// - [`RemovalError::ActorNotFound`] for unknown actors.
    /// - [`RemovalError::Pricing`] when the quote or the refund cannot be
    ///   resolved; nothing changes.
    /// - [`RemovalError::Payment`] when a withdrawal fails mid-commit; the
    ///   charge is rolled back and the entity restored.
    pub fn attempt_removal(
        &self,
        world: &mut WorldState,
        actor: ActorId,
        target: Option<EntityId>,
        params: &SessionParams,
        now: Timestamp,
        env: &ReclaimEnv<'_>,
    ) -> Result<RemovalOutcome, RemovalError> {
        let remover = world.actor(actor).ok_or(RemovalError::ActorNotFound(actor))?;
        let Some(entity) = target.and_then(|id| world.entity(id)) else {
            return Ok(RemovalOutcome::NotAuthorized(DenyReason::NoTarget));
        };

        let quote = if params.pay || params.refund {
            resolve_quote(entity, remover, &self.config.pricing, env)?
        } else {
            RemovalQuote {
                display_name: entity.prefab.clone(),
                ..RemovalQuote::default()
            }
        };

        let ctx = AuthContext {
            world,
            actor: remover,
            entity,
            mode: params.mode,
            pay: params.pay,
            quote: &quote,
            config: &self.config,
            raid: &self.raid,
            env: *env,
            now,
        };
        if let Err(reason) = authorize(&ctx) {
            return Ok(match reason {
                DenyReason::CannotAfford { missing } => RemovalOutcome::InsufficientFunds(missing),
                other => RemovalOutcome::NotAuthorized(other),
            });
        }

        let refund = if params.refund {
            plan_refund(entity, &quote.refund, self.config.pricing.stack_size, env)?
        } else {
            RefundPlan::default()
        };
        let entity_id = entity.id;
        let charged = if params.pay { quote.price } else { Vec::new() };

        // Commit: detach the entity first so a failed charge can put it back.
        let mut removed = world
            .destroy(entity_id)
            .ok_or_else(|| RemovalError::target_vanished(actor, entity_id))?;
        let charge = world
            .actor_mut(actor)
            .ok_or(RemovalError::ActorNotFound(actor))
            .and_then(|payer| collect(payer, &charged, env).map_err(RemovalError::from));
        if let Err(err) = charge {
            removed.destroyed = false;
            world.insert_entity(removed);
            return match err {
                RemovalError::Payment(PaymentError::Insufficient { missing }) => {
                    Ok(RemovalOutcome::InsufficientFunds(missing))
                }
                other => Err(other),
            };
        }

        let spilled = removed
            .contents
            .as_mut()
            .map(|contents| contents.drain())
            .unwrap_or_default();
        let spilled_count = spilled.len();
        world.drop_items(removed.position, spilled);

        let recipient = world
            .actor_mut(actor)
            .ok_or(RemovalError::ActorNotFound(actor))?;
        let refund = refund.apply(recipient, env);
        let drop_at = recipient.position;
        world.drop_items(drop_at, refund.overflow.iter().cloned());

        Ok(RemovalOutcome::Removed(RemovalReceipt {
            entity: entity_id,
            display_name: quote.display_name,
            charged,
            refund,
            spilled: spilled_count,
        }))
    }

    // ===== sweeps =====

    /// Starts a sweep outside of any session (operator command).
    ///
    /// # Errors
    ///
    /// See [`Sweep::start`].
    pub fn start_sweep(
        &mut self,
        world: &WorldState,
        request: SweepRequest,
        requester: ActorId,
    ) -> Result<Sweep, SweepError> {
        Sweep::start(request, requester, world, &mut self.locks)
    }

    pub fn step_sweep(&mut self, sweep: &mut Sweep, world: &mut WorldState) -> SweepStatus {
        sweep.step(world, &mut self.locks, &self.config.sweep)
    }

    /// Cancels the running sweep of `kind`; it stops at its next step.
    pub fn cancel_sweep(&mut self, kind: SweepKind) -> bool {
        self.locks.cancel(kind)
    }

    // ===== raid blocking =====

    pub fn record_damage(
        &mut self,
        world: &WorldState,
        attacker: ActorId,
        target: EntityId,
        now: Timestamp,
    ) -> RaidBlockRecord {
        self.raid.on_damage(world, attacker, target, now)
    }

    /// Drops expired raid entries.
    pub fn prune_raid_blocks(&mut self, now: Timestamp) -> usize {
        self.raid.prune(now)
    }
}

/// Counts one successful use; ends the session when it hit its limit.
fn count_use(sessions: &mut SessionTable, actor: ActorId, now: Timestamp) -> Option<DisableReason> {
    let state = sessions.get_mut(actor)?.record_success();
    match state {
        SessionState::Disabled(reason) => {
            sessions.deactivate(actor, reason, now);
            Some(reason)
        }
        SessionState::Active => None,
    }
}
