//! Host-loop orchestrator.
//!
//! [`Runtime`] owns the world, the engine, the session table and the sweep
//! scheduler, and is driven by the host: commands arrive as method calls and
//! [`Runtime::tick`] advances sessions, sweeps and raid pruning.

use reclaim_content::ContentBundle;
use reclaim_core::{
    ActorId, AuthorizationVeto, CurrencyOverride, CurrencyProvider, DenyReason, DisableReason,
    EntityId, InfoOverride, Permissions, RaidBlockRecord, ReclaimConfig, ReclaimEngine,
    ReclaimError, RelationOracle, RemovalError, RemovalReceipt, Session, SessionError,
    SessionParams, SessionState, SessionTable, SweepError, SweepKind, SweepRequest, TargetOracle,
    Timestamp, TriggerOutcome, WorldState,
};
use tokio::sync::broadcast;

use crate::api::{CommandOutcome, Result, RuntimeError};
use crate::events::{Event, EventBus, RaidEvent, RemovalEvent, SessionEvent, SweepEvent, Topic};
use crate::oracle::OracleManager;
use crate::scheduler::SweepScheduler;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub reclaim: ReclaimConfig,
    pub event_buffer_size: usize,
    /// Step calls each active sweep receives per tick.
    pub sweep_steps_per_tick: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reclaim: ReclaimConfig::default(),
            event_buffer_size: 100,
            sweep_steps_per_tick: 1,
        }
    }
}

pub struct Runtime {
    config: RuntimeConfig,
    world: WorldState,
    engine: ReclaimEngine,
    sessions: SessionTable,
    scheduler: SweepScheduler,
    oracles: OracleManager,
    events: EventBus,
    clock: Timestamp,
    last_prune: Timestamp,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Direct world access for the host's own simulation (spawns, movement).
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn engine(&self) -> &ReclaimEngine {
        &self.engine
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn oracles(&self) -> &OracleManager {
        &self.oracles
    }

    pub fn now(&self) -> Timestamp {
        self.clock
    }

    pub fn active_sweeps(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_sweep_running(&self, kind: SweepKind) -> bool {
        self.scheduler.kinds().any(|running| running == kind)
    }

    pub fn event_bus(&self) -> EventBus {
        self.events.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    // ===== commands =====

    /// Starts a session for `actor`, replacing any session it already has.
    pub fn activate(&mut self, actor: ActorId, params: SessionParams) -> Result<()> {
        let mode = params.mode;
        let duration = params.duration;
        let replaced = self
            .engine
            .activate(&self.world, &mut self.sessions, actor, params, self.clock)
            .inspect_err(|err| {
                tracing::debug!(
                    target: "runtime::session",
                    actor = %actor,
                    code = err.error_code(),
                    "activation refused: {err}"
                );
            })?;

        if let Some(old) = replaced {
            self.publish_ended(&old);
        }
        tracing::info!(
            target: "runtime::session",
            actor = %actor,
            mode = %mode,
            duration,
            "session activated"
        );
        self.events.publish(Event::Session(SessionEvent::Activated {
            actor,
            mode,
            duration,
        }));
        Ok(())
    }

    /// Ends `actor`'s session on request.
    pub fn deactivate(&mut self, actor: ActorId) -> Result<()> {
        let session = self
            .sessions
            .deactivate(actor, DisableReason::Deactivated, self.clock)
            .ok_or(SessionError::NoSession(actor))?;
        self.publish_ended(&session);
        Ok(())
    }

    /// Handles the trigger input of `actor`'s session.
    ///
    /// `target` overrides the entity the session acquired on its last tick.
    pub fn trigger_removal(
        &mut self,
        actor: ActorId,
        target: Option<EntityId>,
    ) -> Result<CommandOutcome> {
        let max_count = self
            .sessions
            .get(actor)
            .map(|session| session.params.max_count)
            .unwrap_or_default();
        let env = self.oracles.as_env();
        let outcome = match self.engine.trigger(
            &mut self.world,
            &mut self.sessions,
            actor,
            target,
            self.clock,
            &env,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                log_removal_error(actor, &err);
                return Err(err.into());
            }
        };

        Ok(match outcome {
            TriggerOutcome::Removed { receipt, ended } => {
                self.publish_removed(actor, &receipt);
                self.finish_use(actor, ended, max_count, CommandOutcome::Success)
            }
            TriggerOutcome::SweepStarted { sweep, ended } => {
                let kind = sweep.kind();
                self.schedule(*sweep);
                self.finish_use(actor, ended, max_count, CommandOutcome::SweepStarted(kind))
            }
            TriggerOutcome::NotAuthorized(reason) => {
                self.publish_denied(actor, target, &reason);
                CommandOutcome::NotAuthorized(reason)
            }
            TriggerOutcome::InsufficientFunds(missing) => {
                tracing::debug!(
                    target: "runtime::session",
                    actor = %actor,
                    "removal refused: insufficient funds"
                );
                self.events
                    .publish(Event::Removal(RemovalEvent::InsufficientFunds {
                        actor,
                        missing: missing.clone(),
                    }));
                CommandOutcome::InsufficientFunds(missing)
            }
            TriggerOutcome::AlreadyRunning(kind) => {
                self.reject_sweep(actor, kind);
                CommandOutcome::AlreadyRunning(kind)
            }
            TriggerOutcome::Throttled { wait } => {
                tracing::debug!(
                    target: "runtime::session",
                    actor = %actor,
                    wait,
                    "trigger throttled"
                );
                CommandOutcome::Throttled { wait }
            }
        })
    }

    /// Starts a sweep on an operator's behalf, outside of any session.
    pub fn start_sweep(&mut self, actor: ActorId, request: SweepRequest) -> Result<CommandOutcome> {
        let kind = request.kind();
        let requester = self
            .world
            .actor(actor)
            .ok_or(RuntimeError::UnknownActor(actor))?;
        if !requester
            .permissions
            .intersects(sweep_permission(kind) | Permissions::ADMIN)
        {
            return Err(RuntimeError::SweepNotPermitted { actor, kind });
        }

        match self.engine.start_sweep(&self.world, request, actor) {
            Ok(sweep) => {
                self.schedule(sweep);
                Ok(CommandOutcome::SweepStarted(kind))
            }
            Err(SweepError::AlreadyRunning(kind)) => {
                self.reject_sweep(actor, kind);
                Ok(CommandOutcome::AlreadyRunning(kind))
            }
            Err(SweepError::SeedNotFound(seed)) => {
                let reason = DenyReason::NoTarget;
                self.publish_denied(actor, Some(seed), &reason);
                Ok(CommandOutcome::NotAuthorized(reason))
            }
        }
    }

    /// Cancels the running sweep of `kind`; it reports as cancelled on the next tick.
    pub fn cancel_sweep(&mut self, kind: SweepKind) -> bool {
        let cancelled = self.engine.cancel_sweep(kind);
        if cancelled {
            tracing::info!(target: "runtime::sweep", kind = %kind, "sweep cancelled");
        }
        cancelled
    }

    /// Feeds a damage notification to the raid blocker.
    pub fn record_damage(&mut self, attacker: ActorId, target: EntityId) -> RaidBlockRecord {
        let record = self
            .engine
            .record_damage(&self.world, attacker, target, self.clock);
        if !record.is_empty() {
            tracing::debug!(
                target: "runtime::raid",
                attacker = %attacker,
                entity = %target,
                actors = record.actors.len(),
                "raid block recorded"
            );
            self.events.publish(Event::Raid(RaidEvent::Blocked {
                structure: record.structure,
                actors: record.actors.clone(),
            }));
        }
        record
    }

    /// Advances the clock by `dt` seconds.
    ///
    /// Sessions tick first (timeouts, disconnects, target refresh), then every
    /// active sweep takes its steps, then raid entries are pruned when the
    /// configured period has elapsed.
    pub fn tick(&mut self, dt: f64) {
        self.clock = self.clock + dt;
        let now = self.clock;

        let env = self.oracles.as_env();
        let ended = self
            .engine
            .tick_sessions(&self.world, &mut self.sessions, &env, dt, now);
        for session in &ended {
            self.publish_ended(session);
        }

        let finished = self.scheduler.advance(
            &mut self.engine,
            &mut self.world,
            self.config.sweep_steps_per_tick,
        );
        for done in finished {
            tracing::info!(
                target: "runtime::sweep",
                requester = %done.requester,
                kind = %done.kind,
                discovered = done.report.discovered,
                removed = done.report.removed,
                cancelled = done.report.cancelled,
                "sweep finished"
            );
            self.events.publish(Event::Sweep(SweepEvent::completed(
                done.requester,
                done.kind,
                &done.report,
            )));
        }

        let interval = self.config.reclaim.raid_block.prune_interval;
        if interval > 0.0 && now.since(self.last_prune) >= interval {
            self.last_prune = now;
            self.sessions
                .prune_cooldowns(&self.config.reclaim.session, now);
            let removed = self.engine.prune_raid_blocks(now);
            if removed > 0 {
                tracing::debug!(target: "runtime::raid", removed, "pruned raid blocks");
                self.events
                    .publish(Event::Raid(RaidEvent::Pruned { removed }));
            }
        }
    }

    // ===== helpers =====

    fn schedule(&mut self, sweep: reclaim_core::Sweep) {
        let requester = sweep.requester();
        let kind = sweep.kind();
        tracing::info!(
            target: "runtime::sweep",
            requester = %requester,
            kind = %kind,
            "sweep started"
        );
        self.scheduler.schedule(sweep);
        self.events
            .publish(Event::Sweep(SweepEvent::Started { requester, kind }));
    }

    fn reject_sweep(&self, requester: ActorId, kind: SweepKind) {
        tracing::debug!(
            target: "runtime::sweep",
            requester = %requester,
            kind = %kind,
            "sweep already running"
        );
        self.events
            .publish(Event::Sweep(SweepEvent::Rejected { requester, kind }));
    }

    /// Turns a counted success into its outcome, ending the session on its last use.
    fn finish_use(
        &self,
        actor: ActorId,
        ended: Option<DisableReason>,
        max_count: u32,
        success: CommandOutcome,
    ) -> CommandOutcome {
        let Some(reason) = ended else {
            return success;
        };
        tracing::info!(
            target: "runtime::session",
            actor = %actor,
            reason = %reason,
            "session ended"
        );
        self.events.publish(Event::Session(SessionEvent::Ended {
            actor,
            reason,
            removed: max_count,
        }));
        CommandOutcome::LimitReached
    }

    fn publish_ended(&self, session: &Session) {
        let SessionState::Disabled(reason) = session.state() else {
            return;
        };
        tracing::info!(
            target: "runtime::session",
            actor = %session.actor,
            reason = %reason,
            removed = session.removed(),
            "session ended"
        );
        self.events.publish(Event::Session(SessionEvent::Ended {
            actor: session.actor,
            reason,
            removed: session.removed(),
        }));
    }

    fn publish_removed(&self, actor: ActorId, receipt: &RemovalReceipt) {
        tracing::debug!(
            target: "runtime::session",
            actor = %actor,
            entity = %receipt.entity,
            name = %receipt.display_name,
            "entity removed"
        );
        for entry in &receipt.refund.failed {
            tracing::error!(
                target: "runtime::session",
                actor = %actor,
                entity = %receipt.entity,
                currency = %entry.currency,
                amount = entry.amount,
                "refund credit refused"
            );
        }
        self.events.publish(Event::Removal(RemovalEvent::Removed {
            actor,
            entity: receipt.entity,
            display_name: receipt.display_name.clone(),
            charged: receipt.charged.clone(),
            credited: receipt.refund.credited.clone(),
            failed: receipt.refund.failed.clone(),
            overflow: receipt.refund.overflow.len(),
        }));
    }

    fn publish_denied(&self, actor: ActorId, entity: Option<EntityId>, reason: &DenyReason) {
        tracing::debug!(
            target: "runtime::session",
            actor = %actor,
            code = reason.error_code(),
            "removal denied: {reason}"
        );
        self.events.publish(Event::Removal(RemovalEvent::Denied {
            actor,
            entity,
            code: reason.error_code().to_owned(),
            message: reason.to_string(),
        }));
    }
}

fn sweep_permission(kind: SweepKind) -> Permissions {
    match kind {
        SweepKind::WholeArea => Permissions::BATCH_ALL,
        SweepKind::ExternalSurface => Permissions::EXTERNAL,
        SweepKind::ConnectedStructure => Permissions::STRUCTURE,
    }
}

fn log_removal_error(actor: ActorId, err: &RemovalError) {
    match err.severity() {
        reclaim_core::ErrorSeverity::Internal | reclaim_core::ErrorSeverity::Fatal => {
            tracing::error!(
                target: "runtime::session",
                actor = %actor,
                code = err.error_code(),
                context = ?err.context(),
                "removal aborted: {err}"
            );
        }
        _ => {
            tracing::debug!(
                target: "runtime::session",
                actor = %actor,
                code = err.error_code(),
                "removal failed: {err}"
            );
        }
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    world: WorldState,
    oracles: OracleManager,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            world: WorldState::new(),
            oracles: OracleManager::default(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reclaim_config(mut self, config: ReclaimConfig) -> Self {
        self.config.reclaim = config;
        self
    }

    /// Use rules, item definitions and build costs loaded from a content directory.
    pub fn content(mut self, content: ContentBundle) -> Self {
        self.config.reclaim = content.config;
        self.oracles.items = content.items;
        self.oracles.costs = content.costs;
        self
    }

    /// Provide initial world state
    pub fn world(mut self, world: WorldState) -> Self {
        self.world = world;
        self
    }

    /// Replaces the default view-ray targeting.
    pub fn target(mut self, target: impl TargetOracle + 'static) -> Self {
        self.oracles.target = Box::new(target);
        self
    }

    pub fn currency(
        mut self,
        name: impl Into<String>,
        provider: impl CurrencyProvider + 'static,
    ) -> Self {
        self.oracles.currencies.register(name, provider);
        self
    }

    pub fn relations(mut self, relations: impl RelationOracle + 'static) -> Self {
        self.oracles.relations = Some(Box::new(relations));
        self
    }

    pub fn veto(mut self, veto: impl AuthorizationVeto + 'static) -> Self {
        self.oracles.veto = Some(Box::new(veto));
        self
    }

    pub fn info_override(mut self, info: impl InfoOverride + 'static) -> Self {
        self.oracles.info = Some(Box::new(info));
        self
    }

    pub fn currency_override(mut self, hook: impl CurrencyOverride + 'static) -> Self {
        self.oracles.currency_override = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Runtime {
        let events = EventBus::with_capacity(self.config.event_buffer_size);
        Runtime {
            engine: ReclaimEngine::new(self.config.reclaim.clone()),
            config: self.config,
            world: self.world,
            sessions: SessionTable::new(),
            scheduler: SweepScheduler::default(),
            oracles: self.oracles,
            events,
            clock: Timestamp::ZERO,
            last_prune: Timestamp::ZERO,
        }
    }
}
