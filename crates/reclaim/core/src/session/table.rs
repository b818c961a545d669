use std::collections::BTreeMap;

use crate::config::SessionPolicy;
use crate::env::ReclaimEnv;
use crate::state::{Actor, ActorId, Permissions, Timestamp, WorldState};

use super::{DisableReason, Session, SessionError, SessionParams, SessionState};

/// Live sessions keyed by actor, plus post-session cooldowns.
///
/// Holds at most one session per actor.
#[derive(Clone, Debug, Default)]
pub struct SessionTable {
    sessions: BTreeMap<ActorId, Session>,
    /// When each actor's last session ended.
    ended_at: BTreeMap<ActorId, Timestamp>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for `actor`, replacing any live one.
    ///
    /// Returns the replaced session, already disabled with
    /// [`DisableReason::Replaced`].
    ///
    /// # Errors
    ///
    /// Fails when the actor lacks the mode's permission, the global override
    /// is on, the actor is still cooling down, or cannot interact.
    pub fn activate(
        &mut self,
        actor: &Actor,
        params: SessionParams,
        policy: &SessionPolicy,
        now: Timestamp,
    ) -> Result<Option<Session>, SessionError> {
        let mode = params.mode;
        if !actor.permissions.contains(Permissions::for_mode(mode)) {
            return Err(SessionError::MissingPermission {
                actor: actor.id,
                mode,
            });
        }
        if !actor.can_interact() {
            return Err(SessionError::ActorUnavailable(actor.id));
        }
        if policy.override_enabled
            && !mode.is_admin()
            && !actor
                .permissions
                .intersects(Permissions::OVERRIDE | Permissions::ADMIN)
        {
            return Err(SessionError::OverrideActive);
        }
        if !actor.is_admin() && !self.sessions.contains_key(&actor.id) {
            if let Some(remaining) = self.cooldown_remaining(actor.id, policy, now) {
                return Err(SessionError::CoolingDown {
                    actor: actor.id,
                    remaining_secs: remaining.ceil() as u64,
                });
            }
        }

        let replaced = self
            .sessions
            .insert(actor.id, Session::new(actor.id, params))
            .map(|mut old| {
                old.disable(DisableReason::Replaced);
                old
            });
        Ok(replaced)
    }

    /// Ends `actor`'s session with `reason` and starts its cooldown.
    pub fn deactivate(
        &mut self,
        actor: ActorId,
        reason: DisableReason,
        now: Timestamp,
    ) -> Option<Session> {
        let mut session = self.sessions.remove(&actor)?;
        session.disable(reason);
        self.ended_at.insert(actor, now);
        Some(session)
    }

    pub fn get(&self, actor: ActorId) -> Option<&Session> {
        self.sessions.get(&actor)
    }

    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut Session> {
        self.sessions.get_mut(&actor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Seconds left on `actor`'s cooldown, if any.
    pub fn cooldown_remaining(
        &self,
        actor: ActorId,
        policy: &SessionPolicy,
        now: Timestamp,
    ) -> Option<f64> {
        let ended = self.ended_at.get(&actor)?;
        let remaining = (*ended + policy.cooldown).since(now);
        (remaining > 0.0).then_some(remaining)
    }

    /// Advances every session by `dt` and refreshes its target.
    ///
    /// Sessions that stop during this tick are removed and returned.
    pub fn tick(
        &mut self,
        world: &WorldState,
        env: &ReclaimEnv<'_>,
        policy: &SessionPolicy,
        dt: f64,
        now: Timestamp,
    ) -> Vec<Session> {
        let target = env.target().ok();

        for session in self.sessions.values_mut() {
            let actor = world.actor(session.actor);
            let state = session.tick(
                dt,
                actor.is_some_and(|actor| actor.connected),
                actor.is_some_and(|actor| actor.interaction_blocked),
            );
            if state != SessionState::Active {
                continue;
            }

            let acquired = actor.zip(target).and_then(|(actor, target)| {
                target.acquire_target(
                    world,
                    actor,
                    policy.max_distance(session.mode()),
                    session.mode().layers(),
                )
            });
            session.set_target(acquired);
        }

        self.sweep_disabled(now)
    }

    /// Removes sessions disabled outside of `tick` (e.g. by reaching their limit).
    pub fn sweep_disabled(&mut self, now: Timestamp) -> Vec<Session> {
        let ended: Vec<ActorId> = self
            .sessions
            .values()
            .filter(|session| !session.is_active())
            .map(|session| session.actor)
            .collect();

        ended
            .into_iter()
            .filter_map(|actor| {
                self.ended_at.insert(actor, now);
                self.sessions.remove(&actor)
            })
            .collect()
    }

    /// Forgets cooldowns that have run out.
    pub fn prune_cooldowns(&mut self, policy: &SessionPolicy, now: Timestamp) {
        let cooldown = policy.cooldown;
        self.ended_at.retain(|_, ended| *ended + cooldown > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionMode;
    use crate::state::Position;

    fn normal(id: u64) -> Actor {
        Actor::new(ActorId(id), Position::ORIGIN)
    }

    fn params() -> SessionParams {
        SessionParams::new(SessionMode::Normal, 30.0)
    }

    #[test]
    fn second_activation_replaces_the_first() {
        let mut table = SessionTable::new();
        let actor = normal(1);
        let policy = SessionPolicy::default();

        assert!(table.activate(&actor, params(), &policy, Timestamp::ZERO).unwrap().is_none());
        let replaced = table
            .activate(&actor, params().with_max_count(3), &policy, Timestamp::ZERO)
            .unwrap()
            .unwrap();
        assert_eq!(
            replaced.state(),
            SessionState::Disabled(DisableReason::Replaced)
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(ActorId(1)).unwrap().params.max_count, 3);
    }

    #[test]
    fn activation_requires_mode_permission() {
        let mut table = SessionTable::new();
        let err = table
            .activate(
                &normal(1),
                SessionParams::new(SessionMode::Admin, 30.0),
                &SessionPolicy::default(),
                Timestamp::ZERO,
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::MissingPermission { .. }));
    }

    #[test]
    fn override_blocks_everyone_without_override_permission() {
        let mut table = SessionTable::new();
        let policy = SessionPolicy {
            override_enabled: true,
            ..SessionPolicy::default()
        };

        let err = table
            .activate(&normal(1), params(), &policy, Timestamp::ZERO)
            .unwrap_err();
        assert_eq!(err, SessionError::OverrideActive);

        let trusted =
            normal(2).with_permissions(Permissions::NORMAL | Permissions::OVERRIDE);
        assert!(table.activate(&trusted, params(), &policy, Timestamp::ZERO).is_ok());

        let admin = normal(3).with_permissions(Permissions::ADMIN);
        let admin_params = SessionParams::new(SessionMode::Admin, 30.0);
        assert!(table.activate(&admin, admin_params, &policy, Timestamp::ZERO).is_ok());
    }

    #[test]
    fn cooldown_applies_after_deactivation_but_not_to_admins() {
        let mut table = SessionTable::new();
        let policy = SessionPolicy {
            cooldown: 10.0,
            ..SessionPolicy::default()
        };
        let actor = normal(1);
        table.activate(&actor, params(), &policy, Timestamp::ZERO).unwrap();
        table.deactivate(ActorId(1), DisableReason::Deactivated, Timestamp::from_secs(5.0));

        let err = table
            .activate(&actor, params(), &policy, Timestamp::from_secs(9.5))
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::CoolingDown {
                actor: ActorId(1),
                remaining_secs: 6
            }
        );
        assert!(table.activate(&actor, params(), &policy, Timestamp::from_secs(15.0)).is_ok());

        let admin = normal(2).with_permissions(Permissions::NORMAL | Permissions::ADMIN);
        table.activate(&admin, params(), &policy, Timestamp::ZERO).unwrap();
        table.deactivate(ActorId(2), DisableReason::Deactivated, Timestamp::ZERO);
        assert!(table.activate(&admin, params(), &policy, Timestamp::from_secs(1.0)).is_ok());
    }

    #[test]
    fn tick_ends_sessions_of_disconnected_actors() {
        let mut world = WorldState::new();
        let mut actor = normal(1);
        world.insert_actor(actor.clone());
        let policy = SessionPolicy::default();

        let mut table = SessionTable::new();
        table.activate(&actor, params(), &policy, Timestamp::ZERO).unwrap();

        actor.connected = false;
        world.insert_actor(actor);
        let ended = table.tick(
            &world,
            &ReclaimEnv::empty(),
            &policy,
            0.1,
            Timestamp::from_secs(0.1),
        );
        assert_eq!(ended.len(), 1);
        assert_eq!(
            ended[0].state(),
            SessionState::Disabled(DisableReason::Disconnected)
        );
        assert!(table.is_empty());
    }
}
