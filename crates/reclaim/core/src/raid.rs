//! Time-windowed removal block after unauthorized structural damage.
//!
//! An entry stamped at `t` blocks while `t + duration > now`. Expired entries
//! are semantically inert; [`RaidBlocker::prune`] only reclaims memory.

use std::collections::BTreeMap;

use crate::config::RaidBlockPolicy;
use crate::state::{ActorId, EntityId, StructureId, Timestamp, WorldState};

/// Entries created by one qualifying damage event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaidBlockRecord {
    pub structure: Option<StructureId>,
    pub actors: Vec<ActorId>,
}

impl RaidBlockRecord {
    pub fn is_empty(&self) -> bool {
        self.structure.is_none() && self.actors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RaidBlocker {
    policy: RaidBlockPolicy,
    structures: BTreeMap<StructureId, Timestamp>,
    actors: BTreeMap<ActorId, Timestamp>,
}

impl RaidBlocker {
    pub fn new(policy: RaidBlockPolicy) -> Self {
        Self {
            policy,
            structures: BTreeMap::new(),
            actors: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> &RaidBlockPolicy {
        &self.policy
    }

    /// Records the blocks caused by `attacker` damaging `target`.
    ///
    /// Damage qualifies only when the target is structural and the attacker
    /// neither owns it nor holds privilege over its structure. Returns the
    /// entries written, empty when the event did not qualify.
    pub fn on_damage(
        &mut self,
        world: &WorldState,
        attacker: ActorId,
        target: EntityId,
        now: Timestamp,
    ) -> RaidBlockRecord {
        let mut record = RaidBlockRecord::default();
        if !self.policy.enabled {
            return record;
        }
        let Some(entity) = world.entity(target) else {
            return record;
        };
        if !entity.is_structural() || entity.owner == Some(attacker) {
            return record;
        }
        let privileged = entity
            .structure
            .and_then(|id| world.structure(id))
            .is_some_and(|structure| structure.is_privileged(attacker));
        if privileged {
            return record;
        }

        if let Some(structure) = entity.structure.filter(|_| self.policy.block_structure) {
            self.structures.insert(structure, now);
            record.structure = Some(structure);
        }

        if self.policy.block_actors {
            for actor in world.actors_within(entity.position, self.policy.radius) {
                self.actors.insert(actor.id, now);
                record.actors.push(actor.id);
            }
        }

        record
    }

    fn live(&self, stamped: Option<&Timestamp>, now: Timestamp) -> Option<f64> {
        stamped
            .map(|&at| (at + self.policy.duration).since(now))
            .filter(|&remaining| remaining > 0.0)
    }

    /// Seconds left on the longest live block covering `structure` or `actor`.
    pub fn remaining(
        &self,
        structure: Option<StructureId>,
        actor: ActorId,
        now: Timestamp,
    ) -> Option<f64> {
        let by_structure = structure.and_then(|id| self.live(self.structures.get(&id), now));
        let by_actor = self.live(self.actors.get(&actor), now);
        match (by_structure, by_actor) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_blocked(&self, structure: Option<StructureId>, actor: ActorId, now: Timestamp) -> bool {
        self.remaining(structure, actor, now).is_some()
    }

    /// Drops expired entries, returning how many were removed.
    pub fn prune(&mut self, now: Timestamp) -> usize {
        let duration = self.policy.duration;
        let before = self.len();
        self.structures.retain(|_, at| *at + duration > now);
        self.actors.retain(|_, at| *at + duration > now);
        before - self.len()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.structures.len() + self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
