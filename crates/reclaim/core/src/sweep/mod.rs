//! Cooperative batch reclamation.
//!
//! A [`Sweep`] discovers a set of entities and deletes them a few at a time.
//! Every call to [`Sweep::step`] does a bounded amount of work and returns
//! [`SweepStatus::Suspended`] until the sweep is finished, so the host loop
//! can interleave sweeps with its own frames.
//!
//! Discovery strategies:
//! - [`SweepKind::WholeArea`]: breadth-first flood fill from a position, one
//!   radius query per dequeued point.
//! - [`SweepKind::ExternalSurface`]: the same flood fill restricted to
//!   exterior structural segments, seeded at an entity.
//! - [`SweepKind::ConnectedStructure`]: every entity sharing the seed's
//!   structure id.
mod lock;

pub use lock::{SweepError, SweepLocks};

use std::collections::{BTreeSet, VecDeque};

use crate::config::{ContainerDisposal, SweepPolicy};
use crate::state::{ActorId, Capabilities, Entity, EntityId, Position, StructureId, WorldState};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SweepKind {
    WholeArea,
    ExternalSurface,
    ConnectedStructure,
}

/// Which entities a flood fill collects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepFilter {
    /// Only entities owned by this actor.
    pub owner: Option<ActorId>,
    /// Capabilities every collected entity must carry.
    pub required: Capabilities,
}

impl SweepFilter {
    /// Everything.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn owned_by(owner: ActorId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn exterior() -> Self {
        Self {
            owner: None,
            required: Capabilities::STRUCTURAL | Capabilities::EXTERIOR,
        }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        !entity.destroyed
            && entity.has(self.required)
            && self.owner.is_none_or(|owner| entity.owner == Some(owner))
    }
}

/// What to sweep and where to start.
#[derive(Clone, Debug, PartialEq)]
pub enum SweepRequest {
    WholeArea {
        origin: Position,
        filter: SweepFilter,
    },
    ExternalSurface {
        seed: EntityId,
    },
    ConnectedStructure {
        seed: EntityId,
    },
}

impl SweepRequest {
    pub fn kind(&self) -> SweepKind {
        match self {
            Self::WholeArea { .. } => SweepKind::WholeArea,
            Self::ExternalSurface { .. } => SweepKind::ExternalSurface,
            Self::ConnectedStructure { .. } => SweepKind::ConnectedStructure,
        }
    }
}

/// Summary handed back to the requesting actor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub discovered: usize,
    pub removed: usize,
    /// Container stacks dropped or discarded before deletion.
    pub disposed_stacks: usize,
    pub cancelled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SweepStatus {
    Suspended,
    Done(SweepReport),
}

#[derive(Clone, Debug, PartialEq)]
enum Phase {
    /// Flood fill in progress.
    Flood,
    /// Structure enumeration, resumed after the last member examined.
    Enumerate {
        structure: Option<StructureId>,
        after: Option<EntityId>,
    },
    /// Emptying discovered containers ahead of deletion.
    Dispose,
    Delete,
    Finished,
}

/// A running sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct Sweep {
    kind: SweepKind,
    requester: ActorId,
    generation: u64,
    filter: SweepFilter,
    phase: Phase,
    frontier: VecDeque<Position>,
    seen: BTreeSet<EntityId>,
    found: Vec<EntityId>,
    cursor: usize,
    report: SweepReport,
}

impl Sweep {
    /// Acquires the kind's lock and prepares the sweep.
    ///
    /// # Errors
    ///
    /// - [`SweepError::AlreadyRunning`] when a sweep of the same kind holds the lock.
    /// - [`SweepError::SeedNotFound`] when an entity-seeded sweep has no live seed.
    pub fn start(
        request: SweepRequest,
        requester: ActorId,
        world: &WorldState,
        locks: &mut SweepLocks,
    ) -> Result<Self, SweepError> {
        let kind = request.kind();
        if locks.is_running(kind) {
            return Err(SweepError::AlreadyRunning(kind));
        }

        let mut sweep = Self {
            kind,
            requester,
            generation: 0,
            filter: SweepFilter::any(),
            phase: Phase::Flood,
            frontier: VecDeque::new(),
            seen: BTreeSet::new(),
            found: Vec::new(),
            cursor: 0,
            report: SweepReport::default(),
        };

        match request {
            SweepRequest::WholeArea { origin, filter } => {
                sweep.filter = filter;
                sweep.frontier.push_back(origin);
            }
            SweepRequest::ExternalSurface { seed } => {
                let seed = live(world, seed)?;
                sweep.filter = SweepFilter::exterior();
                sweep.frontier.push_back(seed.position);
                sweep.collect(seed);
            }
            SweepRequest::ConnectedStructure { seed } => {
                let seed = live(world, seed)?;
                sweep.phase = Phase::Enumerate {
                    structure: seed.structure,
                    after: None,
                };
                sweep.collect(seed);
            }
        }

        sweep.generation = locks.acquire(kind)?;
        Ok(sweep)
    }

    pub fn kind(&self) -> SweepKind {
        self.kind
    }

    pub fn requester(&self) -> ActorId {
        self.requester
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Entities discovered so far, in discovery order.
    pub fn found(&self) -> &[EntityId] {
        &self.found
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    fn collect(&mut self, entity: &Entity) {
        if self.filter.matches(entity) && self.seen.insert(entity.id) {
            self.found.push(entity.id);
        }
    }

    /// Performs one bounded slice of work.
    pub fn step(
        &mut self,
        world: &mut WorldState,
        locks: &mut SweepLocks,
        policy: &SweepPolicy,
    ) -> SweepStatus {
        if self.phase == Phase::Finished {
            return SweepStatus::Done(self.report.clone());
        }
        if !locks.is_current(self.kind, self.generation) {
            self.report.cancelled = true;
            return self.finish(locks);
        }

        match self.phase.clone() {
            Phase::Flood => self.flood(world, policy),
            Phase::Enumerate { structure, after } => {
                self.enumerate(world, policy, structure, after);
            }
            Phase::Dispose => {
                if self.dispose(world, policy) {
                    self.cursor = 0;
                    self.phase = Phase::Delete;
                }
            }
            Phase::Delete => {
                if self.delete(world, policy) {
                    return self.finish(locks);
                }
            }
            Phase::Finished => {}
        }
        SweepStatus::Suspended
    }

    fn flood(&mut self, world: &WorldState, policy: &SweepPolicy) {
        for _ in 0..policy.queries_per_step.max(1) {
            let Some(point) = self.frontier.pop_front() else {
                break;
            };
            let hits: Vec<(EntityId, Position)> = world
                .entities_within(point, policy.query_radius)
                .filter(|entity| self.filter.matches(entity) && !self.seen.contains(&entity.id))
                .map(|entity| (entity.id, entity.position))
                .collect();
            for (id, position) in hits {
                self.seen.insert(id);
                self.found.push(id);
                self.frontier.push_back(position);
            }
        }

        if self.frontier.is_empty() {
            self.end_discovery(policy);
        }
    }

    /// Examines up to `queries_per_step` members of the structure, in id order.
    fn enumerate(
        &mut self,
        world: &WorldState,
        policy: &SweepPolicy,
        structure: Option<StructureId>,
        after: Option<EntityId>,
    ) {
        let Some(structure) = structure else {
            self.end_discovery(policy);
            return;
        };
        let budget = policy.queries_per_step.max(1);
        let batch: Vec<&Entity> = world
            .entities_in_structure(structure)
            .filter(|entity| after.is_none_or(|after| entity.id > after))
            .take(budget)
            .collect();
        let exhausted = batch.len() < budget;
        let last = batch.last().map(|entity| entity.id);
        let admitted: Vec<EntityId> = batch
            .into_iter()
            .filter(|entity| self.filter.matches(entity))
            .map(|entity| entity.id)
            .collect();
        for id in admitted {
            if self.seen.insert(id) {
                self.found.push(id);
            }
        }

        if exhausted {
            self.end_discovery(policy);
        } else {
            self.phase = Phase::Enumerate {
                structure: Some(structure),
                after: last,
            };
        }
    }

    fn end_discovery(&mut self, policy: &SweepPolicy) {
        self.report.discovered = self.found.len();
        self.cursor = 0;
        self.phase = match policy.containers {
            ContainerDisposal::Retain => Phase::Delete,
            _ => Phase::Dispose,
        };
    }

    /// Empties up to `deletions_per_step` discovered entities' containers;
    /// true once every entity is handled.
    fn dispose(&mut self, world: &mut WorldState, policy: &SweepPolicy) -> bool {
        let end = (self.cursor + policy.deletions_per_step.max(1)).min(self.found.len());
        self.report.disposed_stacks +=
            empty_containers(world, &self.found[self.cursor..end], policy.containers);
        self.cursor = end;
        self.cursor == self.found.len()
    }

    /// Deletes up to the per-step budget; true once every entity is handled.
    fn delete(&mut self, world: &mut WorldState, policy: &SweepPolicy) -> bool {
        let end = (self.cursor + policy.deletions_per_step.max(1)).min(self.found.len());
        for &id in &self.found[self.cursor..end] {
            if world.destroy(id).is_some() {
                self.report.removed += 1;
            }
        }
        self.cursor = end;
        self.cursor == self.found.len()
    }

    fn finish(&mut self, locks: &mut SweepLocks) -> SweepStatus {
        locks.release(self.kind, self.generation);
        self.phase = Phase::Finished;
        self.frontier.clear();
        SweepStatus::Done(self.report.clone())
    }
}

fn live(world: &WorldState, id: EntityId) -> Result<&Entity, SweepError> {
    world
        .entity(id)
        .filter(|entity| !entity.destroyed)
        .ok_or(SweepError::SeedNotFound(id))
}

/// Empties the containers among `found`; returns the number of stacks moved.
fn empty_containers(
    world: &mut WorldState,
    found: &[EntityId],
    disposal: ContainerDisposal,
) -> usize {
    if disposal == ContainerDisposal::Retain {
        return 0;
    }

    let mut disposed = 0;
    for &id in found {
        let Some(entity) = world.entity_mut(id) else {
            continue;
        };
        let position = entity.position;
        let Some(stacks) = entity.contents.as_mut().map(|contents| contents.drain()) else {
            continue;
        };
        disposed += stacks.len();
        if disposal == ContainerDisposal::DropToGround {
            world.drop_items(position, stacks);
        }
    }
    disposed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EntityKind, Inventory, ItemStack, Timestamp};

    fn at(id: u64, x: f32, kind: EntityKind) -> Entity {
        Entity::new(
            EntityId(id),
            "thing",
            kind,
            Position::new(x, 0.0, 0.0),
            Timestamp::ZERO,
        )
    }

    /// A chain of blocks 2m apart plus an isolated one far away.
    fn chain_world() -> WorldState {
        let mut world = WorldState::new();
        for i in 0..10 {
            world.insert_entity(at(i + 1, i as f32 * 2.0, EntityKind::BuildingBlock));
        }
        world.insert_entity(at(100, 500.0, EntityKind::BuildingBlock));
        world
    }

    fn run(sweep: &mut Sweep, world: &mut WorldState, locks: &mut SweepLocks) -> SweepReport {
        let policy = SweepPolicy {
            queries_per_step: 2,
            deletions_per_step: 3,
            ..SweepPolicy::default()
        };
        for _ in 0..1000 {
            if let SweepStatus::Done(report) = sweep.step(world, locks, &policy) {
                return report;
            }
        }
        panic!("sweep did not finish");
    }

    #[test]
    fn flood_fill_follows_the_chain_only() {
        let mut world = chain_world();
        let mut locks = SweepLocks::new();
        let mut sweep = Sweep::start(
            SweepRequest::WholeArea {
                origin: Position::ORIGIN,
                filter: SweepFilter::any(),
            },
            ActorId(1),
            &world,
            &mut locks,
        )
        .unwrap();

        let report = run(&mut sweep, &mut world, &mut locks);
        assert_eq!(report.discovered, 10);
        assert_eq!(report.removed, 10);
        assert_eq!(world.entity_count(), 1);
        assert!(!locks.is_running(SweepKind::WholeArea));
    }

    #[test]
    fn repeated_discovery_is_duplicate_free_and_stable() {
        fn discover() -> Vec<EntityId> {
            let mut world = chain_world();
            let mut locks = SweepLocks::new();
            let mut sweep = Sweep::start(
                SweepRequest::WholeArea {
                    origin: Position::new(6.0, 0.0, 0.0),
                    filter: SweepFilter::any(),
                },
                ActorId(1),
                &world,
                &mut locks,
            )
            .unwrap();
            run(&mut sweep, &mut world, &mut locks);
            sweep.found().to_vec()
        }

        let first = discover();
        let second = discover();
        let unique: BTreeSet<_> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn second_sweep_of_same_kind_is_rejected() {
        let mut world = chain_world();
        let mut locks = SweepLocks::new();
        let request = SweepRequest::WholeArea {
            origin: Position::ORIGIN,
            filter: SweepFilter::any(),
        };
        let mut first = Sweep::start(request.clone(), ActorId(1), &world, &mut locks).unwrap();

        let policy = SweepPolicy::default();
        assert_eq!(first.step(&mut world, &mut locks, &policy), SweepStatus::Suspended);

        let err = Sweep::start(request, ActorId(2), &world, &mut locks).unwrap_err();
        assert_eq!(err, SweepError::AlreadyRunning(SweepKind::WholeArea));

        let report = run(&mut first, &mut world, &mut locks);
        assert_eq!(report.removed, 10);
        assert!(!report.cancelled);
    }

    #[test]
    fn empty_area_completes_with_zero() {
        let mut world = WorldState::new();
        let mut locks = SweepLocks::new();
        let mut sweep = Sweep::start(
            SweepRequest::WholeArea {
                origin: Position::ORIGIN,
                filter: SweepFilter::any(),
            },
            ActorId(1),
            &world,
            &mut locks,
        )
        .unwrap();

        assert_eq!(run(&mut sweep, &mut world, &mut locks), SweepReport::default());
    }

    #[test]
    fn cancellation_stops_at_next_step() {
        let mut world = chain_world();
        let mut locks = SweepLocks::new();
        let mut sweep = Sweep::start(
            SweepRequest::WholeArea {
                origin: Position::ORIGIN,
                filter: SweepFilter::any(),
            },
            ActorId(1),
            &world,
            &mut locks,
        )
        .unwrap();
        let policy = SweepPolicy::default();
        sweep.step(&mut world, &mut locks, &policy);

        locks.cancel(SweepKind::WholeArea);
        let SweepStatus::Done(report) = sweep.step(&mut world, &mut locks, &policy) else {
            panic!("cancelled sweep kept running");
        };
        assert!(report.cancelled);
        assert_eq!(report.removed, 0);
        assert_eq!(world.entity_count(), 11);
    }

    #[test]
    fn connected_structure_without_id_takes_only_the_seed() {
        let mut world = chain_world();
        let mut locks = SweepLocks::new();
        let mut sweep = Sweep::start(
            SweepRequest::ConnectedStructure { seed: EntityId(3) },
            ActorId(1),
            &world,
            &mut locks,
        )
        .unwrap();

        let report = run(&mut sweep, &mut world, &mut locks);
        assert_eq!(report.removed, 1);
        assert!(world.entity(EntityId(3)).is_none());
    }

    #[test]
    fn connected_structure_collects_the_cluster() {
        let mut world = chain_world();
        for id in [1, 5, 100] {
            world.entity_mut(EntityId(id)).unwrap().structure = Some(StructureId(7));
        }
        let mut locks = SweepLocks::new();
        let mut sweep = Sweep::start(
            SweepRequest::ConnectedStructure { seed: EntityId(5) },
            ActorId(1),
            &world,
            &mut locks,
        )
        .unwrap();

        let report = run(&mut sweep, &mut world, &mut locks);
        assert_eq!(report.removed, 3);
        assert_eq!(sweep.found(), &[EntityId(5), EntityId(1), EntityId(100)]);
    }

    #[test]
    fn external_surface_skips_interior_blocks() {
        let mut world = WorldState::new();
        world.insert_entity(at(1, 0.0, EntityKind::ExternalWall));
        world.insert_entity(at(2, 2.0, EntityKind::ExternalWall));
        world.insert_entity(at(3, 1.0, EntityKind::BuildingBlock));
        world.insert_entity(at(4, 4.0, EntityKind::ExternalWall));
        let mut locks = SweepLocks::new();
        let mut sweep = Sweep::start(
            SweepRequest::ExternalSurface { seed: EntityId(1) },
            ActorId(1),
            &world,
            &mut locks,
        )
        .unwrap();

        let report = run(&mut sweep, &mut world, &mut locks);
        assert_eq!(report.removed, 3);
        assert!(world.entity(EntityId(3)).is_some());
    }

    #[test]
    fn containers_can_be_dropped_before_deletion() {
        let mut world = WorldState::new();
        world.insert_entity(
            at(1, 0.0, EntityKind::Storage).with_contents(Inventory::from_stacks([
                ItemStack::new("wood", 10),
                ItemStack::new("stones", 5),
            ])),
        );
        let mut locks = SweepLocks::new();
        let mut sweep = Sweep::start(
            SweepRequest::WholeArea {
                origin: Position::ORIGIN,
                filter: SweepFilter::any(),
            },
            ActorId(1),
            &world,
            &mut locks,
        )
        .unwrap();
        let policy = SweepPolicy {
            containers: ContainerDisposal::DropToGround,
            ..SweepPolicy::default()
        };
        let report = loop {
            if let SweepStatus::Done(report) = sweep.step(&mut world, &mut locks, &policy) {
                break report;
            }
        };

        assert_eq!(report.disposed_stacks, 2);
        assert_eq!(world.dropped.len(), 2);
    }

    #[test]
    fn large_cluster_is_enumerated_and_emptied_across_steps() {
        let mut world = WorldState::new();
        for i in 0..6 {
            world.insert_entity(
                at(i + 1, i as f32 * 2.0, EntityKind::Storage)
                    .with_structure(StructureId(3))
                    .with_contents(Inventory::from_stacks([ItemStack::new("wood", 10)])),
            );
        }
        let mut locks = SweepLocks::new();
        let mut sweep = Sweep::start(
            SweepRequest::ConnectedStructure { seed: EntityId(1) },
            ActorId(1),
            &world,
            &mut locks,
        )
        .unwrap();
        let policy = SweepPolicy {
            queries_per_step: 2,
            deletions_per_step: 2,
            containers: ContainerDisposal::DropToGround,
            ..SweepPolicy::default()
        };

        assert_eq!(sweep.step(&mut world, &mut locks, &policy), SweepStatus::Suspended);
        assert_eq!(sweep.found(), &[EntityId(1), EntityId(2)]);

        for _ in 0..3 {
            assert_eq!(sweep.step(&mut world, &mut locks, &policy), SweepStatus::Suspended);
        }
        assert_eq!(sweep.found().len(), 6);
        assert!(world.dropped.is_empty());

        assert_eq!(sweep.step(&mut world, &mut locks, &policy), SweepStatus::Suspended);
        assert_eq!(world.dropped.len(), 2);
        assert_eq!(world.entity_count(), 6);

        let report = loop {
            if let SweepStatus::Done(report) = sweep.step(&mut world, &mut locks, &policy) {
                break report;
            }
        };
        assert_eq!(report.discovered, 6);
        assert_eq!(report.disposed_stacks, 6);
        assert_eq!(report.removed, 6);
        assert_eq!(world.dropped.len(), 6);
        assert_eq!(world.entity_count(), 0);
    }
}
