//! Authoritative world state representation.
//!
//! [`WorldState`] owns every entity, actor and building cluster the tool can
//! see. Runtime layers query it freely but mutate it only through the engine
//! and sweep routines so that every removal stays atomic.
pub mod types;

use std::collections::BTreeMap;

pub use types::{
    Actor, ActorId, Capabilities, Entity, EntityId, EntityKind, Grade, InsufficientItems,
    Inventory, ItemStack, Lock, Permissions, Position, StructureId, Timestamp, ViewRay,
};

/// Building cluster and the actors holding building privilege over it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Structure {
    pub id: StructureId,
    pub privileged: Vec<ActorId>,
}

impl Structure {
    pub fn new(id: StructureId) -> Self {
        Self {
            id,
            privileged: Vec::new(),
        }
    }

    pub fn with_privileged(mut self, actor: ActorId) -> Self {
        self.privileged.push(actor);
        self
    }

    pub fn is_privileged(&self, actor: ActorId) -> bool {
        self.privileged.contains(&actor)
    }
}

/// Items lying on the ground after a refund overflow or a container purge.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DroppedStack {
    pub position: Position,
    pub stack: ItemStack,
}

/// Canonical snapshot of the simulated world.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldState {
    entities: BTreeMap<EntityId, Entity>,
    actors: BTreeMap<ActorId, Actor>,
    structures: BTreeMap<StructureId, Structure>,
    /// Ground items, oldest first.
    pub dropped: Vec<DroppedStack>,
    /// Sequential entity ID allocator (monotonically increasing, never reused).
    next_entity_id: u64,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new unique EntityId.
    pub fn allocate_entity_id(&mut self) -> EntityId {
        self.next_entity_id += 1;
        EntityId(self.next_entity_id)
    }

    /// Inserts an entity, keeping the allocator ahead of explicit ids.
    pub fn insert_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.next_entity_id = self.next_entity_id.max(id.0);
        self.entities.insert(id, entity);
        id
    }

    pub fn insert_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    pub fn insert_structure(&mut self, structure: Structure) {
        self.structures.insert(structure.id, structure);
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities whose position lies within `radius` of `center`, in id order.
    pub fn entities_within(
        &self,
        center: Position,
        radius: f32,
    ) -> impl Iterator<Item = &Entity> + '_ {
        let radius_sq = radius * radius;
        self.entities.values().filter(move |entity| {
            !entity.destroyed && entity.position.distance_squared(&center) <= radius_sq
        })
    }

    /// Connected actors within `radius` of `center`.
    pub fn actors_within(&self, center: Position, radius: f32) -> impl Iterator<Item = &Actor> + '_ {
        let radius_sq = radius * radius;
        self.actors.values().filter(move |actor| {
            actor.connected && actor.position.distance_squared(&center) <= radius_sq
        })
    }

    /// Live entities belonging to `structure`, in id order.
    pub fn entities_in_structure(
        &self,
        structure: StructureId,
    ) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .values()
            .filter(move |entity| !entity.destroyed && entity.structure == Some(structure))
    }

    /// First concealed entity hidden under `anchor`, if any.
    pub fn concealed_under(&self, anchor: EntityId) -> Option<&Entity> {
        self.entities.values().find(|entity| {
            !entity.destroyed
                && entity.has(Capabilities::CONCEALED)
                && entity.anchor == Some(anchor)
        })
    }

    /// Removes an entity from the world, returning it flagged as destroyed.
    pub fn destroy(&mut self, id: EntityId) -> Option<Entity> {
        let mut entity = self.entities.remove(&id)?;
        entity.destroyed = true;
        Some(entity)
    }

    /// Leaves `stacks` on the ground at `position`.
    pub fn drop_items(&mut self, position: Position, stacks: impl IntoIterator<Item = ItemStack>) {
        self.dropped.extend(
            stacks
                .into_iter()
                .filter(|stack| stack.amount > 0)
                .map(|stack| DroppedStack { position, stack }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: u64, x: f32, structure: u32) -> Entity {
        Entity::new(
            EntityId(id),
            "foundation",
            EntityKind::BuildingBlock,
            Position::new(x, 0.0, 0.0),
            Timestamp::ZERO,
        )
        .with_structure(StructureId(structure))
    }

    #[test]
    fn spatial_query_respects_radius_and_destroyed_flag() {
        let mut world = WorldState::new();
        world.insert_entity(block(1, 0.0, 1));
        world.insert_entity(block(2, 2.9, 1));
        world.insert_entity(block(3, 3.1, 1));
        world.entity_mut(EntityId(2)).unwrap().destroyed = true;

        let found: Vec<_> = world
            .entities_within(Position::ORIGIN, 3.0)
            .map(|entity| entity.id)
            .collect();
        assert_eq!(found, vec![EntityId(1)]);
    }

    #[test]
    fn structure_enumeration_filters_by_cluster() {
        let mut world = WorldState::new();
        world.insert_entity(block(1, 0.0, 1));
        world.insert_entity(block(2, 50.0, 1));
        world.insert_entity(block(3, 1.0, 2));

        let ids: Vec<_> = world
            .entities_in_structure(StructureId(1))
            .map(|entity| entity.id)
            .collect();
        assert_eq!(ids, vec![EntityId(1), EntityId(2)]);
    }

    #[test]
    fn allocator_skips_explicit_ids() {
        let mut world = WorldState::new();
        world.insert_entity(block(10, 0.0, 1));
        assert_eq!(world.allocate_entity_id(), EntityId(11));
    }

    #[test]
    fn destroy_returns_flagged_entity() {
        let mut world = WorldState::new();
        world.insert_entity(block(1, 0.0, 1));

        let removed = world.destroy(EntityId(1)).unwrap();
        assert!(removed.destroyed);
        assert!(world.entity(EntityId(1)).is_none());
        assert!(world.destroy(EntityId(1)).is_none());
    }

    #[test]
    fn default_structure_has_no_privileged_actors() {
        let structure = Structure::default();
        assert_eq!(structure.id, StructureId(0));
        assert!(!structure.is_privileged(ActorId(1)));

        let mut world = WorldState::new();
        world.insert_structure(Structure::new(StructureId(4)).with_privileged(ActorId(1)));
        assert!(world.structure(StructureId(4)).unwrap().is_privileged(ActorId(1)));
    }
}
