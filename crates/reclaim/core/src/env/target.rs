//! Target acquisition along an actor's view ray.

use bitflags::bitflags;

use crate::state::{Actor, Entity, EntityId, EntityKind, WorldState};

bitflags! {
    /// Physics layers a target query may hit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LayerMask: u8 {
        /// Building blocks and exterior walls.
        const CONSTRUCTION = 1 << 0;
        /// Placed objects (doors, boxes, turrets, ...).
        const DEPLOYED     = 1 << 1;
    }
}

impl LayerMask {
    /// Layer an entity of `kind` lives on.
    pub const fn of(kind: EntityKind) -> Self {
        match kind {
            EntityKind::BuildingBlock | EntityKind::ExternalWall => Self::CONSTRUCTION,
            _ => Self::DEPLOYED,
        }
    }
}

/// Resolves which world object an actor's view currently intersects.
pub trait TargetOracle {
    /// Nearest object along the actor's view ray, no further than `max_distance`.
    fn acquire_target(
        &self,
        world: &WorldState,
        actor: &Actor,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<EntityId>;
}

/// Ray cast against entity positions treated as spheres of `hit_radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayTargeting {
    pub hit_radius: f32,
}

impl Default for RayTargeting {
    fn default() -> Self {
        Self { hit_radius: 0.75 }
    }
}

impl RayTargeting {
    /// Distance along the ray to the closest approach of `entity`, if hit.
    fn intersect(&self, actor: &Actor, entity: &Entity, max_distance: f32) -> Option<f32> {
        let origin = actor.view.origin;
        let dir = actor.view.direction;
        let len = (dir.x * dir.x + dir.y * dir.y + dir.z * dir.z).sqrt();
        if len == 0.0 {
            return None;
        }

        let (dx, dy, dz) = (
            entity.position.x - origin.x,
            entity.position.y - origin.y,
            entity.position.z - origin.z,
        );
        let along = (dx * dir.x + dy * dir.y + dz * dir.z) / len;
        if along < 0.0 || along > max_distance {
            return None;
        }

        let off_axis_sq = (dx * dx + dy * dy + dz * dz) - along * along;
        (off_axis_sq <= self.hit_radius * self.hit_radius).then_some(along)
    }
}

impl TargetOracle for RayTargeting {
    fn acquire_target(
        &self,
        world: &WorldState,
        actor: &Actor,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<EntityId> {
        world
            .entities()
            .filter(|entity| !entity.destroyed && layers.intersects(LayerMask::of(entity.kind)))
            .filter_map(|entity| {
                self.intersect(actor, entity, max_distance)
                    .map(|along| (along, entity.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }
}
