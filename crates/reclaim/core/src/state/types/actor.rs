//! Connected participants and their permission sets.

use bitflags::bitflags;

use super::common::{ActorId, Position, ViewRay};
use super::inventory::Inventory;

bitflags! {
    /// Permissions granted to an actor by the host's permission system.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Permissions: u8 {
        /// Remove own (or friends') entities.
        const NORMAL    = 1 << 0;
        /// Remove anything without paying; exempt from cooldowns.
        const ADMIN     = 1 << 1;
        /// Flood-fill removal of a whole area.
        const BATCH_ALL = 1 << 2;
        /// Removal of a whole building cluster.
        const STRUCTURE = 1 << 3;
        /// Removal of connected exterior walls.
        const EXTERNAL  = 1 << 4;
        /// Tool stays usable while the global override is active.
        const OVERRIDE  = 1 << 5;
    }
}

/// A connected, controllable participant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    pub id: ActorId,
    pub connected: bool,
    /// Set while the actor is wounded, mounted, or otherwise unable to interact.
    pub interaction_blocked: bool,
    pub position: Position,
    pub view: ViewRay,
    pub permissions: Permissions,
    pub inventory: Inventory,
}

impl Actor {
    pub fn new(id: ActorId, position: Position) -> Self {
        Self {
            id,
            connected: true,
            interaction_blocked: false,
            position,
            view: ViewRay::new(position, Position::new(0.0, 0.0, 1.0)),
            permissions: Permissions::NORMAL,
            inventory: Inventory::empty(),
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.permissions.contains(Permissions::ADMIN)
    }

    /// True while the actor may operate the tool at all.
    pub fn can_interact(&self) -> bool {
        self.connected && !self.interaction_blocked
    }
}
