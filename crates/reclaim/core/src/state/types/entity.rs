//! World entities and their cached classification.
//!
//! Classification happens once, when the entity is spawned: the closed
//! [`EntityKind`] determines a [`Capabilities`] set that rule evaluation and
//! pricing read directly instead of re-inspecting the object every time.

use bitflags::bitflags;

use super::common::{ActorId, EntityId, Position, StructureId, Timestamp};
use super::inventory::Inventory;

/// Closed classification of everything the tool can target.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
    /// Graded building block (foundation, wall, floor, roof).
    BuildingBlock,
    /// Free-standing exterior wall or gate.
    ExternalWall,
    Door,
    /// Box, locker, furnace and other item containers.
    Storage,
    /// Turret or trap.
    Defense,
    /// Planter, quarry, generator: produces resources over time.
    Producer,
    /// Hidden stash anchored to another object.
    Stash,
    /// Any other placed object (ladders, signs, lights).
    Deployable,
}

bitflags! {
    /// Cached capability set derived from [`EntityKind`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Capabilities: u8 {
        const STORAGE    = 1 << 0;
        const STRUCTURAL = 1 << 1;
        const COMBAT     = 1 << 2;
        /// Exterior-facing structural segment (walls, gates).
        const EXTERIOR   = 1 << 3;
        /// Hidden until the object it is anchored to disappears.
        const CONCEALED  = 1 << 4;
        /// Can be repaired by spending resources.
        const REPAIRABLE = 1 << 5;
    }
}

impl EntityKind {
    /// Capabilities every entity of this kind carries.
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::BuildingBlock => Capabilities::STRUCTURAL.union(Capabilities::REPAIRABLE),
            Self::ExternalWall => Capabilities::STRUCTURAL
                .union(Capabilities::EXTERIOR)
                .union(Capabilities::REPAIRABLE),
            Self::Door => Capabilities::REPAIRABLE,
            Self::Storage => Capabilities::STORAGE.union(Capabilities::REPAIRABLE),
            Self::Defense => Capabilities::COMBAT
                .union(Capabilities::STORAGE)
                .union(Capabilities::REPAIRABLE),
            Self::Producer => Capabilities::STORAGE,
            Self::Stash => Capabilities::STORAGE.union(Capabilities::CONCEALED),
            Self::Deployable => Capabilities::REPAIRABLE,
        }
    }
}

/// Construction quality tier of a building block.
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
pub enum Grade {
    Twigs,
    Wood,
    Stone,
    Metal,
    TopTier,
}

/// Key lock or code lock attached to a door or container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lock {
    pub owner: Option<ActorId>,
    pub authorized: Vec<ActorId>,
    pub locked: bool,
}

impl Lock {
    pub fn new(owner: ActorId) -> Self {
        Self {
            owner: Some(owner),
            authorized: vec![owner],
            locked: true,
        }
    }

    /// An unlocked lock opens for anyone.
    pub fn can_open(&self, actor: ActorId) -> bool {
        !self.locked || self.owner == Some(actor) || self.authorized.contains(&actor)
    }
}

/// A discrete object placed or spawned in the world.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    pub id: EntityId,
    /// Prefab short name used as the pricing / configuration key.
    pub prefab: String,
    pub kind: EntityKind,
    capabilities: Capabilities,
    pub grade: Option<Grade>,
    pub position: Position,
    pub owner: Option<ActorId>,
    pub destroyed: bool,
    /// Health as a fraction of maximum health.
    pub health: f32,
    /// `None` when the spawn time was never tracked.
    pub spawned_at: Option<Timestamp>,
    pub contents: Option<Inventory>,
    pub structure: Option<StructureId>,
    pub lock: Option<Lock>,
    pub skin: u64,
    /// Item that deploys this entity; refunding it mirrors condition and skin.
    pub item: Option<String>,
    /// Object a concealed entity is hidden under.
    pub anchor: Option<EntityId>,
}

impl Entity {
    /// Creates a full-health entity and caches its capabilities.
    pub fn new(
        id: EntityId,
        prefab: impl Into<String>,
        kind: EntityKind,
        position: Position,
        spawned_at: Timestamp,
    ) -> Self {
        Self {
            id,
            prefab: prefab.into(),
            kind,
            capabilities: kind.capabilities(),
            grade: None,
            position,
            owner: None,
            destroyed: false,
            health: 1.0,
            spawned_at: Some(spawned_at),
            contents: kind
                .capabilities()
                .contains(Capabilities::STORAGE)
                .then(Inventory::empty),
            structure: None,
            lock: None,
            skin: 0,
            item: None,
            anchor: None,
        }
    }

    pub fn with_owner(mut self, owner: ActorId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_grade(mut self, grade: Grade) -> Self {
        self.grade = Some(grade);
        self
    }

    pub fn with_structure(mut self, structure: StructureId) -> Self {
        self.structure = Some(structure);
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health.clamp(0.0, 1.0);
        self
    }

    pub fn with_contents(mut self, contents: Inventory) -> Self {
        self.contents = Some(contents);
        self
    }

    pub fn with_lock(mut self, lock: Lock) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_skin(mut self, skin: u64) -> Self {
        self.skin = skin;
        self
    }

    pub fn with_anchor(mut self, anchor: EntityId) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Marks the spawn time as unknown (entities restored from old saves).
    pub fn without_spawn_time(mut self) -> Self {
        self.spawned_at = None;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_structural(&self) -> bool {
        self.has(Capabilities::STRUCTURAL)
    }

    /// Exterior-facing structural segment.
    pub fn is_exterior_segment(&self) -> bool {
        self.has(Capabilities::STRUCTURAL | Capabilities::EXTERIOR)
    }

    pub fn has_contents(&self) -> bool {
        self.contents
            .as_ref()
            .is_some_and(|contents| !contents.is_empty())
    }

    /// Seconds since spawn, if tracked.
    pub fn age(&self, now: Timestamp) -> Option<f64> {
        self.spawned_at.map(|spawned| now.since(spawned))
    }
}
