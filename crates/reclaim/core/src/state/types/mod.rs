mod actor;
mod common;
mod entity;
mod inventory;

pub use actor::{Actor, Permissions};
pub use common::{ActorId, EntityId, Position, StructureId, Timestamp, ViewRay};
pub use entity::{Capabilities, Entity, EntityKind, Grade, Lock};
pub use inventory::{InsufficientItems, Inventory, ItemStack};
