//! Optional collaborator hooks consulted during a removal attempt.

use crate::pricing::CostEntry;
use crate::state::{Actor, ActorId, Entity};

/// External rule that may unconditionally deny a removal.
pub trait AuthorizationVeto {
    /// Returns the denial message, or `None` to allow.
    fn veto(&self, actor: &Actor, entity: &Entity) -> Option<String>;
}

/// Display and cost data supplied by an external plugin for one entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityInfo {
    pub display_name: String,
    pub image_id: Option<String>,
    pub price: Vec<CostEntry>,
    pub refund: Vec<CostEntry>,
}

/// Replaces the configured price and refund of selected entities.
pub trait InfoOverride {
    fn info(&self, entity: &Entity, actor: &Actor) -> Option<EntityInfo>;
}

/// Fallback for currency names no provider is registered under.
///
/// Every method defaults to refusing, which denies the unknown currency.
pub trait CurrencyOverride {
    fn can_pay(&self, _actor: ActorId, _currency: &str, _amount: f64) -> bool {
        false
    }

    fn collect(&self, _actor: ActorId, _currency: &str, _amount: f64) -> bool {
        false
    }

    fn refund(&self, _actor: ActorId, _currency: &str, _amount: f64) -> bool {
        false
    }
}

/// Team / friend / clan membership functions of the host's social systems.
pub trait RelationOracle {
    fn are_teammates(&self, _a: ActorId, _b: ActorId) -> bool {
        false
    }

    fn are_friends(&self, _a: ActorId, _b: ActorId) -> bool {
        false
    }

    fn are_clanmates(&self, _a: ActorId, _b: ActorId) -> bool {
        false
    }
}

/// Relation oracle for hosts without social systems.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRelations;

impl RelationOracle for NoRelations {}
