//! Removal eligibility.
//!
//! Eligibility is an ordered, short-circuiting chain of independent rules.
//! Each rule is a plain function over an [`AuthContext`]; the first one that
//! denies decides the reported [`DenyReason`]. Privileged sessions evaluate
//! only the leading [`Rule::Target`] and [`Rule::Veto`] rules.
mod error;
mod rules;

pub use error::DenyReason;

use crate::config::ReclaimConfig;
use crate::env::ReclaimEnv;
use crate::pricing::RemovalQuote;
use crate::raid::RaidBlocker;
use crate::session::SessionMode;
use crate::state::{Actor, Entity, Timestamp, WorldState};

/// Everything a rule may read while judging one attempt.
#[derive(Clone, Copy)]
pub struct AuthContext<'a> {
    pub world: &'a WorldState,
    pub actor: &'a Actor,
    pub entity: &'a Entity,
    pub mode: SessionMode,
    /// Whether this attempt charges the quote's price.
    pub pay: bool,
    pub quote: &'a RemovalQuote,
    pub config: &'a ReclaimConfig,
    pub raid: &'a RaidBlocker,
    pub env: ReclaimEnv<'a>,
    pub now: Timestamp,
}

/// Rules in evaluation order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Rule {
    Target,
    Veto,
    Damage,
    RaidBlock,
    Age,
    Container,
    Affordability,
    Access,
    Concealment,
}

type RuleFn = fn(&AuthContext<'_>) -> Result<(), DenyReason>;

const CHAIN: [(Rule, RuleFn); 9] = [
    (Rule::Target, rules::target),
    (Rule::Veto, rules::veto),
    (Rule::Damage, rules::damage),
    (Rule::RaidBlock, rules::raid_block),
    (Rule::Age, rules::age),
    (Rule::Container, rules::container),
    (Rule::Affordability, rules::affordability),
    (Rule::Access, rules::access),
    (Rule::Concealment, rules::concealment),
];

/// Number of leading rules privileged sessions evaluate.
const PRIVILEGED_RULES: usize = 2;

/// Runs the chain, returning the first denial.
pub fn authorize(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    let len = if ctx.mode.is_privileged() {
        PRIVILEGED_RULES
    } else {
        CHAIN.len()
    };
    CHAIN[..len].iter().try_for_each(|(_, rule)| rule(ctx))
}

/// Evaluates a single rule in isolation.
pub fn check(rule: Rule, ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    CHAIN
        .iter()
        .find(|(candidate, _)| *candidate == rule)
        .map_or(Ok(()), |(_, check)| check(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActorId, EntityId, EntityKind, Position};

    #[test]
    fn chain_follows_rule_declaration_order() {
        use strum::IntoEnumIterator;
        let order: Vec<Rule> = CHAIN.iter().map(|(rule, _)| *rule).collect();
        assert_eq!(order, Rule::iter().collect::<Vec<_>>());
    }

    #[test]
    fn first_failing_rule_is_reported() {
        let mut world = WorldState::new();
        let actor = Actor::new(ActorId(1), Position::ORIGIN);
        let entity = Entity::new(
            EntityId(1),
            "box.wooden.large",
            EntityKind::Storage,
            Position::new(0.0, 0.0, 1.0),
            Timestamp::ZERO,
        )
        .with_owner(ActorId(2))
        .with_health(0.1);
        world.insert_entity(entity.clone());

        let mut config = ReclaimConfig::default();
        config.authorization.damage_threshold = 50.0;
        config.authorization.damage_exempt_unrepairable = false;
        let raid = RaidBlocker::new(config.raid_block.clone());
        let quote = RemovalQuote::default();
        let ctx = AuthContext {
            world: &world,
            actor: &actor,
            entity: &entity,
            mode: SessionMode::Normal,
            pay: true,
            quote: &quote,
            config: &config,
            raid: &raid,
            env: ReclaimEnv::empty(),
            now: Timestamp::ZERO,
        };

        // Both damage and ownership fail; damage comes first.
        assert!(matches!(authorize(&ctx), Err(DenyReason::TooDamaged { .. })));
        assert_eq!(check(Rule::Access, &ctx), Err(DenyReason::NotOwner));

        // Admin sessions stop after the veto rule.
        let admin = AuthContext {
            mode: SessionMode::Admin,
            ..ctx
        };
        assert_eq!(authorize(&admin), Ok(()));
    }
}
