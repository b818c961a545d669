//! The individual eligibility rules, in chain order.

use crate::pricing::{PaymentError, check_affordability};
use crate::session::SessionMode;
use crate::state::{Capabilities, Entity};

use super::{AuthContext, DenyReason};

pub(super) fn target(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    let entity = ctx.entity;
    if entity.destroyed {
        return Err(DenyReason::Destroyed(entity.id));
    }

    let max = ctx.config.session.max_distance(ctx.mode);
    let distance = ctx.actor.position.distance(&entity.position);
    if distance > max {
        return Err(DenyReason::OutOfRange { distance, max });
    }

    if ctx.mode == SessionMode::Normal && !ctx.config.authorization.is_removable(&entity.prefab) {
        return Err(DenyReason::NotRemovable(entity.prefab.clone()));
    }
    Ok(())
}

pub(super) fn veto(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    match ctx.env.veto().and_then(|hook| hook.veto(ctx.actor, ctx.entity)) {
        Some(message) => Err(DenyReason::Vetoed(message)),
        None => Ok(()),
    }
}

fn damage_exempt(ctx: &AuthContext<'_>, entity: &Entity) -> bool {
    let policy = &ctx.config.authorization;
    (policy.damage_exempt_structural && entity.is_structural())
        || (policy.damage_exempt_unrepairable && !entity.has(Capabilities::REPAIRABLE))
}

pub(super) fn damage(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    let threshold = ctx.config.authorization.damage_threshold;
    let health = ctx.entity.health * 100.0;
    if threshold > 0.0 && health < threshold && !damage_exempt(ctx, ctx.entity) {
        return Err(DenyReason::TooDamaged { health, threshold });
    }
    Ok(())
}

pub(super) fn raid_block(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    match ctx
        .raid
        .remaining(ctx.entity.structure, ctx.actor.id, ctx.now)
    {
        Some(remaining) => Err(DenyReason::RaidBlocked {
            remaining_secs: remaining.ceil() as u64,
        }),
        None => Ok(()),
    }
}

pub(super) fn age(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    let Some(max_age) = ctx.config.authorization.max_age else {
        return Ok(());
    };
    match ctx.entity.age(ctx.now) {
        None => Err(DenyReason::UnknownAge),
        Some(age) if age > max_age => Err(DenyReason::TooOld { age, max_age }),
        Some(_) => Ok(()),
    }
}

pub(super) fn container(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    if ctx.config.authorization.forbid_nonempty_containers && ctx.entity.has_contents() {
        return Err(DenyReason::ContainerNotEmpty);
    }
    Ok(())
}

pub(super) fn affordability(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    if !ctx.pay {
        return Ok(());
    }
    check_affordability(ctx.actor, &ctx.quote.price, &ctx.env).map_err(|err| match err {
        PaymentError::Insufficient { missing } => DenyReason::CannotAfford { missing },
        // Checking never withdraws.
        PaymentError::WithdrawFailed { .. } => DenyReason::CannotAfford {
            missing: Vec::new(),
        },
    })
}

fn is_related(ctx: &AuthContext<'_>, entity: &Entity) -> bool {
    let Some(owner) = entity.owner else {
        return false;
    };
    let actor = ctx.actor.id;
    if owner == actor {
        return true;
    }

    let policy = &ctx.config.authorization;
    let relations = ctx.env.relations();
    (policy.allow_teammates && relations.are_teammates(actor, owner))
        || (policy.allow_friends && relations.are_friends(actor, owner))
        || (policy.allow_clanmates && relations.are_clanmates(actor, owner))
}

pub(super) fn access(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    let entity = ctx.entity;
    if !is_related(ctx, entity) {
        return Err(DenyReason::NotOwner);
    }
    if !ctx.config.authorization.require_structure_privilege {
        return Ok(());
    }

    let actor = ctx.actor.id;
    let Some(structure) = entity.structure else {
        return match &entity.lock {
            Some(lock) if !lock.can_open(actor) => Err(DenyReason::LockedOut(entity.id)),
            _ => Ok(()),
        };
    };

    let privileged = ctx
        .world
        .structure(structure)
        .is_some_and(|structure| structure.is_privileged(actor));
    if !privileged {
        return Err(DenyReason::NoStructurePrivilege);
    }

    let locked_out = ctx
        .world
        .entities_in_structure(structure)
        .chain(std::iter::once(entity))
        .find(|member| member.lock.as_ref().is_some_and(|lock| !lock.can_open(actor)));
    match locked_out {
        Some(member) => Err(DenyReason::LockedOut(member.id)),
        None => Ok(()),
    }
}

pub(super) fn concealment(ctx: &AuthContext<'_>) -> Result<(), DenyReason> {
    if ctx.config.authorization.protect_concealed
        && ctx.world.concealed_under(ctx.entity.id).is_some()
    {
        return Err(DenyReason::Concealed);
    }
    Ok(())
}
