//! Two-phase payment and refund execution.
//!
//! Charging is check-then-commit: every currency of the price set is verified
//! before any is consumed. Should a provider still refuse a withdrawal during
//! commit, the currencies already taken are handed back before the error is
//! returned, so a failed payment never leaves a partial charge behind.

use crate::env::ReclaimEnv;
use crate::state::{Actor, ActorId, Entity, ItemStack};

use super::{CostEntry, PaymentError, PricingError};

/// How a currency key resolves against the env.
enum Currency<'e> {
    Item,
    Provider(&'e dyn crate::env::CurrencyProvider),
    Unknown,
}

fn classify<'e>(key: &str, env: &ReclaimEnv<'e>) -> Currency<'e> {
    if env.is_item(key) {
        Currency::Item
    } else if let Some(provider) = env.currency(key) {
        Currency::Provider(provider)
    } else {
        Currency::Unknown
    }
}

/// Sums repeated currency keys, keeping first-appearance order.
fn merged(price: &[CostEntry]) -> Vec<CostEntry> {
    let mut totals: Vec<CostEntry> = Vec::with_capacity(price.len());
    for entry in price {
        match totals.iter_mut().find(|total| total.currency == entry.currency) {
            Some(total) => total.amount += entry.amount,
            None => totals.push(entry.clone()),
        }
    }
    totals
}

/// Verifies that `actor` can pay every entry of `price`.
///
/// Entries naming the same currency are checked against their sum.
///
/// # Errors
///
/// Returns [`PaymentError::Insufficient`] listing every unaffordable currency;
/// for items the listed amount is the shortfall.
pub fn check_affordability(
    actor: &Actor,
    price: &[CostEntry],
    env: &ReclaimEnv<'_>,
) -> Result<(), PaymentError> {
    let missing: Vec<CostEntry> = merged(price)
        .iter()
        .filter_map(|entry| shortfall(actor, entry, env))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PaymentError::Insufficient { missing })
    }
}

fn shortfall(actor: &Actor, entry: &CostEntry, env: &ReclaimEnv<'_>) -> Option<CostEntry> {
    let affordable = match classify(&entry.currency, env) {
        Currency::Item => {
            let held = actor.inventory.count(&entry.currency);
            let needed = entry.quantity();
            if held < needed {
                return Some(CostEntry::new(
                    entry.currency.clone(),
                    f64::from(needed - held),
                ));
            }
            true
        }
        Currency::Provider(provider) => provider.check_balance(actor.id, entry.amount),
        Currency::Unknown => env
            .currency_override()
            .is_some_and(|hook| hook.can_pay(actor.id, &entry.currency, entry.amount)),
    };
    (!affordable).then(|| entry.clone())
}

/// Charges `price` to `actor`, all or nothing.
///
/// # Errors
///
/// - [`PaymentError::Insufficient`] when the affordability check fails; nothing is charged.
/// - [`PaymentError::WithdrawFailed`] when a commit step fails; the inventory
///   is restored as it was and provider withdrawals are deposited back.
pub fn collect(
    actor: &mut Actor,
    price: &[CostEntry],
    env: &ReclaimEnv<'_>,
) -> Result<(), PaymentError> {
    check_affordability(actor, price, env)?;

    let price = merged(price);
    let inventory = actor.inventory.clone();
    let mut committed: Vec<&CostEntry> = Vec::with_capacity(price.len());
    for entry in &price {
        let ok = match classify(&entry.currency, env) {
            Currency::Item => actor
                .inventory
                .take(&entry.currency, entry.quantity())
                .is_ok(),
            Currency::Provider(provider) => provider.withdraw(actor.id, entry.amount),
            Currency::Unknown => env
                .currency_override()
                .is_some_and(|hook| hook.collect(actor.id, &entry.currency, entry.amount)),
        };

        if !ok {
            actor.inventory = inventory;
            rollback(actor.id, &committed, env);
            return Err(PaymentError::WithdrawFailed {
                currency: entry.currency.clone(),
            });
        }
        committed.push(entry);
    }

    Ok(())
}

/// Returns external withdrawals; item withdrawals are undone by the inventory snapshot.
fn rollback(actor: ActorId, committed: &[&CostEntry], env: &ReclaimEnv<'_>) {
    for entry in committed.iter().rev() {
        match classify(&entry.currency, env) {
            Currency::Item => {}
            Currency::Provider(provider) => {
                provider.deposit(actor, entry.amount);
            }
            Currency::Unknown => {
                if let Some(hook) = env.currency_override() {
                    hook.refund(actor, &entry.currency, entry.amount);
                }
            }
        }
    }
}

/// Refund resolved before the entity is deleted, applied afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefundPlan {
    items: Vec<(ItemStack, u32)>,
    credits: Vec<CostEntry>,
}

/// What a refund actually handed out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefundOutcome {
    pub given: Vec<ItemStack>,
    /// Items that did not fit in the inventory; the caller drops them in the world.
    pub overflow: Vec<ItemStack>,
    pub credited: Vec<CostEntry>,
    /// Named-currency credits a provider or hook refused.
    pub failed: Vec<CostEntry>,
}

impl RefundPlan {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.credits.is_empty()
    }

    /// Gives the planned items and credits to `actor`.
    pub fn apply(self, actor: &mut Actor, env: &ReclaimEnv<'_>) -> RefundOutcome {
        let mut outcome = RefundOutcome::default();

        for (stack, max_stack) in self.items {
            let given = stack.clone();
            match actor.inventory.give(stack, max_stack) {
                Some(overflow) => {
                    let mut placed = given;
                    placed.amount -= overflow.amount;
                    if placed.amount > 0 {
                        outcome.given.push(placed);
                    }
                    outcome.overflow.push(overflow);
                }
                None => outcome.given.push(given),
            }
        }

        for credit in self.credits {
            if deposit(actor.id, &credit, env) {
                outcome.credited.push(credit);
            } else {
                outcome.failed.push(credit);
            }
        }

        outcome
    }
}

fn deposit(actor: ActorId, credit: &CostEntry, env: &ReclaimEnv<'_>) -> bool {
    match env.currency(&credit.currency) {
        Some(provider) => provider.deposit(actor, credit.amount),
        None => env
            .currency_override()
            .is_some_and(|hook| hook.refund(actor, &credit.currency, credit.amount)),
    }
}

/// Resolves the refund of `entity` into concrete item stacks and credits.
///
/// The stack matching the entity's own deploy item mirrors the entity's
/// remaining health as condition and keeps its skin.
///
/// # Errors
///
/// [`PricingError::UnknownRefundCurrency`] for a key that is neither an item,
/// a registered currency, nor handled by a currency override.
pub fn plan_refund(
    entity: &Entity,
    refund: &[CostEntry],
    default_stack: u32,
    env: &ReclaimEnv<'_>,
) -> Result<RefundPlan, PricingError> {
    let mut plan = RefundPlan::default();

    for entry in refund {
        let definition = env
            .items()
            .ok()
            .and_then(|items| items.definition(&entry.currency));
        match definition {
            Some(definition) => {
                let mut stack = ItemStack::new(entry.currency.clone(), entry.quantity());
                if stack.amount == 0 {
                    continue;
                }
                if entity.item.as_deref() == Some(entry.currency.as_str()) {
                    stack = stack.with_condition(entity.health).with_skin(entity.skin);
                }
                let max_stack = if definition.max_stack == 0 {
                    default_stack
                } else {
                    definition.max_stack
                };
                plan.items.push((stack, max_stack));
            }
            None if env.currency(&entry.currency).is_some()
                || env.currency_override().is_some() =>
            {
                plan.credits.push(entry.clone());
            }
            None => {
                return Err(PricingError::UnknownRefundCurrency {
                    prefab: entity.prefab.clone(),
                    currency: entry.currency.clone(),
                });
            }
        }
    }

    Ok(plan)
}
