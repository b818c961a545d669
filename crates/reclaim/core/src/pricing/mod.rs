//! Price and refund resolution.
//!
//! A [`RemovalQuote`] is computed once per removal attempt and threaded through
//! authorization (affordability), payment and refund. Resolution order:
//!
//! 1. an [`InfoOverride`](crate::env::InfoOverride) hook may supply the whole quote
//! 2. graded building blocks use the per-grade rule (fixed list or percentage
//!    of the nominal build cost)
//! 3. everything else uses the static per-prefab table
//!
//! Percentage-derived amounts round to whole units; static amounts round to
//! [`PricingPolicy::precision`] decimals.
mod error;
mod payment;

pub use error::{PaymentError, PricingError};
pub use payment::{RefundOutcome, RefundPlan, check_affordability, collect, plan_refund};

use crate::config::{GradePricing, PricingPolicy};
use crate::env::ReclaimEnv;
use crate::state::{Actor, Entity};

/// One (currency, amount) pair of a price or refund list.
///
/// `currency` is either an item short name (direct currency held in the
/// inventory) or the name of a registered external currency provider.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostEntry {
    pub currency: String,
    pub amount: f64,
}

impl CostEntry {
    pub fn new(currency: impl Into<String>, amount: f64) -> Self {
        Self {
            currency: currency.into(),
            amount,
        }
    }

    /// Whole item count for direct currencies.
    pub fn quantity(&self) -> u32 {
        self.amount.max(0.0).round() as u32
    }
}

/// Per-grade price or refund rule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GradeCost {
    /// Percentage (0-100) of the grade's nominal build cost.
    Percentage(f64),
    /// Explicit list, independent of the build cost.
    Fixed(Vec<CostEntry>),
}

/// Strongly-typed cost data for one removal attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemovalQuote {
    pub display_name: String,
    pub image_id: Option<String>,
    pub price: Vec<CostEntry>,
    pub refund: Vec<CostEntry>,
}

impl RemovalQuote {
    pub fn is_free(&self) -> bool {
        self.price.is_empty()
    }
}

/// Resolves the price and refund of removing `entity` for `actor`.
///
/// # Errors
///
/// Returns [`PricingError::MissingBuildCost`] when a percentage grade rule
/// applies but the nominal build cost of the grade is unknown.
pub fn resolve_quote(
    entity: &Entity,
    actor: &Actor,
    policy: &PricingPolicy,
    env: &ReclaimEnv<'_>,
) -> Result<RemovalQuote, PricingError> {
    if let Some(info) = env
        .info_override()
        .and_then(|hook| hook.info(entity, actor))
    {
        return Ok(RemovalQuote {
            display_name: info.display_name,
            image_id: info.image_id,
            price: retain_positive(info.price),
            refund: retain_positive(info.refund),
        });
    }

    let display_name = env
        .items()
        .ok()
        .and_then(|items| entity.item.as_deref().and_then(|key| items.definition(key)))
        .map(|definition| definition.display_name.clone())
        .unwrap_or_else(|| entity.prefab.clone());

    let graded = entity
        .grade
        .and_then(|grade| policy.grade(grade).map(|rule| (grade, rule)));

    let (price, refund) = match graded {
        Some((grade, GradePricing { price, refund })) => (
            graded_cost(entity, grade, price, policy.precision, env)?,
            graded_cost(entity, grade, refund, policy.precision, env)?,
        ),
        None => match policy.entry(&entity.prefab) {
            Some(entry) => (
                round_all(&entry.price, policy.precision),
                round_all(&entry.refund, policy.precision),
            ),
            None => (Vec::new(), Vec::new()),
        },
    };

    Ok(RemovalQuote {
        display_name,
        image_id: None,
        price: retain_positive(price),
        refund: retain_positive(refund),
    })
}

fn graded_cost(
    entity: &Entity,
    grade: crate::state::Grade,
    rule: &GradeCost,
    precision: u32,
    env: &ReclaimEnv<'_>,
) -> Result<Vec<CostEntry>, PricingError> {
    match rule {
        GradeCost::Fixed(entries) => Ok(round_all(entries, precision)),
        GradeCost::Percentage(percent) => {
            let nominal = env
                .construction()
                .ok()
                .and_then(|construction| construction.build_cost(&entity.prefab, grade))
                .ok_or_else(|| PricingError::MissingBuildCost {
                    prefab: entity.prefab.clone(),
                    grade,
                })?;
            Ok(nominal
                .into_iter()
                .map(|entry| CostEntry {
                    amount: (entry.amount * percent / 100.0).round(),
                    currency: entry.currency,
                })
                .collect())
        }
    }
}

fn round_all(entries: &[CostEntry], precision: u32) -> Vec<CostEntry> {
    entries
        .iter()
        .map(|entry| CostEntry {
            currency: entry.currency.clone(),
            amount: round_to(entry.amount, precision),
        })
        .collect()
}

/// Rounds `value` to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(12) as i32);
    (value * factor).round() / factor
}

fn retain_positive(entries: Vec<CostEntry>) -> Vec<CostEntry> {
    entries.into_iter().filter(|entry| entry.amount > 0.0).collect()
}
