//! Policy knobs for sessions, authorization, pricing, raid blocking and sweeps.

use std::collections::{BTreeMap, BTreeSet};

use crate::pricing::{CostEntry, GradeCost};
use crate::session::SessionMode;
use crate::state::Grade;

/// Top-level configuration consumed by [`crate::engine::ReclaimEngine`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReclaimConfig {
    pub session: SessionPolicy,
    pub authorization: AuthorizationPolicy,
    pub pricing: PricingPolicy,
    pub raid_block: RaidBlockPolicy,
    pub sweep: SweepPolicy,
}

impl ReclaimConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_INVENTORY_SLOTS: usize = 36;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_DISTANCE: f32 = 3.0;
    pub const DEFAULT_ADMIN_DISTANCE: f32 = 20.0;
    pub const DEFAULT_BATCH_DISTANCE: f32 = 10.0;
    pub const DEFAULT_STACK_SIZE: u32 = 1000;
    pub const DEFAULT_RAID_BLOCK_SECS: f64 = 300.0;
    pub const DEFAULT_RAID_BLOCK_RADIUS: f32 = 50.0;
    pub const DEFAULT_QUERY_RADIUS: f32 = 3.0;
    pub const DEFAULT_DELETIONS_PER_STEP: usize = 8;
    pub const DEFAULT_QUERIES_PER_STEP: usize = 16;

    pub fn new() -> Self {
        Self::default()
    }
}

/// Session activation and targeting policy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionPolicy {
    /// Seconds an actor must wait after a session ends before activating again.
    pub cooldown: f64,
    /// Global switch that disables every session not holding `OVERRIDE`/`ADMIN`.
    pub override_enabled: bool,
    pub normal_distance: f32,
    pub admin_distance: f32,
    /// Distance for `BatchAll`, `Structure` and `External` sessions.
    pub batch_distance: f32,
}

impl SessionPolicy {
    /// Maximum interaction distance for `mode`.
    pub fn max_distance(&self, mode: SessionMode) -> f32 {
        match mode {
            SessionMode::Normal => self.normal_distance,
            SessionMode::Admin => self.admin_distance,
            SessionMode::BatchAll | SessionMode::Structure | SessionMode::External => {
                self.batch_distance
            }
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            cooldown: 0.0,
            override_enabled: false,
            normal_distance: ReclaimConfig::DEFAULT_MAX_DISTANCE,
            admin_distance: ReclaimConfig::DEFAULT_ADMIN_DISTANCE,
            batch_distance: ReclaimConfig::DEFAULT_BATCH_DISTANCE,
        }
    }
}

/// Eligibility rules evaluated by the authorization chain.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AuthorizationPolicy {
    /// Prefabs normal sessions may remove; `None` allows every prefab.
    pub removable: Option<BTreeSet<String>>,
    /// Minimum health percentage (0-100) required to remove; 0 disables the rule.
    pub damage_threshold: f32,
    pub damage_exempt_structural: bool,
    /// Objects that cannot be repaired by purchase are never blocked by damage.
    pub damage_exempt_unrepairable: bool,
    /// Maximum entity age in seconds; `None` disables the age ceiling.
    pub max_age: Option<f64>,
    pub forbid_nonempty_containers: bool,
    pub allow_teammates: bool,
    pub allow_friends: bool,
    pub allow_clanmates: bool,
    /// Also require building privilege and every lock in the structure.
    pub require_structure_privilege: bool,
    /// Refuse removals that would expose a concealed stash.
    pub protect_concealed: bool,
}

impl AuthorizationPolicy {
    pub fn is_removable(&self, prefab: &str) -> bool {
        self.removable
            .as_ref()
            .is_none_or(|allowed| allowed.contains(prefab))
    }
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self {
            removable: None,
            damage_threshold: 0.0,
            damage_exempt_structural: false,
            damage_exempt_unrepairable: true,
            max_age: None,
            forbid_nonempty_containers: true,
            allow_teammates: true,
            allow_friends: false,
            allow_clanmates: false,
            require_structure_privilege: false,
            protect_concealed: true,
        }
    }
}

/// Static price / refund tables and rounding rules.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PricingPolicy {
    /// Decimal places kept for non-graded amounts.
    pub precision: u32,
    /// Max stack size used when handing out refund items.
    pub stack_size: u32,
    /// Per-grade pricing for building blocks, keyed by grade name (`"stone"`).
    pub graded: BTreeMap<String, GradePricing>,
    /// Per-prefab static tables.
    pub entries: BTreeMap<String, PriceEntry>,
}

impl PricingPolicy {
    pub fn grade(&self, grade: Grade) -> Option<&GradePricing> {
        self.graded.get(grade.as_ref())
    }

    pub fn entry(&self, prefab: &str) -> Option<&PriceEntry> {
        self.entries.get(prefab)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            precision: 0,
            stack_size: ReclaimConfig::DEFAULT_STACK_SIZE,
            graded: BTreeMap::new(),
            entries: BTreeMap::new(),
        }
    }
}

/// Price and refund rule for one construction grade.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradePricing {
    pub price: GradeCost,
    pub refund: GradeCost,
}

/// Static price and refund lists for one prefab.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PriceEntry {
    pub price: Vec<CostEntry>,
    pub refund: Vec<CostEntry>,
}

/// Time-windowed denial after unauthorized structural damage.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RaidBlockPolicy {
    pub enabled: bool,
    /// Block the damaged structure cluster.
    pub block_structure: bool,
    /// Block every actor near the damage.
    pub block_actors: bool,
    pub radius: f32,
    /// Block window in seconds.
    pub duration: f64,
    /// Seconds between sweeps of expired entries; 0 disables pruning.
    pub prune_interval: f64,
}

impl Default for RaidBlockPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            block_structure: true,
            block_actors: true,
            radius: ReclaimConfig::DEFAULT_RAID_BLOCK_RADIUS,
            duration: ReclaimConfig::DEFAULT_RAID_BLOCK_SECS,
            prune_interval: 600.0,
        }
    }
}

/// What happens to container contents before a sweep deletes the container.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContainerDisposal {
    /// Contents vanish together with the container.
    #[default]
    Retain,
    DropToGround,
    Discard,
}

/// Work budget of the cooperative batch sweeps.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SweepPolicy {
    /// Radius of each flood-fill spatial query.
    pub query_radius: f32,
    /// Spatial queries performed per resumption during discovery.
    pub queries_per_step: usize,
    /// Deletions performed per resumption.
    pub deletions_per_step: usize,
    pub containers: ContainerDisposal,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            query_radius: ReclaimConfig::DEFAULT_QUERY_RADIUS,
            queries_per_step: ReclaimConfig::DEFAULT_QUERIES_PER_STEP,
            deletions_per_step: ReclaimConfig::DEFAULT_DELETIONS_PER_STEP,
            containers: ContainerDisposal::Retain,
        }
    }
}
