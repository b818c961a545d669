//! Deterministic removal rules for an in-world reclamation tool.
//!
//! `reclaim-core` defines the canonical rules (sessions, authorization,
//! pricing, raid blocking, batch sweeps) as pure APIs over a [`WorldState`].
//! Every removal flows through [`engine::ReclaimEngine`]; host collaborators
//! (targeting, currencies, social relations, plugin hooks) plug in through
//! the traits in [`env`].
pub mod auth;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod pricing;
pub mod raid;
pub mod session;
pub mod state;
pub mod sweep;

pub use auth::{AuthContext, DenyReason, Rule, authorize};
pub use config::{
    AuthorizationPolicy, ContainerDisposal, GradePricing, PriceEntry, PricingPolicy,
    RaidBlockPolicy, ReclaimConfig, SessionPolicy, SweepPolicy,
};
pub use engine::{ReclaimEngine, RemovalError, RemovalOutcome, RemovalReceipt, TriggerOutcome};
pub use env::{
    AuthorizationVeto, BuildCostTable, ConstructionOracle, CurrencyOverride, CurrencyProvider,
    CurrencyRegistry, EntityInfo, InfoOverride, ItemCatalog, ItemDefinition, ItemOracle,
    LayerMask, MemoryLedger, OracleError, RayTargeting, ReclaimEnv, RelationOracle,
    TargetOracle,
};
pub use error::{ErrorContext, ErrorSeverity, ReclaimError};
pub use pricing::{
    CostEntry, GradeCost, PaymentError, PricingError, RefundOutcome, RefundPlan, RemovalQuote,
};
pub use raid::{RaidBlockRecord, RaidBlocker};
pub use session::{
    DisableReason, Session, SessionError, SessionMode, SessionParams, SessionState, SessionTable,
};
pub use state::{
    Actor, ActorId, Capabilities, DroppedStack, Entity, EntityId, EntityKind, Grade, Inventory,
    ItemStack, Lock, Permissions, Position, Structure, StructureId, Timestamp, WorldState,
};
pub use sweep::{
    Sweep, SweepError, SweepFilter, SweepKind, SweepLocks, SweepReport, SweepRequest,
    SweepStatus,
};
