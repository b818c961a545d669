//! Data-driven reclamation content.
//!
//! Provides TOML loaders for:
//! - Rule configuration (sessions, authorization, pricing, raid blocking, sweeps)
//! - Item catalogs used to resolve direct currencies and refund templates
//! - Nominal build costs per prefab and grade
//!
//! Content is consumed by runtime oracles and never appears in world state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{BuildCostLoader, ConfigLoader, ContentBundle, ItemLoader, LoadResult};
