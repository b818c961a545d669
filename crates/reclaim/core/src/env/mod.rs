//! Collaborator traits the reclamation rules consult.
//!
//! Oracles expose read-only host data (target acquisition, item templates,
//! build costs, social relations) and optional hooks let external plugins veto
//! removals or override prices. The [`ReclaimEnv`] aggregate bundles them so
//! the engine can reach everything it needs without hard coupling to concrete
//! implementations.
mod currency;
mod error;
mod hooks;
mod items;
mod target;

pub use currency::{CurrencyProvider, CurrencyRegistry, MemoryLedger};
pub use error::OracleError;
pub use hooks::{
    AuthorizationVeto, CurrencyOverride, EntityInfo, InfoOverride, NoRelations, RelationOracle,
};
pub use items::{BuildCostTable, ConstructionOracle, ItemCatalog, ItemDefinition, ItemOracle};
pub use target::{LayerMask, RayTargeting, TargetOracle};

static NO_RELATIONS: NoRelations = NoRelations;

/// Aggregates the collaborators required by the engine and sessions.
#[derive(Clone, Copy)]
pub struct ReclaimEnv<'a> {
    target: Option<&'a dyn TargetOracle>,
    items: Option<&'a dyn ItemOracle>,
    construction: Option<&'a dyn ConstructionOracle>,
    relations: Option<&'a dyn RelationOracle>,
    currencies: Option<&'a CurrencyRegistry>,
    veto: Option<&'a dyn AuthorizationVeto>,
    info: Option<&'a dyn InfoOverride>,
    currency_override: Option<&'a dyn CurrencyOverride>,
}

impl<'a> ReclaimEnv<'a> {
    pub fn empty() -> Self {
        Self {
            target: None,
            items: None,
            construction: None,
            relations: None,
            currencies: None,
            veto: None,
            info: None,
            currency_override: None,
        }
    }

    pub fn with_target(mut self, target: &'a dyn TargetOracle) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_items(mut self, items: &'a dyn ItemOracle) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_construction(mut self, construction: &'a dyn ConstructionOracle) -> Self {
        self.construction = Some(construction);
        self
    }

    pub fn with_relations(mut self, relations: &'a dyn RelationOracle) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn with_currencies(mut self, currencies: &'a CurrencyRegistry) -> Self {
        self.currencies = Some(currencies);
        self
    }

    pub fn with_veto(mut self, veto: &'a dyn AuthorizationVeto) -> Self {
        self.veto = Some(veto);
        self
    }

    pub fn with_info_override(mut self, info: &'a dyn InfoOverride) -> Self {
        self.info = Some(info);
        self
    }

    pub fn with_currency_override(mut self, hook: &'a dyn CurrencyOverride) -> Self {
        self.currency_override = Some(hook);
        self
    }

    /// Returns the TargetOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::TargetNotAvailable` if no target oracle was provided.
    pub fn target(&self) -> Result<&'a dyn TargetOracle, OracleError> {
        self.target.ok_or(OracleError::TargetNotAvailable)
    }

    /// Returns the ItemOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::ItemsNotAvailable` if no item oracle was provided.
    pub fn items(&self) -> Result<&'a dyn ItemOracle, OracleError> {
        self.items.ok_or(OracleError::ItemsNotAvailable)
    }

    /// Returns the ConstructionOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::ConstructionNotAvailable` if none was provided.
    pub fn construction(&self) -> Result<&'a dyn ConstructionOracle, OracleError> {
        self.construction
            .ok_or(OracleError::ConstructionNotAvailable)
    }

    /// Social relations; hosts without one behave as if nobody is related.
    pub fn relations(&self) -> &'a dyn RelationOracle {
        self.relations.unwrap_or(&NO_RELATIONS)
    }

    /// Provider registered under `name`, if any.
    pub fn currency(&self, name: &str) -> Option<&'a dyn CurrencyProvider> {
        self.currencies.and_then(|registry| registry.get(name))
    }

    pub fn veto(&self) -> Option<&'a dyn AuthorizationVeto> {
        self.veto
    }

    pub fn info_override(&self) -> Option<&'a dyn InfoOverride> {
        self.info
    }

    pub fn currency_override(&self) -> Option<&'a dyn CurrencyOverride> {
        self.currency_override
    }

    /// True when `key` names an item template (a direct currency).
    pub fn is_item(&self, key: &str) -> bool {
        self.items.is_some_and(|items| items.is_item(key))
    }
}

impl Default for ReclaimEnv<'_> {
    fn default() -> Self {
        Self::empty()
    }
}
