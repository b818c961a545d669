//! Collaborator bundle owned by the runtime.
//!
//! [`OracleManager`] keeps the static content tables and the host's boxed
//! hooks together so the runtime can lend a [`ReclaimEnv`] on every command.

use reclaim_core::{
    AuthorizationVeto, BuildCostTable, CurrencyOverride, CurrencyRegistry, InfoOverride,
    ItemCatalog, RayTargeting, ReclaimEnv, RelationOracle, TargetOracle,
};

pub struct OracleManager {
    pub(crate) target: Box<dyn TargetOracle>,
    pub(crate) items: ItemCatalog,
    pub(crate) costs: BuildCostTable,
    pub(crate) currencies: CurrencyRegistry,
    pub(crate) relations: Option<Box<dyn RelationOracle>>,
    pub(crate) veto: Option<Box<dyn AuthorizationVeto>>,
    pub(crate) info: Option<Box<dyn InfoOverride>>,
    pub(crate) currency_override: Option<Box<dyn CurrencyOverride>>,
}

impl Default for OracleManager {
    fn default() -> Self {
        Self {
            target: Box::new(RayTargeting::default()),
            items: ItemCatalog::new(),
            costs: BuildCostTable::new(),
            currencies: CurrencyRegistry::new(),
            relations: None,
            veto: None,
            info: None,
            currency_override: None,
        }
    }
}

impl OracleManager {
    /// Borrows every collaborator as a [`ReclaimEnv`] for one command.
    pub fn as_env(&self) -> ReclaimEnv<'_> {
        let mut env = ReclaimEnv::empty()
            .with_target(self.target.as_ref())
            .with_items(&self.items)
            .with_construction(&self.costs)
            .with_currencies(&self.currencies);
        if let Some(relations) = &self.relations {
            env = env.with_relations(relations.as_ref());
        }
        if let Some(veto) = &self.veto {
            env = env.with_veto(veto.as_ref());
        }
        if let Some(info) = &self.info {
            env = env.with_info_override(info.as_ref());
        }
        if let Some(hook) = &self.currency_override {
            env = env.with_currency_override(hook.as_ref());
        }
        env
    }

    pub fn items(&self) -> &ItemCatalog {
        &self.items
    }

    pub fn currencies(&self) -> &CurrencyRegistry {
        &self.currencies
    }
}
