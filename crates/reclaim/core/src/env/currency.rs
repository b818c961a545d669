//! Named (non-item) currencies backed by external economy systems.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::state::ActorId;

/// External component resolving one named payment type.
pub trait CurrencyProvider {
    fn check_balance(&self, actor: ActorId, amount: f64) -> bool;
    fn withdraw(&self, actor: ActorId, amount: f64) -> bool;
    fn deposit(&self, actor: ActorId, amount: f64) -> bool;
}

/// Currency providers keyed by the name used in price tables.
#[derive(Default)]
pub struct CurrencyRegistry {
    providers: BTreeMap<String, Box<dyn CurrencyProvider>>,
}

impl CurrencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, provider: impl CurrencyProvider + 'static) {
        self.providers.insert(name.into(), Box::new(provider));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.providers.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn CurrencyProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for CurrencyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Balance book kept in memory, for hosts without an economy backend and for tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: RefCell<BTreeMap<ActorId, f64>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, actor: ActorId, amount: f64) -> Self {
        self.balances.borrow_mut().insert(actor, amount);
        self
    }

    pub fn balance(&self, actor: ActorId) -> f64 {
        self.balances.borrow().get(&actor).copied().unwrap_or(0.0)
    }
}

impl CurrencyProvider for MemoryLedger {
    fn check_balance(&self, actor: ActorId, amount: f64) -> bool {
        self.balance(actor) >= amount
    }

    fn withdraw(&self, actor: ActorId, amount: f64) -> bool {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.entry(actor).or_insert(0.0);
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        true
    }

    fn deposit(&self, actor: ActorId, amount: f64) -> bool {
        *self.balances.borrow_mut().entry(actor).or_insert(0.0) += amount;
        true
    }
}

/// Shared handle so a host can keep inspecting a ledger it registered.
impl<T: CurrencyProvider + ?Sized> CurrencyProvider for std::rc::Rc<T> {
    fn check_balance(&self, actor: ActorId, amount: f64) -> bool {
        (**self).check_balance(actor, amount)
    }

    fn withdraw(&self, actor: ActorId, amount: f64) -> bool {
        (**self).withdraw(actor, amount)
    }

    fn deposit(&self, actor: ActorId, amount: f64) -> bool {
        (**self).deposit(actor, amount)
    }
}
