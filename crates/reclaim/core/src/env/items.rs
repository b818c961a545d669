//! Item templates and nominal construction costs.

use std::collections::BTreeMap;

use crate::pricing::CostEntry;
use crate::state::Grade;

/// Template used to create refund items.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub key: String,
    pub display_name: String,
    pub max_stack: u32,
}

impl ItemDefinition {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>, max_stack: u32) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            max_stack,
        }
    }
}

/// Item template lookup.
///
/// Currency keys naming a known item are treated as direct (inventory-held)
/// currencies; everything else is a named external currency.
pub trait ItemOracle {
    fn definition(&self, key: &str) -> Option<&ItemDefinition>;

    fn is_item(&self, key: &str) -> bool {
        self.definition(key).is_some()
    }
}

/// In-memory item catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemCatalog {
    items: BTreeMap<String, ItemDefinition>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, definition: ItemDefinition) -> Self {
        self.insert(definition);
        self
    }

    pub fn insert(&mut self, definition: ItemDefinition) {
        self.items.insert(definition.key.clone(), definition);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ItemDefinition> for ItemCatalog {
    fn from_iter<T: IntoIterator<Item = ItemDefinition>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.insert(definition);
        }
        catalog
    }
}

impl ItemOracle for ItemCatalog {
    fn definition(&self, key: &str) -> Option<&ItemDefinition> {
        self.items.get(key)
    }
}

/// Nominal cost of building a prefab at a given grade.
pub trait ConstructionOracle {
    fn build_cost(&self, prefab: &str, grade: Grade) -> Option<Vec<CostEntry>>;
}

/// In-memory build cost table keyed by prefab and grade name.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildCostTable {
    costs: BTreeMap<String, BTreeMap<String, Vec<CostEntry>>>,
}

impl BuildCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prefab: &str, grade: Grade, cost: Vec<CostEntry>) -> Self {
        self.insert(prefab, grade, cost);
        self
    }

    pub fn insert(&mut self, prefab: &str, grade: Grade, cost: Vec<CostEntry>) {
        self.costs
            .entry(prefab.to_owned())
            .or_default()
            .insert(grade.as_ref().to_owned(), cost);
    }
}

impl ConstructionOracle for BuildCostTable {
    fn build_cost(&self, prefab: &str, grade: Grade) -> Option<Vec<CostEntry>> {
        self.costs.get(prefab)?.get(grade.as_ref()).cloned()
    }
}
