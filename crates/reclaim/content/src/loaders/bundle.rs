//! Directory-level content loading.

use std::path::Path;

use reclaim_core::{BuildCostTable, ItemCatalog, ReclaimConfig};

use crate::loaders::{BuildCostLoader, ConfigLoader, ItemLoader, LoadResult};

/// Everything a host needs to wire the engine, loaded from one directory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentBundle {
    pub config: ReclaimConfig,
    pub items: ItemCatalog,
    pub costs: BuildCostTable,
}

impl ContentBundle {
    pub const CONFIG_FILE: &'static str = "reclaim.toml";
    pub const ITEMS_FILE: &'static str = "items.toml";
    pub const COSTS_FILE: &'static str = "build_costs.toml";

    /// Loads `reclaim.toml`, `items.toml` and `build_costs.toml` from `dir`.
    ///
    /// Missing files fall back to defaults / empty tables; malformed files fail.
    pub fn load(dir: &Path) -> LoadResult<Self> {
        let config_path = dir.join(Self::CONFIG_FILE);
        let items_path = dir.join(Self::ITEMS_FILE);
        let costs_path = dir.join(Self::COSTS_FILE);

        Ok(Self {
            config: if config_path.exists() {
                ConfigLoader::load(&config_path)?
            } else {
                ReclaimConfig::default()
            },
            items: if items_path.exists() {
                ItemLoader::load(&items_path)?
            } else {
                ItemCatalog::new()
            },
            costs: if costs_path.exists() {
                BuildCostLoader::load(&costs_path)?
            } else {
                BuildCostTable::new()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ContentBundle::load(dir.path()).unwrap();
        assert_eq!(bundle, ContentBundle::default());
    }

    #[test]
    fn malformed_file_fails_the_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ContentBundle::ITEMS_FILE), "items = 3").unwrap();
        assert!(ContentBundle::load(dir.path()).is_err());
    }

    #[test]
    fn loads_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(ContentBundle::CONFIG_FILE),
            "[sweep]\nqueries_per_step = 4\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(ContentBundle::ITEMS_FILE),
            "[[items]]\nkey = \"wood\"\ndisplay_name = \"Wood\"\nmax_stack = 1000\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(ContentBundle::COSTS_FILE),
            "[wall]\nwood = [{ currency = \"wood\", amount = 200.0 }]\n",
        )
        .unwrap();

        let bundle = ContentBundle::load(dir.path()).unwrap();
        assert_eq!(bundle.config.sweep.queries_per_step, 4);
        assert_eq!(bundle.items.len(), 1);
        assert_ne!(bundle.costs, BuildCostTable::new());
    }
}
