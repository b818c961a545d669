//! Item catalog loader.

use std::path::Path;

use reclaim_core::{ItemCatalog, ItemDefinition};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Item catalog layout of TOML files (`[[items]]` tables).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItemFile {
    items: Vec<ItemDefinition>,
}

/// Loader for item catalogs from TOML files.
pub struct ItemLoader;

impl ItemLoader {
    /// Load an item catalog from a TOML file.
    ///
    /// Duplicate keys are rejected so a typo cannot silently shadow an item.
    pub fn load(path: &Path) -> LoadResult<ItemCatalog> {
        let content = read_file(path)?;
        let file: ItemFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog TOML: {}", e))?;

        let mut catalog = ItemCatalog::new();
        for definition in file.items {
            if reclaim_core::ItemOracle::is_item(&catalog, &definition.key) {
                anyhow::bail!("duplicate item '{}' in {}", definition.key, path.display());
            }
            catalog.insert(definition);
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use reclaim_core::ItemOracle;

    use super::*;

    #[test]
    fn loads_item_tables() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[items]]
key = "wood"
display_name = "Wood"
max_stack = 1000

[[items]]
key = "box.wooden.large"
display_name = "Large Wood Box"
max_stack = 1
"#
        )
        .unwrap();

        let catalog = ItemLoader::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.definition("box.wooden.large").unwrap().max_stack, 1);
        assert!(!catalog.is_item("economics"));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[items]]
key = "wood"
display_name = "Wood"
max_stack = 1000

[[items]]
key = "wood"
display_name = "More Wood"
max_stack = 10
"#
        )
        .unwrap();

        let err = ItemLoader::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate item 'wood'"));
    }
}
