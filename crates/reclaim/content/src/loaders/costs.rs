//! Nominal build cost loader.

use std::collections::BTreeMap;
use std::path::Path;

use reclaim_core::{BuildCostTable, CostEntry, Grade};

use crate::loaders::{LoadResult, read_file};

/// Loader for per-prefab, per-grade build costs.
///
/// ```toml
/// [wall]
/// stone = [{ currency = "stones", amount = 300.0 }]
/// metal = [{ currency = "metal.fragments", amount = 200.0 }]
/// ```
pub struct BuildCostLoader;

impl BuildCostLoader {
    pub fn load(path: &Path) -> LoadResult<BuildCostTable> {
        let content = read_file(path)?;
        let file: BTreeMap<String, BTreeMap<String, Vec<CostEntry>>> = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse build cost TOML: {}", e))?;

        let mut table = BuildCostTable::new();
        for (prefab, grades) in file {
            for (grade, cost) in grades {
                let grade: Grade = grade.parse().map_err(|_| {
                    anyhow::anyhow!("{}: unknown grade '{}' for '{}'", path.display(), grade, prefab)
                })?;
                table.insert(&prefab, grade, cost);
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use reclaim_core::ConstructionOracle;

    use super::*;

    #[test]
    fn loads_costs_by_grade() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[wall]
stone = [{{ currency = "stones", amount = 300.0 }}]
top_tier = [{{ currency = "metal.refined", amount = 25.0 }}]
"#
        )
        .unwrap();

        let table = BuildCostLoader::load(file.path()).unwrap();
        assert_eq!(
            table.build_cost("wall", Grade::Stone),
            Some(vec![CostEntry::new("stones", 300.0)])
        );
        assert!(table.build_cost("wall", Grade::TopTier).is_some());
        assert!(table.build_cost("wall", Grade::Wood).is_none());
    }

    #[test]
    fn rejects_unknown_grades() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[wall]\nmarble = []").unwrap();

        let err = BuildCostLoader::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("marble"));
    }
}
