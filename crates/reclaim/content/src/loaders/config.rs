//! Reclamation configuration loader.

use std::path::Path;

use reclaim_core::ReclaimConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`ReclaimConfig`] from TOML files.
///
/// Every section and field is optional; omitted values keep their defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<ReclaimConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse config data from TOML text.
    pub fn parse(content: &str) -> LoadResult<ReclaimConfig> {
        let config: ReclaimConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &ReclaimConfig) -> LoadResult<()> {
    let auth = &config.authorization;
    if !(0.0..=100.0).contains(&auth.damage_threshold) {
        anyhow::bail!(
            "authorization.damage_threshold must be within 0..=100, got {}",
            auth.damage_threshold
        );
    }
    if auth.max_age.is_some_and(|age| age < 0.0) {
        anyhow::bail!("authorization.max_age must not be negative");
    }
    if config.raid_block.duration < 0.0 {
        anyhow::bail!("raid_block.duration must not be negative");
    }
    for grade in config.pricing.graded.keys() {
        grade
            .parse::<reclaim_core::Grade>()
            .map_err(|_| anyhow::anyhow!("pricing.graded: unknown grade '{}'", grade))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use reclaim_core::{ContainerDisposal, CostEntry, Grade, GradeCost};

    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = ConfigLoader::parse("").unwrap();
        assert_eq!(config, ReclaimConfig::default());
    }

    #[test]
    fn loads_sections_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[session]
cooldown = 30.0
override_enabled = true

[authorization]
damage_threshold = 60.0
max_age = 3600.0
removable = ["box.wooden.large", "wall"]

[pricing]
precision = 2

[pricing.graded.stone]
price = {{ percentage = 50.0 }}
refund = {{ fixed = [{{ currency = "stones", amount = 20.0 }}] }}

[pricing.entries."box.wooden.large"]
price = [{{ currency = "economics", amount = 12.5 }}]

[raid_block]
duration = 120.0

[sweep]
deletions_per_step = 4
containers = "drop_to_ground"
"#
        )
        .unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.session.cooldown, 30.0);
        assert!(config.session.override_enabled);
        assert_eq!(config.session.normal_distance, ReclaimConfig::DEFAULT_MAX_DISTANCE);
        assert_eq!(config.authorization.max_age, Some(3600.0));
        assert!(config.authorization.is_removable("wall"));
        assert!(!config.authorization.is_removable("door.hinged.wood"));

        let stone = config.pricing.grade(Grade::Stone).unwrap();
        assert_eq!(stone.price, GradeCost::Percentage(50.0));
        assert_eq!(
            stone.refund,
            GradeCost::Fixed(vec![CostEntry::new("stones", 20.0)])
        );
        let entry = config.pricing.entry("box.wooden.large").unwrap();
        assert_eq!(entry.price, vec![CostEntry::new("economics", 12.5)]);
        assert!(entry.refund.is_empty());

        assert_eq!(config.raid_block.duration, 120.0);
        assert!(config.raid_block.enabled);
        assert_eq!(config.sweep.deletions_per_step, 4);
        assert_eq!(config.sweep.containers, ContainerDisposal::DropToGround);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = ConfigLoader::parse("[authorization]\ndamage_threshold = 150.0\n").unwrap_err();
        assert!(err.to_string().contains("damage_threshold"));
    }

    #[test]
    fn rejects_unknown_grade_keys() {
        let err = ConfigLoader::parse(
            "[pricing.graded.marble]\nprice = { percentage = 1.0 }\nrefund = { percentage = 0.0 }\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("marble"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ConfigLoader::load(Path::new("/nonexistent/reclaim.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/reclaim.toml"));
    }
}
