use std::path::{Path, PathBuf};

pub const UNIT_TABLE_FILE: &str = "school_department_mapping_cleaned.csv";
pub const TARGET_TABLE_FILE: &str = "iqac_target_plan.csv";

const ENV_WORKSPACE: &str = "IQACD_WORKSPACE";
const ENV_UNITS_PATH: &str = "IQACD_UNITS_PATH";
const ENV_TARGETS_PATH: &str = "IQACD_TARGETS_PATH";

/// Storage locations of the two backing tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub units_path: PathBuf,
    pub targets_path: PathBuf,
}

impl Config {
    pub fn for_workspace(dir: &Path) -> Self {
        Config {
            units_path: dir.join(UNIT_TABLE_FILE),
            targets_path: dir.join(TARGET_TABLE_FILE),
        }
    }

    /// Startup configuration from the environment. Returns `None` when no
    /// storage location is configured at all.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let workspace = non_empty(ENV_WORKSPACE).map(PathBuf::from);
        let units = non_empty(ENV_UNITS_PATH).map(PathBuf::from);
        let targets = non_empty(ENV_TARGETS_PATH).map(PathBuf::from);
        if workspace.is_none() && units.is_none() && targets.is_none() {
            return None;
        }
        let base = workspace.unwrap_or_else(|| PathBuf::from("."));
        let defaults = Config::for_workspace(&base);
        Some(Config {
            units_path: units.unwrap_or(defaults.units_path),
            targets_path: targets.unwrap_or(defaults.targets_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_environment_means_no_workspace() {
        assert_eq!(Config::from_vars(vars(&[])), None);
        assert_eq!(Config::from_vars(vars(&[(ENV_WORKSPACE, "  ")])), None);
    }

    #[test]
    fn workspace_uses_default_file_names() {
        let cfg = Config::from_vars(vars(&[(ENV_WORKSPACE, "/data/iqac")])).expect("config");
        assert_eq!(cfg.units_path, PathBuf::from("/data/iqac").join(UNIT_TABLE_FILE));
        assert_eq!(cfg.targets_path, PathBuf::from("/data/iqac").join(TARGET_TABLE_FILE));
    }

    #[test]
    fn per_file_override_wins() {
        let cfg = Config::from_vars(vars(&[
            (ENV_WORKSPACE, "/data/iqac"),
            (ENV_TARGETS_PATH, "/tmp/targets.csv"),
        ]))
        .expect("config");
        assert_eq!(cfg.units_path, PathBuf::from("/data/iqac").join(UNIT_TABLE_FILE));
        assert_eq!(cfg.targets_path, PathBuf::from("/tmp/targets.csv"));
    }
}
