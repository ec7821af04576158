//! Configuration schema for smellscan.
//!
//! A configuration selects which detectors run, tunes their thresholds and
//! lists paths to leave out of directory scans. It can come from a YAML file,
//! from a JSON selection string (`{"MagicNumbers": false}`), or both.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::detect::SmellCategory;

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["smellscan.yaml", ".smellscan.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Detector selection keyed by category name. Absent categories run.
    #[serde(default)]
    pub smells: SmellSelection,
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Glob patterns for paths to skip when walking directories.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Build a matcher for `excluded_paths`.
    pub fn excluded_matcher(&self) -> anyhow::Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }
}

/// Mapping from category name to enabled flag.
///
/// Names are kept as given so that unknown ones can be reported and then
/// ignored; only the six category names have any effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SmellSelection(BTreeMap<String, bool>);

impl SmellSelection {
    /// Parse a JSON object such as `{"LongMethod": true, "GodClass": false}`.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let map: BTreeMap<String, bool> = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("invalid smell selection {:?}: {}", json, e))?;
        Ok(Self(map))
    }

    /// Whether a category should run. Categories not mentioned default to on.
    pub fn is_enabled(&self, category: SmellCategory) -> bool {
        self.0.get(category.as_str()).copied().unwrap_or(true)
    }

    pub fn set(&mut self, name: &str, enabled: bool) {
        self.0.insert(name.to_string(), enabled);
    }

    /// Entries of `other` take precedence over ours.
    pub fn extend(&mut self, other: SmellSelection) {
        self.0.extend(other.0);
    }

    /// Names that match no category.
    pub fn unknown_names(&self) -> Vec<&str> {
        self.0
            .keys()
            .filter(|name| SmellCategory::parse(name).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Categories that will run, in report order.
    pub fn enabled(&self) -> Vec<SmellCategory> {
        SmellCategory::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }
}

/// Detector thresholds. A smell is reported when a measurement is strictly
/// greater than its threshold.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    /// Maximum counted statements per function (default: 5)
    pub long_method_statements: usize,
    /// Maximum methods per class (default: 4)
    pub god_class_methods: usize,
    /// Maximum methods plus attributes per class (default: 8)
    pub god_class_members: usize,
    /// Maximum declared parameters, not counting `self` (default: 4)
    pub max_parameters: usize,
    /// Maximum positional plus keyword arguments at a call site (default: 6)
    pub max_call_arguments: usize,
    /// Shortest line block considered for duplication (default: 10 chars)
    pub duplicate_min_length: usize,
    /// Consecutive lines compared as one block (default: 1)
    pub duplicate_window: usize,
    /// Maximum calls to one external method per function (default: 2)
    pub feature_envy_calls: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            long_method_statements: 5,
            god_class_methods: 4,
            god_class_members: 8,
            max_parameters: 4,
            max_call_arguments: 6,
            duplicate_min_length: 10,
            duplicate_window: 1,
            feature_envy_calls: 2,
        }
    }
}

/// Validate a configuration.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.thresholds.duplicate_window == 0 {
        anyhow::bail!("thresholds.duplicate_window must be at least 1");
    }

    config.excluded_matcher()?;

    for name in config.smells.unknown_names() {
        warn!(name, "ignoring unknown smell category");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
smells:
  MagicNumbers: false
  FeatureEnvy: true
thresholds:
  long_method_statements: 10
excluded_paths:
  - "**/migrations/**"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.smells.is_enabled(SmellCategory::MagicNumbers));
        assert!(config.smells.is_enabled(SmellCategory::FeatureEnvy));
        assert!(config.smells.is_enabled(SmellCategory::GodClass));
        assert_eq!(config.thresholds.long_method_statements, 10);
        // Unspecified thresholds keep their defaults.
        assert_eq!(config.thresholds.max_parameters, 4);
        assert_eq!(config.excluded_paths.len(), 1);
    }

    #[test]
    fn test_empty_config_enables_everything() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.smells.enabled(), SmellCategory::ALL.to_vec());
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn test_selection_from_json() {
        let selection =
            SmellSelection::from_json(r#"{"LongMethod": false, "NoSuchSmell": true}"#).unwrap();
        assert!(!selection.is_enabled(SmellCategory::LongMethod));
        assert!(selection.is_enabled(SmellCategory::DuplicatedCode));
        assert_eq!(selection.unknown_names(), vec!["NoSuchSmell"]);
        assert_eq!(selection.enabled().len(), 5);

        assert!(SmellSelection::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_selection_extend_overrides() {
        let mut base = SmellSelection::default();
        base.set("GodClass", false);
        base.set("MagicNumbers", false);
        base.extend(SmellSelection::from_json(r#"{"GodClass": true}"#).unwrap());
        assert!(base.is_enabled(SmellCategory::GodClass));
        assert!(!base.is_enabled(SmellCategory::MagicNumbers));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(validate(&config).is_ok());

        config.excluded_paths = vec!["[".to_string()];
        assert!(validate(&config).is_err());

        config.excluded_paths.clear();
        config.thresholds.duplicate_window = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_excluded_matcher() {
        let config = Config {
            excluded_paths: vec!["**/migrations/**".to_string()],
            ..Default::default()
        };
        let matcher = config.excluded_matcher().unwrap();
        assert!(matcher.is_match("app/migrations/0001_initial.py"));
        assert!(!matcher.is_match("app/models.py"));
    }
}
