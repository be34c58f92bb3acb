use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::SynonymDictionary;
use crate::error::{PosSearchError, Result};
use crate::services::{HeaderReconciler, ImportDefaults, SearchSettings};

const APP_NAME: &str = "pos-search";
const PROJECT_CONFIG: &str = ".pos-search.toml";
const STORE_ENV: &str = "POS_SEARCH_STORE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_path: Option<PathBuf>,
    pub search: SearchConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub result_cap: usize,
    pub index_limit: usize,
    pub rebuild_debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_cap: 100,
            index_limit: 100,
            rebuild_debounce_ms: 100,
        }
    }
}

impl SearchConfig {
    pub const fn settings(&self) -> SearchSettings {
        SearchSettings {
            result_cap: self.result_cap,
            index_limit: self.index_limit,
            rebuild_debounce: Duration::from_millis(self.rebuild_debounce_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub defaults: ImportDefaults,
    /// Extra header spellings per field, tried after the built-in ones.
    pub synonyms: IndexMap<String, Vec<String>>,
}

impl ImportConfig {
    pub fn reconciler(&self) -> Result<HeaderReconciler> {
        let mut dictionary = SynonymDictionary::inventory();
        for (field, aliases) in &self.synonyms {
            dictionary.extend(field.clone(), aliases.iter().cloned());
        }
        HeaderReconciler::new(&dictionary, self.defaults.clone())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project()?;
        let merged = Self::merge(global, project);
        Ok(merged.with_env_overrides())
    }

    fn load_global() -> Result<Self> {
        let config_dir = directories::ProjectDirs::from("", "", APP_NAME).map_or_else(
            || PathBuf::from("~/.config").join(APP_NAME),
            |d| d.config_dir().to_path_buf(),
        );

        Ok(Self::load_file(&config_dir.join("config.toml"))?.unwrap_or_default())
    }

    fn load_project() -> Result<Option<Self>> {
        Self::load_file(Path::new(PROJECT_CONFIG))
    }

    fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| PosSearchError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(Some(config))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PosSearchError::Config(e.to_string()))
    }

    /// A project file replaces the global `search` and `import` sections
    /// wholesale; `store_path` falls back to the global one when unset.
    fn merge(global: Self, project: Option<Self>) -> Self {
        let Some(project) = project else {
            return global;
        };
        Self {
            store_path: project.store_path.or(global.store_path),
            search: project.search,
            import: project.import,
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(path) = std::env::var_os(STORE_ENV).filter(|p| !p.is_empty()) {
            self.store_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Configured store file, else `store.json` in the platform data dir.
    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", APP_NAME).map_or_else(
                || PathBuf::from(".pos-search").join("store.json"),
                |d| d.data_dir().join("store.json"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawRow, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.search.settings(), SearchSettings::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            store_path = "/var/lib/pos/store.json"

            [search]
            rebuild_debounce_ms = 250

            [import.defaults]
            hsn = "3003"
            "#,
        )
        .unwrap();

        assert_eq!(config.store_path(), PathBuf::from("/var/lib/pos/store.json"));
        assert_eq!(config.search.result_cap, 100);
        assert_eq!(
            config.search.settings().rebuild_debounce,
            Duration::from_millis(250)
        );
        assert_eq!(config.import.defaults.hsn, "3003");
        assert_eq!(config.import.defaults.batch, "N/A");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml_str("[search]\nresult_cap = \"many\"").unwrap_err();
        assert!(matches!(err, PosSearchError::Config(_)));
    }

    #[test]
    fn test_project_overrides_global() {
        let global = Config {
            store_path: Some(PathBuf::from("/global.json")),
            search: SearchConfig {
                result_cap: 20,
                ..SearchConfig::default()
            },
            ..Config::default()
        };
        let project = Config {
            search: SearchConfig {
                result_cap: 50,
                ..SearchConfig::default()
            },
            ..Config::default()
        };

        let merged = Config::merge(global.clone(), Some(project));
        assert_eq!(merged.store_path, Some(PathBuf::from("/global.json")));
        assert_eq!(merged.search.result_cap, 50);

        assert_eq!(Config::merge(global.clone(), None), global);
    }

    #[test]
    fn test_extra_synonyms_reach_the_reconciler() {
        let config = Config::from_toml_str(
            r#"
            [import.synonyms]
            name = ["Dawa"]
            "#,
        )
        .unwrap();
        let reconciler = config.import.reconciler().unwrap();
        let row = RawRow::from_iter([("DAWA", "Crocin")]);

        assert_eq!(reconciler.resolve(&row, "name"), Some(&Value::from("Crocin")));
    }
}
