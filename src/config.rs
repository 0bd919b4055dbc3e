// Catalog configuration
//
// Loaded from a TOML file; `BIBCATALOG_DB` overrides the database location.
// `CatalogConfig::default()` is an in-memory catalog, which is what tests use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `database`
pub const DB_ENV_VAR: &str = "BIBCATALOG_DB";

/// Where the catalog lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseLocation {
    InMemory,
    File(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub database: DatabaseLocation,

    /// How long a writer waits on a locked database before giving up
    pub busy_timeout_ms: u64,

    /// Upper bound for one `read_changelog` page; 0 is treated as 1
    pub max_changelog_page: usize,

    /// Editor created on first open and used by autoaccept helpers
    pub default_editor: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            database: DatabaseLocation::InMemory,
            busy_timeout_ms: 5_000,
            max_changelog_page: 500,
            default_editor: "admin".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Config for an on-disk database, other settings default
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        CatalogConfig {
            database: DatabaseLocation::File(path.into()),
            ..CatalogConfig::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse catalog config")
    }

    /// Read a TOML config file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides (no file)
    pub fn from_env() -> Self {
        let mut config = CatalogConfig::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(db) = std::env::var(DB_ENV_VAR) {
            self.database = if db == ":memory:" {
                DatabaseLocation::InMemory
            } else {
                DatabaseLocation::File(PathBuf::from(db))
            };
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Effective changelog page size, never zero
    pub fn changelog_page(&self) -> usize {
        self.max_changelog_page.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_in_memory() {
        let config = CatalogConfig::default();
        assert_eq!(config.database, DatabaseLocation::InMemory);
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert_eq!(config.default_editor, "admin");
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = CatalogConfig::from_toml_str(
            r#"
            busy_timeout_ms = 250
            database = { file = "/var/lib/bibcatalog/catalog.db" }
            "#,
        )
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseLocation::File(PathBuf::from("/var/lib/bibcatalog/catalog.db"))
        );
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.max_changelog_page, 500);
    }

    #[test]
    fn test_zero_page_size_clamped() {
        let config = CatalogConfig::from_toml_str("max_changelog_page = 0").unwrap();
        assert_eq!(config.changelog_page(), 1);
        assert_eq!(CatalogConfig::default().changelog_page(), 500);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(CatalogConfig::from_toml_str("busy_timeout_ms = \"soon\"").is_err());
    }
}
