//! Roster configuration
//!
//! Settings live in `roster.yaml` inside the platform config directory.
//! A missing file means defaults. `ROSTER_REGISTRY` and `ROSTER_INDEX`
//! override the catalog location without editing the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::catalog::ModuleRef;

mod store;

pub use store::{ConfigStore, InstalledConfig, StoreError, YamlConfigStore};

/// Default registry serving asset modules
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.roster.dev";

/// Default index module
pub const DEFAULT_INDEX_MODULE: &str = "github.com/roster-dev/assets/index@v0";

/// Branch the asset repository must be on for validation
pub const DEFAULT_VALIDATE_BRANCH: &str = "main";

/// Environment variable overriding the registry URL
pub const REGISTRY_ENV: &str = "ROSTER_REGISTRY";

/// Environment variable overriding the index module
pub const INDEX_ENV: &str = "ROSTER_INDEX";

const SETTINGS_FILE: &str = "roster.yaml";
const ASSETS_FILE: &str = "assets.yaml";
const PROJECT_DIR: &str = ".roster";

/// Top-level settings file (roster.yaml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub validate: ValidateSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Registry base URL
    #[serde(default = "default_registry")]
    pub registry: String,

    /// Index module reference
    #[serde(default = "default_index")]
    pub index: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateSettings {
    /// Branch the asset repository must be on
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_registry() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_index() -> String {
    DEFAULT_INDEX_MODULE.to_string()
}

fn default_branch() -> String {
    DEFAULT_VALIDATE_BRANCH.to_string()
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            index: default_index(),
        }
    }
}

impl Default for ValidateSettings {
    fn default() -> Self {
        Self {
            branch: default_branch(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (defaults if absent) and apply env overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::load_from_path(path)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load settings from a file without env overrides
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;

        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(registry) = lookup(REGISTRY_ENV).filter(|v| !v.is_empty()) {
            debug!("Registry overridden by {}: {}", REGISTRY_ENV, registry);
            self.catalog.registry = registry;
        }
        if let Some(index) = lookup(INDEX_ENV).filter(|v| !v.is_empty()) {
            debug!("Index module overridden by {}: {}", INDEX_ENV, index);
            self.catalog.index = index;
        }
    }

    /// Parsed index module reference
    pub fn index_module(&self) -> Result<ModuleRef> {
        self.catalog
            .index
            .parse()
            .with_context(|| format!("Invalid index module in settings: {}", self.catalog.index))
    }
}

/// Filesystem locations used by roster
#[derive(Debug, Clone)]
pub struct RosterPaths {
    /// Settings file
    pub settings: PathBuf,
    /// Persisted index version record
    pub index_cache: PathBuf,
    /// Fetched module content
    pub modules: PathBuf,
    /// Machine-wide installed assets
    pub global_assets: PathBuf,
    /// Project installed assets (overlay on the global file)
    pub project_assets: PathBuf,
}

impl RosterPaths {
    /// Discover paths using platform conventions
    pub fn discover(project_root: &Path) -> Result<Self> {
        let (config_dir, data_dir) = match directories::ProjectDirs::from("dev", "roster", "roster")
        {
            Some(dirs) => (dirs.config_dir().to_path_buf(), dirs.data_dir().to_path_buf()),
            None => {
                let config_dir = dirs::config_dir()
                    .map(|d| d.join("roster"))
                    .context("Could not determine config directory")?;
                let data_dir = dirs::data_dir()
                    .map(|d| d.join("roster"))
                    .unwrap_or_else(|| config_dir.join("data"));
                (config_dir, data_dir)
            }
        };

        Ok(Self::from_dirs(&config_dir, &data_dir, project_root))
    }

    /// Build paths from explicit directories
    pub fn from_dirs(config_dir: &Path, data_dir: &Path, project_root: &Path) -> Self {
        Self {
            settings: config_dir.join(SETTINGS_FILE),
            index_cache: data_dir.join("cache").join("index.yaml"),
            modules: data_dir.join("modules"),
            global_assets: config_dir.join(ASSETS_FILE),
            project_assets: project_root.join(PROJECT_DIR).join(ASSETS_FILE),
        }
    }
}
