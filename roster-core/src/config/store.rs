//! Installed asset store
//!
//! Installed definitions live in `assets.yaml` files, one map per
//! category. The global file is overlaid by the project file, project
//! entries winning. Installs never overwrite an existing name.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::asset::{AssetDefinition, Category};

/// Store-specific errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{category} '{name}' is already installed")]
    AlreadyExists { category: Category, name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Snapshot of installed definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstalledConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub agents: BTreeMap<String, AssetDefinition>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, AssetDefinition>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, AssetDefinition>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tasks: BTreeMap<String, AssetDefinition>,
}

impl InstalledConfig {
    pub fn assets(&self, category: Category) -> &BTreeMap<String, AssetDefinition> {
        match category {
            Category::Agent => &self.agents,
            Category::Role => &self.roles,
            Category::Context => &self.contexts,
            Category::Task => &self.tasks,
        }
    }

    pub fn assets_mut(&mut self, category: Category) -> &mut BTreeMap<String, AssetDefinition> {
        match category {
            Category::Agent => &mut self.agents,
            Category::Role => &mut self.roles,
            Category::Context => &mut self.contexts,
            Category::Task => &mut self.tasks,
        }
    }

    pub fn get(&self, category: Category, name: &str) -> Option<&AssetDefinition> {
        self.assets(category).get(name)
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        self.assets(category).contains_key(name)
    }

    /// Overlay another config on top of this one
    pub fn overlay(&mut self, mut other: InstalledConfig) {
        for category in Category::ALL {
            self.assets_mut(category)
                .append(other.assets_mut(category));
        }
    }

    /// Read a config file, empty when absent
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read installed assets: {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse installed assets: {}", path.display()))
    }

    /// Write a config file, replacing it as a whole
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Assets path has no parent directory")?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

        let content =
            serde_yaml_ng::to_string(self).context("Failed to serialize installed assets")?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .context("Failed to create temporary assets file")?;
        temp.write_all(content.as_bytes())
            .context("Failed to write temporary assets file")?;
        temp.persist(path)
            .with_context(|| format!("Failed to write installed assets: {}", path.display()))?;

        Ok(())
    }
}

/// Installed-configuration store contract
pub trait ConfigStore: Send + Sync {
    /// Load the merged view of all installed definitions
    fn load(&self) -> Result<InstalledConfig>;

    /// Durably persist a new definition, failing if the name exists
    fn install(
        &self,
        category: Category,
        name: &str,
        definition: &AssetDefinition,
    ) -> Result<(), StoreError>;
}

/// Store backed by global and project `assets.yaml` files
pub struct YamlConfigStore {
    global: PathBuf,
    project: Option<PathBuf>,
}

impl YamlConfigStore {
    /// Store with a global file and an optional project overlay
    ///
    /// Installs go to the global file.
    pub fn new(global: PathBuf, project: Option<PathBuf>) -> Self {
        Self { global, project }
    }

    pub fn global_path(&self) -> &Path {
        &self.global
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<InstalledConfig> {
        let mut config = InstalledConfig::load_from_path(&self.global)?;
        if let Some(project) = &self.project {
            config.overlay(InstalledConfig::load_from_path(project)?);
        }
        Ok(config)
    }

    fn install(
        &self,
        category: Category,
        name: &str,
        definition: &AssetDefinition,
    ) -> Result<(), StoreError> {
        if self.load()?.contains(category, name) {
            return Err(StoreError::AlreadyExists {
                category,
                name: name.to_string(),
            });
        }

        let mut global = InstalledConfig::load_from_path(&self.global)?;
        global
            .assets_mut(category)
            .insert(name.to_string(), definition.clone());
        global.save_to_path(&self.global)?;

        tracing::info!("Installed {} '{}' to {}", category, name, self.global.display());
        Ok(())
    }
}
