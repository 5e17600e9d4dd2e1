//! Catalog index parsing
//!
//! The index module ships an `index.yaml` listing every published asset
//! per category with its module reference, description, tags and
//! declared version.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::ModuleRef;
use crate::asset::Category;

/// File name of the index inside the fetched index module
pub const INDEX_FILE: &str = "index.yaml";

/// A catalog index (index.yaml)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndex {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Kind (AssetIndex)
    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub agents: BTreeMap<String, IndexEntry>,

    #[serde(default)]
    pub roles: BTreeMap<String, IndexEntry>,

    #[serde(default)]
    pub contexts: BTreeMap<String, IndexEntry>,

    #[serde(default)]
    pub tasks: BTreeMap<String, IndexEntry>,
}

/// Catalog metadata for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Module reference, e.g. `github.com/acme/assets/roles/golang/assistant@v0`
    pub module: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Version the index claims is current
    #[serde(default)]
    pub version: Option<String>,
}

fn default_api_version() -> String {
    "roster.dev/v1".to_string()
}

fn default_kind() -> String {
    "AssetIndex".to_string()
}

impl Default for AssetIndex {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            agents: BTreeMap::new(),
            roles: BTreeMap::new(),
            contexts: BTreeMap::new(),
            tasks: BTreeMap::new(),
        }
    }
}

impl AssetIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse index from YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).context("Failed to parse catalog index YAML")
    }

    /// Load `index.yaml` from a fetched index module directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog index: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Entries of one category, sorted by name
    pub fn entries(&self, category: Category) -> &BTreeMap<String, IndexEntry> {
        match category {
            Category::Agent => &self.agents,
            Category::Role => &self.roles,
            Category::Context => &self.contexts,
            Category::Task => &self.tasks,
        }
    }

    /// Look up one entry
    pub fn get(&self, category: Category, name: &str) -> Option<&IndexEntry> {
        self.entries(category).get(name)
    }

    /// Total number of assets across all categories
    pub fn asset_count(&self) -> usize {
        Category::ALL.iter().map(|c| self.entries(*c).len()).sum()
    }
}

impl IndexEntry {
    /// Parsed module reference
    pub fn module_ref(&self) -> Result<ModuleRef> {
        self.module
            .parse()
            .with_context(|| format!("Invalid module reference in index: {}", self.module))
    }

    /// Truncate description to first line
    pub fn short_description(&self) -> &str {
        self.description
            .lines()
            .next()
            .unwrap_or(&self.description)
            .trim()
    }
}

#[cfg(test)]
mod index_tests {
    use super::*;

    fn sample_index_yaml() -> &'static str {
        r#"
apiVersion: roster.dev/v1
kind: AssetIndex
agents:
  ai/claude:
    module: github.com/acme/assets/agents/ai/claude@v0
    description: Anthropic Claude CLI
    tags: [anthropic, cli]
    version: v0.2.0
roles:
  golang/assistant:
    module: github.com/acme/assets/roles/golang/assistant@v0
    description: |
      Go programming assistant
      Knows the standard library well.
    tags: [golang]
    version: v0.1.0
  golang/reviewer:
    module: github.com/acme/assets/roles/golang/reviewer@v0
    description: Go code reviewer
"#
    }

    #[test]
    fn test_parse_index() {
        let index = AssetIndex::from_yaml(sample_index_yaml()).unwrap();
        assert_eq!(index.asset_count(), 3);
        assert_eq!(index.entries(Category::Role).len(), 2);
        assert!(index.entries(Category::Task).is_empty());
    }

    #[test]
    fn test_entry_fields() {
        let index = AssetIndex::from_yaml(sample_index_yaml()).unwrap();

        let entry = index.get(Category::Role, "golang/assistant").unwrap();
        assert_eq!(entry.version.as_deref(), Some("v0.1.0"));
        assert_eq!(entry.short_description(), "Go programming assistant");
        assert_eq!(
            entry.module_ref().unwrap().identity(),
            "github.com/acme/assets/roles/golang/assistant"
        );

        let reviewer = index.get(Category::Role, "golang/reviewer").unwrap();
        assert!(reviewer.version.is_none());
        assert!(reviewer.tags.is_empty());
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), sample_index_yaml()).unwrap();

        let index = AssetIndex::from_dir(dir.path()).unwrap();
        assert!(index.get(Category::Agent, "ai/claude").is_some());

        let empty = tempfile::TempDir::new().unwrap();
        assert!(AssetIndex::from_dir(empty.path()).is_err());
    }
}
