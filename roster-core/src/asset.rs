//! Asset identity and installed definitions
//!
//! An asset is identified by its category and name. Names are unique
//! only within a category, so `role:golang/assistant` and
//! `task:golang/assistant` are distinct assets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The fixed set of asset categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Agent,
    Role,
    Context,
    Task,
}

impl Category {
    /// All categories in report order
    pub const ALL: [Category; 4] = [
        Category::Agent,
        Category::Role,
        Category::Context,
        Category::Task,
    ];

    /// Singular form used in user-facing messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Agent => "agent",
            Category::Role => "role",
            Category::Context => "context",
            Category::Task => "task",
        }
    }

    /// Plural form used for index keys, directories and tag prefixes
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Agent => "agents",
            Category::Role => "roles",
            Category::Context => "contexts",
            Category::Task => "tasks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lower || c.dir_name() == lower)
            .ok_or_else(|| {
                format!("Unknown asset category: {s} (expected agent, role, context or task)")
            })
    }
}

/// An installed asset definition
///
/// Only the fields the resolver reads are typed. Everything else in the
/// definition is kept verbatim in `extra` so installs never lose data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetDefinition {
    /// Concrete module reference this definition was installed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Model aliases (agents only): alias -> model identifier
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, String>,

    /// Role required by this definition (tasks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml_ng::Value>,
}

/// The part of a name after its last `/`
pub fn short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
