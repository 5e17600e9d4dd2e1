//! Module references (`path@version`)
//!
//! A reference either names a concrete version (`path@v0.3.1`), a major
//! version line (`path@v0`), or no version at all (`path`). The path
//! alone is the module identity.

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

use crate::version;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    pub path: String,
    pub version: Option<String>,
}

impl ModuleRef {
    pub fn new(path: impl Into<String>, version: Option<String>) -> Self {
        Self {
            path: path.into(),
            version,
        }
    }

    /// Module identity: the address without its version suffix
    pub fn identity(&self) -> &str {
        &self.path
    }

    /// Whether this reference pins a canonical version
    pub fn is_concrete(&self) -> bool {
        self.version.as_deref().is_some_and(version::is_canonical)
    }

    /// Same module at another version
    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Self {
            path: self.path.clone(),
            version: Some(version.into()),
        }
    }

    /// Whether a published version satisfies this reference
    ///
    /// Unversioned references accept any canonical version, major
    /// references accept versions of that major, concrete references
    /// accept only themselves.
    pub fn accepts(&self, candidate: &str) -> bool {
        let Some(parsed) = version::parse(candidate) else {
            return false;
        };
        match self.version.as_deref() {
            None => true,
            Some(v) => match version::major_query(v) {
                Some(major) => parsed.major == major,
                None => v == candidate,
            },
        }
    }
}

impl FromStr for ModuleRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (path, version) = match s.split_once('@') {
            Some((path, version)) => (path, Some(version.to_string())),
            None => (s, None),
        };
        if path.is_empty() {
            bail!("Invalid module reference '{s}': empty module path");
        }
        if let Some(v) = &version {
            if version::major_query(v).is_none() && !version::is_canonical(v) {
                bail!("Invalid module reference '{s}': version must look like v1 or v1.2.3");
            }
        }
        Ok(Self::new(path, version))
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.path, v),
            None => f.write_str(&self.path),
        }
    }
}
