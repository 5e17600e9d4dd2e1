//! Catalog client trait - Abstraction over module transports
//!
//! The resolver and the validator only ever talk to the catalog through
//! this trait, so tests can swap in stubs and the HTTP transport stays
//! behind the `catalog` feature.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

use super::ModuleRef;

/// A module fetched to local storage
#[derive(Debug, Clone)]
pub struct FetchedModule {
    /// The concrete reference that was fetched
    pub module: ModuleRef,

    /// Directory holding the module content
    pub source_dir: PathBuf,
}

/// Trait for catalog transports
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Resolve a reference (e.g. `path@v0`) to its latest concrete version
    async fn resolve_latest_version(&self, module: &ModuleRef) -> Result<ModuleRef>;

    /// Fetch a concrete module to local storage
    async fn fetch(&self, module: &ModuleRef) -> Result<FetchedModule>;

    /// Every published version of a module, in registry order
    async fn module_versions(&self, module: &ModuleRef) -> Result<Vec<String>>;
}
