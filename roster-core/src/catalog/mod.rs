//! Roster Catalog - remote, versioned asset definitions
//!
//! # Architecture
//!
//! ```text
//! Registry (HTTP module proxy)
//!     │
//!     ├── .../index/@v/list         ← published index versions
//!     ├── .../index/@v/v0.4.1.tar.gz ← index.yaml
//!     └── .../roles/go/@v/*.tar.gz   ← asset modules (asset.yaml)
//!            │
//!            ▼
//!     CatalogClient (trait)
//!            │
//!            ├── Resolver   (lazy index fetch, auto-install)
//!            └── Validator  (published versions per asset)
//! ```

mod cache;
mod client;
#[cfg(feature = "catalog")]
mod http;
mod index;
mod module;

pub use cache::{CachedIndexRecord, FileIndexCache, IndexCache, INDEX_CACHE_TTL};
pub use client::{CatalogClient, FetchedModule};
#[cfg(feature = "catalog")]
pub use http::HttpCatalogClient;
pub use index::{AssetIndex, IndexEntry, INDEX_FILE};
pub use module::ModuleRef;

/// File holding an asset definition inside a fetched asset module
pub const ASSET_FILE: &str = "asset.yaml";
