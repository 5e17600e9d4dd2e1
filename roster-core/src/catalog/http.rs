//! HTTP module transport
//!
//! Speaks a small module-proxy protocol against the configured registry:
//!
//! ```text
//! GET {registry}/{module-path}/@v/list           newline-separated versions
//! GET {registry}/{module-path}/@v/{version}.tar.gz  module content
//! ```
//!
//! Fetched modules are immutable and extracted once into
//! `{module_dir}/{module-path}@{version}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::{CatalogClient, FetchedModule, ModuleRef};
use crate::version;

/// Catalog client backed by an HTTP registry
pub struct HttpCatalogClient {
    client: reqwest::Client,
    registry: String,
    module_dir: PathBuf,
}

impl HttpCatalogClient {
    pub fn new(registry: &str, module_dir: PathBuf) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            registry: registry.trim_end_matches('/').to_string(),
            module_dir,
        })
    }

    fn list_url(&self, module: &ModuleRef) -> String {
        format!("{}/{}/@v/list", self.registry, module.identity())
    }

    fn archive_url(&self, module: &ModuleRef, version: &str) -> String {
        format!("{}/{}/@v/{}.tar.gz", self.registry, module.identity(), version)
    }

    fn install_dir(&self, module: &ModuleRef, version: &str) -> PathBuf {
        self.module_dir
            .join(format!("{}@{}", module.identity(), version))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Request failed: HTTP {} from {}", response.status(), url);
        }

        Ok(response)
    }

    /// Extract tarball bytes into `dest` via a sibling temp directory
    fn extract(&self, bytes: &[u8], dest: &Path) -> Result<()> {
        let parent = dest
            .parent()
            .context("Module directory has no parent")?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let staging = tempfile::tempdir_in(parent).context("Failed to create staging dir")?;
        let gz_decoder = flate2::read::GzDecoder::new(Cursor::new(bytes));
        let mut archive = tar::Archive::new(gz_decoder);
        archive
            .unpack(staging.path())
            .context("Failed to extract module archive")?;

        let staged = staging.keep();
        if let Err(e) = std::fs::rename(&staged, dest) {
            // Another process may have extracted the same version first
            if let Err(cleanup) = std::fs::remove_dir_all(&staged) {
                tracing::debug!("Failed to remove staging dir {:?}: {}", staged, cleanup);
            }
            if !dest.exists() {
                return Err(e).with_context(|| format!("Failed to move module to {}", dest.display()));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn resolve_latest_version(&self, module: &ModuleRef) -> Result<ModuleRef> {
        if module.is_concrete() {
            return Ok(module.clone());
        }

        let versions = self.module_versions(module).await?;
        let latest = version::latest(
            versions
                .iter()
                .map(String::as_str)
                .filter(|v| module.accepts(v)),
        )
        .with_context(|| format!("No published version of {module}"))?;

        Ok(module.with_version(latest))
    }

    async fn fetch(&self, module: &ModuleRef) -> Result<FetchedModule> {
        let version = module
            .version
            .as_deref()
            .filter(|_| module.is_concrete())
            .with_context(|| format!("Cannot fetch {module}: not a concrete version"))?;

        let source_dir = self.install_dir(module, version);
        if source_dir.is_dir() {
            tracing::debug!("Module {} already present at {:?}", module, source_dir);
            return Ok(FetchedModule {
                module: module.clone(),
                source_dir,
            });
        }

        let url = self.archive_url(module, version);
        tracing::debug!("Downloading {} from {}", module, url);

        let bytes = self
            .get(&url)
            .await?
            .bytes()
            .await
            .context("Failed to read download response")?;

        self.extract(&bytes, &source_dir)?;

        Ok(FetchedModule {
            module: module.clone(),
            source_dir,
        })
    }

    async fn module_versions(&self, module: &ModuleRef) -> Result<Vec<String>> {
        let url = self.list_url(module);
        let body = self
            .get(&url)
            .await?
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(parse_version_list(&body))
    }
}

/// Parse a `@v/list` body, skipping blank lines
fn parse_version_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
