//! Test helpers shared by the integration tests
//!
//! In-memory stand-ins for every injected dependency: catalog client,
//! installed-config store, index cache, user interaction and source
//! control.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tempfile::TempDir;

use roster_core::asset::{AssetDefinition, Category};
use roster_core::catalog::{
    CachedIndexRecord, CatalogClient, FetchedModule, IndexCache, ModuleRef, ASSET_FILE, INDEX_FILE,
};
use roster_core::config::{ConfigStore, InstalledConfig, StoreError};
use roster_core::resolve::{CatalogAccess, Interaction, Resolver};
use roster_core::validate::{DiffOutcome, SourceControl};
use roster_core::version;

/// Index module every test catalog publishes
pub const INDEX_MODULE: &str = "example.com/assets/index";

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Catalog backed by a temporary directory of published modules
pub struct StubCatalog {
    root: TempDir,
    versions: Mutex<HashMap<String, Vec<String>>>,
    resolve_calls: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("temp dir"),
            versions: Mutex::new(HashMap::new()),
            resolve_calls: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn module_dir(&self, identity: &str, version: &str) -> PathBuf {
        self.root
            .path()
            .join(format!("{}@{}", identity.replace('/', "_"), version))
    }

    /// Publish a module version containing `files`
    pub fn publish(&self, identity: &str, version: &str, files: &[(&str, &str)]) {
        let dir = self.module_dir(identity, version);
        std::fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
        self.versions
            .lock()
            .unwrap()
            .entry(identity.to_string())
            .or_default()
            .push(version.to_string());
    }

    /// Publish an asset module with the given definition
    pub fn publish_asset(&self, identity: &str, version: &str, asset_yaml: &str) {
        self.publish(identity, version, &[(ASSET_FILE, asset_yaml)]);
    }

    /// Publish a version of the index module
    pub fn publish_index(&self, version: &str, index_yaml: &str) {
        self.publish(INDEX_MODULE, version, &[(INDEX_FILE, index_yaml)]);
    }

    /// Record versions without content, for validation
    pub fn publish_versions(&self, identity: &str, versions: &[&str]) {
        self.versions
            .lock()
            .unwrap()
            .entry(identity.to_string())
            .or_default()
            .extend(versions.iter().map(|v| v.to_string()));
    }

    /// Total number of client calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Identities passed to `resolve_latest_version`, in call order
    pub fn resolved(&self) -> Vec<String> {
        self.resolve_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogClient for StubCatalog {
    async fn resolve_latest_version(&self, module: &ModuleRef) -> Result<ModuleRef> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.resolve_calls
            .lock()
            .unwrap()
            .push(module.identity().to_string());
        let versions = self.module_versions(module).await?;
        let latest = version::latest(
            versions
                .iter()
                .map(String::as_str)
                .filter(|v| module.accepts(v)),
        )
        .ok_or_else(|| anyhow::anyhow!("no published version of {module}"))?;
        Ok(module.with_version(latest))
    }

    async fn fetch(&self, module: &ModuleRef) -> Result<FetchedModule> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let version = module
            .version
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("fetch needs a concrete version: {module}"))?;
        let dir = self.module_dir(module.identity(), version);
        if !dir.is_dir() {
            anyhow::bail!("{module} not found");
        }
        Ok(FetchedModule {
            module: module.clone(),
            source_dir: dir,
        })
    }

    async fn module_versions(&self, module: &ModuleRef) -> Result<Vec<String>> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .get(module.identity())
            .cloned()
            .unwrap_or_default())
    }
}

/// Catalog that fails the test when consulted
pub struct PanickingCatalog;

#[async_trait]
impl CatalogClient for PanickingCatalog {
    async fn resolve_latest_version(&self, module: &ModuleRef) -> Result<ModuleRef> {
        panic!("catalog must not be consulted (resolve {module})")
    }

    async fn fetch(&self, module: &ModuleRef) -> Result<FetchedModule> {
        panic!("catalog must not be consulted (fetch {module})")
    }

    async fn module_versions(&self, module: &ModuleRef) -> Result<Vec<String>> {
        panic!("catalog must not be consulted (versions of {module})")
    }
}

/// Catalog whose every call fails like an unreachable registry
pub struct UnreachableCatalog;

#[async_trait]
impl CatalogClient for UnreachableCatalog {
    async fn resolve_latest_version(&self, _module: &ModuleRef) -> Result<ModuleRef> {
        anyhow::bail!("connection refused")
    }

    async fn fetch(&self, _module: &ModuleRef) -> Result<FetchedModule> {
        anyhow::bail!("connection refused")
    }

    async fn module_versions(&self, _module: &ModuleRef) -> Result<Vec<String>> {
        anyhow::bail!("connection refused")
    }
}

/// Installed configuration held in memory
#[derive(Default)]
pub struct MemoryStore {
    config: Mutex<InstalledConfig>,
}

impl MemoryStore {
    pub fn with_assets(assets: &[(Category, &str, &str)]) -> Self {
        let store = Self::default();
        for (category, name, description) in assets {
            store.insert(*category, name, definition(description));
        }
        store
    }

    pub fn insert(&self, category: Category, name: &str, definition: AssetDefinition) {
        self.config
            .lock()
            .unwrap()
            .assets_mut(category)
            .insert(name.to_string(), definition);
    }

    pub fn snapshot(&self) -> InstalledConfig {
        self.config.lock().unwrap().clone()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<InstalledConfig> {
        Ok(self.snapshot())
    }

    fn install(
        &self,
        category: Category,
        name: &str,
        definition: &AssetDefinition,
    ) -> Result<(), StoreError> {
        let mut config = self.config.lock().unwrap();
        if config.contains(category, name) {
            return Err(StoreError::AlreadyExists {
                category,
                name: name.to_string(),
            });
        }
        config
            .assets_mut(category)
            .insert(name.to_string(), definition.clone());
        Ok(())
    }
}

/// Index cache held in memory
#[derive(Default)]
pub struct MemoryCache {
    record: Mutex<Option<CachedIndexRecord>>,
}

impl MemoryCache {
    pub fn record(&self) -> Option<CachedIndexRecord> {
        self.record.lock().unwrap().clone()
    }
}

impl IndexCache for MemoryCache {
    fn load(&self) -> Result<Option<CachedIndexRecord>> {
        Ok(self.record())
    }

    fn store(&self, record: &CachedIndexRecord) -> Result<()> {
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }
}

/// Interaction that answers prompts from a script
pub struct ScriptedInteraction {
    interactive: bool,
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<Vec<String>>>,
    notices: Mutex<Vec<String>>,
}

impl ScriptedInteraction {
    pub fn interactive(answers: &[&str]) -> Self {
        Self {
            interactive: true,
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            ..Self::interactive(&[])
        }
    }

    /// Lines shown for each prompt
    pub fn prompts(&self) -> Vec<Vec<String>> {
        self.prompts.lock().unwrap().clone()
    }

    /// Informational messages shown so far
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

impl Interaction for ScriptedInteraction {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn prompt(&self, lines: &[String], _question: &str) -> Result<String> {
        assert!(self.interactive, "prompted in non-interactive mode");
        self.prompts.lock().unwrap().push(lines.to_vec());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted answer left"))
    }

    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

/// Source control with fixed answers
#[derive(Default)]
pub struct FakeSourceControl {
    pub tags: Vec<String>,
    /// Error returned by the state check
    pub dirty: Option<String>,
    /// Outcome per tag, `Err` text for a failing diff; unlisted tags are unchanged
    pub diffs: HashMap<String, std::result::Result<DiffOutcome, String>>,
    pub diff_calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeSourceControl {
    pub fn with_tags(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl SourceControl for FakeSourceControl {
    async fn check_clean_state(&self, branch: &str, _offline: bool) -> Result<()> {
        match &self.dirty {
            Some(reason) => anyhow::bail!("{reason} (branch {branch})"),
            None => Ok(()),
        }
    }

    async fn tags(&self) -> Result<Vec<String>> {
        Ok(self.tags.clone())
    }

    async fn diff_path(&self, tag: &str, path: &Path) -> Result<DiffOutcome> {
        self.diff_calls
            .lock()
            .unwrap()
            .push((tag.to_string(), path.to_path_buf()));
        match self.diffs.get(tag) {
            Some(Ok(outcome)) => Ok(*outcome),
            Some(Err(message)) => anyhow::bail!("{message}"),
            None => Ok(DiffOutcome::Unchanged),
        }
    }
}

pub fn definition(description: &str) -> AssetDefinition {
    AssetDefinition {
        description: description.to_string(),
        ..Default::default()
    }
}

/// Index module reference accepting any v0 version
pub fn index_module() -> ModuleRef {
    ModuleRef::new(INDEX_MODULE, Some("v0".to_string()))
}

/// Resolver session over the given dependencies
pub fn resolver(
    store: Arc<dyn ConfigStore>,
    client: Arc<dyn CatalogClient>,
    cache: Arc<dyn IndexCache>,
    interaction: Arc<dyn Interaction>,
) -> Resolver {
    init_test_logging();
    let catalog = CatalogAccess::with_client(index_module(), cache, client);
    Resolver::new(store, catalog, interaction).expect("resolver")
}
