//! Asset resolution
//!
//! Turns a short or ambiguous query into exactly one installed asset
//! name. Tiers run in a fixed order and stop at the first success:
//!
//! 1. file-path bypass (roles only)
//! 2. exact or short name among installed assets
//! 3. unique scored match among installed assets
//! 4. exact or short name in the catalog index (auto-install)
//! 5. merged installed + catalog matches, disambiguated
//!
//! The catalog is only contacted when tiers 1-3 cannot decide, and an
//! unreachable catalog simply contributes no candidates.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod contexts;
mod error;
mod fetch;
mod interaction;
mod matching;
mod models;
pub mod scorer;
mod select;

pub use contexts::DEFAULT_CONTEXTS_TERM;
pub use error::ResolveError;
pub use fetch::{INDEX_FETCH_TIMEOUT, SLOW_FETCH_NOTICE};
pub use interaction::{Interaction, TerminalInteraction};
pub use matching::{merge, match_name, AssetMatch, NameMatch, Provenance};
pub use models::{resolve_model, ModelResolution};
pub use select::{parse_selection, Choice, MAX_DISPLAYED_MATCHES};

use crate::asset::{AssetDefinition, Category};
use crate::catalog::{AssetIndex, CatalogClient, IndexCache, IndexEntry, ModuleRef, ASSET_FILE};
use crate::config::{ConfigStore, InstalledConfig};

type Connect = dyn Fn() -> anyhow::Result<Arc<dyn CatalogClient>> + Send + Sync;

/// How a resolver reaches the catalog
pub struct CatalogAccess {
    index_module: ModuleRef,
    cache: Arc<dyn IndexCache>,
    connect: Box<Connect>,
}

impl CatalogAccess {
    /// Catalog whose client is built on first use
    pub fn new<F>(index_module: ModuleRef, cache: Arc<dyn IndexCache>, connect: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn CatalogClient>> + Send + Sync + 'static,
    {
        Self {
            index_module,
            cache,
            connect: Box::new(connect),
        }
    }

    /// Catalog with an already constructed client
    pub fn with_client(
        index_module: ModuleRef,
        cache: Arc<dyn IndexCache>,
        client: Arc<dyn CatalogClient>,
    ) -> Self {
        Self::new(index_module, cache, move || Ok(client.clone()))
    }
}

enum IndexState {
    NotLoaded,
    Loaded(Arc<AssetIndex>),
    Unavailable,
}

/// One resolution session
///
/// Holds the installed snapshot, the memoized catalog index and whether
/// anything was installed. Not meant to be shared between concurrent
/// resolutions.
pub struct Resolver {
    store: Arc<dyn ConfigStore>,
    catalog: CatalogAccess,
    interaction: Arc<dyn Interaction>,
    config: InstalledConfig,
    client: Option<Arc<dyn CatalogClient>>,
    index: IndexState,
    installed_any: bool,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        catalog: CatalogAccess,
        interaction: Arc<dyn Interaction>,
    ) -> Result<Self, ResolveError> {
        let config = store.load().map_err(ResolveError::Store)?;
        Ok(Self {
            store,
            catalog,
            interaction,
            config,
            client: None,
            index: IndexState::NotLoaded,
            installed_any: false,
        })
    }

    /// Current installed snapshot
    pub fn config(&self) -> &InstalledConfig {
        &self.config
    }

    /// Whether this session installed anything
    ///
    /// Callers holding their own view of the configuration must reload it
    /// when this is true.
    pub fn installed_any(&self) -> bool {
        self.installed_any
    }

    /// Resolve `query` to one installed asset name
    pub async fn resolve(&mut self, category: Category, query: &str) -> Result<String, ResolveError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(not_found(category, query));
        }

        if category == Category::Role && looks_like_path(query) {
            debug!("Treating role '{}' as a file path", query);
            return Ok(query.to_string());
        }

        if let Some(name) = self.installed_name(category, query)? {
            return Ok(name);
        }

        let query_lower = query.to_lowercase();
        let installed = matching::installed_matches(&self.config, category, &query_lower);
        if installed.len() == 1 {
            debug!("Unique installed match for '{}': {}", query, installed[0].name);
            return Ok(installed[0].name.clone());
        }

        let index = self.ensure_index().await;

        if installed.is_empty() {
            if let Some(index) = &index {
                if let Some((name, entry)) = catalog_name(index, category, query)? {
                    self.install(category, &name, &entry).await?;
                    return Ok(name);
                }
            }
        }

        let catalog = index
            .map(|index| matching::catalog_matches(&index, category, &query_lower))
            .unwrap_or_default();
        let merged = matching::merge(installed, catalog);

        let chosen = self.choose(category, query, merged)?;
        if let Provenance::Catalog(entry) = &chosen.provenance {
            self.install(category, &chosen.name, entry).await?;
        }
        Ok(chosen.name)
    }

    /// Merged, scored matches without installing anything
    pub async fn search(&mut self, category: Category, query: &str) -> Vec<AssetMatch> {
        let query_lower = query.trim().to_lowercase();
        let installed = matching::installed_matches(&self.config, category, &query_lower);
        let catalog = self
            .ensure_index()
            .await
            .map(|index| matching::catalog_matches(&index, category, &query_lower))
            .unwrap_or_default();
        matching::merge(installed, catalog)
    }

    /// Resolve a model alias of an installed agent
    pub async fn resolve_model(
        &mut self,
        agent: &str,
        query: &str,
    ) -> Result<ModelResolution, ResolveError> {
        let agent = self.resolve(Category::Agent, agent).await?;
        let definition = self
            .config
            .get(Category::Agent, &agent)
            .ok_or_else(|| not_found(Category::Agent, &agent))?;
        models::resolve_model(&agent, &definition.models, query, &*self.interaction)
    }

    /// Exact or short-name hit among installed assets
    fn installed_name(&self, category: Category, query: &str) -> Result<Option<String>, ResolveError> {
        match matching::match_name(self.config.assets(category).keys(), query) {
            NameMatch::Exact(name) | NameMatch::Short(name) => Ok(Some(name)),
            NameMatch::Ambiguous(candidates) => Err(ResolveError::Ambiguous {
                category,
                query: query.to_string(),
                candidates,
            }),
            NameMatch::None => Ok(None),
        }
    }

    fn choose(
        &self,
        category: Category,
        query: &str,
        mut matches: Vec<AssetMatch>,
    ) -> Result<AssetMatch, ResolveError> {
        if matches.is_empty() {
            return Err(not_found(category, query));
        }

        let choices: Vec<Choice> = matches
            .iter()
            .map(|m| Choice {
                name: m.name.clone(),
                detail: format!("[{}]{}", m.source_label(), describe(m, &self.config)),
            })
            .collect();
        let header = format!("Multiple {}s match '{}':", category, query);

        match select::disambiguate(&*self.interaction, &header, &choices)? {
            Some(i) => Ok(matches.swap_remove(i)),
            None => Err(ResolveError::Ambiguous {
                category,
                query: query.to_string(),
                candidates: matches.into_iter().map(|m| m.name).collect(),
            }),
        }
    }

    fn client(&mut self) -> anyhow::Result<Arc<dyn CatalogClient>> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = (self.catalog.connect)()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Load the catalog index at most once per session
    async fn ensure_index(&mut self) -> Option<Arc<AssetIndex>> {
        match &self.index {
            IndexState::Loaded(index) => return Some(index.clone()),
            IndexState::Unavailable => return None,
            IndexState::NotLoaded => {}
        }

        let loaded = match self.client() {
            Ok(client) => {
                fetch::load_index(
                    client,
                    self.catalog.cache.clone(),
                    &self.catalog.index_module,
                    self.interaction.clone(),
                )
                .await
            }
            Err(e) => {
                debug!("Catalog unavailable: {:#}", e);
                None
            }
        };

        self.index = match &loaded {
            Some(index) => IndexState::Loaded(index.clone()),
            None => IndexState::Unavailable,
        };
        loaded
    }

    /// Install a catalog asset and refresh the snapshot
    async fn install(
        &mut self,
        category: Category,
        name: &str,
        entry: &IndexEntry,
    ) -> Result<(), ResolveError> {
        if self.config.contains(category, name) {
            return Ok(());
        }

        self.install_from_catalog(category, name, entry)
            .await
            .map_err(|source| ResolveError::Install {
                category,
                name: name.to_string(),
                source,
            })?;

        if category == Category::Task {
            self.install_task_role(name).await;
        }
        Ok(())
    }

    async fn install_from_catalog(
        &mut self,
        category: Category,
        name: &str,
        entry: &IndexEntry,
    ) -> anyhow::Result<()> {
        let client = self.client()?;
        let module = entry.module_ref()?;
        let concrete = client.resolve_latest_version(&module).await?;
        let fetched = client.fetch(&concrete).await?;

        let mut definition = read_definition(&fetched.source_dir)?;
        definition.origin = Some(concrete.to_string());
        if definition.description.is_empty() {
            definition.description = entry.description.clone();
        }
        if definition.tags.is_empty() {
            definition.tags = entry.tags.clone();
        }

        self.store.install(category, name, &definition)?;
        self.installed_any = true;
        info!("Installed {} '{}' ({})", category, name, concrete);

        // Stale snapshots must never be used after an install
        self.config = self
            .store
            .load()
            .context("Failed to reload installed configuration")?;
        Ok(())
    }

    /// Install the role a freshly installed task requires
    async fn install_task_role(&mut self, task: &str) {
        let Some(role) = self
            .config
            .get(Category::Task, task)
            .and_then(|definition| definition.role.clone())
        else {
            return;
        };

        if looks_like_path(&role)
            || !matches!(
                matching::match_name(self.config.assets(Category::Role).keys(), &role),
                NameMatch::None
            )
        {
            return;
        }

        let Some(index) = self.ensure_index().await else {
            warn!("Task '{}' requires role '{}' but the catalog is unavailable", task, role);
            return;
        };

        let found = match catalog_name(&index, Category::Role, &role) {
            Ok(Some(found)) => found,
            Ok(None) => {
                warn!("Task '{}' requires role '{}' which is not in the catalog", task, role);
                return;
            }
            Err(e) => {
                warn!("Task '{}' requires role '{}': {}", task, role, e);
                return;
            }
        };

        let (name, entry) = found;
        if let Err(e) = self.install_from_catalog(Category::Role, &name, &entry).await {
            warn!("Failed to install role '{}' required by task '{}': {:#}", name, task, e);
        }
    }
}

/// Exact or short-name hit among catalog entries
fn catalog_name(
    index: &AssetIndex,
    category: Category,
    query: &str,
) -> Result<Option<(String, IndexEntry)>, ResolveError> {
    let entries = index.entries(category);
    match matching::match_name(entries.keys(), query) {
        NameMatch::Exact(name) | NameMatch::Short(name) => {
            let entry = entries[&name].clone();
            Ok(Some((name, entry)))
        }
        NameMatch::Ambiguous(candidates) => Err(ResolveError::Ambiguous {
            category,
            query: query.to_string(),
            candidates,
        }),
        NameMatch::None => Ok(None),
    }
}

fn read_definition(dir: &Path) -> anyhow::Result<AssetDefinition> {
    let path = dir.join(ASSET_FILE);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read asset definition: {}", path.display()))?;
    serde_yaml_ng::from_str(&content)
        .with_context(|| format!("Failed to parse asset definition: {}", path.display()))
}

fn describe(m: &AssetMatch, config: &InstalledConfig) -> String {
    let description = match &m.provenance {
        Provenance::Installed => config
            .get(m.category, &m.name)
            .map(|d| d.description.as_str())
            .unwrap_or(""),
        Provenance::Catalog(entry) => entry.short_description(),
    };
    let first_line = description.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        String::new()
    } else {
        format!(" {first_line}")
    }
}

fn not_found(category: Category, query: &str) -> ResolveError {
    ResolveError::NotFound {
        category,
        query: query.to_string(),
    }
}

/// Whether a role query names a file rather than an asset
pub fn looks_like_path(query: &str) -> bool {
    query.starts_with('/')
        || query.starts_with("./")
        || query.starts_with("../")
        || query.starts_with('~')
}
