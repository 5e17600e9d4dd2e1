//! Resolution commands
//!
//! Each command builds one resolver session from the settings file and
//! platform paths, runs it, and prints results to stdout.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::{debug, info};

use roster_core::asset::Category;
use roster_core::catalog::{CatalogClient, FileIndexCache, HttpCatalogClient};
use roster_core::config::{RosterPaths, Settings, YamlConfigStore};
use roster_core::resolve::{
    CatalogAccess, ModelResolution, Provenance, Resolver, TerminalInteraction,
    DEFAULT_CONTEXTS_TERM,
};

/// Settings and paths shared by all commands
pub struct Environment {
    pub settings: Settings,
    pub paths: RosterPaths,
}

impl Environment {
    pub fn load(settings_override: Option<&Path>) -> Result<Self> {
        let project_root = std::env::current_dir().context("Failed to read current directory")?;
        let paths = RosterPaths::discover(&project_root)?;
        let settings_path = settings_override.unwrap_or(&paths.settings);
        let settings = Settings::load(settings_path)?;
        debug!("Loaded settings from {}", settings_path.display());
        Ok(Self { settings, paths })
    }

    /// HTTP client for the configured registry
    pub fn catalog_client(&self) -> Result<HttpCatalogClient> {
        HttpCatalogClient::new(&self.settings.catalog.registry, self.paths.modules.clone())
    }

    fn resolver(&self, no_input: bool) -> Result<Resolver> {
        let store = Arc::new(YamlConfigStore::new(
            self.paths.global_assets.clone(),
            Some(self.paths.project_assets.clone()),
        ));
        let cache = Arc::new(FileIndexCache::new(self.paths.index_cache.clone()));

        let registry = self.settings.catalog.registry.clone();
        let modules: PathBuf = self.paths.modules.clone();
        let catalog = CatalogAccess::new(self.settings.index_module()?, cache, move || {
            let client: Arc<dyn CatalogClient> =
                Arc::new(HttpCatalogClient::new(&registry, modules.clone())?);
            Ok(client)
        });

        let interaction = Arc::new(TerminalInteraction::detect(no_input));
        Ok(Resolver::new(store, catalog, interaction)?)
    }
}

pub async fn resolve_command(
    env: &Environment,
    no_input: bool,
    category: Category,
    query: &str,
) -> Result<()> {
    let mut resolver = env.resolver(no_input)?;
    let name = resolver.resolve(category, query).await?;
    if resolver.installed_any() {
        info!("Installed {} '{}'", category, name);
    }
    println!("{name}");
    Ok(())
}

pub async fn model_command(
    env: &Environment,
    no_input: bool,
    agent: &str,
    query: &str,
) -> Result<()> {
    let mut resolver = env.resolver(no_input)?;
    match resolver.resolve_model(agent, query).await? {
        ModelResolution::Alias { alias, model } => {
            debug!("Model alias '{}' -> {}", alias, model);
            println!("{model}");
        }
        ModelResolution::Literal(model) => {
            eprintln!("No alias matches '{model}', using it as a model identifier");
            println!("{model}");
        }
    }
    Ok(())
}

pub async fn contexts_command(env: &Environment, no_input: bool, terms: &[String]) -> Result<()> {
    let mut resolver = env.resolver(no_input)?;
    let resolved = resolver.resolve_contexts(terms).await?;
    for name in resolved {
        if name != DEFAULT_CONTEXTS_TERM
            && !resolver.config().contains(Category::Context, &name)
        {
            eprintln!("Warning: context '{name}' is not installed");
        }
        println!("{name}");
    }
    Ok(())
}

/// Table row for search results
#[derive(Tabled)]
struct SearchRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Score")]
    score: u32,
    #[tabled(rename = "Source")]
    source: &'static str,
    #[tabled(rename = "Description")]
    description: String,
}

pub async fn search_command(
    env: &Environment,
    category: Category,
    query: &str,
    json_output: bool,
) -> Result<()> {
    let mut resolver = env.resolver(true)?;
    let matches = resolver.search(category, query).await;

    if json_output {
        let rows: Vec<serde_json::Value> = matches
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "score": m.score,
                    "source": m.source_label(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No {category} matches '{query}'.");
        return Ok(());
    }

    let rows: Vec<SearchRow> = matches
        .iter()
        .map(|m| {
            let description = match &m.provenance {
                Provenance::Catalog(entry) => {
                    entry.short_description().to_string()
                }
                Provenance::Installed => resolver
                    .config()
                    .get(category, &m.name)
                    .map(|d| d.description.clone())
                    .unwrap_or_default(),
            };
            SearchRow {
                name: m.name.clone(),
                score: m.score,
                source: m.source_label(),
                description: truncate(&description, 50),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub fn cache_clear_command(env: &Environment) -> Result<()> {
    let cache = FileIndexCache::new(env.paths.index_cache.clone());
    if cache.clear()? {
        println!("Removed {}", cache.path().display());
    } else {
        println!("No index cache to remove.");
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
