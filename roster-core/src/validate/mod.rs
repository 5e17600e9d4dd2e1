//! Consistency validator for an asset repository
//!
//! For every indexed asset three records must agree: the repository tags
//! (`{category-dir}/{name}/vX.Y.Z`), the versions published to the
//! registry, and the version the index declares. Module directories the
//! index does not list are reported as orphans.
//!
//! Validation is read-only and strictly sequential.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod checks;
mod error;
mod git;
mod orphans;

pub use checks::tag_prefix;
pub use error::ValidateError;
pub use git::{DiffOutcome, GitCli, SourceControl};
pub use orphans::{find_orphans, Orphan};

use crate::asset::Category;
use crate::catalog::{AssetIndex, CatalogClient, IndexEntry};
use crate::config::DEFAULT_VALIDATE_BRANCH;
use crate::version;

/// Result for one asset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidateModuleResult {
    pub name: String,
    /// Version declared by the index
    pub version: Option<String>,
    pub passed: bool,
    pub issues: Vec<String>,
}

/// Results for one category, sorted by name
#[derive(Debug, Clone, Serialize)]
pub struct ValidateCatResult {
    pub category: Category,
    pub modules: Vec<ValidateModuleResult>,
}

/// Full validation report
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub categories: Vec<ValidateCatResult>,
    pub orphans: Vec<Orphan>,
}

impl ValidationReport {
    pub fn module_count(&self) -> usize {
        self.categories.iter().map(|c| c.modules.len()).sum()
    }

    pub fn passed_count(&self) -> usize {
        self.modules().filter(|m| m.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.modules().filter(|m| !m.passed).count()
    }

    /// True if any asset failed or any orphan was found
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0 || !self.orphans.is_empty()
    }

    fn modules(&self) -> impl Iterator<Item = &ValidateModuleResult> {
        self.categories.iter().flat_map(|c| c.modules.iter())
    }
}

/// Options for a validation run
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Branch the checkout must be on
    pub branch: String,
    /// Skip fetching and the upstream comparison
    pub offline: bool,
    /// Categories to validate, all when empty
    pub categories: Vec<Category>,
    /// Only validate assets whose name contains this text
    pub name_filter: Option<String>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            branch: DEFAULT_VALIDATE_BRANCH.to_string(),
            offline: false,
            categories: Vec::new(),
            name_filter: None,
        }
    }
}

impl ValidateOptions {
    fn selected_categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            Category::ALL
                .into_iter()
                .filter(|c| self.categories.contains(c))
                .collect()
        }
    }

    fn selects(&self, name: &str) -> bool {
        match &self.name_filter {
            Some(filter) => name.to_lowercase().contains(&filter.to_lowercase()),
            None => true,
        }
    }
}

/// Validates an asset repository against its index and the registry
pub struct Validator<'a> {
    repo_root: PathBuf,
    client: &'a dyn CatalogClient,
    scm: &'a dyn SourceControl,
    options: ValidateOptions,
}

impl<'a> Validator<'a> {
    pub fn new(
        repo_root: &Path,
        client: &'a dyn CatalogClient,
        scm: &'a dyn SourceControl,
        options: ValidateOptions,
    ) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            client,
            scm,
            options,
        }
    }

    /// Validate every selected asset of `index`
    ///
    /// `progress` is called once per asset, after its checks complete.
    pub async fn run<F>(
        &self,
        index: &AssetIndex,
        mut progress: F,
    ) -> Result<ValidationReport, ValidateError>
    where
        F: FnMut(Category, &ValidateModuleResult),
    {
        self.scm
            .check_clean_state(&self.options.branch, self.options.offline)
            .await
            .map_err(ValidateError::Precondition)?;

        let all_tags = self
            .scm
            .tags()
            .await
            .map_err(ValidateError::Precondition)?;
        debug!("Repository has {} tags", all_tags.len());

        let mut report = ValidationReport::default();

        for category in self.options.selected_categories() {
            let mut modules = Vec::new();
            for (name, entry) in index.entries(category) {
                if !self.options.selects(name) {
                    continue;
                }
                let result = self
                    .validate_asset(category, name, entry, &all_tags)
                    .await?;
                progress(category, &result);
                modules.push(result);
            }

            let orphans = find_orphans(&self.repo_root, category, index)
                .map_err(|source| ValidateError::Scan { category, source })?;
            report
                .orphans
                .extend(orphans.into_iter().filter(|o| self.options.selects(&o.name)));

            report.categories.push(ValidateCatResult { category, modules });
        }

        info!(
            "Validated {} assets: {} passed, {} failed, {} orphans",
            report.module_count(),
            report.passed_count(),
            report.failed_count(),
            report.orphans.len()
        );

        Ok(report)
    }

    async fn validate_asset(
        &self,
        category: Category,
        name: &str,
        entry: &IndexEntry,
        all_tags: &[String],
    ) -> Result<ValidateModuleResult, ValidateError> {
        let module = entry
            .module_ref()
            .map_err(|source| ValidateError::InvalidEntry {
                category,
                name: name.to_string(),
                source,
            })?;

        let prefix = checks::tag_prefix(category, name);
        let tags = checks::tagged_versions(all_tags, &prefix);

        let mut published: Vec<String> = self
            .client
            .module_versions(&module)
            .await
            .map_err(|source| ValidateError::Catalog {
                module: module.identity().to_string(),
                source,
            })?
            .into_iter()
            .filter(|v| version::is_canonical(v) && module.accepts(v))
            .collect();
        version::sort(&mut published);
        let latest_published = published.last().map(String::as_str);

        debug!(
            "{} {}: tags {:?}, published {:?}, declared {:?}",
            category, name, tags, published, entry.version
        );

        let mut issues = Vec::new();
        issues.extend(checks::check_index_version(
            entry.version.as_deref(),
            latest_published,
        ));
        issues.extend(checks::check_latest_tagged(latest_published, &tags, &prefix));
        issues.extend(checks::check_tags_published(&tags, &published, &prefix));

        if let Some(tag_version) = checks::staleness_tag(&tags, latest_published) {
            let tag = format!("{prefix}{tag_version}");
            let path = Path::new(category.dir_name()).join(name);
            match self.scm.diff_path(&tag, &path).await {
                Ok(DiffOutcome::Unchanged) => {}
                Ok(DiffOutcome::Changed) => {
                    issues.push(format!("content changed since {tag_version}"))
                }
                Err(e) => issues.push(format!("diff against {tag} failed: {e:#}")),
            }
        }

        Ok(ValidateModuleResult {
            name: name.to_string(),
            version: entry.version.clone(),
            passed: issues.is_empty(),
            issues,
        })
    }
}
