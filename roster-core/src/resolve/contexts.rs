//! Context list resolution
//!
//! Each term of a context list resolves on its own and may expand to
//! several contexts. Terms that resolve to nothing are passed through so
//! the caller can warn about them later instead of failing the batch.

use tracing::debug;

use super::matching::{self, Provenance};
use super::scorer::CONTEXT_MIN_SCORE;
use super::{catalog_name, ResolveError, Resolver};
use crate::asset::Category;

/// Pseudo-term selecting the default contexts, never resolved
pub const DEFAULT_CONTEXTS_TERM: &str = "default";

impl Resolver {
    /// Resolve every term of a context list
    ///
    /// Output keeps input order without duplicates.
    pub async fn resolve_contexts(&mut self, terms: &[String]) -> Result<Vec<String>, ResolveError> {
        let mut resolved: Vec<String> = Vec::new();
        for term in terms {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            for name in self.resolve_context_term(term).await? {
                if !resolved.contains(&name) {
                    resolved.push(name);
                }
            }
        }
        Ok(resolved)
    }

    async fn resolve_context_term(&mut self, term: &str) -> Result<Vec<String>, ResolveError> {
        if term == DEFAULT_CONTEXTS_TERM {
            return Ok(vec![term.to_string()]);
        }

        if let Some(name) = self.installed_name(Category::Context, term)? {
            return Ok(vec![name]);
        }

        let term_lower = term.to_lowercase();
        let installed: Vec<_> =
            matching::installed_matches(self.config(), Category::Context, &term_lower)
                .into_iter()
                .filter(|m| m.score >= CONTEXT_MIN_SCORE)
                .collect();
        if !installed.is_empty() {
            return Ok(installed.into_iter().map(|m| m.name).collect());
        }

        let Some(index) = self.ensure_index().await else {
            return Ok(vec![term.to_string()]);
        };

        if let Some((name, entry)) = catalog_name(&index, Category::Context, term)? {
            self.install(Category::Context, &name, &entry).await?;
            return Ok(vec![name]);
        }

        let qualifying: Vec<_> = matching::catalog_matches(&index, Category::Context, &term_lower)
            .into_iter()
            .filter(|m| m.score >= CONTEXT_MIN_SCORE)
            .collect();

        if qualifying.is_empty() {
            debug!("Context term '{}' matched nothing, passing it through", term);
            return Ok(vec![term.to_string()]);
        }

        let mut names = Vec::with_capacity(qualifying.len());
        for m in qualifying {
            if let Provenance::Catalog(entry) = &m.provenance {
                self.install(Category::Context, &m.name, entry).await?;
            }
            names.push(m.name);
        }
        Ok(names)
    }
}
