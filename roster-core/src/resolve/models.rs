//! Model alias resolution for agents
//!
//! Single tier: exact alias, then every alias containing all query terms,
//! then the raw query as a literal model identifier.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use super::error::ResolveError;
use super::interaction::Interaction;
use super::select::{self, Choice};

static TERM_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").expect("valid regex"));

/// Outcome of model resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResolution {
    /// Query resolved to an alias of the agent
    Alias { alias: String, model: String },
    /// Nothing matched, the query is passed through unchanged
    Literal(String),
}

impl ModelResolution {
    /// The model identifier to hand to the agent
    pub fn model(&self) -> &str {
        match self {
            ModelResolution::Alias { model, .. } => model,
            ModelResolution::Literal(model) => model,
        }
    }
}

/// Split a query into lower-cased terms on commas and whitespace
pub fn split_terms(query: &str) -> Vec<String> {
    TERM_SEPARATOR
        .split(query.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Resolve `query` against an agent's model aliases
pub fn resolve_model(
    agent: &str,
    models: &BTreeMap<String, String>,
    query: &str,
    interaction: &dyn Interaction,
) -> Result<ModelResolution, ResolveError> {
    let query = query.trim();

    if let Some(model) = models.get(query) {
        return Ok(alias(query, model));
    }

    let terms = split_terms(query);
    if terms.is_empty() {
        return Ok(ModelResolution::Literal(query.to_string()));
    }

    let matches: Vec<(&String, &String)> = models
        .iter()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            terms.iter().all(|t| key.contains(t.as_str()))
        })
        .collect();

    if matches.is_empty() {
        tracing::debug!(
            "No model alias of '{}' matches '{}', passing it through",
            agent,
            query
        );
        return Ok(ModelResolution::Literal(query.to_string()));
    }

    let choices: Vec<Choice> = matches
        .iter()
        .map(|(key, model)| Choice {
            name: key.to_string(),
            detail: format!("-> {model}"),
        })
        .collect();
    let header = format!("Multiple models of '{agent}' match '{query}':");

    match select::disambiguate(interaction, &header, &choices)? {
        Some(i) => Ok(alias(matches[i].0, matches[i].1)),
        None => Err(ResolveError::AmbiguousModel {
            agent: agent.to_string(),
            query: query.to_string(),
            candidates: matches.iter().map(|(key, _)| key.to_string()).collect(),
        }),
    }
}

fn alias(alias: &str, model: &str) -> ModelResolution {
    ModelResolution::Alias {
        alias: alias.to_string(),
        model: model.to_string(),
    }
}
