//! Resolution error types with actionable messages

use thiserror::Error;

use crate::asset::Category;

/// Errors returned by the resolver
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Nothing matched in any tier
    #[error("{category} '{query}' not found in installed configuration or catalog")]
    NotFound { category: Category, query: String },

    /// Several candidates and nobody to choose between them
    #[error(
        "{category} '{query}' is ambiguous, matches: {}\n\nRe-run with one of the exact names above.",
        .candidates.join(", ")
    )]
    Ambiguous {
        category: Category,
        query: String,
        candidates: Vec<String>,
    },

    /// Several model aliases match and nobody to choose between them
    #[error(
        "model '{query}' is ambiguous for agent '{agent}', matches: {}",
        .candidates.join(", ")
    )]
    AmbiguousModel {
        agent: String,
        query: String,
        candidates: Vec<String>,
    },

    /// Interactive answer did not identify a candidate
    #[error("Invalid selection '{input}': enter a number, an exact name, or a unique part of a name")]
    InvalidSelection { input: String },

    /// Auto-install of a catalog asset failed
    #[error("Failed to install {category} '{name}' from catalog")]
    Install {
        category: Category,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// Installed configuration could not be loaded
    #[error("Failed to load installed configuration")]
    Store(#[source] anyhow::Error),

    /// Prompting the user failed
    #[error("Failed to read selection")]
    Interaction(#[source] anyhow::Error),
}
