use thiserror::Error;

use crate::asset::Category;

/// Errors that stop a validation run
///
/// Per-asset inconsistencies are not errors; they are collected as
/// issues in the report.
#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Repository is not ready for validation: {0:#}")]
    Precondition(#[source] anyhow::Error),

    #[error("Failed to query published versions of {module}")]
    Catalog {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Index entry for {category} '{name}' is invalid")]
    InvalidEntry {
        category: Category,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to scan {category} modules")]
    Scan {
        category: Category,
        #[source]
        source: anyhow::Error,
    },
}
