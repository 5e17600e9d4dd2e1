//! Match scoring
//!
//! Installed definitions and catalog entries are scored the same way:
//! each field that contains the query adds its weight. A score of zero
//! means the candidate does not match at all.

/// Weight of a name match
pub const NAME_WEIGHT: u32 = 3;

/// Weight of a module path match
pub const MODULE_WEIGHT: u32 = 2;

/// Weight of a description match
pub const DESCRIPTION_WEIGHT: u32 = 1;

/// Weight of each matching tag
pub const TAG_WEIGHT: u32 = 1;

/// Minimum score for a fuzzy match to stand in for a context list term
pub const CONTEXT_MIN_SCORE: u32 = 2;

/// The searchable fields of a candidate
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub module: &'a str,
    pub description: &'a str,
    pub tags: &'a [String],
}

/// Score a candidate against an already lower-cased query
pub fn score(candidate: &Candidate<'_>, query_lower: &str) -> u32 {
    if query_lower.is_empty() {
        return 0;
    }

    let contains = |field: &str| field.to_lowercase().contains(query_lower);

    let mut total = 0;
    if contains(candidate.name) {
        total += NAME_WEIGHT;
    }
    if !candidate.module.is_empty() && contains(candidate.module) {
        total += MODULE_WEIGHT;
    }
    if contains(candidate.description) {
        total += DESCRIPTION_WEIGHT;
    }
    total += candidate.tags.iter().filter(|t| contains(t)).count() as u32 * TAG_WEIGHT;

    total
}
