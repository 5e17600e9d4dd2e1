//! Candidate matching and merging
//!
//! Both sources produce [`AssetMatch`] values through the same scorer.
//! Merging keeps one match per name, installed provenance always
//! winning, and orders by descending score then ascending name.

use std::collections::BTreeSet;

use super::scorer::{self, Candidate};
use crate::asset::{short_name, Category};
use crate::catalog::{AssetIndex, IndexEntry};
use crate::config::InstalledConfig;

/// Where a match came from
#[derive(Debug, Clone, PartialEq)]
pub enum Provenance {
    Installed,
    Catalog(IndexEntry),
}

/// A resolution candidate
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMatch {
    pub category: Category,
    pub name: String,
    pub provenance: Provenance,
    pub score: u32,
}

impl AssetMatch {
    /// `installed` or `catalog`
    pub fn source_label(&self) -> &'static str {
        match self.provenance {
            Provenance::Installed => "installed",
            Provenance::Catalog(_) => "catalog",
        }
    }
}

/// Outcome of exact/short-name lookup
#[derive(Debug, Clone, PartialEq)]
pub enum NameMatch {
    /// Query equals a full name
    Exact(String),
    /// Query equals the short name of exactly one name
    Short(String),
    /// Query equals the short name of several names
    Ambiguous(Vec<String>),
    None,
}

/// Exact or short-name lookup among `names`
pub fn match_name<'a, I>(names: I, query: &str) -> NameMatch
where
    I: IntoIterator<Item = &'a String>,
{
    let mut short_matches = Vec::new();
    for name in names {
        if name == query {
            return NameMatch::Exact(name.clone());
        }
        if short_name(name) == query {
            short_matches.push(name.clone());
        }
    }

    match short_matches.len() {
        0 => NameMatch::None,
        1 => NameMatch::Short(short_matches.remove(0)),
        _ => {
            short_matches.sort();
            NameMatch::Ambiguous(short_matches)
        }
    }
}

/// Scored matches among installed definitions
pub fn installed_matches(
    config: &InstalledConfig,
    category: Category,
    query_lower: &str,
) -> Vec<AssetMatch> {
    let mut matches: Vec<AssetMatch> = config
        .assets(category)
        .iter()
        .filter_map(|(name, definition)| {
            let candidate = Candidate {
                name,
                module: definition.origin.as_deref().unwrap_or(""),
                description: &definition.description,
                tags: &definition.tags,
            };
            let score = scorer::score(&candidate, query_lower);
            (score > 0).then(|| AssetMatch {
                category,
                name: name.clone(),
                provenance: Provenance::Installed,
                score,
            })
        })
        .collect();

    sort_matches(&mut matches);
    matches
}

/// Scored matches among catalog entries
pub fn catalog_matches(index: &AssetIndex, category: Category, query_lower: &str) -> Vec<AssetMatch> {
    let mut matches: Vec<AssetMatch> = index
        .entries(category)
        .iter()
        .filter_map(|(name, entry)| {
            let candidate = Candidate {
                name,
                module: &entry.module,
                description: &entry.description,
                tags: &entry.tags,
            };
            let score = scorer::score(&candidate, query_lower);
            (score > 0).then(|| AssetMatch {
                category,
                name: name.clone(),
                provenance: Provenance::Catalog(entry.clone()),
                score,
            })
        })
        .collect();

    sort_matches(&mut matches);
    matches
}

/// Merge installed and catalog matches
///
/// A name present in both keeps its installed provenance and score.
pub fn merge(installed: Vec<AssetMatch>, catalog: Vec<AssetMatch>) -> Vec<AssetMatch> {
    let installed_names: BTreeSet<String> = installed.iter().map(|m| m.name.clone()).collect();

    let mut merged = installed;
    merged.extend(
        catalog
            .into_iter()
            .filter(|m| !installed_names.contains(&m.name)),
    );

    sort_matches(&mut merged);
    merged
}

/// Descending score, then ascending name
pub fn sort_matches(matches: &mut [AssetMatch]) {
    matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
}
