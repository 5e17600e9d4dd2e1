//! Version comparison
//!
//! Asset versions are canonical semantic versions with a leading `v`,
//! e.g. `v1.2.0` or `v0.3.0-rc.1`. Build metadata is never canonical.

use std::cmp::Ordering;

/// Parse a canonical version string
pub fn parse(version: &str) -> Option<semver::Version> {
    let rest = version.strip_prefix('v')?;
    let parsed = semver::Version::parse(rest).ok()?;
    if !parsed.build.is_empty() {
        return None;
    }
    Some(parsed)
}

/// Whether a string is a canonical `vMAJOR.MINOR.PATCH` version
pub fn is_canonical(version: &str) -> bool {
    parse(version).is_some()
}

/// Compare two version strings
///
/// Canonical versions order semantically and always sort after
/// non-canonical strings, which fall back to string order.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Sort versions ascending
pub fn sort(versions: &mut [String]) {
    versions.sort_by(|a, b| compare(a, b));
}

/// The highest canonical version, if any
pub fn latest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter(|v| is_canonical(v))
        .max_by(|a, b| compare(a, b))
}

/// Major component of a major-only query such as `v0` or `v2`
pub fn major_query(version: &str) -> Option<u64> {
    version.strip_prefix('v')?.parse().ok()
}
