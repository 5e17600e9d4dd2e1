//! Per-asset consistency checks
//!
//! Pure functions over the three version records of one asset. Each
//! returns the issues it found; checks never stop each other.

use crate::asset::Category;
use crate::version;

/// Tag prefix of an asset, e.g. `roles/golang/assistant/`
pub fn tag_prefix(category: Category, name: &str) -> String {
    format!("{}/{}/", category.dir_name(), name)
}

/// Canonical versions tagged for an asset, ascending
pub fn tagged_versions(all_tags: &[String], prefix: &str) -> Vec<String> {
    let mut versions: Vec<String> = all_tags
        .iter()
        .filter_map(|tag| tag.strip_prefix(prefix))
        .filter(|v| !v.contains('/') && version::is_canonical(v))
        .map(String::from)
        .collect();
    version::sort(&mut versions);
    versions
}

/// Index-declared version must equal the latest published version
pub fn check_index_version(declared: Option<&str>, latest_published: Option<&str>) -> Option<String> {
    let Some(latest) = latest_published else {
        return Some("no published versions".to_string());
    };
    match declared {
        None => Some(format!("index has no version (latest published {latest})")),
        Some(declared) if declared == latest => None,
        Some(declared) => Some(format!(
            "index version {declared} does not match latest published {latest}"
        )),
    }
}

/// The latest published version must have a tag
pub fn check_latest_tagged(
    latest_published: Option<&str>,
    tags: &[String],
    prefix: &str,
) -> Option<String> {
    let latest = latest_published?;
    if tags.iter().any(|t| t == latest) {
        return None;
    }
    Some(format!("latest published {latest} has no tag {prefix}{latest}"))
}

/// Every tag must correspond to a published version
pub fn check_tags_published(tags: &[String], published: &[String], prefix: &str) -> Vec<String> {
    tags.iter()
        .filter(|tag| !published.contains(tag))
        .map(|tag| format!("tag {prefix}{tag} is not published"))
        .collect()
}

/// The tag to diff against, when the latest tag is also the latest published version
pub fn staleness_tag(tags: &[String], latest_published: Option<&str>) -> Option<String> {
    match (tags.last(), latest_published) {
        (Some(tag), Some(latest)) if tag == latest => Some(tag.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tagged_versions_filters_and_sorts() {
        let tags = strings(&[
            "roles/golang/v0.10.0",
            "roles/golang/v0.2.0",
            "roles/golang/latest",
            "roles/golang/nested/v9.0.0",
            "roles/golangci/v1.0.0",
            "tasks/golang/v3.0.0",
        ]);
        assert_eq!(
            tagged_versions(&tags, "roles/golang/"),
            strings(&["v0.2.0", "v0.10.0"])
        );
    }

    #[test]
    fn test_index_version_mismatch() {
        assert_eq!(
            check_index_version(Some("v0.1.0"), Some("v0.2.0")).unwrap(),
            "index version v0.1.0 does not match latest published v0.2.0"
        );
        assert!(check_index_version(Some("v0.2.0"), Some("v0.2.0")).is_none());
    }

    #[test]
    fn test_index_version_missing_records() {
        assert_eq!(
            check_index_version(None, Some("v0.2.0")).unwrap(),
            "index has no version (latest published v0.2.0)"
        );
        assert_eq!(
            check_index_version(Some("v0.1.0"), None).unwrap(),
            "no published versions"
        );
    }

    #[test]
    fn test_latest_published_without_tag() {
        let tags = strings(&["v0.1.0"]);
        assert_eq!(
            check_latest_tagged(Some("v0.2.0"), &tags, "roles/x/").unwrap(),
            "latest published v0.2.0 has no tag roles/x/v0.2.0"
        );
        assert!(check_latest_tagged(Some("v0.1.0"), &tags, "roles/x/").is_none());
        assert!(check_latest_tagged(None, &tags, "roles/x/").is_none());
    }

    #[test]
    fn test_unpublished_tags() {
        let tags = strings(&["v0.1.0", "v0.2.0", "v0.3.0"]);
        let published = strings(&["v0.1.0", "v0.2.0"]);
        assert_eq!(
            check_tags_published(&tags, &published, "roles/x/"),
            vec!["tag roles/x/v0.3.0 is not published"]
        );
    }

    #[test]
    fn test_staleness_tag() {
        let tags = strings(&["v0.1.0", "v0.2.0"]);
        assert_eq!(staleness_tag(&tags, Some("v0.2.0")).as_deref(), Some("v0.2.0"));
        assert!(staleness_tag(&tags, Some("v0.3.0")).is_none());
        assert!(staleness_tag(&[], Some("v0.3.0")).is_none());
    }
}
