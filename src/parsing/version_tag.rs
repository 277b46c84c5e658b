//! Release tag format checks

use std::sync::OnceLock;

use regex::Regex;

fn release_tag_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[vV]?[0-9]+\.[0-9]+\.[0-9]+$").ok())
        .as_ref()
}

/// Check whether a tag looks like a three-part numeric release, e.g. `v1.2.3`
///
/// One leading `v` or `V` is allowed. Never fails; malformed input is `false`.
pub fn validate_version_tag(tag: &str) -> bool {
    release_tag_pattern().is_some_and(|pattern| pattern.is_match(tag))
}

/// Normalise a version label so every label carries exactly one `v` prefix
///
/// All lower-case `v` characters are removed before prefixing, so `1.2.3`,
/// `v1.2.3` and `vv1.2.3` all become `v1.2.3`.
pub fn normalize_version_label(version: &str) -> String {
    format!("v{}", version.replace('v', ""))
}
