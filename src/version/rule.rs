//! Ordering and validity rules over version identifiers
//!
//! An identifier is either a symbolic [`Tag`] or a semantic version string.
//! Nothing here performs I/O and nothing here fails: malformed input is
//! treated as "invalid" or "not satisfied".

use std::cmp::Ordering;

use crate::version::range::VersionSpec;
use crate::version::semver::{parse_version, prerelease_head};
use crate::version::tags::Tag;

/// Wildcard condition matching any version, tags included
pub const ANY: &str = "*";

/// Returns true if `id` is exactly one of the symbolic tags
pub fn is_tag(id: &str) -> bool {
    id.parse::<Tag>().is_ok()
}

/// Tags are always valid; a version is valid iff it parses and falls within
/// `constraint`. The constraint selects release lines regardless of channel,
/// so `2.0.0-beta.1` is valid under `>1.x.x`. An unparseable constraint
/// rejects every version.
pub fn is_valid(id: &str, constraint: &str) -> bool {
    if is_tag(id) {
        return true;
    }
    let Some(version) = parse_version(id) else {
        return false;
    };
    VersionSpec::parse(constraint).is_some_and(|spec| spec.contains(&version))
}

/// Release channel of an identifier.
///
/// A tag classifies as itself. A version classifies as the first tag that
/// prefixes the leading token of its prerelease component, else as stable.
pub fn classify_tag(id: &str) -> Tag {
    if let Ok(tag) = id.parse::<Tag>() {
        return tag;
    }

    parse_version(id)
        .as_ref()
        .and_then(prerelease_head)
        .and_then(|head| Tag::ALL.into_iter().find(|tag| head.starts_with(tag.as_str())))
        .unwrap_or(Tag::STABLE)
}

/// Total order putting the newest identifier first.
///
/// `Ordering::Less` means `a` is newer and sorts before `b`. Tags come
/// before every version (in priority order), versions follow in descending
/// semver precedence (build metadata ignored), and unparseable strings
/// sort last. Sorting with this comparator leaves the canonical "current"
/// pick at index 0.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (a.parse::<Tag>(), b.parse::<Tag>()) {
        (Ok(a), Ok(b)) => a.priority().cmp(&b.priority()),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => match (parse_version(a), parse_version(b)) {
            (Some(a), Some(b)) => b.cmp_precedence(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Returns true if `version` satisfies `condition`.
///
/// A tag only satisfies the wildcard or itself. With
/// `accept_tag_condition`, a version also satisfies the name of its release
/// channel ("2.0.0-beta.1" satisfies "beta"). Otherwise `condition` is
/// evaluated as a range.
pub fn satisfies(version: &str, condition: &str, accept_tag_condition: bool) -> bool {
    if is_tag(version) {
        return condition == ANY || version == condition;
    }

    if accept_tag_condition && classify_tag(version).as_str() == condition {
        return true;
    }

    let Some(parsed) = parse_version(version) else {
        return false;
    };
    VersionSpec::parse(condition).is_some_and(|spec| spec.satisfies(&parsed))
}

/// Rule set bound to an acceptance constraint.
///
/// Components take a `VersionRule` instead of reading a global constraint.
#[derive(Debug, Clone)]
pub struct VersionRule {
    constraint: String,
    accepted: Option<VersionSpec>,
}

impl VersionRule {
    pub fn new(constraint: &str) -> Self {
        Self {
            constraint: constraint.to_string(),
            accepted: VersionSpec::parse(constraint),
        }
    }

    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    /// Same as [`is_valid`] with the constraint parsed once up front
    pub fn is_valid(&self, id: &str) -> bool {
        if is_tag(id) {
            return true;
        }
        match (&self.accepted, parse_version(id)) {
            (Some(spec), Some(version)) => spec.contains(&version),
            _ => false,
        }
    }

    pub fn classify_tag(&self, id: &str) -> Tag {
        classify_tag(id)
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        compare(a, b)
    }

    pub fn satisfies(&self, version: &str, condition: &str, accept_tag_condition: bool) -> bool {
        satisfies(version, condition, accept_tag_condition)
    }

    /// Sort identifiers newest first (stable)
    pub fn sort_newest_first(&self, ids: &mut [String]) {
        ids.sort_by(|a, b| compare(a, b));
    }
}
