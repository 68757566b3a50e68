//! npm-style version range parser
//!
//! Supports the range dialect used both for the acceptance constraint and for
//! version conditions:
//! - `1.2.3`, `=1.2.3` - exact match (partials like `1.2` are padded)
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `1.x.x`, `*` - wildcards
//! - `>1.x.x`, `<=1.2.x` - comparison operators applied to a wildcard prefix
//! - `1.0.0 - 2.0.0` - hyphen range
//! - `>=1.0.0 <2.0.0` (AND) and `^1.0.0 || ^2.0.0` (OR)

use std::cmp::Ordering;

use semver::Version;

use crate::version::semver::parse_version;

/// Top-level version specification
/// Handles compound ranges (AND, OR) as well as simple ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// Single range (^1.0.0, >=1.0.0, etc.)
    Single(VersionRange),
    /// AND of ranges (>=1.0.0 <2.0.0) - space-separated, all must satisfy
    And(Vec<VersionSpec>),
    /// OR of specs (^1.0.0 || ^2.0.0) - any must satisfy
    Or(Vec<VersionSpec>),
}

impl VersionSpec {
    /// Parse a version specification string. Returns None when any part of
    /// the specification is not understood.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        // OR (||) has the lowest precedence
        if spec.contains("||") {
            let specs: Option<Vec<VersionSpec>> = spec
                .split("||")
                .map(|s| s.trim())
                .map(Self::parse_and_or_single)
                .collect();
            return specs.map(VersionSpec::Or);
        }

        Self::parse_and_or_single(spec)
    }

    /// Parse a spec that may be AND (space-separated) or a single range
    fn parse_and_or_single(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        if let Some(range) = VersionRange::parse_hyphen(spec) {
            return Some(VersionSpec::Single(range));
        }

        let parts = Self::split_and_parts(spec);

        if parts.len() > 1 {
            let ranges: Option<Vec<VersionSpec>> = parts
                .into_iter()
                .map(|p| VersionRange::parse(&p).map(VersionSpec::Single))
                .collect();
            ranges.map(VersionSpec::And)
        } else {
            VersionRange::parse(spec).map(VersionSpec::Single)
        }
    }

    /// Split spec into AND parts. An operator separated from its version by
    /// whitespace (">= 1.2.3") stays attached to that version.
    fn split_and_parts(spec: &str) -> Vec<String> {
        let mut parts: Vec<String> = Vec::new();
        let mut pending_operator: Option<&str> = None;

        for token in spec.split_whitespace() {
            if is_bare_operator(token) {
                pending_operator = Some(token);
                continue;
            }
            match pending_operator.take() {
                Some(op) => parts.push(format!("{op}{token}")),
                None => parts.push(token.to_string()),
            }
        }

        if let Some(op) = pending_operator {
            // Dangling operator; keep it so the range fails to parse
            parts.push(op.to_string());
        }

        parts
    }

    /// Check if a version satisfies this spec.
    ///
    /// A prerelease only satisfies a comparator set (a single range or an
    /// AND group) in which some comparator names a prerelease of the same
    /// `major.minor.patch`: `*` and `>=3.0.0` reject `4.0.0-alpha.1`, while
    /// `>=3.0.0-beta.1 <4.0.0` accepts `3.0.0-beta.2`.
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Or(specs) => specs.iter().any(|s| s.satisfies(version)),
            _ => {
                self.contains(version)
                    && (version.pre.is_empty() || self.names_prerelease_of(version))
            }
        }
    }

    /// Range check on precedence alone, prereleases included.
    ///
    /// `>1.x.x` contains `2.0.0-beta.1`.
    pub fn contains(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Single(range) => range.satisfies(version),
            VersionSpec::And(specs) => specs.iter().all(|s| s.contains(version)),
            VersionSpec::Or(specs) => specs.iter().any(|s| s.contains(version)),
        }
    }

    fn names_prerelease_of(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Single(range) => range.names_prerelease_of(version),
            VersionSpec::And(specs) | VersionSpec::Or(specs) => {
                specs.iter().any(|s| s.names_prerelease_of(version))
            }
        }
    }
}

fn is_bare_operator(token: &str) -> bool {
    matches!(token, ">" | ">=" | "<" | "<=" | "=" | "^" | "~")
}

/// Comparison operator of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exact,
    Gt,
    Gte,
    Lt,
    Lte,
    Caret,
    Tilde,
}

/// Version prefix with wildcarded trailing components (`1.x`, `1.2.x`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partial {
    Major(u64),
    Minor(u64, u64),
}

impl Partial {
    /// Compare the matching prefix of `version` against this partial
    fn cmp_version(&self, version: &Version) -> Ordering {
        match *self {
            Partial::Major(major) => version.major.cmp(&major),
            Partial::Minor(major, minor) => (version.major, version.minor).cmp(&(major, minor)),
        }
    }
}

/// Represents a parsed npm version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRange {
    /// Operator applied to a complete version
    Version(Op, Version),
    /// Operator applied to a wildcarded prefix; `Exact` is a plain `1.x`
    Partial(Op, Partial),
    /// Any version: * matches all versions
    Any,
    /// Hyphen range: 1.0.0 - 2.0.0 means >=1.0.0 <=2.0.0
    Hyphen { from: Version, to: Version },
}

impl VersionRange {
    /// Parse a single range (no AND/OR)
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        if let Some(range) = Self::parse_hyphen(spec) {
            return Some(range);
        }

        let (op, rest) = if let Some(rest) = spec.strip_prefix(">=") {
            (Op::Gte, rest)
        } else if let Some(rest) = spec.strip_prefix('>') {
            (Op::Gt, rest)
        } else if let Some(rest) = spec.strip_prefix("<=") {
            (Op::Lte, rest)
        } else if let Some(rest) = spec.strip_prefix('<') {
            (Op::Lt, rest)
        } else if let Some(rest) = spec.strip_prefix('^') {
            (Op::Caret, rest)
        } else if let Some(rest) = spec.strip_prefix('~') {
            (Op::Tilde, rest)
        } else if let Some(rest) = spec.strip_prefix('=') {
            (Op::Exact, rest)
        } else {
            (Op::Exact, spec)
        };
        let rest = rest.trim();

        if is_wildcard(rest) {
            return Self::any_for(op);
        }

        if let Some(partial) = Self::parse_wildcard(rest) {
            return Some(VersionRange::Partial(op, partial));
        }

        parse_version(rest).map(|v| VersionRange::Version(op, v))
    }

    /// A bare wildcard behind an operator: `>=*` matches everything, `<*`
    /// and `>*` match nothing and are rejected.
    fn any_for(op: Op) -> Option<Self> {
        match op {
            Op::Exact | Op::Gte | Op::Lte | Op::Caret | Op::Tilde => Some(VersionRange::Any),
            Op::Gt | Op::Lt => None,
        }
    }

    /// Parse hyphen range like "1.0.0 - 2.0.0"
    fn parse_hyphen(spec: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.split(" - ").collect();
        if parts.len() != 2 {
            return None;
        }

        let from = parse_version(parts[0].trim())?;
        let to = parse_version(parts[1].trim())?;

        Some(VersionRange::Hyphen { from, to })
    }

    /// Parse wildcard patterns like "1.x", "1.x.x", "1.2.x" or "1.*"
    fn parse_wildcard(spec: &str) -> Option<Partial> {
        let spec = spec.strip_prefix('v').unwrap_or(spec);
        let parts: Vec<&str> = spec.split('.').collect();

        match parts.as_slice() {
            [major, x] if is_wildcard(x) => major.parse::<u64>().ok().map(Partial::Major),
            [major, x, y] if is_wildcard(x) && is_wildcard(y) => {
                major.parse::<u64>().ok().map(Partial::Major)
            }
            [major, minor, x] if is_wildcard(x) => {
                let major = major.parse::<u64>().ok()?;
                let minor = minor.parse::<u64>().ok()?;
                Some(Partial::Minor(major, minor))
            }
            _ => None,
        }
    }

    /// True if one of the range's bounds is a prerelease of the same
    /// `major.minor.patch` as `version`
    fn names_prerelease_of(&self, version: &Version) -> bool {
        let same_release = |bound: &Version| {
            !bound.pre.is_empty()
                && (bound.major, bound.minor, bound.patch)
                    == (version.major, version.minor, version.patch)
        };
        match self {
            VersionRange::Version(_, v) => same_release(v),
            VersionRange::Hyphen { from, to } => same_release(from) || same_release(to),
            VersionRange::Partial(..) | VersionRange::Any => false,
        }
    }

    /// Check if a version falls within this range by precedence alone.
    /// Prerelease exclusion is applied by [`VersionSpec::satisfies`].
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionRange::Version(op, v) => {
                let ordering = version.cmp_precedence(v);
                match op {
                    Op::Exact => ordering == Ordering::Equal,
                    Op::Gt => ordering == Ordering::Greater,
                    Op::Gte => ordering != Ordering::Less,
                    Op::Lt => ordering == Ordering::Less,
                    Op::Lte => ordering != Ordering::Greater,
                    Op::Caret => {
                        if ordering == Ordering::Less {
                            return false;
                        }
                        // ^1.2.3 -> >=1.2.3 <2.0.0
                        // ^0.2.3 -> >=0.2.3 <0.3.0
                        // ^0.0.3 -> >=0.0.3 <0.0.4
                        if v.major == 0 {
                            if v.minor == 0 {
                                version.major == 0 && version.minor == 0 && version.patch == v.patch
                            } else {
                                version.major == 0 && version.minor == v.minor
                            }
                        } else {
                            version.major == v.major
                        }
                    }
                    Op::Tilde => {
                        ordering != Ordering::Less
                            && version.major == v.major
                            && version.minor == v.minor
                    }
                }
            }
            VersionRange::Partial(op, partial) => {
                let ordering = partial.cmp_version(version);
                match op {
                    Op::Exact | Op::Caret | Op::Tilde => ordering == Ordering::Equal,
                    Op::Gt => ordering == Ordering::Greater,
                    Op::Gte => ordering != Ordering::Less,
                    Op::Lt => ordering == Ordering::Less,
                    Op::Lte => ordering != Ordering::Greater,
                }
            }
            VersionRange::Any => true,
            VersionRange::Hyphen { from, to } => {
                version.cmp_precedence(from) != Ordering::Less
                    && version.cmp_precedence(to) != Ordering::Greater
            }
        }
    }
}

fn is_wildcard(s: &str) -> bool {
    s == "*" || s.eq_ignore_ascii_case("x")
}
