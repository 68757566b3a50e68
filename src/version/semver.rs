use semver::Version;

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros and
/// strips a leading 'v'.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "v1.2.3" -> Version(1, 2, 3)
/// - "2.0.0-beta.1" -> Version(2, 0, 0, pre: beta.1)
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    if version.is_empty() {
        return None;
    }

    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Leading token of the prerelease component ("beta.1" -> "beta"), if any.
pub fn prerelease_head(version: &Version) -> Option<&str> {
    if version.pre.is_empty() {
        return None;
    }
    version.pre.as_str().split('.').next()
}
