//! Symbolic release channels

use std::fmt;
use std::str::FromStr;

/// Named release channel usable in place of an explicit version.
///
/// Variants are declared in priority order: earlier tags sort as newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Latest,
    Pre,
    Beta,
    Alpha,
}

impl Tag {
    /// All tags, highest priority first
    pub const ALL: [Tag; 4] = [Tag::Latest, Tag::Pre, Tag::Beta, Tag::Alpha];

    /// The stable channel
    pub const STABLE: Tag = Tag::Latest;

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Latest => "latest",
            Tag::Pre => "pre",
            Tag::Beta => "beta",
            Tag::Alpha => "alpha",
        }
    }

    /// Position in the priority list (0 is the highest priority)
    pub fn priority(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Tag::Latest),
            "pre" => Ok(Tag::Pre),
            "beta" => Ok(Tag::Beta),
            "alpha" => Ok(Tag::Alpha),
            _ => Err(()),
        }
    }
}
