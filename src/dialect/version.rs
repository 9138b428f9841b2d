//! MySQL / MariaDB server version parsing.
//!
//! The two families share a wire protocol but number their releases
//! independently, so a version only orders against versions of the same
//! family.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// MariaDB servers may prefix their real version with "5.5.5-" so that old
// replication clients accept them.
static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:5\.5\.5-)?(\d+)\.(\d+)\.(\d+)((?i)-MariaDB)?").expect("static version pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    MySql,
    MariaDb,
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::MySql => f.write_str("MySQL"),
            Variant::MariaDb => f.write_str("MariaDB"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("unrecognized MySQL / MariaDB version string: \"{0}\"")]
    Unrecognized(String),
    #[error("version component out of range in \"{0}\"")]
    OutOfRange(String),
}

/// A parsed server version. Ordering is partial: versions from different
/// families are never comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionInfo {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub variant: Variant,
}

impl VersionInfo {
    pub const fn new(major: u32, minor: u32, patch: u32, variant: Variant) -> Self {
        Self { major, minor, patch, variant }
    }

    pub const fn mysql(major: u32, minor: u32, patch: u32) -> Self {
        Self::new(major, minor, patch, Variant::MySql)
    }

    pub const fn mariadb(major: u32, minor: u32, patch: u32) -> Self {
        Self::new(major, minor, patch, Variant::MariaDb)
    }

    /// Parse a product version string as reported by the server, such as
    /// `8.0.36-0ubuntu0.22.04.1` or `5.5.5-10.11.6-MariaDB-1:10.11.6`.
    /// Anything after the recognized prefix is ignored.
    pub fn parse(raw: &str) -> Result<Self, VersionParseError> {
        let trimmed = raw.trim();
        let caps = VERSION_PATTERN
            .captures(trimmed)
            .ok_or_else(|| VersionParseError::Unrecognized(raw.to_string()))?;

        let component = |idx: usize| -> Result<u32, VersionParseError> {
            caps[idx].parse::<u32>().map_err(|_| VersionParseError::OutOfRange(raw.to_string()))
        };

        let variant = if caps.get(4).is_some() { Variant::MariaDb } else { Variant::MySql };
        Ok(Self::new(component(1)?, component(2)?, component(3)?, variant))
    }

    /// Three-way comparison, defined only within one variant.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        self.partial_cmp(other)
    }

    /// True when this version is the same family as `threshold` and not older
    /// than it. A different family never meets the threshold.
    pub fn is_at_least(&self, threshold: &Self) -> bool {
        matches!(self.compare(threshold), Some(Ordering::Greater | Ordering::Equal))
    }

    fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialOrd for VersionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.variant != other.variant {
            return None;
        }
        Some(self.triple().cmp(&other.triple()))
    }
}

impl FromStr for VersionInfo {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for VersionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}.{}.{}", self.variant, self.major, self.minor, self.patch)
    }
}
