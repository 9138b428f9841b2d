use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::debug;

use super::version::{Variant, VersionInfo};

/// The earliest MariaDB release with recursive CTEs.
pub const MARIADB_SUPPORTS_CTE: VersionInfo = VersionInfo::mariadb(10, 2, 2);

/// The earliest MySQL release with recursive CTEs.
pub const MYSQL_SUPPORTS_CTE: VersionInfo = VersionInfo::mysql(8, 0, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    RecursiveQuery,
}

/// How hierarchical group membership should be resolved against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPlan {
    /// A single `WITH RECURSIVE` statement.
    Recursive,
    /// One round-trip per level of the hierarchy.
    Iterative,
}

/// Source of the free-form product version string of a connected database.
pub trait VersionSource {
    fn product_version(&self) -> Result<String>;
}

impl<F> VersionSource for F
where
    F: Fn() -> Result<String>,
{
    fn product_version(&self) -> Result<String> {
        self()
    }
}

/// Minimum versions per family for each feature. A family with no entry
/// never supports the feature.
#[derive(Debug, Clone)]
pub struct CapabilityPolicy {
    thresholds: HashMap<(Feature, Variant), VersionInfo>,
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self::empty()
            .with_threshold(Feature::RecursiveQuery, MARIADB_SUPPORTS_CTE)
            .with_threshold(Feature::RecursiveQuery, MYSQL_SUPPORTS_CTE)
    }
}

impl CapabilityPolicy {
    pub fn empty() -> Self {
        Self { thresholds: HashMap::new() }
    }

    /// Set the minimum version of `threshold.variant` that provides `feature`,
    /// replacing any previous entry for that family.
    pub fn with_threshold(mut self, feature: Feature, threshold: VersionInfo) -> Self {
        self.thresholds.insert((feature, threshold.variant), threshold);
        self
    }

    pub fn threshold(&self, feature: Feature, variant: Variant) -> Option<&VersionInfo> {
        self.thresholds.get(&(feature, variant))
    }

    pub fn supports(&self, version: &VersionInfo, feature: Feature) -> bool {
        self.threshold(feature, version.variant)
            .is_some_and(|min| version.is_at_least(min))
    }

    /// Whether the server reporting `raw` can run recursive queries. An
    /// unrecognized string is treated as "not supported".
    pub fn supports_recursive_query(&self, raw: &str) -> bool {
        match VersionInfo::parse(raw) {
            Ok(version) => {
                debug!(target: "dirauth::dialect", "Database recognized as {}.", version);
                self.supports(&version, Feature::RecursiveQuery)
            }
            Err(e) => {
                debug!(
                    target: "dirauth::dialect",
                    "{}. Assuming database engine does not support recursive queries.", e
                );
                false
            }
        }
    }

    pub fn plan_for_group_resolution(&self, raw: &str) -> QueryPlan {
        if self.supports_recursive_query(raw) { QueryPlan::Recursive } else { QueryPlan::Iterative }
    }

    /// Ask a live connection for its version. Failing to read the version is
    /// an error; failing to parse it is not.
    pub fn recursive_query_supported(&self, source: &dyn VersionSource) -> Result<bool> {
        let raw = source
            .product_version()
            .context("cannot determine whether MySQL / MariaDB supports recursive queries")?;
        Ok(self.supports_recursive_query(&raw))
    }
}
