//! SQL dialect capability negotiation for MySQL-compatible backends.

mod capability;
mod version;

pub use capability::{
    CapabilityPolicy, Feature, QueryPlan, VersionSource, MARIADB_SUPPORTS_CTE, MYSQL_SUPPORTS_CTE,
};
pub use version::{Variant, VersionInfo, VersionParseError};
