//! Runtime settings read from the environment.
//!
//! `DIRAUTH_SESSION_TTL_SECS`       session lifetime in the registry (default 3600)
//! `DIRAUTH_MYSQL_RECURSIVE_MIN`    first MySQL version with recursive CTEs (default 8.0.1)
//! `DIRAUTH_MARIADB_RECURSIVE_MIN`  first MariaDB version with recursive CTEs (default 10.2.2)

use std::time::Duration;

use tracing::warn;

use crate::dialect::{CapabilityPolicy, Feature, Variant, VersionInfo, MARIADB_SUPPORTS_CTE, MYSQL_SUPPORTS_CTE};
use crate::identity::SessionRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub session_ttl: Duration,
    pub mysql_recursive_min: VersionInfo,
    pub mariadb_recursive_min: VersionInfo,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(60 * 60),
            mysql_recursive_min: MYSQL_SUPPORTS_CTE,
            mariadb_recursive_min: MARIADB_SUPPORTS_CTE,
        }
    }
}

// The variable names the family, so "10.2.2" is accepted for MariaDB.
fn version_override(name: &str, raw: Option<String>, variant: Variant, default: VersionInfo) -> VersionInfo {
    let Some(raw) = raw else { return default; };
    match VersionInfo::parse(&raw) {
        Ok(v) => VersionInfo { variant, ..v },
        Err(e) => {
            warn!(target: "dirauth::config", "ignoring {}: {}; using {}", name, e, default);
            default
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build settings from an arbitrary variable source; unset or invalid
    /// values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let session_ttl = match lookup("DIRAUTH_SESSION_TTL_SECS") {
            None => d.session_ttl,
            Some(s) => match s.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(target: "dirauth::config", "ignoring DIRAUTH_SESSION_TTL_SECS={:?}; using {}s", s, d.session_ttl.as_secs());
                    d.session_ttl
                }
            },
        };
        let mysql_recursive_min = version_override(
            "DIRAUTH_MYSQL_RECURSIVE_MIN",
            lookup("DIRAUTH_MYSQL_RECURSIVE_MIN"),
            Variant::MySql,
            d.mysql_recursive_min,
        );
        let mariadb_recursive_min = version_override(
            "DIRAUTH_MARIADB_RECURSIVE_MIN",
            lookup("DIRAUTH_MARIADB_RECURSIVE_MIN"),
            Variant::MariaDb,
            d.mariadb_recursive_min,
        );
        Self { session_ttl, mysql_recursive_min, mariadb_recursive_min }
    }

    pub fn capability_policy(&self) -> CapabilityPolicy {
        CapabilityPolicy::empty()
            .with_threshold(Feature::RecursiveQuery, self.mysql_recursive_min)
            .with_threshold(Feature::RecursiveQuery, self.mariadb_recursive_min)
    }

    pub fn session_registry(&self) -> SessionRegistry {
        SessionRegistry::new(self.session_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(settings(&[]), Settings::default());
    }

    #[test]
    fn overrides_apply_to_named_family() {
        let s = settings(&[("DIRAUTH_MARIADB_RECURSIVE_MIN", "10.3.0"), ("DIRAUTH_SESSION_TTL_SECS", "120")]);
        assert_eq!(s.mariadb_recursive_min, VersionInfo::mariadb(10, 3, 0));
        assert_eq!(s.session_ttl, Duration::from_secs(120));
        let policy = s.capability_policy();
        assert!(!policy.supports_recursive_query("10.2.9-MariaDB"));
        assert!(policy.supports_recursive_query("8.0.1"));
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let s = settings(&[("DIRAUTH_MYSQL_RECURSIVE_MIN", "eight"), ("DIRAUTH_SESSION_TTL_SECS", "0")]);
        assert_eq!(s, Settings::default());
    }
}
