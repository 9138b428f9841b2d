use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use dirauth::dialect::{Feature, VersionInfo};
use dirauth::{AppError, Settings};

fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let settings = Settings::from_env();
    info!(
        target: "dirauth",
        "dirauth: session_ttl_secs={}, mysql_recursive_min={}, mariadb_recursive_min={}",
        settings.session_ttl.as_secs(), settings.mysql_recursive_min, settings.mariadb_recursive_min
    );

    let versions: Vec<String> = std::env::args().skip(1).collect();
    if versions.is_empty() {
        eprintln!("usage: dirauth <server-version-string>...");
        return Ok(());
    }

    let policy = settings.capability_policy();
    for raw in &versions {
        let plan = policy.plan_for_group_resolution(raw);
        match VersionInfo::parse(raw) {
            Ok(v) => {
                let recursive = policy.supports(&v, Feature::RecursiveQuery);
                println!("{:<40} {:<20} recursive={} plan={:?}", raw, v.to_string(), recursive, plan);
            }
            Err(e) => {
                let err = AppError::from(e);
                println!("{:<40} {:<20} plan={:?}", raw, err.code_str(), plan);
            }
        }
    }
    Ok(())
}
