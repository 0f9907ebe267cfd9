use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the level.
pub fn init_logging(verbose: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbose, rust_log.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("could not install log subscriber: {}", e))?;

    Ok(())
}

/// sqlx is muted to WARN unless `RUST_LOG` is set, in which case the
/// environment decides every level.
fn build_filter(verbose: bool, rust_log: Option<&str>) -> Result<EnvFilter> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = EnvFilter::builder().with_default_directive(level.into());

    match rust_log.filter(|spec| !spec.trim().is_empty()) {
        Some(spec) => Ok(builder.parse_lossy(spec)),
        None => Ok(builder.parse_lossy("").add_directive("sqlx=warn".parse()?)),
    }
}
