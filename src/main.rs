//! # Portfolio CLI (`portfolio`)
//!
//! Unpacks the seed archive, loads it into the store, then either serves the
//! site over HTTP or writes it out as static files.
//!
//! ## Examples
//!
//! ```bash
//! # Serve live on the configured address
//! portfolio --config ./config/portfolio.toml
//!
//! # Render the static site into output/webapp_build
//! portfolio --static
//! BUILD_STATIC=1 portfolio
//! ```

use clap::Parser;
use std::path::PathBuf;

use portfolio_site::{app, config, logging};

/// Portfolio site: serve live or build static pages from a seed archive.
#[derive(Parser)]
#[command(name = "portfolio", version)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it is absent.
    #[arg(long, default_value = "./config/portfolio.toml")]
    config: PathBuf,

    /// Generate the static site instead of serving it.
    #[arg(long = "static")]
    static_build: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let mut cfg = config::load_config(&cli.config)?;
    if cli.static_build {
        cfg.site.static_build = true;
    }

    app::run(&cfg).await
}
