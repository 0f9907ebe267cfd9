use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub images: ImagesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Budget for a single logical store operation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            timeout_secs: default_timeout_secs(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/portfolio.sqlite")
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_zip_name")]
    pub zip_name: String,
    /// Where the seed files from the archive's `json/` folder land.
    #[serde(default = "default_seed_dir")]
    pub seed_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    #[serde(default)]
    pub static_build: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            zip_name: default_zip_name(),
            seed_dir: default_seed_dir(),
            static_dir: default_static_dir(),
            output_dir: default_output_dir(),
            build_dir: default_build_dir(),
            static_build: false,
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}
fn default_zip_name() -> String {
    "resources.zip".to_string()
}
fn default_seed_dir() -> PathBuf {
    PathBuf::from("./json")
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_build_dir() -> PathBuf {
    PathBuf::from("output/webapp_build")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImagesConfig {
    /// Images sized for the home page.
    #[serde(default = "default_lores_dir")]
    pub lores_dir: PathBuf,
    #[serde(default = "default_hires_dir")]
    pub hires_dir: PathBuf,
    #[serde(default = "default_placeholder")]
    pub placeholder: PathBuf,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            lores_dir: default_lores_dir(),
            hires_dir: default_hires_dir(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_lores_dir() -> PathBuf {
    PathBuf::from("./static/images/lores")
}
fn default_hires_dir() -> PathBuf {
    PathBuf::from("./static/images/hires")
}
fn default_placeholder() -> PathBuf {
    PathBuf::from("./static/images/lores/coming-soon.png")
}

impl Config {
    /// Suffix appended to page links. Static output is addressed by file name.
    pub fn html_suffix(&self) -> &'static str {
        if self.site.static_build {
            ".html"
        } else {
            ""
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.site.input_dir.join(&self.site.zip_name)
    }

    /// Applies process environment overrides on top of the file values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup("DB_PATH").filter(|v| !v.is_empty()) {
            self.db.path = PathBuf::from(path);
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
            let host = self
                .server
                .bind
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.server.bind = format!("{}:{}", host, port);
        }
        if let Some(flag) = lookup("BUILD_STATIC") {
            if flag == "1" {
                self.site.static_build = true;
            }
        }
        if let Some(name) = lookup("ZIP_NAME").filter(|v| !v.is_empty()) {
            self.site.zip_name = name;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.db.timeout_secs == 0 {
            anyhow::bail!("db.timeout_secs must be > 0");
        }
        if self.db.max_connections == 0 {
            anyhow::bail!("db.max_connections must be > 0");
        }
        if self.site.zip_name.trim().is_empty() {
            anyhow::bail!("site.zip_name must not be empty");
        }
        Ok(())
    }
}

/// Loads the configuration file, falling back to defaults when it is absent,
/// then applies environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.apply_env()?;
    config.validate()?;
    Ok(config)
}
