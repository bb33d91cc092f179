//! TOML configuration parsing and validation.
//!
//! The configuration file is optional. When `--config` is not given,
//! `<root>/.cliplin/config.toml` is read if it exists and defaults are used
//! otherwise. The collection table is not configurable here.
//!
//! ```toml
//! [store]
//! path = ".cliplin/data/context/index.sqlite"
//!
//! [reindex]
//! skip_unchanged = false
//! follow_symlinks = false
//!
//! [log]
//! level = "warn"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Directory holding the store, relative to the project root.
pub const STORE_DIR: &str = ".cliplin/data/context";

/// Default config file location, relative to the project root.
pub const DEFAULT_CONFIG_PATH: &str = ".cliplin/config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reindex: ReindexConfig,
    #[serde(default)]
    pub log: LogConfig,

    /// Absolute project root. Set by [`load_config`].
    #[serde(skip)]
    pub project_root: PathBuf,
    /// The file the configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    Path::new(STORE_DIR).join("index.sqlite")
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReindexConfig {
    #[serde(default)]
    pub skip_unchanged: bool,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Absolute path of the store database file.
    pub fn store_path(&self) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            self.project_root.join(&self.store.path)
        }
    }

    /// Absolute path of the default config file for this project.
    pub fn default_config_path(&self) -> PathBuf {
        self.project_root.join(DEFAULT_CONFIG_PATH)
    }
}

/// Load the configuration for the project at `root`.
///
/// An explicit `path` must exist; the default location may be absent.
pub fn load_config(root: &Path, path: Option<&Path>) -> Result<Config> {
    let project_root = std::fs::canonicalize(root)
        .with_context(|| format!("Project root does not exist: {}", root.display()))?;

    let (file, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (project_root.join(DEFAULT_CONFIG_PATH), false),
    };

    let mut config = if file.exists() {
        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read config file: {}", file.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", file.display()))?;
        config.source = Some(file);
        config
    } else if required {
        bail!("Config file not found: {}", file.display());
    } else {
        Config::default()
    };
    config.project_root = project_root;

    if config.store.path.as_os_str().is_empty() {
        bail!("store.path must not be empty");
    }

    if EnvFilter::try_new(&config.log.level).is_err() {
        bail!("log.level is not a valid filter: '{}'", config.log.level);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(tmp.path(), None).unwrap();
        assert!(cfg.source.is_none());
        assert!(!cfg.reindex.skip_unchanged);
        assert_eq!(cfg.log.level, "warn");
        assert!(cfg
            .store_path()
            .ends_with(".cliplin/data/context/index.sqlite"));
        assert!(cfg.store_path().is_absolute());
    }

    #[test]
    fn reads_default_location() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".cliplin")).unwrap();
        std::fs::write(
            tmp.path().join(DEFAULT_CONFIG_PATH),
            "[reindex]\nskip_unchanged = true\n\n[store]\npath = \"db/custom.sqlite\"\n",
        )
        .unwrap();

        let cfg = load_config(tmp.path(), None).unwrap();
        assert!(cfg.source.is_some());
        assert!(cfg.reindex.skip_unchanged);
        assert_eq!(cfg.store_path(), cfg.project_root.join("db/custom.sqlite"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(load_config(tmp.path(), Some(&missing)).is_err());
    }

    #[test]
    fn rejects_bad_log_level() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("c.toml");
        std::fs::write(&file, "[log]\nlevel = \"cliplin=loud\"\n").unwrap();
        assert!(load_config(tmp.path(), Some(&file)).is_err());
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("absent"), None).is_err());
    }
}
