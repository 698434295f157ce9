//! Configuration management for CLI tools.
//!
//! Configuration is stored in ~/.facekeep/{app_name}/config.yaml

use std::path::{Path, PathBuf};
use std::time::Duration;

use facekeep_faceid::{ConfidencePolicy, ServiceConfig, DEFAULT_TOP_K};
use facekeep_vecstore::{DEFAULT_DIM, DEFAULT_INDEX_FILE};
use serde::{Deserialize, Serialize};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".facekeep";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// CLI configuration.
///
/// Relative paths are resolved against the directory holding the config
/// file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Embedding index file.
    pub index_file_path: String,

    /// Description store (redb) file.
    pub descriptions_path: String,

    /// Embedding dimension.
    pub dim: usize,

    /// Neighbors consulted per recognition.
    pub top_k: usize,

    /// Upper bound for a single index operation, in milliseconds.
    pub timeout_ms: u64,

    /// Distance-to-confidence policy.
    pub policy: ConfidencePolicy,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_file_path: DEFAULT_INDEX_FILE.to_string(),
            descriptions_path: "descriptions.redb".to_string(),
            dim: DEFAULT_DIM,
            top_k: DEFAULT_TOP_K,
            timeout_ms: 5000,
            policy: ConfidencePolicy::default(),
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// `~/.facekeep/{app_name}`, if a home directory is known.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// File this configuration was loaded from.
    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Returns the config directory path.
    pub fn dir(&self) -> Option<&Path> {
        self.config_path.parent()
    }

    /// Writes the configuration back to the file it was loaded from.
    pub fn save(&self) -> anyhow::Result<()> {
        write_yaml(&self.config_path, self)
    }

    /// Checks every setting the service depends on.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index_file_path.is_empty() {
            anyhow::bail!("index_file_path must not be empty");
        }
        if self.descriptions_path.is_empty() {
            anyhow::bail!("descriptions_path must not be empty");
        }
        if self.dim == 0 {
            anyhow::bail!("dim must be positive");
        }
        if self.top_k == 0 {
            anyhow::bail!("top_k must be positive");
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("timeout_ms must be positive");
        }
        self.policy.validate()?;
        Ok(())
    }

    /// Resolves a configured path against the config directory.
    pub fn resolve_path(&self, p: &str) -> PathBuf {
        let path = PathBuf::from(p);
        if path.is_absolute() {
            return path;
        }
        match self.dir() {
            Some(dir) => dir.join(path),
            None => path,
        }
    }

    /// Absolute location of the embedding index.
    pub fn index_path(&self) -> PathBuf {
        self.resolve_path(&self.index_file_path)
    }

    /// Absolute location of the description store.
    pub fn descriptions_file(&self) -> PathBuf {
        self.resolve_path(&self.descriptions_path)
    }

    /// Settings for the identity service.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            top_k: self.top_k,
            timeout: Duration::from_millis(self.timeout_ms),
            policy: self.policy,
        }
    }
}

/// Picks the config file: `custom_path` if given, the app default otherwise.
fn locate(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<PathBuf> {
    match custom_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine home directory for config")),
    }
}

fn write_yaml(path: &Path, config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_yaml::to_string(config)?)?;
    Ok(())
}

/// Loads configuration for the specified app.
///
/// A missing file is created with default settings.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = locate(app_name, custom_path)?;

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("parse {}: {e}", config_path.display()))?
    } else {
        let cfg = Config::default();
        write_yaml(&config_path, &cfg)?;
        cfg
    };

    cfg.config_path = config_path;
    Ok(cfg)
}

/// Writes `config` for the specified app and returns the file written.
pub fn save_config(
    app_name: &str,
    config: &Config,
    custom_path: Option<&str>,
) -> anyhow::Result<PathBuf> {
    let config_path = locate(app_name, custom_path)?;
    write_yaml(&config_path, config)?;
    Ok(config_path)
}
