//! Configuration loading and path resolution
//!
//! Bootstrap settings come from an optional TOML file. Paths are resolved in
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Category, Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the Pulse `data/` checkout location
pub const ENV_DATA_ROOT: &str = "PULSE_DATA_ROOT";

/// Environment variable overriding the SQLite database path
pub const ENV_DATABASE: &str = "PULSE_DATABASE";

/// Environment variable overriding the config file location
pub const ENV_CONFIG: &str = "PULSE_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Pulse `data/` checkout containing `aggregated/`, `map/` and `top/`
    #[serde(default)]
    pub data_root: Option<PathBuf>,

    /// SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory for CSV exports (no export when unset)
    #[serde(default)]
    pub csv_dir: Option<PathBuf>,

    /// Pincode → city reference CSV
    #[serde(default)]
    pub pincode_csv: Option<PathBuf>,

    /// Drop snapshots whose canonical state is outside the known vocabulary
    #[serde(default)]
    pub strict_states: bool,

    /// HTTP port for pulse-query
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-category root overrides, keyed by category name (`map_user`, ...)
    #[serde(default)]
    pub roots: BTreeMap<String, PathBuf>,

    #[serde(default)]
    pub canonical: CanonicalConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Extra state-name overrides appended to the built-in rename table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CanonicalConfig {
    #[serde(default)]
    pub state_overrides: BTreeMap<String, String>,
}

impl TomlConfig {
    /// Load configuration from `path`
    ///
    /// A missing file is not an error: a warning is logged and defaults are
    /// used. A file that exists but does not parse is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path, `PULSE_CONFIG`, or the platform default
    pub fn load_resolved(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_path(cli_path, ENV_CONFIG, None, default_config_path);
        Self::load(&path)
    }

    /// Root directory for one category
    ///
    /// An explicit `[roots]` entry wins; otherwise the category's standard
    /// location under `data_root` is used.
    pub fn category_root(&self, data_root: &Path, category: Category) -> PathBuf {
        self.roots
            .get(category.as_str())
            .cloned()
            .unwrap_or_else(|| data_root.join(category.relative_root()))
    }
}

/// Resolve a path following the CLI → ENV → TOML → default priority order
pub fn resolve_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
    default: impl FnOnce() -> PathBuf,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default()
}

/// Default config file: `<config dir>/pulse/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("pulse").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("./pulse.toml"))
}

/// OS-dependent default folder for the database and exports
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("pulse"))
        .unwrap_or_else(|| PathBuf::from("./pulse_data"))
}

pub fn default_database_path() -> PathBuf {
    default_data_folder().join("pulse.db")
}

/// Default data checkout: `./pulse/data` relative to the working directory
pub fn default_data_root() -> PathBuf {
    PathBuf::from("pulse").join("data")
}
