//! Run settings for pulse-etl
//!
//! Resolves every setting from the command line, environment and TOML
//! config (in that priority order) into one `EtlSettings` value.

use pulse_common::config::{
    default_data_root, default_database_path, resolve_path, TomlConfig, ENV_DATABASE,
    ENV_DATA_ROOT,
};
use pulse_common::Category;
use std::path::PathBuf;
use tracing::info;

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_root: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub pincode_csv: Option<PathBuf>,
    pub only: Vec<Category>,
    pub strict_states: bool,
    pub log_level: Option<String>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct EtlSettings {
    pub data_root: PathBuf,
    pub database_path: PathBuf,
    /// CSV export directory; no export when `None`
    pub csv_dir: Option<PathBuf>,
    pub pincode_csv: Option<PathBuf>,
    /// Categories to process, in processing order
    pub categories: Vec<Category>,
    pub strict_states: bool,
    pub log_level: String,
}

impl EtlSettings {
    pub fn resolve(cli: CliOverrides, toml_config: &TomlConfig) -> Self {
        let data_root = resolve_path(
            cli.data_root.as_deref(),
            ENV_DATA_ROOT,
            toml_config.data_root.as_deref(),
            default_data_root,
        );
        let database_path = resolve_path(
            cli.database.as_deref(),
            ENV_DATABASE,
            toml_config.database_path.as_deref(),
            default_database_path,
        );

        let categories = if cli.only.is_empty() {
            Category::ALL.to_vec()
        } else {
            // Keep processing order regardless of flag order
            Category::ALL
                .into_iter()
                .filter(|c| cli.only.contains(c))
                .collect()
        };

        let settings = Self {
            data_root,
            database_path,
            csv_dir: cli.csv_dir.or_else(|| toml_config.csv_dir.clone()),
            pincode_csv: cli.pincode_csv.or_else(|| toml_config.pincode_csv.clone()),
            categories,
            strict_states: cli.strict_states || toml_config.strict_states,
            log_level: cli
                .log_level
                .unwrap_or_else(|| toml_config.logging.level.clone()),
        };

        info!("Data root: {}", settings.data_root.display());
        info!("Database: {}", settings.database_path.display());
        match &settings.csv_dir {
            Some(dir) => info!("CSV export: {}", dir.display()),
            None => info!("CSV export disabled"),
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(ENV_DATA_ROOT);
        std::env::remove_var(ENV_DATABASE);
    }

    #[test]
    #[serial]
    fn test_cli_wins_over_toml() {
        clear_env();
        let toml_config = TomlConfig {
            data_root: Some(PathBuf::from("/toml/data")),
            csv_dir: Some(PathBuf::from("/toml/csv")),
            ..Default::default()
        };
        let cli = CliOverrides {
            data_root: Some(PathBuf::from("/cli/data")),
            ..Default::default()
        };

        let settings = EtlSettings::resolve(cli, &toml_config);
        assert_eq!(settings.data_root, PathBuf::from("/cli/data"));
        assert_eq!(settings.csv_dir, Some(PathBuf::from("/toml/csv")));
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_env_wins_over_toml() {
        clear_env();
        std::env::set_var(ENV_DATABASE, "/env/pulse.db");
        let toml_config = TomlConfig {
            database_path: Some(PathBuf::from("/toml/pulse.db")),
            ..Default::default()
        };

        let settings = EtlSettings::resolve(CliOverrides::default(), &toml_config);
        assert_eq!(settings.database_path, PathBuf::from("/env/pulse.db"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_only_keeps_processing_order() {
        clear_env();
        let cli = CliOverrides {
            only: vec![Category::TopUser, Category::AggregatedUser],
            ..Default::default()
        };

        let settings = EtlSettings::resolve(cli, &TomlConfig::default());
        assert_eq!(
            settings.categories,
            vec![Category::AggregatedUser, Category::TopUser]
        );
        assert!(settings.csv_dir.is_none());
    }
}
