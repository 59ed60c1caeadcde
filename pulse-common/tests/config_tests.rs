//! Integration tests for configuration loading and path resolution
//!
//! Tests that manipulate PULSE_* environment variables are marked with
//! #[serial] so they never run in parallel with each other.

use pulse_common::config::{resolve_path, TomlConfig, ENV_DATABASE};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ENV_DATABASE, "/tmp/from-env.db");

    let resolved = resolve_path(
        Some(Path::new("/tmp/from-cli.db")),
        ENV_DATABASE,
        Some(Path::new("/tmp/from-toml.db")),
        || PathBuf::from("/tmp/default.db"),
    );
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli.db"));

    env::remove_var(ENV_DATABASE);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ENV_DATABASE, "/tmp/from-env.db");

    let resolved = resolve_path(
        None,
        ENV_DATABASE,
        Some(Path::new("/tmp/from-toml.db")),
        || PathBuf::from("/tmp/default.db"),
    );
    assert_eq!(resolved, PathBuf::from("/tmp/from-env.db"));

    env::remove_var(ENV_DATABASE);
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ENV_DATABASE);

    let from_toml = resolve_path(
        None,
        ENV_DATABASE,
        Some(Path::new("/tmp/from-toml.db")),
        || PathBuf::from("/tmp/default.db"),
    );
    assert_eq!(from_toml, PathBuf::from("/tmp/from-toml.db"));

    let fallback = resolve_path(None, ENV_DATABASE, None, || PathBuf::from("/tmp/default.db"));
    assert_eq!(fallback, PathBuf::from("/tmp/default.db"));
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    env::set_var(ENV_DATABASE, "   ");

    let resolved = resolve_path(None, ENV_DATABASE, None, || PathBuf::from("/tmp/default.db"));
    assert_eq!(resolved, PathBuf::from("/tmp/default.db"));

    env::remove_var(ENV_DATABASE);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = TomlConfig::load(&temp_dir.path().join("absent.toml")).unwrap();

    assert!(config.data_root.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_config_file_is_read() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pulse.toml");
    std::fs::write(
        &path,
        "data_root = \"/srv/pulse/data\"\ncsv_dir = \"/srv/pulse/csv\"\n[logging]\nlevel = \"warn\"\n",
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.data_root, Some(PathBuf::from("/srv/pulse/data")));
    assert_eq!(config.csv_dir, Some(PathBuf::from("/srv/pulse/csv")));
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "data_root = [unterminated").unwrap();

    let result = TomlConfig::load(&path);
    assert!(matches!(result, Err(pulse_common::Error::Config(_))));
}
