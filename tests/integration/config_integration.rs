//! Integration tests for layered configuration

use crate::integration::test_utils::with_config_env;
use frametree::cli::RunContext;
use frametree::config::{global_config_path, ConfigLoader};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_global(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("frametree").join("config.toml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_defaults_without_any_file() {
    let dir = TempDir::new().unwrap();
    let config = with_config_env(&dir, &[], || ConfigLoader::load(None).unwrap());
    assert_eq!(config.gather.init_timeout_ms, 500);
    assert_eq!(config.gather.relay_grace_ms, 250);
    assert_eq!(config.gather.sweep_interval_ms, 100);
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn test_global_file_is_resolved_under_xdg_config_home() {
    let dir = TempDir::new().unwrap();
    let path = with_config_env(&dir, &[], global_config_path).unwrap();
    assert_eq!(path, dir.path().join("frametree").join("config.toml"));
}

#[test]
fn test_explicit_file_overrides_global_file() {
    let dir = TempDir::new().unwrap();
    write_global(&dir, "[gather]\ninit_timeout_ms = 900\nrelay_grace_ms = 50\n");
    let explicit = dir.path().join("explicit.toml");
    std::fs::write(&explicit, "[gather]\ninit_timeout_ms = 1200\n").unwrap();

    let config = with_config_env(&dir, &[], || ConfigLoader::load(Some(&explicit)).unwrap());
    assert_eq!(config.gather.init_timeout_ms, 1200);
    assert_eq!(config.gather.relay_grace_ms, 50);
}

#[test]
fn test_environment_overrides_files() {
    let dir = TempDir::new().unwrap();
    write_global(&dir, "[gather]\ninit_timeout_ms = 900\n");

    let config = with_config_env(
        &dir,
        &[
            ("FRAMETREE_GATHER__INIT_TIMEOUT_MS", "1500"),
            ("FRAMETREE_LOGGING__LEVEL", "debug"),
        ],
        || ConfigLoader::load(None).unwrap(),
    );
    assert_eq!(config.gather.init_timeout_ms, 1500);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let result = with_config_env(&dir, &[], || ConfigLoader::load(Some(&missing)));
    assert!(result.is_err());
}

#[test]
fn test_run_context_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("bad.toml");
    std::fs::write(&explicit, "[gather]\nsweep_interval_ms = 0\n").unwrap();

    let result = with_config_env(&dir, &[], || RunContext::new(Some(explicit.clone())));
    let err = result.err().expect("invalid configuration rejected");
    assert!(err.to_string().contains("sweep_interval_ms"));
}
