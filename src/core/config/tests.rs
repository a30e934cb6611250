use super::data::{path_display, Config};
use super::io::ConfigError;
use crate::core::settings::DispatchMode;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.base_url(), "https://api.openai.com/v1");
    assert_eq!(config.context_window(), 10);
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
    assert_eq!(config.dispatch_mode(), DispatchMode::AllowFallback);
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        base_url: Some("http://localhost:11434/v1".to_string()),
        temperature: Some(0.3),
        max_tokens: Some(512),
        context_window: Some(6),
        request_timeout_secs: Some(5),
        remote_enabled: Some(true),
        remote_only: Some(true),
    };
    config.save_to_path(&config_path).expect("Failed to save");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load");
    assert_eq!(loaded, config);
    assert_eq!(loaded.dispatch_mode(), DispatchMode::RemoteOnly);

    let mut cleared = loaded.clone();
    cleared.remote_only = None;
    cleared.temperature = None;
    cleared.save_to_path(&config_path).expect("Failed to save");

    let reloaded = Config::load_from_path(&config_path).expect("Failed to load");
    assert_eq!(reloaded.remote_only, None);
    assert_eq!(reloaded.temperature, None);
    assert_eq!(reloaded.max_tokens, Some(512));
}

#[test]
fn session_settings_use_config_values_and_defaults() {
    let config = Config {
        temperature: Some(0.1),
        remote_enabled: Some(false),
        ..Default::default()
    };

    let settings = config.session_settings();
    assert_eq!(settings.temperature, 0.1);
    assert_eq!(settings.max_tokens, 1000);
    assert!(!settings.remote_enabled);
    assert_eq!(settings.model, "gpt-3.5-turbo");
    assert!(settings.credential.is_none());
}

#[test]
fn invalid_toml_reports_parse_error_with_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "temperature = \"warm\"\n").expect("write failed");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn path_display_keeps_paths_outside_home() {
    assert_eq!(path_display("/tmp/parlance/config.toml"), "/tmp/parlance/config.toml");
}

#[test]
fn zero_window_and_timeout_in_file_fall_back_to_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "context_window = 0\nrequest_timeout_secs = 0\n")
        .expect("write failed");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(config.context_window, Some(0));
    assert_eq!(config.context_window(), 10);
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
}
