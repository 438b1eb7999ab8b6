use lucidlink_mcp::config::{ConfigError, ServerConfig};
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_config_serialization_roundtrip() {
    let original_config = ServerConfig::default();

    let toml_str = original_config
        .to_toml_string()
        .expect("Should be able to serialize config to TOML");

    assert!(toml_str.contains("[api]"), "Should contain the api section");
    assert!(toml_str.contains("[container]"), "Should contain the container section");

    let deserialized_config =
        ServerConfig::from_toml_str(&toml_str).expect("Should be able to deserialize TOML string");

    assert_eq!(original_config, deserialized_config);
}

#[test]
fn test_config_file_operations() {
    let mut original_config = ServerConfig::default();
    original_config.container.host_port = 4004;
    original_config.container.launch_command = Some(vec!["systemctl".into(), "start".into(), "docker".into()]);

    let temp_file = NamedTempFile::new().expect("Should be able to create temporary file");
    let temp_path = temp_file.path();

    original_config
        .to_toml_file(temp_path)
        .expect("Should be able to save config to file");

    let loaded_config =
        ServerConfig::from_toml_file(temp_path).expect("Should be able to load config from file");

    assert_eq!(original_config, loaded_config);
    assert_eq!(loaded_config.orchestrator_settings().host_port, 4004);
    assert_eq!(
        loaded_config.engine_settings().launch_command,
        vec!["systemctl", "start", "docker"]
    );
}

#[test]
fn test_partial_config_fills_defaults() {
    let config = ServerConfig::from_toml_str(
        r#"
[api]
base_url = "http://127.0.0.1:9000/api/v1"

[rate_limit]
max_calls = 3
"#,
    )
    .expect("Partial config should load");

    let api = config.api_client_config();
    assert_eq!(api.base_url, "http://127.0.0.1:9000/api/v1");
    assert_eq!(api.max_calls, 3);
    assert_eq!(api.window, Duration::from_secs(60));
    assert_eq!(config.orchestrator_settings().container_name, "lucidlink-api");
}

#[test]
fn test_invalid_config_rejected() {
    let result = ServerConfig::from_toml_str(
        r#"
[container]
poll_interval_ms = 0
"#,
    );
    assert!(matches!(result, Err(ConfigError::Invalid(_))));

    let result = ServerConfig::from_toml_str("[api\nbase_url = ");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_missing_file_reports_path() {
    let error = ServerConfig::from_toml_file("/nonexistent/lucidlink-mcp.toml").unwrap_err();
    assert!(error.to_string().contains("/nonexistent/lucidlink-mcp.toml"));
}
