//! Configuration resolution and graceful degradation tests
//!
//! Tests that manipulate JUKEBOT_TEST_CONFIG are marked with #[serial]
//! so they run sequentially, not in parallel.

use jukebot_common::config::{load_toml, ConfigResolver, LoggingConfig};
use jukebot_common::Error;
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

const TEST_ENV_VAR: &str = "JUKEBOT_TEST_CONFIG";

#[derive(Debug, Default, Deserialize, PartialEq)]
struct TestConfig {
    #[serde(default)]
    command_prefix: String,
    #[serde(default)]
    logging: LoggingConfig,
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
#[serial]
fn test_resolver_env_var_used_without_cli_argument() {
    env::set_var(TEST_ENV_VAR, "/tmp/jukebot-env-config.toml");

    let resolver = ConfigResolver::new("jukebot-test").with_env_var(TEST_ENV_VAR);
    assert_eq!(
        resolver.resolve(None),
        Some(PathBuf::from("/tmp/jukebot-env-config.toml"))
    );

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_cli_argument_beats_env_var() {
    env::set_var(TEST_ENV_VAR, "/tmp/jukebot-env-config.toml");

    let resolver = ConfigResolver::new("jukebot-test").with_env_var(TEST_ENV_VAR);
    let cli = PathBuf::from("/tmp/jukebot-cli-config.toml");
    assert_eq!(resolver.resolve(Some(&cli)), Some(cli));

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_without_any_source_returns_none() {
    env::remove_var(TEST_ENV_VAR);

    // An app name that certainly has no per-user config file
    let resolver = ConfigResolver::new(&format!("jukebot-absent-{}", std::process::id()))
        .with_env_var(TEST_ENV_VAR);
    assert_eq!(resolver.resolve(None), None);
}

#[test]
fn test_load_valid_file() {
    let file = write_config(
        r#"
command_prefix = "!"

[logging]
level = "debug"
"#,
    );

    let config: TestConfig = load_toml(Some(file.path())).unwrap();
    assert_eq!(config.command_prefix, "!");
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_load_partial_file_fills_defaults() {
    let file = write_config("command_prefix = \"?\"\n");

    let config: TestConfig = load_toml(Some(file.path())).unwrap();
    assert_eq!(config.command_prefix, "?");
    assert_eq!(config.logging, LoggingConfig::default());
}

#[test]
fn test_load_malformed_file_is_error() {
    let file = write_config("command_prefix = \n[[[");

    let result: jukebot_common::Result<TestConfig> = load_toml(Some(file.path()));
    assert!(matches!(result, Err(Error::Toml(_))));
}
