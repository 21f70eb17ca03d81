//! ---
//! rsd_section: "15-testing-qa-runbook"
//! rsd_subsection: "integration-tests"
//! rsd_type: "source"
//! rsd_scope: "code"
//! rsd_description: "Configuration loading scenarios against real files."
//! rsd_version: "v0.1.0-alpha"
//! rsd_owner: "tbd"
//! ---
use std::fs;
use std::time::Duration;

use parking_lot::Mutex;
use rolesync_common::{AppConfig, LogFormat};

// Tests that call the loader share the process environment through
// `ROLESYNC_CONFIG`; serialize them so an override set in one test is never
// visible to another.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const SAMPLE: &str = r#"
[discord]
token_env = "SILVERMART_TOKEN"

[marker]
role_id = 1396710984491728967
vanity_pattern = "discord.gg/silvermart"

[sweep]
interval = 300

[logging]
format = "pretty"
"#;

#[test]
fn config_loads_from_first_existing_candidate() {
    let _guard = ENV_LOCK.lock();
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.toml");
    let present = dir.path().join("rolesync.toml");
    fs::write(&present, SAMPLE).expect("write config");

    let loaded =
        AppConfig::load_with_source(&[missing, present.clone()]).expect("config loads");
    assert_eq!(loaded.source, present);
    assert_eq!(loaded.config.marker.role_id, 1396710984491728967);
    assert_eq!(loaded.config.sweep.interval, Duration::from_secs(300));
    assert_eq!(loaded.config.logging.format, LogFormat::Pretty);
}

#[test]
fn env_override_takes_priority_over_candidates() {
    let _guard = ENV_LOCK.lock();
    let dir = tempfile::tempdir().expect("tempdir");
    let candidate = dir.path().join("candidate.toml");
    fs::write(&candidate, SAMPLE).expect("write candidate");
    let override_path = dir.path().join("override.toml");
    fs::write(&override_path, SAMPLE.replace("interval = 300", "interval = 120"))
        .expect("write override");

    std::env::set_var(AppConfig::ENV_CONFIG_PATH, &override_path);
    let loaded = AppConfig::load_with_source(&[candidate]).expect("override loads");
    std::env::remove_var(AppConfig::ENV_CONFIG_PATH);

    assert_eq!(loaded.source, override_path);
    assert_eq!(loaded.config.sweep.interval, Duration::from_secs(120));
}

#[test]
fn blank_env_override_falls_through_to_candidates() {
    let _guard = ENV_LOCK.lock();
    let dir = tempfile::tempdir().expect("tempdir");
    let candidate = dir.path().join("candidate.toml");
    fs::write(&candidate, SAMPLE).expect("write candidate");

    std::env::set_var(AppConfig::ENV_CONFIG_PATH, "  ");
    let loaded =
        AppConfig::load_with_source(&[candidate.clone()]).expect("candidate loads");
    std::env::remove_var(AppConfig::ENV_CONFIG_PATH);

    assert_eq!(loaded.source, candidate);
    assert_eq!(loaded.config.sweep.interval, Duration::from_secs(300));
}

#[test]
fn missing_config_reports_inspected_candidates() {
    let _guard = ENV_LOCK.lock();
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nowhere.toml");
    let err = AppConfig::load(&[missing.clone()]).unwrap_err();
    assert!(err.to_string().contains("nowhere.toml"));
}

#[test]
fn invalid_marker_section_fails_validation_on_load() {
    let _guard = ENV_LOCK.lock();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rolesync.toml");
    fs::write(
        &path,
        r#"
        [marker]
        role_id = 0
        vanity_pattern = "discord.gg/silvermart"
        "#,
    )
    .expect("write config");

    let err = AppConfig::load(&[path]).unwrap_err();
    assert!(err.to_string().contains("role_id"));
}

#[test]
fn token_resolution_is_a_startup_fault_when_unset() {
    let config: AppConfig = SAMPLE.parse().expect("sample parses");
    // SILVERMART_TOKEN is not exported in the test environment.
    let err = config.discord.resolve_token().unwrap_err();
    assert!(err.to_string().contains("SILVERMART_TOKEN"));
}

#[test]
fn token_resolution_reads_the_configured_variable() {
    let config: AppConfig = SAMPLE
        .replace("SILVERMART_TOKEN", "SILVERMART_TOKEN_SET")
        .parse()
        .expect("sample parses");
    std::env::set_var("SILVERMART_TOKEN_SET", "s3cr3t");
    let token = config.discord.resolve_token().expect("token resolves");
    assert_eq!(token, "s3cr3t");
    std::env::remove_var("SILVERMART_TOKEN_SET");
}
