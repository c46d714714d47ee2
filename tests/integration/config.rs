//! Config file handling in the CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use switch_up::test_utils::ZipFixture;

use crate::common::TestEnv;

#[test]
fn test_malformed_config_is_reported() {
    let env = TestEnv::new();
    fs::write(&env.config_path, "mount_root = [\n").unwrap();

    env.cmd()
        .args(["backups", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let env = TestEnv::new();

    Command::cargo_bin("switch-up")
        .unwrap()
        .arg("--config")
        .arg(env.temp.path().join("nope.toml"))
        .args(["backups", "list"])
        .env("NO_COLOR", "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config"));
}

#[test]
fn test_config_from_environment() {
    let env = TestEnv::new();
    let zip = env.write_zip("ams.zip", ZipFixture::atmosphere_release());

    Command::cargo_bin("switch-up")
        .unwrap()
        .args(["--no-progress", "install"])
        .arg(&zip)
        .env("SWITCH_UP_CONFIG_PATH", &env.config_path)
        .env("NO_COLOR", "1")
        .assert()
        .success();

    assert_eq!(env.backups().len(), 1);
}

#[test]
fn test_custom_backup_file_set() {
    let env = TestEnv::new();
    let config = fs::read_to_string(&env.config_path).unwrap();
    let mut config: toml::Table = toml::from_str(&config).unwrap();
    config
        .get_mut("backup")
        .and_then(toml::Value::as_table_mut)
        .unwrap()
        .insert("files".to_string(), toml::Value::Array(vec!["exosphere.ini".into()]));
    fs::write(&env.config_path, toml::to_string(&config).unwrap()).unwrap();
    let zip = env.write_zip("ams.zip", ZipFixture::atmosphere_release());

    env.cmd().arg("install").arg(&zip).assert().success();

    let backup = &env.backups()[0];
    assert!(backup.join("exosphere.ini").is_file());
    assert!(!backup.join("hekate_ipl.ini").exists());
}
