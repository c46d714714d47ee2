//! `switch-up backups list|restore`

use predicates::prelude::*;
use std::fs;
use switch_up::test_utils::ZipFixture;

use crate::common::{TestEnv, read};

fn install_once(env: &TestEnv) {
    let zip = env.write_zip("ams.zip", ZipFixture::atmosphere_release());
    env.cmd().arg("install").arg(&zip).assert().success();
}

#[test]
fn test_list_without_backups() {
    let env = TestEnv::new();

    env.cmd()
        .args(["backups", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups in"));
}

#[test]
fn test_list_after_install() {
    let env = TestEnv::new();
    install_once(&env);
    let name = env.backups()[0].file_name().unwrap().to_string_lossy().into_owned();

    env.cmd()
        .args(["backups", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(name))
        .stdout(predicate::str::contains("3 file(s)"));
}

#[test]
fn test_list_json() {
    let env = TestEnv::new();
    install_once(&env);

    let output = env.cmd().args(["backups", "list", "--json"]).output().unwrap();
    assert!(output.status.success());

    let backups: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let backups = backups.as_array().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0]["files"].as_array().unwrap().len(), 3);
    assert!(backups[0]["created_at"].is_string());
}

#[test]
fn test_restore_puts_configuration_back() {
    let env = TestEnv::new();
    install_once(&env);
    let name = env.backups()[0].file_name().unwrap().to_string_lossy().into_owned();

    env.sd.write("hekate_ipl.ini", "autoboot=9\n").unwrap();
    fs::remove_file(env.sd.path().join("exosphere.ini")).unwrap();

    env.cmd()
        .args(["backups", "restore", &name])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored 3 file(s)"));

    assert_eq!(read(&env.sd.path().join("hekate_ipl.ini")), "autoboot=0\n");
    assert_eq!(read(&env.sd.path().join("exosphere.ini")), "log_enabled=1\n");
}

#[test]
fn test_restore_unknown_backup() {
    let env = TestEnv::new();

    env.cmd()
        .args(["backups", "restore", "19990101_000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Backup '19990101_000000' not found"))
        .stderr(predicate::str::contains("backups list"));
}
