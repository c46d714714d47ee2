//! `switch-up install`

use predicates::prelude::*;
use std::fs;
use switch_up::test_utils::{SdCardFixture, USER_MOD_PATH, ZipFixture};

use crate::common::{TestEnv, read};

#[test]
fn test_install_autodetects_card() {
    let env = TestEnv::new();
    let zip = env.write_zip("atmosphere-1.8.0.zip", ZipFixture::atmosphere_release());

    env.cmd()
        .arg("install")
        .arg(&zip)
        .assert()
        .success()
        .stdout(predicate::str::contains("SD card:"))
        .stdout(predicate::str::contains("Backing up configuration"))
        .stdout(predicate::str::contains("Install complete"));

    assert_eq!(read(&env.sd.path().join("atmosphere/package3")), "new_package3_data");
    assert_eq!(read(&env.sd.path().join(USER_MOD_PATH)), "mi mod custom\n");
    assert_eq!(env.backups().len(), 1);
}

#[test]
fn test_install_with_explicit_sd_path() {
    let env = TestEnv::new();
    let other = env.temp.path().join("elsewhere");
    fs::create_dir(&other).unwrap();
    let zip = env.write_zip("hekate.zip", ZipFixture::new().file("bootloader/update.bin", b"bl"));

    env.cmd().arg("install").arg(&zip).arg("--sd-path").arg(&other).assert().success();

    assert_eq!(read(&other.join("bootloader/update.bin")), "bl");
    assert!(!env.sd.path().join("bootloader/update.bin").exists());
}

#[test]
fn test_install_missing_archive() {
    let env = TestEnv::new();

    env.cmd()
        .arg("install")
        .arg(env.temp.path().join("missing.zip"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Archive not found"));

    assert!(env.backups().is_empty());
}

#[test]
fn test_install_corrupt_archive_changes_nothing() {
    let env = TestEnv::new();
    let bad = env.temp.path().join("bad.zip");
    fs::write(&bad, "this is not a zip").unwrap();
    let before = env.sd.snapshot().unwrap();

    env.cmd()
        .arg("install")
        .arg(&bad)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed while extracting archive"))
        .stdout(predicate::str::contains("Nothing on the SD card was changed"))
        .stderr(predicate::str::contains("Invalid archive"));

    assert_eq!(env.sd.snapshot().unwrap(), before);
}

#[test]
fn test_install_merge_failure_reports_rollback() {
    let env = TestEnv::new();
    // A directory where the archive ships a file makes the merge fail. It
    // sorts after exosphere.ini, which is overwritten before the failure.
    fs::create_dir_all(env.sd.path().join("switch/daybreak.nro")).unwrap();
    let zip = env.write_zip(
        "ams.zip",
        ZipFixture::atmosphere_release()
            .file("exosphere.ini", b"[exosphere]\n")
            .file("switch/daybreak.nro", b"nro"),
    );

    env.cmd()
        .arg("install")
        .arg(&zip)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Restoring backup"))
        .stdout(predicate::str::contains("Configuration restored from"))
        .stderr(predicate::str::contains("SD card configuration restored"));

    assert_eq!(read(&env.sd.path().join("exosphere.ini")), "log_enabled=1\n");
    assert_eq!(read(&env.sd.path().join("atmosphere/package3")), "new_package3_data");
    assert_eq!(env.backups().len(), 1);
}

#[test]
fn test_install_without_card() {
    let env = TestEnv::new();
    fs::remove_dir_all(env.sd.path()).unwrap();
    let zip = env.write_zip("ams.zip", ZipFixture::atmosphere_release());

    env.cmd()
        .arg("install")
        .arg(&zip)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Switch SD card detected"))
        .stderr(predicate::str::contains("--sd-path"));
}

#[test]
fn test_install_with_two_cards() {
    let env = TestEnv::new();
    let second = env.mount_root().join("SD2");
    fs::create_dir_all(second.join("Nintendo")).unwrap();
    let zip = env.write_zip("ams.zip", ZipFixture::atmosphere_release());

    env.cmd()
        .arg("install")
        .arg(&zip)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Multiple Switch SD cards detected"));
}

#[test]
fn test_install_removes_macos_junk() {
    let env = TestEnv::new();
    let junk = SdCardFixture::new(&env.temp.path().join("junky")).unwrap().with_macos_junk().unwrap();
    let zip = env.write_zip("ams.zip", ZipFixture::atmosphere_release());

    env.cmd()
        .arg("install")
        .arg(&zip)
        .arg("--sd-path")
        .arg(junk.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 6 macOS junk file(s)"));

    assert!(!junk.path().join("__MACOSX").exists());
}
