//! Install scenarios through the library API.

use anyhow::{Result, bail};
use std::fs;
use std::path::Path;
use switch_up::backup::BackupManager;
use switch_up::cleaner::MacJunkCleaner;
use switch_up::constants::CRITICAL_FILES;
use switch_up::installer::{InstallError, Installer};
use switch_up::merge::{MergeStats, TreeMerger, merge};
use switch_up::test_utils::{SdCardFixture, USER_MOD_PATH, ZipFixture, init_test_logging};
use tempfile::TempDir;

fn installer(temp: &TempDir) -> Installer {
    init_test_logging(None);
    Installer::new(BackupManager::new(temp.path().join("backups")))
        .with_cleaner(Box::new(MacJunkCleaner::new().clear_xattrs(false)))
}

fn present_critical_files(sd: &SdCardFixture) -> Vec<&'static str> {
    CRITICAL_FILES.iter().copied().filter(|f| sd.path().join(f).is_file()).collect()
}

/// Runs the real merge, then reports failure as if the card filled up on
/// the last file.
struct FailAfterMerge;

impl TreeMerger for FailAfterMerge {
    fn merge(&self, source: &Path, dest: &Path) -> Result<MergeStats> {
        merge(source, dest)?;
        bail!("No space left on device")
    }
}

#[test]
fn test_update_adds_files_and_keeps_hekate_config() {
    let temp = TempDir::new().unwrap();
    let sd = SdCardFixture::new(temp.path()).unwrap();
    let zip = ZipFixture::new()
        .file("bootloader/update.bin", b"new_bootloader")
        .file("bootloader/payloads/hekate.bin", b"payload")
        .write_to(&temp.path().join("hekate.zip"))
        .unwrap();

    let report = installer(&temp).install(&zip, sd.path()).unwrap();

    assert_eq!(sd.read_to_string("hekate_ipl.ini").unwrap(), "autoboot=0\n");
    assert_eq!(sd.read_to_string("bootloader/update.bin").unwrap(), "new_bootloader");
    assert_eq!(report.merge.files_added, 2);
    assert_eq!(report.merge.files_replaced, 0);
}

#[test]
fn test_update_preserves_mods_and_replaces_system_files() {
    let temp = TempDir::new().unwrap();
    let sd = SdCardFixture::new(temp.path()).unwrap();
    sd.write("atmosphere/package3", "old_package3").unwrap();
    let zip = ZipFixture::atmosphere_release().write_to(&temp.path().join("ams.zip")).unwrap();

    let report = installer(&temp).install(&zip, sd.path()).unwrap();

    assert_eq!(sd.read_to_string(USER_MOD_PATH).unwrap(), "mi mod custom\n");
    assert_eq!(sd.read_to_string("atmosphere/package3").unwrap(), "new_package3_data");
    assert_eq!(report.merge.files_replaced, 1);
}

#[test]
fn test_failed_merge_restores_configs_overwritten_by_archive() {
    let temp = TempDir::new().unwrap();
    let sd = SdCardFixture::new(temp.path()).unwrap();
    let zip = ZipFixture::atmosphere_release()
        .file("hekate_ipl.ini", b"autoboot=1\n")
        .file("exosphere.ini", b"[exosphere]\n")
        .write_to(&temp.path().join("ams.zip"))
        .unwrap();

    let err = installer(&temp)
        .with_merger(Box::new(FailAfterMerge))
        .install(&zip, sd.path())
        .unwrap_err();

    assert!(matches!(err, InstallError::MergeRolledBack { .. }));
    assert_eq!(sd.read_to_string("hekate_ipl.ini").unwrap(), "autoboot=0\n");
    assert_eq!(sd.read_to_string("exosphere.ini").unwrap(), "log_enabled=1\n");
    assert_eq!(sd.read_to_string(USER_MOD_PATH).unwrap(), "mi mod custom\n");
}

#[test]
fn test_critical_files_survive_every_outcome() {
    let temp = TempDir::new().unwrap();
    let sd = SdCardFixture::new(temp.path()).unwrap();
    let before = present_critical_files(&sd);
    let zip = ZipFixture::atmosphere_release().write_to(&temp.path().join("ams.zip")).unwrap();

    installer(&temp).install(&zip, sd.path()).unwrap();
    assert_eq!(present_critical_files(&sd), before);

    installer(&temp).with_merger(Box::new(FailAfterMerge)).install(&zip, sd.path()).unwrap_err();
    assert_eq!(present_critical_files(&sd), before);

    let corrupt = temp.path().join("corrupt.zip");
    fs::write(&corrupt, b"PK\x03\x04 truncated").unwrap();
    installer(&temp).install(&corrupt, sd.path()).unwrap_err();
    assert_eq!(present_critical_files(&sd), before);
}

#[test]
fn test_each_install_gets_its_own_backup() {
    let temp = TempDir::new().unwrap();
    let sd = SdCardFixture::new(temp.path()).unwrap();
    let zip = ZipFixture::atmosphere_release().write_to(&temp.path().join("ams.zip")).unwrap();
    let installer = installer(&temp);

    let first = installer.install(&zip, sd.path()).unwrap();
    let second = installer.install(&zip, sd.path()).unwrap();

    assert_ne!(first.backup_dir, second.backup_dir);
    assert_eq!(installer.backup_manager().list_backups().unwrap().len(), 2);
}

#[test]
fn test_reinstall_of_read_only_entries_succeeds() {
    let temp = TempDir::new().unwrap();
    let sd = SdCardFixture::new(temp.path()).unwrap();
    let zip = ZipFixture::new()
        .file_with_mode("atmosphere/package3", b"new_package3_data", 0o444)
        .write_to(&temp.path().join("ams.zip"))
        .unwrap();
    let installer = installer(&temp);

    installer.install(&zip, sd.path()).unwrap();
    let report = installer.install(&zip, sd.path()).unwrap();

    assert_eq!(report.merge.files_replaced, 1);
    assert_eq!(sd.read_to_string("atmosphere/package3").unwrap(), "new_package3_data");
}

#[test]
fn test_install_replaces_read_only_file_on_card() {
    let temp = TempDir::new().unwrap();
    let sd = SdCardFixture::new(temp.path()).unwrap();
    sd.write("atmosphere/package3", "old").unwrap();
    let package3 = sd.path().join("atmosphere/package3");
    let mut permissions = fs::metadata(&package3).unwrap().permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&package3, permissions).unwrap();
    let zip = ZipFixture::atmosphere_release().write_to(&temp.path().join("ams.zip")).unwrap();

    installer(&temp).install(&zip, sd.path()).unwrap();

    assert_eq!(sd.read_to_string("atmosphere/package3").unwrap(), "new_package3_data");
}
