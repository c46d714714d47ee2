//! On-disk fixtures: a populated fake SD card and an in-memory zip builder.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

/// A user mod that no update archive ever ships.
pub const USER_MOD_PATH: &str = "atmosphere/contents/0100000000001000/romfs/user_mod.txt";

/// A fake Switch SD card.
///
/// Layout created by [`SdCardFixture::new`]:
///
/// ```text
/// SD/
/// ├── Nintendo/
/// ├── bootloader/
/// ├── hekate_ipl.ini                          "autoboot=0\n"
/// ├── exosphere.ini                           "log_enabled=1\n"
/// └── atmosphere/
///     ├── config/system_settings.ini          "dmnt_cheats_enabled_by_default=1\n"
///     └── contents/0100000000001000/romfs/user_mod.txt   "mi mod custom\n"
/// ```
pub struct SdCardFixture {
    root: PathBuf,
}

impl SdCardFixture {
    /// Creates the card as `parent/SD`.
    pub fn new(parent: &Path) -> Result<Self> {
        let root = parent.join("SD");
        let fixture = Self {
            root,
        };

        fs::create_dir_all(fixture.root.join("Nintendo"))?;
        fs::create_dir_all(fixture.root.join("bootloader"))?;
        fixture.write("hekate_ipl.ini", "autoboot=0\n")?;
        fixture.write("exosphere.ini", "log_enabled=1\n")?;
        fixture.write("atmosphere/config/system_settings.ini", "dmnt_cheats_enabled_by_default=1\n")?;
        fixture.write(USER_MOD_PATH, "mi mod custom\n")?;

        Ok(fixture)
    }

    /// Adds the junk macOS leaves behind: two `.DS_Store`, two `._*` files
    /// and a `__MACOSX` directory holding one more `._*` file.
    pub fn with_macos_junk(self) -> Result<Self> {
        fs::write(self.root.join(".DS_Store"), b"\x00\x00\x00\x01")?;
        fs::write(self.root.join("atmosphere/.DS_Store"), b"\x00\x00\x00\x01")?;
        fs::write(self.root.join("._somefile"), b"\x00\x05\x16")?;
        fs::write(self.root.join("atmosphere/._config"), b"\x00\x05\x16")?;
        fs::create_dir_all(self.root.join("__MACOSX"))?;
        fs::write(self.root.join("__MACOSX/._ignored"), b"\x00")?;
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes a file relative to the card root, creating parents.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("writing fixture {}", path.display()))
    }

    pub fn read_to_string(&self, relative: &str) -> Result<String> {
        fs::read_to_string(self.root.join(relative))
            .with_context(|| format!("reading fixture file {relative}"))
    }

    /// Every regular file on the card with its bytes, keyed by relative path.
    pub fn snapshot(&self) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
        let mut files = BTreeMap::new();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(&self.root)?.to_path_buf();
                files.insert(relative, fs::read(entry.path())?);
            }
        }
        Ok(files)
    }
}

/// Builds a zip archive from in-memory entries.
#[derive(Default)]
pub struct ZipFixture {
    entries: Vec<ZipEntry>,
}

struct ZipEntry {
    name: String,
    content: Option<Vec<u8>>,
    mode: Option<u32>,
}

impl ZipFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shape of an Atmosphere release: `atmosphere/package3`, an empty
    /// `atmosphere/config/` and `bootloader/update.bin`.
    pub fn atmosphere_release() -> Self {
        Self::new()
            .file("atmosphere/package3", b"new_package3_data")
            .dir("atmosphere/config/")
            .file("bootloader/update.bin", b"new_bootloader")
    }

    pub fn file(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push(ZipEntry {
            name: name.to_string(),
            content: Some(content.to_vec()),
            mode: None,
        });
        self
    }

    /// A file entry with explicit unix permissions, e.g. `0o444`.
    pub fn file_with_mode(mut self, name: &str, content: &[u8], mode: u32) -> Self {
        self.entries.push(ZipEntry {
            name: name.to_string(),
            content: Some(content.to_vec()),
            mode: Some(mode),
        });
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.entries.push(ZipEntry {
            name: name.to_string(),
            content: None,
            mode: None,
        });
        self
    }

    /// Writes the archive to `path` and returns that path.
    pub fn write_to(&self, path: &Path) -> Result<PathBuf> {
        let file = fs::File::create(path)?;
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        for entry in &self.entries {
            let options = match entry.mode {
                Some(mode) => options.unix_permissions(mode),
                None => options,
            };
            match &entry.content {
                Some(bytes) => {
                    writer.start_file(entry.name.as_str(), options)?;
                    writer.write_all(bytes)?;
                }
                None => writer.add_directory(entry.name.as_str(), options)?,
            }
        }
        writer.finish()?;
        Ok(path.to_path_buf())
    }
}
