//! File-system capability and legacy-config sources
//!
//! Scans, config reads, and renames all go through [`ProjectFs`], so a
//! session can be driven against a real tree or a test double.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, devices, sockets. Never followed.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// File-system access used by a migration session.
pub trait ProjectFs: Send + Sync {
    /// List the immediate children of `dir`.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn exists(&self, path: &Path) -> bool;

    /// Move `from` to `to`, creating parent directories of `to`.
    ///
    /// Must fail with [`ErrorKind::AlreadyExists`] when `to` exists, and must
    /// never replace it, even when two moves to `to` race.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create `path` with `contents`, failing with `AlreadyExists` if present.
    fn write_new(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// [`ProjectFs`] backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl ProjectFs for StdFs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::Other
            };
            out.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        Ok(out)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let already_exists = || {
            io::Error::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            )
        };
        if fs::symlink_metadata(to).is_ok() {
            return Err(already_exists());
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }

        // A hard link refuses to replace an existing destination atomically.
        match fs::hard_link(from, to) {
            Ok(()) => fs::remove_file(from),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(e),
            // Lost a race: the source is already gone and the destination is there.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if fs::symlink_metadata(to).is_ok() {
                    Err(already_exists())
                } else {
                    Err(e)
                }
            }
            Err(e) => {
                log::debug!(
                    "hard link {} -> {} unavailable ({e}), falling back to rename",
                    from.display(),
                    to.display()
                );
                if fs::symlink_metadata(to).is_ok() {
                    return Err(already_exists());
                }
                fs::rename(from, to)
            }
        }
    }

    fn write_new(&self, path: &Path, contents: &str) -> io::Result<()> {
        use std::io::Write;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(contents.as_bytes())
    }
}

/// Supplies the raw text of the legacy configuration.
pub trait ConfigSource: Send + Sync {
    fn read_legacy(&self) -> io::Result<String>;
}

/// Reads the legacy configuration file through a [`ProjectFs`] on each call.
#[derive(Clone)]
pub struct FileConfigSource {
    fs: Arc<dyn ProjectFs>,
    path: PathBuf,
}

impl FileConfigSource {
    #[must_use]
    pub fn new(fs: Arc<dyn ProjectFs>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn read_legacy(&self) -> io::Result<String> {
        self.fs.read_to_string(&self.path)
    }
}

/// Fixed in-memory legacy configuration text.
#[derive(Debug, Clone)]
pub struct TextConfigSource(pub String);

impl ConfigSource for TextConfigSource {
    fn read_legacy(&self) -> io::Result<String> {
        Ok(self.0.clone())
    }
}
