//! Filesystem access for request paths.
//!
//! A request path `/<rest>` maps to `<root>/<rest>` by plain concatenation,
//! so with the default root of `.` the server reads and writes `./<rest>`
//! relative to its working directory.

use std::ffi::{OsStr, OsString};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// How a request opens its target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only, for GET
    Read,
    /// Create or truncate, read-write, owner-only permissions; for POST
    Create,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path onto the filesystem.
    ///
    /// `Path::join` would discard the root for an absolute argument, which
    /// every request path is; the path is appended instead.
    pub fn resolve(&self, path: &[u8]) -> PathBuf {
        let mut full = OsString::from(self.root.as_os_str());
        full.push(OsStr::from_bytes(path));
        PathBuf::from(full)
    }

    /// Opens the file behind a request path.
    ///
    /// Directories are refused with `ErrorKind::IsADirectory`, whichever mode
    /// is requested.
    pub fn open(&self, path: &[u8], mode: OpenMode) -> io::Result<File> {
        let full = self.resolve(path);

        let file = match mode {
            OpenMode::Read => File::open(&full)?,
            OpenMode::Create => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&full)?,
        };

        if file.metadata()?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", full.display()),
            ));
        }

        Ok(file)
    }
}

/// Size of an open file, leaving the cursor at the start.
pub fn content_length(file: &mut File) -> io::Result<u64> {
    let len = file.seek(SeekFrom::End(0))?;
    file.rewind()?;
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_appends_request_path_to_root() {
        let store = FileStore::new(".");

        assert_eq!(store.resolve(b"/a/b.txt"), PathBuf::from("./a/b.txt"));
        assert_eq!(store.resolve(b"/"), PathBuf::from("./"));
    }

    #[test]
    fn resolve_passes_non_utf8_names_through() {
        let store = FileStore::new("/srv");

        assert_eq!(
            store.resolve(b"/caf\xe9").as_os_str().as_bytes(),
            b"/srv/caf\xe9"
        );
    }

    #[test]
    fn resolve_keeps_absolute_looking_paths_under_root() {
        let store = FileStore::new("/srv/files");

        assert_eq!(
            store.resolve(b"//etc/passwd"),
            PathBuf::from("/srv/files//etc/passwd")
        );
    }
}
