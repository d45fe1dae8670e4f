//! File operations shared by every storer.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{PersistenceError, Result};

/// Read a whole file.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| PersistenceError::io("read", path, e))
}

/// Replace `path` with `bytes`.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a
/// half-written document behind. Missing parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| PersistenceError::io("create directory", parent, e))?;
    }

    let mut file =
        File::create(&temp_path).map_err(|e| PersistenceError::io("create", &temp_path, e))?;
    let written = file
        .write_all(bytes)
        .map_err(|e| PersistenceError::io("write", &temp_path, e))
        .and_then(|()| {
            file.sync_all()
                .map_err(|e| PersistenceError::io("sync", &temp_path, e))
        });
    drop(file);
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    if let Err(source) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(PersistenceError::AtomicWriteFailed {
            temp_path,
            target_path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// SHA-256 of a byte slice, hex encoded.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compute SHA-256 hash of a file.
///
/// Uses buffered reading for efficient processing of large files.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| PersistenceError::io("read", path, e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| PersistenceError::io("read", path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn digest_matches_file_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        write_atomic(&path, b"Hello, World!").unwrap();

        // Known SHA-256 hash for "Hello, World!"
        let expected = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";
        assert_eq!(digest(b"Hello, World!"), expected);
        assert_eq!(compute_file_hash(&path).unwrap(), expected);
    }

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/doc.xml");
        write_atomic(&path, b"<a/>").unwrap();
        write_atomic(&path, b"<b/>").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"<b/>");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("doc.xml");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inside.txt"), b"keep").unwrap();

        let err = write_atomic(&target, b"<a/>").unwrap_err();
        assert!(matches!(err, PersistenceError::AtomicWriteFailed { .. }));
        assert!(!dir.path().join("doc.xml.tmp").exists());
        assert_eq!(fs::read(target.join("inside.txt")).unwrap(), b"keep");
    }

    #[test]
    fn unwritable_parent_fails_before_any_temp_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("plain-file");
        fs::write(&blocker, b"not a directory").unwrap();

        assert!(write_atomic(&blocker.join("doc.xml"), b"<a/>").is_err());
        assert_eq!(fs::read(&blocker).unwrap(), b"not a directory");
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = read_file(&dir.path().join("absent.xml")).unwrap_err();
        assert!(err.is_not_found());
    }
}
