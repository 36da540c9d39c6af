//! Attachment store for uploaded product images.
//!
//! Files live in a flat directory and are referenced from product rows as
//! `uploads/<generated-name><ext>`. The same directory is served statically
//! under `/uploads`, so a reference doubles as a URL path.

use std::ffi::OsStr;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub mod mock;

/// Prefix shared by every attachment reference and the static route.
pub const UPLOADS_PREFIX: &str = "uploads";

/// Result type returned by attachment store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while touching the attachment store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing a new attachment failed; nothing may reference it.
    #[error("failed to write attachment `{reference}`: {source}")]
    Write {
        reference: String,
        #[source]
        source: std::io::Error,
    },
    /// Removing an attachment failed for a reason other than it being absent.
    #[error("failed to remove attachment `{reference}`: {source}")]
    Remove {
        reference: String,
        #[source]
        source: std::io::Error,
    },
    /// The reference does not point inside the attachment store.
    #[error("invalid attachment reference `{0}`")]
    InvalidReference(String),
}

/// Saves uploaded files under generated names and removes replaced ones.
pub trait AttachmentStore {
    /// Write `bytes` under a fresh name that keeps the extension of
    /// `original_file_name`, returning the reference to store on the product.
    fn store(&self, bytes: &[u8], original_file_name: &str) -> StorageResult<String>;

    /// Delete the file behind `reference`. Removing a missing file succeeds.
    fn remove(&self, reference: &str) -> StorageResult<()>;
}

/// Attachment store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the attachments.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    pub fn ensure_root(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Resolve a reference to its location on disk.
    pub fn path_for(&self, reference: &str) -> StorageResult<PathBuf> {
        let name = reference
            .trim_start_matches('/')
            .strip_prefix(UPLOADS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::InvalidReference(reference.to_string()))?;

        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(StorageError::InvalidReference(reference.to_string()));
        }

        Ok(self.root.join(name))
    }

    fn write_atomically(&self, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;

        let mut temp = NamedTempFile::new_in(&self.root)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist_noclobber(target).map_err(|err| err.error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(target, std::fs::Permissions::from_mode(0o644))?;
        }

        Ok(())
    }
}

impl AttachmentStore for FileSystemStorage {
    fn store(&self, bytes: &[u8], original_file_name: &str) -> StorageResult<String> {
        let file_name = generate_file_name(original_file_name);
        let reference = format!("{UPLOADS_PREFIX}/{file_name}");
        let target = self.root.join(&file_name);

        self.write_atomically(&target, bytes)
            .map_err(|source| StorageError::Write {
                reference: reference.clone(),
                source,
            })?;

        log::debug!("Stored {} bytes as {reference}", bytes.len());
        Ok(reference)
    }

    fn remove(&self, reference: &str) -> StorageResult<()> {
        let path = self.path_for(reference)?;

        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Removed attachment {reference}");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                reference: reference.to_string(),
                source,
            }),
        }
    }
}

/// Random v4 UUID plus the original extension, when it is a plain
/// alphanumeric one.
fn generate_file_name(original_file_name: &str) -> String {
    let extension = Path::new(original_file_name.trim())
        .extension()
        .and_then(OsStr::to_str)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|ch| ch.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, FileSystemStorage) {
        let dir = TempDir::new().expect("temp dir");
        let storage = FileSystemStorage::new(dir.path().join("uploads"));
        (dir, storage)
    }

    #[test]
    fn generated_names_keep_extension_and_differ() {
        let first = generate_file_name("photo.JPG");
        let second = generate_file_name("photo.JPG");

        assert!(first.ends_with(".JPG"));
        assert_ne!(first, second);
        assert_eq!(first.len(), 36 + 4);
    }

    #[test]
    fn generated_names_drop_odd_extensions() {
        assert_eq!(generate_file_name("archive").len(), 36);
        assert_eq!(generate_file_name("weird.p$g").len(), 36);
        assert_eq!(generate_file_name("").len(), 36);
    }

    #[test]
    fn store_writes_file_under_reference() {
        let (_dir, storage) = storage();

        let reference = storage.store(b"png-bytes", "cat.png").expect("store");

        assert!(reference.starts_with("uploads/"));
        assert!(reference.ends_with(".png"));
        let path = storage.path_for(&reference).expect("resolve");
        assert_eq!(std::fs::read(path).expect("read back"), b"png-bytes");
    }

    #[test]
    fn remove_deletes_file_and_is_idempotent() {
        let (_dir, storage) = storage();
        let reference = storage.store(b"x", "a.gif").expect("store");
        let path = storage.path_for(&reference).expect("resolve");

        storage.remove(&reference).expect("first remove");
        assert!(!path.exists());

        storage.remove(&reference).expect("second remove");
        storage.remove("/uploads/never-existed.png").expect("missing file");
    }

    #[test]
    fn references_outside_the_store_are_rejected() {
        let (_dir, storage) = storage();

        for reference in [
            "uploads/../secret.txt",
            "uploads/nested/file.png",
            "other/file.png",
            "uploads/",
            "uploadsfile.png",
        ] {
            assert!(
                matches!(
                    storage.remove(reference),
                    Err(StorageError::InvalidReference(_))
                ),
                "expected {reference} to be rejected"
            );
        }
    }

    #[test]
    fn store_fails_when_root_is_not_a_directory() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("uploads");
        std::fs::write(&blocker, b"not a dir").expect("create blocker");
        let storage = FileSystemStorage::new(&blocker);

        let result = storage.store(b"data", "a.png");

        assert!(matches!(result, Err(StorageError::Write { .. })));
    }
}
