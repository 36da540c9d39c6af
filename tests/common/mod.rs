//! Helpers for integration tests.
#![allow(dead_code)]

use pion_catalog::db::{DbPool, establish_connection_pool, run_migrations};
use pion_catalog::storage::FileSystemStorage;
use tempfile::TempDir;

/// Temporary database used in integration tests.
pub struct TestDb {
    filename: String,
    pool: DbPool,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        std::fs::remove_file(filename).ok(); // Clean up old DB

        let pool =
            establish_connection_pool(filename).expect("Failed to establish SQLite connection.");
        run_migrations(&pool).expect("Migrations failed");
        TestDb {
            filename: filename.to_string(),
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.filename).ok();
        std::fs::remove_file(format!("{}-shm", &self.filename)).ok();
        std::fs::remove_file(format!("{}-wal", &self.filename)).ok();
    }
}

/// Attachment store rooted in a directory removed on drop.
pub struct TestStorage {
    _dir: TempDir,
    storage: FileSystemStorage,
}

impl TestStorage {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create uploads directory.");
        let storage = FileSystemStorage::new(dir.path().join("uploads"));
        storage.ensure_root().expect("Failed to create uploads root.");
        TestStorage { _dir: dir, storage }
    }

    pub fn storage(&self) -> &FileSystemStorage {
        &self.storage
    }

    /// Whether the file behind `reference` is present.
    pub fn contains(&self, reference: &str) -> bool {
        self.storage
            .path_for(reference)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Number of attachments currently stored.
    pub fn file_count(&self) -> usize {
        std::fs::read_dir(self.storage.root())
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }
}
