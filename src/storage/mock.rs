use mockall::mock;

use super::{AttachmentStore, StorageResult};

mock! {
    pub AttachmentStore {}

    impl AttachmentStore for AttachmentStore {
        fn store(&self, bytes: &[u8], original_file_name: &str) -> StorageResult<String>;
        fn remove(&self, reference: &str) -> StorageResult<()>;
    }
}
