//! Profile image blob storage.

use axum::{async_trait, body::Bytes};
use common::s3;
use derive_more::{Display, Error, From};

/// Stored object location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    /// Public object URL.
    pub url: String,

    /// Object key, used for later deletion.
    pub key: String,
}

/// Blob storage errors.
#[derive(Debug, Display, From, Error)]
pub enum StorageError {
    /// AWS S3-related error.
    S3Error(s3::Error),
}

/// Object storage used for user profile images.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store an object under the provided key, replacing any existing one.
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredBlob, StorageError>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl BlobStorage for s3::ConfiguredClient {
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<StoredBlob, StorageError> {
        s3::ConfiguredClient::upload(self, key, content_type, bytes).await?;

        Ok(StoredBlob {
            url: self.object_url(key),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        s3::ConfiguredClient::delete(self, key).await?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryStorage;

#[cfg(test)]
mod memory {
    use std::{collections::HashMap, sync::Mutex};

    use axum::{async_trait, body::Bytes};

    use super::{BlobStorage, StorageError, StoredBlob};

    /// In-memory [`BlobStorage`] implementation for tests.
    #[derive(Default)]
    pub(crate) struct MemoryStorage {
        objects: Mutex<HashMap<String, (String, Bytes)>>,
    }

    impl MemoryStorage {
        pub(crate) fn contains(&self, key: &str) -> bool {
            self.objects.lock().unwrap().contains_key(key)
        }

        pub(crate) fn len(&self) -> usize {
            self.objects.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BlobStorage for MemoryStorage {
        async fn upload(
            &self,
            key: &str,
            content_type: &str,
            bytes: Bytes,
        ) -> Result<StoredBlob, StorageError> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (content_type.to_string(), bytes));

            Ok(StoredBlob {
                url: format!("https://images.example.com/{key}"),
                key: key.to_string(),
            })
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.objects.lock().unwrap().remove(key);

            Ok(())
        }
    }
}
