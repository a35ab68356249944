pub mod fs;
pub mod s3;

pub use fs::FsObjectStore;
pub use s3::S3ObjectStore;

use crate::config::{StorageBackend, StorageSettings};
use crate::domain::{ObjectStore, ObjectSummary};
use crate::utils::error::Result;

/// The backend chosen by `storage.backend`.
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    S3(S3ObjectStore),
    Fs(FsObjectStore),
}

impl ConfiguredStore {
    pub fn from_settings(settings: &StorageSettings) -> Result<Self> {
        match settings.backend {
            StorageBackend::S3 => Ok(Self::S3(S3ObjectStore::new(settings.clone())?)),
            StorageBackend::Fs => Ok(Self::Fs(FsObjectStore::new(settings.fs_root.clone()))),
        }
    }
}

impl ObjectStore for ConfiguredStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        match self {
            Self::S3(store) => store.put_object(key, body).await,
            Self::Fs(store) => store.put_object(key, body).await,
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        match self {
            Self::S3(store) => store.list_objects(prefix).await,
            Self::Fs(store) => store.list_objects(prefix).await,
        }
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        match self {
            Self::S3(store) => store.get_object(key).await,
            Self::Fs(store) => store.get_object(key).await,
        }
    }

    fn location(&self) -> String {
        match self {
            Self::S3(store) => store.location(),
            Self::Fs(store) => store.location(),
        }
    }
}
