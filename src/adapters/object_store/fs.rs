use crate::domain::{ObjectStore, ObjectSummary};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs;

/// A directory used as a bucket: object keys map to relative file paths.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return Err(EtlError::store("resolve_key", format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(key))
    }

    async fn collect(&self) -> Result<Vec<ObjectSummary>> {
        let mut out = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                out.push(ObjectSummary {
                    key,
                    last_modified: DateTime::<Utc>::from(metadata.modified()?),
                    size: metadata.len() as i64,
                });
            }
        }
        Ok(out)
    }
}

impl ObjectStore for FsObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, body).await?;
        tracing::debug!("Wrote object {}", path.display());
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        if !fs::try_exists(&self.root).await? {
            return Ok(Vec::new());
        }
        let mut objects = self.collect().await?;
        objects.retain(|o| o.key.starts_with(prefix));
        Ok(objects)
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EtlError::store("get_object", format!("NoSuchKey: {}", key)),
            _ => EtlError::IoError(e),
        })
    }

    fn location(&self) -> String {
        format!("file://{}", self.root.display())
    }
}
