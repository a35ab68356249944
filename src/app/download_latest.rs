use crate::config::DownloadErrorPolicy;
use crate::core::{PipelineTask, TaskContext};
use crate::domain::model::latest_object;
use crate::domain::ObjectStore;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

pub const DOWNLOAD_LATEST_TASK: &str = "download_latest_from_s3";

/// Downloads the most recently modified object under `prefix` into
/// `local_dir/<basename>`. Returns `None` (with a warning) when the prefix is
/// empty.
pub async fn download_latest_from_s3<S: ObjectStore>(
    store: &S,
    prefix: &str,
    local_dir: &Path,
) -> Result<Option<PathBuf>> {
    let result = download_latest(store, prefix, local_dir).await;
    if let Err(e) = &result {
        tracing::error!(
            "Download of latest object from {}/{} failed: {}",
            store.location(),
            prefix,
            e
        );
    }
    result
}

async fn download_latest<S: ObjectStore>(
    store: &S,
    prefix: &str,
    local_dir: &Path,
) -> Result<Option<PathBuf>> {
    let objects = store.list_objects(prefix).await?;

    let Some(latest) = latest_object(&objects) else {
        tracing::warn!("No files found in {} with prefix {}", store.location(), prefix);
        return Ok(None);
    };

    tracing::debug!(
        "Latest of {} objects: {} (modified {})",
        objects.len(),
        latest.key,
        latest.last_modified
    );

    let body = store.get_object(&latest.key).await?;

    tokio::fs::create_dir_all(local_dir).await?;
    let local_path = local_dir.join(latest.basename());
    tokio::fs::write(&local_path, &body).await?;

    tracing::info!(
        "📥 Downloaded latest file: {} to {}",
        latest.key,
        local_path.display()
    );
    Ok(Some(local_path))
}

pub struct DownloadLatestTask<S: ObjectStore> {
    store: S,
    prefix: String,
    local_dir: PathBuf,
    on_error: DownloadErrorPolicy,
}

impl<S: ObjectStore> DownloadLatestTask<S> {
    pub fn new(store: S, prefix: impl Into<String>, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            local_dir: local_dir.into(),
            on_error: DownloadErrorPolicy::Fail,
        }
    }

    pub fn with_error_policy(mut self, on_error: DownloadErrorPolicy) -> Self {
        self.on_error = on_error;
        self
    }
}

#[async_trait::async_trait]
impl<S: ObjectStore> PipelineTask for DownloadLatestTask<S> {
    fn name(&self) -> &str {
        DOWNLOAD_LATEST_TASK
    }

    async fn run(&self, context: &mut TaskContext) -> Result<String> {
        match download_latest_from_s3(&self.store, &self.prefix, &self.local_dir).await {
            Ok(Some(path)) => {
                if let Some(uploaded) = &context.uploaded_key {
                    if !path.ends_with(uploaded.rsplit('/').next().unwrap_or(uploaded)) {
                        tracing::warn!(
                            "Latest object is not the one uploaded in this run ({})",
                            uploaded
                        );
                    }
                }
                let output = path.display().to_string();
                context.downloaded_file = Some(path);
                Ok(output)
            }
            Ok(None) => Ok(format!("no objects under {}", self.prefix)),
            Err(e) => match self.on_error {
                DownloadErrorPolicy::Fail => Err(e),
                DownloadErrorPolicy::Log => {
                    tracing::warn!("⚠️ Continuing without a download (on_error = log)");
                    Ok(format!("download failed: {}", e))
                }
            },
        }
    }
}
