use crate::adapters::NewsApiClient;
use crate::core::{PipelineTask, TaskContext};
use crate::domain::model::raw_object_key;
use crate::domain::{NewsPayload, ObjectStore};
use crate::utils::error::Result;
use chrono::Utc;

pub const FETCH_AND_UPLOAD_TASK: &str = "fetch_and_upload_to_s3";

/// Serializes `payload` and writes it under `key`. Any failure is logged and
/// returned; nothing is written unless the whole body was serialized.
pub async fn upload_json_to_s3<S: ObjectStore>(
    store: &S,
    payload: &NewsPayload,
    key: &str,
) -> Result<()> {
    let body = match payload.to_json_bytes() {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Unexpected error serializing news payload: {}", e);
            return Err(e.into());
        }
    };

    let size = body.len();
    match store.put_object(key, body).await {
        Ok(()) => {
            tracing::info!(
                "☁️ Uploaded news JSON to {}/{} ({} bytes)",
                store.location(),
                key,
                size
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Upload to {}/{} failed: {}", store.location(), key, e);
            Err(e)
        }
    }
}

/// Fetches the headlines and archives them under a timestamped key.
/// Returns the key written.
pub async fn fetch_and_upload<S: ObjectStore>(
    client: &NewsApiClient,
    store: &S,
    prefix: &str,
) -> Result<String> {
    let payload = client.fetch_news().await.inspect_err(|e| {
        tracing::error!("Error fetching news from API: {}", e);
    })?;

    let key = raw_object_key(prefix, Utc::now());
    upload_json_to_s3(store, &payload, &key).await?;
    Ok(key)
}

pub struct FetchAndUploadTask<S: ObjectStore> {
    client: NewsApiClient,
    store: S,
    prefix: String,
}

impl<S: ObjectStore> FetchAndUploadTask<S> {
    pub fn new(client: NewsApiClient, store: S, prefix: impl Into<String>) -> Self {
        Self {
            client,
            store,
            prefix: prefix.into(),
        }
    }
}

#[async_trait::async_trait]
impl<S: ObjectStore> PipelineTask for FetchAndUploadTask<S> {
    fn name(&self) -> &str {
        FETCH_AND_UPLOAD_TASK
    }

    async fn run(&self, context: &mut TaskContext) -> Result<String> {
        let key = fetch_and_upload(&self.client, &self.store, &self.prefix)
            .await
            .inspect_err(|_| tracing::error!("Failed to fetch and upload news data"))?;

        let location = format!("{}/{}", self.store.location(), key);
        context.uploaded_key = Some(key);
        Ok(location)
    }
}
