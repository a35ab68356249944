use crate::config::{StorageSettings, ENV_AWS_REGION, ENV_AWS_S3_BUCKET};
use crate::domain::{ObjectStore, ObjectSummary};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::require_non_blank;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};

/// S3 bucket access. A new client is built from the settings for every
/// operation; nothing is pooled between calls.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    settings: StorageSettings,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    pub fn new(settings: StorageSettings) -> Result<Self> {
        let bucket = require_non_blank(ENV_AWS_S3_BUCKET, &settings.bucket)?.to_string();
        let region = require_non_blank(ENV_AWS_REGION, &settings.region)?.to_string();
        Ok(Self {
            settings,
            bucket,
            region,
        })
    }

    async fn client(&self) -> S3Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()));

        // 沒給 key 的話走預設的 credential chain (instance profile, ~/.aws, ...)
        if let (Some(key_id), Some(secret)) = (
            self.settings.access_key_id.as_deref(),
            self.settings.secret_access_key.as_deref(),
        ) {
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "news-etl-settings",
            ));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &self.settings.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        S3Client::from_conf(builder.build())
    }
}

fn store_error<E>(operation: &str, err: E) -> EtlError
where
    E: std::error::Error + 'static,
{
    EtlError::store(operation, DisplayErrorContext(&err).to_string())
}

fn to_chrono(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let client = self.client().await;
        client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(body.into())
            .send()
            .await
            .map_err(|e| store_error("put_object", e))?;

        tracing::debug!("PUT s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let client = self.client().await;
        let mut pages = client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| store_error("list_objects_v2", e))?;
            for object in page.contents() {
                let (Some(key), Some(modified)) = (object.key(), object.last_modified()) else {
                    continue;
                };
                let last_modified = to_chrono(modified).ok_or_else(|| EtlError::Unexpected {
                    message: format!("Object {} has an out-of-range LastModified", key),
                })?;
                objects.push(ObjectSummary {
                    key: key.to_string(),
                    last_modified,
                    size: object.size().unwrap_or_default(),
                });
            }
        }

        tracing::debug!(
            "Listed {} objects under s3://{}/{}",
            objects.len(),
            self.bucket,
            prefix
        );
        Ok(objects)
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let client = self.client().await;
        let resp = client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error("get_object", e))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| store_error("get_object", e))?;

        Ok(data.into_bytes().to_vec())
    }

    fn location(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}
