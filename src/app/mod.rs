//! The news ingestion pipeline:
//! `fetch_and_upload_to_s3 >> download_latest_from_s3 >> load_data_to_postgres`.

pub mod download_latest;
pub mod fetch_upload;
pub mod load_table;

pub use download_latest::{download_latest_from_s3, DownloadLatestTask, DOWNLOAD_LATEST_TASK};
pub use fetch_upload::{fetch_and_upload, upload_json_to_s3, FetchAndUploadTask, FETCH_AND_UPLOAD_TASK};
pub use load_table::{load_data_to_postgres, LoadTableTask, LOAD_TABLE_TASK};

use crate::adapters::{ConfiguredStore, NewsApiClient, PostgresSink};
use crate::config::Settings;
use crate::core::{RetryPolicy, TaskSequence};
use crate::utils::error::{EtlError, Result};

/// Fixed execution order of the pipeline.
pub const TASK_ORDER: [&str; 3] = [FETCH_AND_UPLOAD_TASK, DOWNLOAD_LATEST_TASK, LOAD_TABLE_TASK];

/// `--only` / `--skip` selection over [`TASK_ORDER`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub only: Vec<String>,
    pub skip: Vec<String>,
}

impl TaskFilter {
    pub fn accepts(&self, name: &str) -> bool {
        (self.only.is_empty() || self.only.iter().any(|n| n == name))
            && !self.skip.iter().any(|n| n == name)
    }

    /// Rejects names that are not pipeline tasks.
    pub fn validate(&self) -> Result<()> {
        for name in self.only.iter().chain(&self.skip) {
            if !TASK_ORDER.contains(&name.as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "task filter".to_string(),
                    value: name.clone(),
                    reason: format!("Unknown task; expected one of {}", TASK_ORDER.join(", ")),
                });
            }
        }
        Ok(())
    }

    pub fn selected(&self) -> Vec<&'static str> {
        TASK_ORDER.into_iter().filter(|n| self.accepts(n)).collect()
    }
}

/// Builds the configured pipeline. Only the selected tasks are constructed,
/// so running just the load step does not require S3 credentials.
pub fn build_news_pipeline(
    settings: &Settings,
    execution_id: String,
    filter: &TaskFilter,
) -> Result<TaskSequence> {
    filter.validate()?;

    let mut sequence =
        TaskSequence::new(execution_id).with_retry(RetryPolicy::from(settings.retry.clone()));

    for name in filter.selected() {
        match name {
            FETCH_AND_UPLOAD_TASK => {
                let client = NewsApiClient::new(settings.news.clone())?;
                let store = ConfiguredStore::from_settings(&settings.storage)?;
                sequence.add_task(Box::new(FetchAndUploadTask::new(
                    client,
                    store,
                    settings.storage.prefix.clone(),
                )));
            }
            DOWNLOAD_LATEST_TASK => {
                let store = ConfiguredStore::from_settings(&settings.storage)?;
                sequence.add_task(Box::new(
                    DownloadLatestTask::new(
                        store,
                        settings.storage.prefix.clone(),
                        settings.download.local_dir.clone(),
                    )
                    .with_error_policy(settings.download.on_error),
                ));
            }
            LOAD_TABLE_TASK => {
                let sink = PostgresSink::new(settings.postgres.clone());
                sequence.add_task(Box::new(LoadTableTask::new(
                    sink,
                    settings.load.csv_path.clone(),
                    settings.load.table.clone(),
                )));
            }
            _ => unreachable!("TASK_ORDER only holds known task names"),
        }
    }

    Ok(sequence)
}
