use crate::core::{PipelineTask, TaskContext};
use crate::domain::{CsvTable, TableSink};
use crate::utils::error::{EtlError, Result};
use std::path::{Path, PathBuf};

pub const LOAD_TABLE_TASK: &str = "load_data_to_postgres";

/// Resolves the cleaned CSV: either `path` itself, or the first `*.csv` file
/// (by name) inside it when it is a directory of part files.
pub async fn resolve_csv_path(path: &Path) -> Result<PathBuf> {
    let metadata = tokio::fs::metadata(path).await.ok();

    if metadata.as_ref().is_some_and(|m| m.is_file()) {
        return Ok(path.to_path_buf());
    }

    if metadata.as_ref().is_some_and(|m| m.is_dir()) {
        let mut candidates = Vec::new();
        let mut entries = tokio::fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let candidate = entry.path();
            let is_csv = candidate
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && entry.file_type().await?.is_file() {
                candidates.push(candidate);
            }
        }
        candidates.sort();
        if let Some(first) = candidates.into_iter().next() {
            return Ok(first);
        }
    }

    Err(EtlError::FileNotFound {
        path: path.display().to_string(),
    })
}

/// Replaces `table_name` with the contents of the cleaned CSV. The file is
/// read and validated before the sink is touched.
pub async fn load_data_to_postgres<K: TableSink>(
    sink: &K,
    csv_path: &Path,
    table_name: &str,
    raw_input: Option<&Path>,
) -> Result<u64> {
    match load(sink, csv_path, table_name, raw_input).await {
        Ok(rows) => Ok(rows),
        Err(e) => {
            match &e {
                EtlError::FileNotFound { .. } => tracing::error!("FileNotFoundError: {}", e),
                EtlError::ValidationError { .. } => tracing::error!("ValidationError: {}", e),
                EtlError::DatabaseError(_) => tracing::error!("DatabaseError: {}", e),
                _ => tracing::error!("Unexpected error: {}", e),
            }
            Err(e)
        }
    }
}

async fn load<K: TableSink>(
    sink: &K,
    csv_path: &Path,
    table_name: &str,
    raw_input: Option<&Path>,
) -> Result<u64> {
    let csv_file = resolve_csv_path(csv_path).await?;
    tracing::info!("Found CSV file at: {}", csv_file.display());

    if let Some(raw) = raw_input {
        warn_if_stale(&csv_file, raw).await;
    }

    let content = tokio::fs::read(&csv_file).await?;
    let table = CsvTable::from_reader(content.as_slice())?;
    tracing::info!(
        "Loaded CSV with {} rows and {} columns.",
        table.row_count(),
        table.column_count()
    );

    if table.is_empty() {
        return Err(EtlError::ValidationError {
            message: format!("CSV is empty: {}. Aborting.", csv_file.display()),
        });
    }

    let written = sink.replace_table(table_name, &table).await?;
    tracing::info!(
        "🗄️ Data successfully loaded into PostgreSQL table: {} ({} rows)",
        table_name,
        written
    );
    Ok(written)
}

/// 清理步驟在 pipeline 外面跑，CSV 比原始檔舊通常代表它還沒更新
async fn warn_if_stale(csv_file: &Path, raw_input: &Path) {
    async fn modified(p: &Path) -> Option<std::time::SystemTime> {
        tokio::fs::metadata(p).await.and_then(|m| m.modified()).ok()
    }
    if let (Some(csv_time), Some(raw_time)) = (modified(csv_file).await, modified(raw_input).await) {
        if csv_time < raw_time {
            tracing::warn!(
                "⚠️ Cleaned CSV {} is older than the latest raw file {}; the cleaning step may not have run",
                csv_file.display(),
                raw_input.display()
            );
        }
    }
}

pub struct LoadTableTask<K: TableSink> {
    sink: K,
    csv_path: PathBuf,
    table_name: String,
}

impl<K: TableSink> LoadTableTask<K> {
    pub fn new(sink: K, csv_path: impl Into<PathBuf>, table_name: impl Into<String>) -> Self {
        Self {
            sink,
            csv_path: csv_path.into(),
            table_name: table_name.into(),
        }
    }
}

#[async_trait::async_trait]
impl<K: TableSink> PipelineTask for LoadTableTask<K> {
    fn name(&self) -> &str {
        LOAD_TABLE_TASK
    }

    async fn run(&self, context: &mut TaskContext) -> Result<String> {
        let rows = load_data_to_postgres(
            &self.sink,
            &self.csv_path,
            &self.table_name,
            context.downloaded_file.as_deref(),
        )
        .await?;
        Ok(format!("{} rows into {}", rows, self.table_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolve_csv_path_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("clean.csv");
        std::fs::write(&file, "a\n1\n").unwrap();
        assert_eq!(resolve_csv_path(&file).await.unwrap(), file);
    }

    #[tokio::test]
    async fn test_resolve_csv_path_part_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("_SUCCESS"), "").unwrap();
        std::fs::write(dir.path().join("part-00001-abc.csv"), "a\n2\n").unwrap();
        std::fs::write(dir.path().join("part-00000-abc.csv"), "a\n1\n").unwrap();

        assert_eq!(
            resolve_csv_path(dir.path()).await.unwrap(),
            dir.path().join("part-00000-abc.csv")
        );
    }

    #[tokio::test]
    async fn test_resolve_csv_path_missing() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            resolve_csv_path(&dir.path().join("missing.csv")).await,
            Err(EtlError::FileNotFound { .. })
        ));
        // 目錄存在但沒有 CSV
        assert!(matches!(
            resolve_csv_path(dir.path()).await,
            Err(EtlError::FileNotFound { .. })
        ));
    }
}
