use crate::domain::model::ObjectSummary;
use crate::domain::table::CsvTable;
use crate::utils::error::Result;

/// Blob storage holding the raw API payloads.
pub trait ObjectStore: Send + Sync {
    fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Every object under `prefix`, across all listing pages.
    fn list_objects(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ObjectSummary>>> + Send;

    fn get_object(&self, key: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Human-readable location, e.g. `s3://bucket`.
    fn location(&self) -> String;
}

/// Destination of the cleaned table.
pub trait TableSink: Send + Sync {
    /// Drops `table_name` if present and recreates it from `table`.
    /// Returns the number of rows written.
    fn replace_table(
        &self,
        table_name: &str,
        table: &CsvTable,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}
