// Adapters layer: concrete implementations for external systems (news API, object storage, postgres).

pub mod news_api;
pub mod object_store;
pub mod postgres;

pub use news_api::NewsApiClient;
pub use object_store::{ConfiguredStore, FsObjectStore, S3ObjectStore};
pub use postgres::PostgresSink;
