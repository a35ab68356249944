// Domain layer: payload/table models and the ports the adapters implement.

pub mod model;
pub mod ports;
pub mod table;

pub use model::{NewsPayload, ObjectSummary};
pub use ports::{ObjectStore, TableSink};
pub use table::CsvTable;
