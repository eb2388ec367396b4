pub mod aggregation;
pub mod cursor;
pub mod repository;

pub use aggregation::AggregationStore;
pub use cursor::IngestionCursor;
pub use repository::{IngestState, JsonFileRepository, ReadOnlyRepository, Repository};
