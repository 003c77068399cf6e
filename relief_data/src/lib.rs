pub mod analysis;
pub mod city;
pub mod memory_store;
pub mod reader;
pub mod record;
pub mod sqlite_store;
pub mod store;

pub use city::{CityTemplate, Resource, CITY_COUNT, CITY_TEMPLATES};
pub use memory_store::MemoryStore;
pub use record::{ResourceMap, SyntheticRecord};
pub use sqlite_store::SqliteDocumentStore;
pub use store::{Document, RecordStore, StoreError, DEFAULT_STORE_PATH};
