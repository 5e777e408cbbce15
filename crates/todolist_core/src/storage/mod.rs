pub mod json_store;
mod kv;

pub use json_store::{PersistenceGateway, TODOS_KEY, store_dir};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
