//! Storage backends for tagweave
//!
//! Backends implement the `GraphStore` trait. `SqliteStore` is the
//! persistent implementation; `MemoryStore` keeps the same tables in process.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{GraphStore, OpenStore, StorageError, StorageResult, StoreSnapshot};
