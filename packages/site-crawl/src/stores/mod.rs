//! Result persistence.
//!
//! [`ResultStore`] is the public face: it maps canonical results to stored
//! records and turns every storage failure into `false`/`None`/empty.
//! Underneath, any [`RecordStore`](crate::traits::RecordStore) works:
//! - `MemoryStore` - In-memory storage (always available)
//! - `SqliteStore` - SQLite file-based storage (requires `sqlite` feature)
//! - `PostgresStore` - PostgreSQL storage (requires `postgres` feature)

pub mod memory;
pub mod result_store;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
pub use result_store::ResultStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
