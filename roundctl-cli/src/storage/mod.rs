//! Native storage: SQLite key-value metadata.

pub mod sqlite_meta;

pub use sqlite_meta::SqliteMeta;
