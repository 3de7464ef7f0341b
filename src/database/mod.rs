pub mod brackets;
pub mod connection;
pub mod models;
pub mod reports;
pub mod runs;
pub mod setup;
pub mod store;

pub use connection::{DbConn, DbPool, create_memory_pool, create_pool, get_connection};
pub use models::*;
pub use store::{BracketStore, ReportStore, RunSource, SqliteStore};
