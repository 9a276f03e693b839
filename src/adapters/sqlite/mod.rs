//! SQLite origin store
//!
//! Reads the `countries` and `cities` tables of the reference database.

pub mod models;
pub mod reader;

pub use models::SqliteRecord;
pub use reader::SqliteSource;
