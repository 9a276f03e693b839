//! Store abstraction layer
//!
//! Trait-based seams between the migration pipeline and concrete stores.

pub mod traits;

pub use traits::{Destination, InsertSession, RecordSource, SourceFailure, SourceReport};
