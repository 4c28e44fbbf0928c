//! Core value types, the state store seam, and the change-detecting writer
//!
//! Both ingest pipelines normalize their feeds into [`EntryUpdate`]s and hand
//! them to a [`StateWriter`], which creates missing entries and only writes
//! values that actually changed.

pub mod path;
pub mod pipeline;
pub mod types;
pub mod writer;

pub use path::*;
pub use pipeline::*;
pub use types::*;
pub use writer::*;
