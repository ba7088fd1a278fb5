//! In-memory repository implementations for tests and local runs.

mod log;
mod table;

pub use log::InMemoryViolationLog;
pub use table::MemoryTable;
