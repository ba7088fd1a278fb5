//! File-based repository implementations.
//!
//! Violation logs are append-only JSON lines; every other table is a whole
//! JSON snapshot replaced atomically on each write.

mod log;
mod table;

pub use log::FileViolationLog;
pub use table::FileTable;
