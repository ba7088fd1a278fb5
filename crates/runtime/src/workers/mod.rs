//! Background tasks owned by the runtime.
//!
//! The tracker worker serializes every facade counter update; sweepers run
//! periodic maintenance against the detector, the ban table and the tracker.

mod sweeper;
mod tracker;

pub use sweeper::spawn_sweeper;
pub use tracker::{Command, FAILED_AUTH_THRESHOLD, FAILED_AUTH_WINDOW, TrackerWorker};
