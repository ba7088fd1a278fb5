//! Platform-specific directories for logs and persisted tables.
//!
//! - Linux: `~/.cache/anticheat/logs`, `~/.local/share/anticheat`
//! - macOS: `~/Library/Caches/anticheat/logs`, `~/Library/Application Support/anticheat`
//! - Windows: `%LOCALAPPDATA%\anticheat\logs`, `%APPDATA%\anticheat`
use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "anticheat")
}

pub fn log_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/anticheat"))
        .join("logs")
}

pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./anticheat_data"))
}
