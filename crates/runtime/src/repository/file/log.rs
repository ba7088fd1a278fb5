//! Append-only violation log.
//!
//! One JSON document per line. Rows are never rewritten: recording the
//! action taken appends an amendment line that is folded in on replay.
//!
//! ```text
//! {"kind":"entry","id":1,"event":{...},"action_taken":null}
//! {"kind":"entry","id":2,"event":{...},"action_taken":null}
//! {"kind":"amend","ids":[1,2],"action_taken":"Ban issued: speed_hack"}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::repository::memory::InMemoryViolationLog;
use crate::repository::{RepositoryError, Result, ViolationLogRepository};
use crate::violation::{ViolationEvent, ViolationLogEntry};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum LogLine {
    Entry(ViolationLogEntry),
    Amend { ids: Vec<u64>, action_taken: String },
}

/// File-backed [`ViolationLogRepository`] with an in-memory index for queries.
pub struct FileViolationLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    index: InMemoryViolationLog,
}

impl FileViolationLog {
    /// Opens `base_dir/filename`, creating it if needed, and replays it.
    pub fn open_or_create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir).map_err(RepositoryError::Io)?;
        let path = base_dir.join(filename.as_ref());

        let index = InMemoryViolationLog::from_entries(Self::replay(&path)?);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(RepositoryError::Io)?;

        tracing::debug!(
            "Opened violation log: {} ({} entries)",
            path.display(),
            index.len()
        );

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every row back, folding amendments in. A torn final line is
    /// cut off so later appends start on a clean line.
    fn replay(path: &Path) -> Result<Vec<ViolationLogEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path).map_err(RepositoryError::Io)?;
        let file_size = file.metadata().map_err(RepositoryError::Io)?.len();
        let mut reader = BufReader::new(file);
        let mut entries: Vec<ViolationLogEntry> = Vec::new();
        let mut line = String::new();
        let mut offset = 0u64;
        let mut number = 0usize;

        loop {
            line.clear();
            let read = reader.read_line(&mut line).map_err(RepositoryError::Io)?;
            if read == 0 {
                break;
            }
            number += 1;
            let line_start = offset;
            offset += read as u64;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<LogLine>(line.trim_end()) {
                Ok(LogLine::Entry(entry)) => entries.push(entry),
                Ok(LogLine::Amend { ids, action_taken }) => {
                    for entry in entries.iter_mut().filter(|entry| ids.contains(&entry.id)) {
                        entry.action_taken = Some(action_taken.clone());
                    }
                }
                Err(e) if offset == file_size => {
                    tracing::warn!(
                        "Truncating torn last line {} of {}: {}",
                        number,
                        path.display(),
                        e
                    );
                    OpenOptions::new()
                        .write(true)
                        .open(path)
                        .and_then(|file| file.set_len(line_start))
                        .map_err(RepositoryError::Io)?;
                    break;
                }
                Err(e) => {
                    return Err(RepositoryError::CorruptedData(format!(
                        "{} line {}: {}",
                        path.display(),
                        number,
                        e
                    )));
                }
            }
        }

        Ok(entries)
    }

    fn write_line(writer: &mut BufWriter<File>, line: &LogLine) -> Result<()> {
        serde_json::to_writer(&mut *writer, line)?;
        writer.write_all(b"\n").map_err(RepositoryError::Io)?;
        writer.flush().map_err(RepositoryError::Io)?;
        Ok(())
    }
}

impl ViolationLogRepository for FileViolationLog {
    fn append(&self, event: &ViolationEvent) -> Result<u64> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let entry = ViolationLogEntry {
            id: self.index.next_id()?,
            event: event.clone(),
            action_taken: None,
        };
        Self::write_line(&mut writer, &LogLine::Entry(entry.clone()))?;

        let id = entry.id;
        self.index.push(entry)?;
        Ok(id)
    }

    fn amend(&self, ids: &[u64], action_taken: &str) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        Self::write_line(
            &mut writer,
            &LogLine::Amend {
                ids: ids.to_vec(),
                action_taken: action_taken.to_string(),
            },
        )?;
        self.index.amend(ids, action_taken)
    }

    fn find(
        &self,
        predicate: &dyn Fn(&ViolationLogEntry) -> bool,
        limit: usize,
    ) -> Result<Vec<ViolationLogEntry>> {
        self.index.find(predicate, limit)
    }
}
