//! Watering event log adapter.
//!
//! Implements both [`WateringEventSink`] and [`WateringHistory`].
//!
//! Two backends share one in-memory index:
//! - **memory**: records live only as long as the process (tests,
//!   development without a configured path);
//! - **file**: every record is appended to a JSON-lines file and flushed
//!   before the call returns.  Reopening the file restores the history and
//!   continues id numbering after the highest stored id.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use parking_lot::Mutex;

use crate::app::events::{WateringEvent, WateringRecord};
use crate::app::ports::{WateringEventSink, WateringHistory};
use crate::error::{self, SinkError};

pub struct EventLog {
    path: Option<PathBuf>,
    state: Mutex<LogState>,
}

struct LogState {
    records: Vec<WateringRecord>,
    next_id: u64,
    file: Option<File>,
}

impl EventLog {
    pub fn in_memory() -> Self {
        info!("event_log: memory backend");
        Self {
            path: None,
            state: Mutex::new(LogState {
                records: Vec::new(),
                next_id: 1,
                file: None,
            }),
        }
    }

    /// Open (or create) a JSON-lines log at `path`.
    ///
    /// A torn last line (no trailing newline) is terminated before any new
    /// record is appended, so the next record starts on its own line.
    pub fn open(path: impl AsRef<Path>) -> error::Result<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(SinkError::from(e).into()),
        };
        let records = parse_lines(path, &raw);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(SinkError::from)?;
        if !raw.is_empty() && !raw.ends_with('\n') {
            warn!("event_log: {} ends mid-record, terminating it", path.display());
            file.write_all(b"\n").map_err(SinkError::from)?;
        }
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        info!(
            "event_log: {} opened with {} records",
            path.display(),
            records.len()
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(LogState {
                records,
                next_id,
                file: Some(file),
            }),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_lines(path: &Path, raw: &str) -> Vec<WateringRecord> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("event_log: {}:{} skipped: {e}", path.display(), n + 1);
                None
            }
        })
        .collect()
}

/// Newest session first; ties broken by insertion order, newest first.
fn newest_first(mut records: Vec<WateringRecord>) -> Vec<WateringRecord> {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    records
}

// ── WateringEventSink ─────────────────────────────────────────

impl WateringEventSink for EventLog {
    fn record_watering_event(&self, event: &WateringEvent) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        let record = WateringRecord {
            id: state.next_id,
            timestamp: event.start_ms,
            duration_seconds: event.duration_secs,
            triggered_by: event.triggered_by.clone(),
            created_at: Utc::now(),
        };

        if let Some(file) = state.file.as_mut() {
            let line = serde_json::to_string(&record).map_err(|_| SinkError::Encode)?;
            writeln!(file, "{line}")?;
            file.flush()?;
        }

        state.next_id += 1;
        state.records.push(record);
        Ok(())
    }
}

// ── WateringHistory ───────────────────────────────────────────

impl WateringHistory for EventLog {
    fn recent(&self, limit: usize) -> Result<Vec<WateringRecord>, SinkError> {
        let records = self.state.lock().records.clone();
        let mut sorted = newest_first(records);
        sorted.truncate(limit);
        Ok(sorted)
    }

    fn in_range(&self, start_ms: i64, end_ms: i64) -> Result<Vec<WateringRecord>, SinkError> {
        let records: Vec<_> = self
            .state
            .lock()
            .records
            .iter()
            .filter(|r| (start_ms..=end_ms).contains(&r.timestamp))
            .cloned()
            .collect();
        Ok(newest_first(records))
    }
}
