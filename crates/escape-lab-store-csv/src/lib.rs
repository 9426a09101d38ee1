#![allow(clippy::missing_errors_doc)]

//! Append-only CSV table of escape-room attempts.
//!
//! Every call re-reads or re-opens the backing file; nothing is cached
//! between calls, so edits made by other tools are always visible.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use escape_lab_core::{
    now_epoch_millis, rank_leaderboard, AttemptError, AttemptRecord, LeaderboardSort, NewAttempt,
    TABLE_HEADER,
};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] AttemptError),
    #[error("failed to write attempt table at {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read attempt table at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("attempt table at {} has an unexpected header: {found:?}", .path.display())]
    Header { path: PathBuf, found: Vec<String> },
}

impl StoreError {
    #[must_use]
    pub fn is_read_failure(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Header { .. })
    }
}

#[derive(Debug, thiserror::Error)]
enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("column `{column}` has invalid value {value:?}")]
    InvalidField { column: &'static str, value: String },
}

#[derive(Debug, Default)]
struct WriterState {
    last_id: i64,
}

/// Attempt table persisted as a comma-separated file with a fixed header.
///
/// Appends from this instance are serialized; each row goes to disk as a
/// single append-mode write.
#[derive(Debug)]
pub struct CsvAttemptStore {
    path: PathBuf,
    writer: Mutex<WriterState>,
}

impl CsvAttemptStore {
    /// Binds a store to `path`. No file is touched until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), writer: Mutex::new(WriterState::default()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the table with its header row if it is missing or empty.
    ///
    /// Only takes the writer lock when the header actually has to be written.
    pub fn ensure_initialized(&self) -> Result<(), StoreError> {
        if self.has_content()? {
            return Ok(());
        }
        let _writer = self.lock_writer();
        self.initialize_locked()
    }

    /// Assigns an id to `attempt` and appends it as one row.
    pub fn append_record(&self, attempt: NewAttempt) -> Result<AttemptRecord, StoreError> {
        attempt.validate()?;

        let mut writer = self.lock_writer();
        let id = next_id(writer.last_id, now_epoch_millis());
        writer.last_id = id;
        self.initialize_locked()?;

        let record = AttemptRecord::from_new(id, attempt);
        let row = encode_row(&record_fields(&record)).map_err(|err| self.write_error(err))?;
        append_row(&self.path, &row).map_err(|err| self.write_error(err))?;

        info!(id = record.id, name = %record.name, status = %record.status, "recorded attempt");
        Ok(record)
    }

    /// Loads every parseable row in file order.
    ///
    /// Rows whose fields do not parse are logged and skipped.
    pub fn read_all(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        self.ensure_initialized()?;

        let file = File::open(&self.path).map_err(|err| self.read_error(err))?;
        let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(file);

        let headers = reader.headers().map_err(|err| self.read_error(err.into()))?;
        if !headers.iter().eq(TABLE_HEADER.iter().copied()) {
            return Err(StoreError::Header {
                path: self.path.clone(),
                found: headers.iter().map(str::to_string).collect(),
            });
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = match row {
                Ok(row) => row,
                Err(err) if err.is_io_error() => return Err(self.read_error(err.into())),
                Err(err) => {
                    let line = err.position().map(csv::Position::line);
                    warn!(line = ?line, error = %err, "skipping unreadable attempt row");
                    continue;
                }
            };

            match parse_attempt_row(&row) {
                Ok(record) => records.push(record),
                Err(err) => {
                    let line = row.position().map(csv::Position::line);
                    warn!(line = ?line, error = %err, "skipping malformed attempt row");
                }
            }
        }

        Ok(records)
    }

    /// Completed attempts ordered by `sort`, fastest first by default.
    pub fn leaderboard(&self, sort: LeaderboardSort) -> Result<Vec<AttemptRecord>, StoreError> {
        Ok(rank_leaderboard(self.read_all()?, sort))
    }

    /// Every attempt, including failed ones, in file order.
    pub fn all_entries(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        self.read_all()
    }

    /// Raw bytes of the table, header included.
    pub fn export_bytes(&self) -> Result<Vec<u8>, StoreError> {
        self.ensure_initialized()?;
        fs::read(&self.path).map_err(|err| self.read_error(err))
    }

    fn has_content(&self) -> Result<bool, StoreError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.len() > 0),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.write_error(err)),
        }
    }

    fn initialize_locked(&self) -> Result<(), StoreError> {
        if self.has_content()? {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.write_error(err))?;
        }

        let header = encode_row(&TABLE_HEADER).map_err(|err| self.write_error(err))?;
        append_row(&self.path, &header).map_err(|err| self.write_error(err))?;
        info!(path = %self.path.display(), "initialized attempt table");
        Ok(())
    }

    fn lock_writer(&self) -> MutexGuard<'_, WriterState> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::Write { path: self.path.clone(), source }
    }

    fn read_error(&self, source: io::Error) -> StoreError {
        StoreError::Read { path: self.path.clone(), source }
    }
}

/// Millisecond clock reading, bumped past the last id this store issued.
fn next_id(last_id: i64, now_ms: i64) -> i64 {
    if now_ms > last_id {
        now_ms
    } else {
        last_id.saturating_add(1)
    }
}

fn record_fields(record: &AttemptRecord) -> [String; 9] {
    [
        record.id.to_string(),
        record.name.clone(),
        record.time_spent_sec.to_string(),
        record.time_remaining_sec.to_string(),
        record.money_lost.to_string(),
        record.hints_used.to_string(),
        record.grade.clone(),
        record.status.clone(),
        record.completed_at.clone(),
    ]
}

fn encode_row<T: AsRef<[u8]>>(fields: &[T]) -> io::Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().terminator(Terminator::CRLF).from_writer(Vec::new());
    writer.write_record(fields)?;
    writer.into_inner().map_err(|err| io::Error::new(err.error().kind(), err.to_string()))
}

/// Appends `row` in one write, first terminating a last line left open by
/// another writer. A failed write is truncated back to the previous length.
fn append_row(path: &Path, row: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).read(true).append(true).open(path)?;
    let previous_len = file.metadata()?.len();

    let mut bytes = Vec::with_capacity(row.len() + 2);
    if previous_len > 0 && !ends_with_newline(&mut file, previous_len)? {
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(row);

    let written = file.write_all(&bytes).and_then(|()| file.flush()).and_then(|()| file.sync_data());
    if let Err(err) = written {
        if let Err(truncate_err) = file.set_len(previous_len) {
            warn!(path = %path.display(), error = %truncate_err, "failed to roll back partial row");
        }
        return Err(err);
    }
    Ok(())
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn parse_attempt_row(row: &StringRecord) -> Result<AttemptRecord, RowError> {
    if row.len() != TABLE_HEADER.len() {
        return Err(RowError::FieldCount { expected: TABLE_HEADER.len(), found: row.len() });
    }

    let money_lost: f64 = parse_field(row, 4)?;
    if !money_lost.is_finite() || money_lost < 0.0 {
        return Err(invalid_field(row, 4));
    }

    Ok(AttemptRecord {
        id: parse_field(row, 0)?,
        name: text_field(row, 1),
        time_spent_sec: parse_field(row, 2)?,
        time_remaining_sec: parse_field(row, 3)?,
        money_lost,
        hints_used: parse_field(row, 5)?,
        grade: text_field(row, 6),
        status: text_field(row, 7),
        completed_at: text_field(row, 8),
    })
}

fn parse_field<T: FromStr>(row: &StringRecord, index: usize) -> Result<T, RowError> {
    row.get(index)
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(|_| invalid_field(row, index))
}

fn text_field(row: &StringRecord, index: usize) -> String {
    row.get(index).unwrap_or_default().to_string()
}

fn invalid_field(row: &StringRecord, index: usize) -> RowError {
    RowError::InvalidField {
        column: TABLE_HEADER.get(index).copied().unwrap_or("?"),
        value: row.get(index).unwrap_or_default().to_string(),
    }
}
