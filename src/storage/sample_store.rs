//! Sample store, the per-day file lifecycle over a flat [`FileStore`].
//!
//! ```text
//!   resolve_active_file ──▶ create (header) │ reopen (count lines)
//!   append              ──▶ one record line, index from LoggerContext
//!   enforce_retention   ──▶ delete lexicographically smallest names
//!   stream_records      ──▶ lazy iterator for the radio protocol
//!   enumerate_files     ──▶ sorted, bounded listing
//! ```
//!
//! Nothing here is fatal.  Failures are logged and reported to the
//! caller, which keeps sampling in degraded mode.

use log::{debug, info, warn};

use crate::app::context::LoggerContext;
use crate::app::ports::FileStore;
use crate::clock::{TimestampLabel, WallClock};
use crate::config::{FILE_NAME_LEN, MAX_LISTED_FILES, RETENTION_BATCH};
use crate::error::StoreError;

use super::lines::{LineReader, scan_lines};
use super::{Line, LogFileName, Record, header_line};

/// Outcome of [`SampleStore::resolve_active_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// A new file was created with its header row.
    Created,
    /// An existing file was reopened; `lines` data records were found.
    Recovered { lines: u32 },
    /// The file could not be opened or created.
    Unavailable(StoreError),
}

/// Sorted listing of day files, newest [`MAX_LISTED_FILES`] kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    pub names: heapless::Vec<LogFileName, MAX_LISTED_FILES>,
    /// Matching files left out because the listing was full.
    pub omitted: usize,
}

type RawName = heapless::String<FILE_NAME_LEN>;

pub struct SampleStore<F: FileStore> {
    backend: F,
}

impl<F: FileStore> SampleStore<F> {
    pub fn new(backend: F) -> Self {
        Self { backend }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    pub fn backend(&self) -> &F {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut F {
        &mut self.backend
    }

    // ═══════════════════════════════════════════════════════════
    //  File lifecycle
    // ═══════════════════════════════════════════════════════════

    /// Open (or create) the file for `today` and point the context at it.
    ///
    /// Calling this twice for the same day without appends in between
    /// leaves both the file and the context unchanged.
    pub fn resolve_active_file(&mut self, ctx: &mut LoggerContext, today: &WallClock) -> FileState {
        let name = LogFileName::for_date(today.month(), today.day());
        match self.open_or_create(&name, ctx.config.channel_count()) {
            Ok(state) => {
                let lines = match state {
                    FileState::Recovered { lines } => lines,
                    _ => 0,
                };
                info!("Store: active file {} (next index {})", name, lines);
                ctx.file_resolved(name, lines);
                state
            }
            Err(e) => {
                warn!("Store: cannot open {}: {}", name, e);
                ctx.file_lost();
                FileState::Unavailable(e)
            }
        }
    }

    fn open_or_create(&mut self, name: &LogFileName, channels: u8) -> Result<FileState, StoreError> {
        if !self.backend.is_available() {
            return Err(StoreError::Unavailable);
        }
        if self.backend.exists(name.as_str())? {
            let scan = scan_lines(&mut self.backend, name.as_str())?;
            if scan.lines == 0 {
                // Created but the header never landed.
                warn!("Store: {} is empty, rewriting header", name);
                self.backend
                    .append(name.as_str(), header_line(channels).as_bytes())?;
                return Ok(FileState::Recovered { lines: 0 });
            }
            if !scan.terminated {
                // A cut-short append.  Close it off so the next record
                // starts on its own line; the fragment keeps its slot so
                // line positions still match record indices.
                warn!("Store: {} ends in a partial line, terminating it", name);
                self.backend.append(name.as_str(), b"\n")?;
            }
            // First line is the header.
            Ok(FileState::Recovered {
                lines: scan.lines - 1,
            })
        } else {
            self.backend
                .create(name.as_str(), header_line(channels).as_bytes())?;
            Ok(FileState::Created)
        }
    }

    /// Append one record to the active file.  On failure nothing in the
    /// context advances.
    pub fn append(&mut self, ctx: &mut LoggerContext, label: &TimestampLabel, values: &[u16]) -> bool {
        let Some(name) = ctx.active_file().cloned() else {
            debug!("Store: append with no active file");
            return false;
        };
        let record = Record {
            index: ctx.next_index(),
            label: label.clone(),
            values: values.iter().copied().take(crate::config::MAX_CHANNELS).collect(),
        };
        let line: Line = record.to_line();
        match self.backend.append(name.as_str(), line.as_bytes()) {
            Ok(()) => {
                ctx.record_appended();
                true
            }
            Err(e) => {
                warn!("Store: append to {} failed: {}", name, e);
                false
            }
        }
    }

    // ═══════════════════════════════════════════════════════════
    //  Retention
    // ═══════════════════════════════════════════════════════════

    /// Delete the lexicographically smallest day files until at most
    /// `max_files` remain.  Returns how many were deleted.
    ///
    /// Works in bounded batches so the number of files on the medium is
    /// not limited by RAM.
    pub fn enforce_retention(&mut self, max_files: usize) -> Result<usize, StoreError> {
        if !self.backend.is_available() {
            return Err(StoreError::Unavailable);
        }
        let mut total = 0usize;
        self.backend.for_each_name(&mut |raw| {
            if LogFileName::parse(raw).is_some() {
                total += 1;
            }
        })?;

        let mut excess = total.saturating_sub(max_files);
        let mut deleted = 0usize;
        while excess > 0 {
            let want = excess.min(RETENTION_BATCH);
            let batch = self.smallest_names(want)?;
            if batch.is_empty() {
                break;
            }
            for (name, raw) in &batch {
                if let Err(e) = self.backend.delete(raw.as_str()) {
                    warn!("Store: retention could not delete {}: {}", name, e);
                    return Err(e);
                }
                debug!("Store: retention deleted {}", name);
                deleted += 1;
            }
            excess -= batch.len();
        }

        if deleted > 0 {
            info!("Store: retention deleted {} file(s), limit {}", deleted, max_files);
        }
        Ok(deleted)
    }

    /// The `want` smallest matching names, sorted.
    fn smallest_names(
        &mut self,
        want: usize,
    ) -> Result<heapless::Vec<(LogFileName, RawName), RETENTION_BATCH>, StoreError> {
        let mut set: heapless::Vec<(LogFileName, RawName), RETENTION_BATCH> = heapless::Vec::new();
        let want = want.min(RETENTION_BATCH);
        self.backend.for_each_name(&mut |raw| {
            let Some(name) = LogFileName::parse(raw) else {
                return;
            };
            let mut raw_name = RawName::new();
            if raw_name.push_str(raw).is_err() {
                return;
            }
            insert_keep_smallest(&mut set, (name, raw_name));
        })?;
        set.truncate(want);
        Ok(set)
    }

    // ═══════════════════════════════════════════════════════════
    //  Read side (radio protocol)
    // ═══════════════════════════════════════════════════════════

    /// Lazily stream up to `count` records of `name`, skipping the header
    /// and the first `start_index` data lines.
    pub fn stream_records<'a>(
        &'a mut self,
        name: &'a LogFileName,
        start_index: u16,
        count: u16,
    ) -> Result<RecordStream<'a, F>, StoreError> {
        if !self.backend.is_available() {
            return Err(StoreError::Unavailable);
        }
        if !self.backend.exists(name.as_str())? {
            return Err(StoreError::NotFound);
        }
        Ok(RecordStream {
            reader: LineReader::new(&mut self.backend, name.as_str()),
            to_skip: start_index as u32 + 1,
            remaining: count,
            done: false,
        })
    }

    /// All day files, sorted ascending.  When more than
    /// [`MAX_LISTED_FILES`] match, the newest are kept.
    pub fn enumerate_files(&mut self) -> Result<FileList, StoreError> {
        if !self.backend.is_available() {
            return Err(StoreError::Unavailable);
        }
        let mut list = FileList::default();
        self.backend.for_each_name(&mut |raw| {
            if let Some(name) = LogFileName::parse(raw) {
                if insert_keep_largest(&mut list.names, name) {
                    list.omitted += 1;
                }
            }
        })?;
        if list.omitted > 0 {
            warn!(
                "Store: listing capped at {} files, {} older omitted",
                MAX_LISTED_FILES, list.omitted
            );
        }
        Ok(list)
    }
}

/// Lazy, finite record iterator returned by
/// [`SampleStore::stream_records`].  Malformed lines are skipped; a read
/// error ends the stream.
pub struct RecordStream<'a, F: FileStore> {
    reader: LineReader<'a, F>,
    to_skip: u32,
    remaining: u16,
    done: bool,
}

impl<F: FileStore> Iterator for RecordStream<'_, F> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.done || self.remaining == 0 {
            return None;
        }
        while self.to_skip > 0 {
            match self.reader.skip_line() {
                Ok(true) => self.to_skip -= 1,
                Ok(false) => return self.finish(),
                Err(e) => {
                    warn!("Store: read failed while seeking: {}", e);
                    return self.finish();
                }
            }
        }
        let mut line = Line::new();
        loop {
            match self.reader.read_line(&mut line) {
                Ok(true) => {
                    if let Some(record) = Record::parse_line(&line) {
                        self.remaining -= 1;
                        return Some(record);
                    }
                    debug!("Store: skipping malformed line");
                }
                Ok(false) => return self.finish(),
                Err(e) => {
                    warn!("Store: read failed: {}", e);
                    return self.finish();
                }
            }
        }
    }
}

impl<F: FileStore> RecordStream<'_, F> {
    fn finish(&mut self) -> Option<Record> {
        self.done = true;
        None
    }
}

// ── Bounded sorted sets ───────────────────────────────────────

/// Insert into an ascending set holding at most `N` of the smallest
/// items.  Duplicates are ignored.
fn insert_keep_smallest<T: Ord, const N: usize>(set: &mut heapless::Vec<T, N>, item: T) {
    let Err(pos) = set.binary_search(&item) else {
        return;
    };
    if pos == N {
        return;
    }
    if set.is_full() {
        set.pop();
    }
    let _ = set.insert(pos, item);
}

/// Insert into an ascending set holding at most `N` of the largest
/// items.  Returns `true` when an item was dropped to make room (either
/// the new one or the current smallest).
fn insert_keep_largest<T: Ord, const N: usize>(set: &mut heapless::Vec<T, N>, item: T) -> bool {
    let Err(pos) = set.binary_search(&item) else {
        return false;
    };
    if !set.is_full() {
        let _ = set.insert(pos, item);
        return false;
    }
    if pos == 0 {
        return true;
    }
    set.remove(0);
    let _ = set.insert(pos - 1, item);
    true
}
