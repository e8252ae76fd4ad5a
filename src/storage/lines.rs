//! Buffered line reader over [`FileStore::read_at`].
//!
//! Reads in small chunks so a file of any length can be scanned with a
//! fixed stack footprint.  Used both to recover the record index on
//! reopen (count lines) and to stream records back out.

use crate::app::ports::FileStore;
use crate::error::StoreError;

use super::Line;

const CHUNK: usize = 64;

pub struct LineReader<'a, F: FileStore> {
    store: &'a mut F,
    name: &'a str,
    buf: [u8; CHUNK],
    len: usize,
    pos: usize,
    offset: u64,
    eof: bool,
    last: Option<u8>,
}

impl<'a, F: FileStore> LineReader<'a, F> {
    pub fn new(store: &'a mut F, name: &'a str) -> Self {
        Self {
            store,
            name,
            buf: [0; CHUNK],
            len: 0,
            pos: 0,
            offset: 0,
            eof: false,
            last: None,
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>, StoreError> {
        if self.pos == self.len {
            if self.eof {
                return Ok(None);
            }
            let n = self.store.read_at(self.name, self.offset, &mut self.buf)?;
            if n == 0 {
                self.eof = true;
                return Ok(None);
            }
            self.offset += n as u64;
            self.len = n;
            self.pos = 0;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        self.last = Some(b);
        Ok(Some(b))
    }

    /// Read the next line into `out`, without its terminator.  Returns
    /// `false` at end of file.  A final line without a trailing newline
    /// still counts.  Characters past the line capacity are dropped,
    /// carriage returns are stripped and non-ASCII bytes become `?`.
    pub fn read_line(&mut self, out: &mut Line) -> Result<bool, StoreError> {
        out.clear();
        self.scan_line(|b| {
            if b == b'\r' {
                return;
            }
            let c = if b.is_ascii() { b as char } else { '?' };
            let _ = out.push(c);
        })
    }

    /// Advance past the next line.  Returns `false` at end of file.
    pub fn skip_line(&mut self) -> Result<bool, StoreError> {
        self.scan_line(|_| {})
    }

    /// Whether everything read so far ends with a newline.  `true` for
    /// an empty file.
    pub fn ends_terminated(&self) -> bool {
        matches!(self.last, None | Some(b'\n'))
    }

    fn scan_line(&mut self, mut sink: impl FnMut(u8)) -> Result<bool, StoreError> {
        let mut consumed = false;
        while let Some(b) = self.next_byte()? {
            consumed = true;
            if b == b'\n' {
                break;
            }
            sink(b);
        }
        Ok(consumed)
    }
}

/// Result of [`scan_lines`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineScan {
    /// Lines in the file, header and any unterminated tail included.
    pub lines: u32,
    /// The file is empty or ends with `\n`.  `false` after a write was
    /// cut short, e.g. by power loss mid-append.
    pub terminated: bool,
}

/// Count the lines of `name` and report whether the last one is whole.
pub fn scan_lines<F: FileStore>(store: &mut F, name: &str) -> Result<LineScan, StoreError> {
    let mut reader = LineReader::new(store, name);
    let mut lines = 0u32;
    while reader.skip_line()? {
        lines = lines.saturating_add(1);
    }
    Ok(LineScan {
        lines,
        terminated: reader.ends_terminated(),
    })
}
