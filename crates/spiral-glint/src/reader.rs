// reader.rs — Tailing cursor over the glint log.
//
// Consumers (dashboards, the `spiral glints tail` command, tests) never talk
// to producers. They follow the file: remember a byte offset, read whatever
// complete lines were appended past it, and come back later.
//
// A line only counts once its terminating newline is on disk. A producer
// killed mid-write leaves an unterminated fragment at the end of the file;
// the reader leaves it unconsumed instead of failing. If a later producer
// appends after the fragment, the joined line is unparseable and is skipped
// with a warning.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::GlintError;
use crate::filter::GlintFilter;
use crate::glint::Glint;

/// A restartable cursor over a glint log.
#[derive(Debug, Clone)]
pub struct GlintReader {
    path: PathBuf,
    offset: u64,
    filter: GlintFilter,
}

impl GlintReader {
    /// Start reading at the first byte of the log.
    pub fn from_start(path: impl AsRef<Path>) -> Self {
        Self::at_offset(path, 0)
    }

    /// Start at the current end of the log, so only glints appended from now
    /// on are returned. A missing file starts at offset 0.
    pub fn from_end(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let offset = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Self::at_offset(path, offset)
    }

    /// Resume at a byte offset previously returned by [`GlintReader::offset`].
    pub fn at_offset(path: impl AsRef<Path>, offset: u64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            offset,
            filter: GlintFilter::default(),
        }
    }

    /// Only return glints accepted by `filter`. Rejected lines are still
    /// consumed.
    pub fn with_filter(mut self, filter: GlintFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Byte offset just past the last complete line consumed.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Path of the log being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return every glint completed since the last poll.
    ///
    /// A missing file yields nothing. If the file is now shorter than the
    /// cursor (it was truncated or rotated away), reading restarts from the
    /// beginning.
    pub fn poll(&mut self) -> Result<Vec<Glint>, GlintError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(GlintError::OpenFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let len = file
            .metadata()
            .map_err(|source| self.read_failed(source))?
            .len();
        if len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                offset = self.offset,
                len,
                "glint log shrank below the read cursor; restarting from the beginning"
            );
            self.offset = 0;
        }

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(self.offset))
            .map_err(|source| self.read_failed(source))?;

        let mut glints = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| self.read_failed(source))?;
            if n == 0 {
                break;
            }
            if buf.last() != Some(&b'\n') {
                // Unterminated tail: a write in progress or an interrupted
                // producer. Leave it for the next poll.
                break;
            }

            let line_offset = self.offset;
            self.offset += n as u64;

            if let Some(glint) = parse_line(&buf, &self.path, line_offset) {
                if self.filter.matches(&glint) {
                    glints.push(glint);
                }
            }
        }

        Ok(glints)
    }

    /// Turn the cursor into a blocking, never-ending iterator that checks
    /// the log every `poll_interval`.
    pub fn follow(self, poll_interval: Duration) -> Follow {
        Follow {
            reader: self,
            poll_interval,
            pending: VecDeque::new(),
        }
    }

    fn read_failed(&self, source: std::io::Error) -> GlintError {
        GlintError::ReadFailed {
            path: self.path.clone(),
            source,
        }
    }
}

/// Parse one newline-terminated line. Blank lines are silently skipped,
/// anything else that doesn't parse is skipped with a warning.
fn parse_line(raw: &[u8], path: &Path, offset: u64) -> Option<Glint> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text.trim(),
        Err(e) => {
            tracing::warn!(path = %path.display(), offset, "skipping non-UTF-8 glint line: {}", e);
            return None;
        }
    };
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<Glint>(text) {
        Ok(glint) => Some(glint),
        Err(e) => {
            tracing::warn!(path = %path.display(), offset, "skipping malformed glint line: {}", e);
            None
        }
    }
}

/// Infinite iterator over a growing glint log.
///
/// `next()` blocks until a glint is available. Read errors are logged and
/// retried on the next tick rather than ending the iteration.
pub struct Follow {
    reader: GlintReader,
    poll_interval: Duration,
    pending: VecDeque<Glint>,
}

impl Follow {
    /// Current cursor position, for restarting later.
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }
}

impl Iterator for Follow {
    type Item = Glint;

    fn next(&mut self) -> Option<Glint> {
        loop {
            if let Some(glint) = self.pending.pop_front() {
                return Some(glint);
            }
            match self.reader.poll() {
                Ok(glints) => self.pending.extend(glints),
                Err(e) => tracing::warn!("glint tail read failed: {}", e),
            }
            if self.pending.is_empty() {
                std::thread::sleep(self.poll_interval);
            }
        }
    }
}
