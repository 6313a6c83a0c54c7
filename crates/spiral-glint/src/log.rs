// log.rs — Append-only JSONL glint log.
//
// The glint log is stored as a JSONL (JSON Lines) file: one JSON object per
// line. This format is simple, append-friendly, and easy to parse with
// standard tools (jq, grep, tail -f).
//
// Several producers (the orchestrator, every module, external command
// modules) append to the same file. There is no lock: each glint is written
// with one `write` call on a file opened in append mode, which the OS applies
// atomically at the end of the file. Order is only guaranteed per producer.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::GlintError;
use crate::glint::Glint;
use crate::reader::GlintReader;

/// Handle to an append-only glint log backed by a JSONL file.
///
/// The handle only stores the path; the file is opened per append, the same
/// way a shell `>>` redirect does. That keeps the handle `Clone + Send + Sync`
/// so every module can own a copy without sharing a file descriptor.
#[derive(Debug, Clone)]
pub struct GlintLog {
    path: PathBuf,
}

impl GlintLog {
    /// Create a handle for the log at `path`. Nothing is touched on disk
    /// until the first append.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append a glint to the log.
    ///
    /// Creates the containing directory if it doesn't exist. The serialized
    /// record and its trailing newline go out in a single write, so a
    /// concurrent tailer either sees the whole line or none of it.
    pub fn append(&self, glint: &Glint) -> Result<(), GlintError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| GlintError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        // serde_json escapes control characters, so the line never contains
        // a raw newline of its own.
        let mut line = serde_json::to_vec(glint)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| GlintError::OpenFailed {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(&line)
            .and_then(|()| file.flush())
            .map_err(|source| GlintError::WriteFailed {
                path: self.path.clone(),
                source,
            })?;

        tracing::trace!(glint_type = %glint.glint_type, source = %glint.source, "glint appended");
        Ok(())
    }

    /// Read every complete glint in a log file, oldest first.
    ///
    /// Blank lines are skipped, malformed lines are skipped with a warning,
    /// and a trailing line without a newline (an interrupted write) is
    /// ignored.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Glint>, GlintError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GlintError::OpenFailed {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        GlintReader::from_start(path).poll()
    }

    /// Return the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn append_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let log = GlintLog::new(dir.path().join("glints.jsonl"));

        log.append(&Glint::new("spiral.awakened", "awaken")).unwrap();
        log.append(&Glint::new("spiral.pulse", "heartbeat").with_payload(json!({ "beat": 1 })))
            .unwrap();

        let glints = GlintLog::read_all(log.path()).unwrap();
        assert_eq!(glints.len(), 2);
        assert_eq!(glints[0].glint_type, "spiral.awakened");
        assert_eq!(glints[1].payload["beat"], 1);
    }

    #[test]
    fn preserves_append_order_of_a_single_producer() {
        let dir = tempdir().unwrap();
        let log = GlintLog::new(dir.path().join("glints.jsonl"));

        for i in 0..25 {
            log.append(&Glint::new("test.seq", "producer").with_payload(json!({ "n": i })))
                .unwrap();
        }

        let glints = GlintLog::read_all(log.path()).unwrap();
        let seq: Vec<i64> = glints
            .iter()
            .map(|g| g.payload["n"].as_i64().unwrap())
            .collect();
        assert_eq!(seq, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("glints.jsonl");
        let log = GlintLog::new(&path);

        log.append(&Glint::new("a.b", "x")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn truncated_final_line_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("glints.jsonl");
        let log = GlintLog::new(&path);
        log.append(&Glint::new("a.one", "x")).unwrap();
        log.append(&Glint::new("a.two", "x")).unwrap();

        // Simulate a producer killed halfway through a write.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"timestamp":"2024-01-01T00:00:00Z","glint_ty"#)
            .unwrap();

        let glints = GlintLog::read_all(&path).unwrap();
        assert_eq!(glints.len(), 2);
        assert_eq!(glints[1].glint_type, "a.two");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("glints.jsonl");
        let log = GlintLog::new(&path);
        log.append(&Glint::new("a.one", "x")).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"not json at all\n\n")
            .unwrap();
        log.append(&Glint::new("a.two", "x")).unwrap();

        let types: Vec<String> = GlintLog::read_all(&path)
            .unwrap()
            .into_iter()
            .map(|g| g.glint_type)
            .collect();
        assert_eq!(types, vec!["a.one", "a.two"]);
    }

    #[test]
    fn read_all_on_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = GlintLog::read_all(dir.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, GlintError::OpenFailed { .. }));
    }

    #[test]
    fn concurrent_producers_never_interleave_lines() {
        let dir = tempdir().unwrap();
        let log = GlintLog::new(dir.path().join("glints.jsonl"));

        let handles: Vec<_> = (0..4)
            .map(|p| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let glint = Glint::new("test.concurrent", format!("producer-{}", p))
                            .with_payload(json!({ "n": i }));
                        log.append(&glint).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let glints = GlintLog::read_all(log.path()).unwrap();
        assert_eq!(glints.len(), 200);

        // Per-producer order survives even though producers interleave.
        for p in 0..4 {
            let source = format!("producer-{}", p);
            let seq: Vec<i64> = glints
                .iter()
                .filter(|g| g.source == source)
                .map(|g| g.payload["n"].as_i64().unwrap())
                .collect();
            assert_eq!(seq, (0..50).collect::<Vec<_>>());
        }
    }
}
