//! File-based data source.
//!
//! Polls a JSON file holding the latest queue snapshot.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use queuewatch_types::Snapshot;
use tracing::debug;

use super::DataSource;

/// A data source that reads queue snapshots from a JSON file.
///
/// Some exporter (a cron job, a sidecar polling the backend) keeps
/// overwriting the file. The source tracks the file's modification time and
/// only returns data when the file has been updated.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<Snapshot> {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(snapshot) => {
                    self.last_error = None;
                    Some(snapshot)
                }
                Err(e) => {
                    self.last_error = Some(format!("Parse error: {}", e));
                    None
                }
            },
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                None
            }
        }
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<Snapshot> {
        let current_modified = self.modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // First poll, always read
            (Some(_), None) => false, // File disappeared, keep last state
            (Some(last), Some(current)) => current > last,
        };

        if !file_changed {
            return None;
        }

        let snapshot = self.read_file()?;
        debug!(path = %self.path.display(), queues = snapshot.len(), "read snapshot file");
        self.last_modified = current_modified;
        Some(snapshot)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, Write};
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "timestamp": 1700000000000,
            "queues": {
                "openai/gpt-4o": { "queued": 5, "running": 2, "success": 100 }
            }
        }"#
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/queues.json");
        assert_eq!(source.path(), Path::new("/tmp/queues.json"));
        assert_eq!(source.description(), "file: /tmp/queues.json");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_poll_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());

        let snapshot = source.poll().unwrap();
        assert_eq!(snapshot.timestamp_ms, 1700000000000);
        assert_eq!(snapshot.stat("openai/gpt-4o").unwrap().queued, 5);

        // Second poll without file change should return None
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_detects_changes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());
        let _ = source.poll();

        std::thread::sleep(std::time::Duration::from_millis(10));
        file.rewind().unwrap();
        writeln!(file, r#"{{"timestamp": 1700000060000, "queues": {{"new": {{}}}}}}"#).unwrap();
        file.flush().unwrap();

        // Filesystems with coarse mtime resolution may not report a change
        if let Some(s) = source.poll() {
            assert!(s.stat("new").is_some());
        }
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/queues.json");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Parse error"));
    }

    #[test]
    fn test_file_source_lenient_counters() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"timestamp": 5, "queues": {{"a": {{"queued": "7", "failed": null}}}}}}"#)
            .unwrap();

        let mut source = FileSource::new(file.path());
        let snapshot = source.poll().unwrap();
        assert_eq!(snapshot.stat("a").unwrap().queued, 7);
        assert_eq!(snapshot.stat("a").unwrap().failed, 0);
    }
}
