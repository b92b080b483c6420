use crate::{Result, RipperError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Plain-text list of image URLs that failed during the current run
///
/// One URL per line, append-only. Reset at the start of every run; never read
/// back by the downloader.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the log, or truncates it if it exists
    pub fn reset(&self) -> Result<()> {
        fs::write(&self.path, "").map_err(|source| self.error(source))
    }

    /// Appends one failed URL
    pub fn append(&self, url: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.error(source))?;

        writeln!(file, "{}", url).map_err(|source| self.error(source))
    }

    /// Reads back every recorded URL
    pub fn entries(&self) -> Result<Vec<String>> {
        let content = fs::read_to_string(&self.path).map_err(|source| self.error(source))?;
        Ok(content.lines().map(str::to_string).collect())
    }

    fn error(&self, source: std::io::Error) -> RipperError {
        RipperError::SessionLog {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_creates_empty_log() {
        let dir = TempDir::new().unwrap();
        let log = SessionLog::new(dir.path().join("session_log.txt"));

        log.reset().unwrap();

        assert!(log.path().exists());
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_reset() {
        let dir = TempDir::new().unwrap();
        let log = SessionLog::new(dir.path().join("session_log.txt"));

        log.append("https://cdn.example.com/1.jpg").unwrap();
        log.append("https://cdn.example.com/2.jpg").unwrap();
        assert_eq!(
            log.entries().unwrap(),
            vec![
                "https://cdn.example.com/1.jpg",
                "https://cdn.example.com/2.jpg"
            ]
        );

        log.reset().unwrap();
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn test_unwritable_path() {
        let log = SessionLog::new("/nonexistent/dir/session_log.txt");
        assert!(matches!(log.reset(), Err(RipperError::SessionLog { .. })));
    }
}
