//! The persistent, human-readable log of one export run.
//!
//! While the run is active the log is `##{program}__{YYYY-mm-dd_HH-MM-SS}.progress.log`;
//! [`RunLog::finalize`] renames it to `##{program}__{...}.log`. Each line is
//! `<local timestamp> - <message>`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, warn};

use crate::export_dir::LOG_TIMESTAMP_FORMAT;

/// Append-only run log with progress → final rename.
#[derive(Debug)]
pub struct RunLog {
    progress_path: PathBuf,
    final_path: PathBuf,
    file: File,
}

impl RunLog {
    /// Creates the progress log in `log_dir` for a run started at `started`.
    ///
    /// A final log with the same name (a run started in the same second) is
    /// taken over: its content is copied into the new progress log and the
    /// old file removed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory or file cannot be created.
    pub fn open(log_dir: &Path, program: &str, started: NaiveDateTime) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let stamp = started.format("%Y-%m-%d_%H-%M-%S");
        let progress_path = log_dir.join(format!("##{program}__{stamp}.progress.log"));
        let final_path = log_dir.join(format!("##{program}__{stamp}.log"));

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&progress_path)?;
        if final_path.exists() {
            let mut previous = File::open(&final_path)?;
            io::copy(&mut previous, &mut file)?;
            fs::remove_file(&final_path)?;
        }

        debug!(path = %progress_path.display(), "run log opened");
        Ok(Self {
            progress_path,
            final_path,
            file,
        })
    }

    /// Path of the log while the run is active.
    #[must_use]
    pub fn progress_path(&self) -> &Path {
        &self.progress_path
    }

    /// Path the log is renamed to by [`finalize`](Self::finalize).
    #[must_use]
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Appends a line stamped with the current local time.
    ///
    /// A failed write is reported through `tracing` and otherwise ignored.
    pub fn record(&mut self, message: impl AsRef<str>) {
        self.record_at(Local::now().naive_local(), message);
    }

    /// Appends a line stamped with `at`.
    pub fn record_at(&mut self, at: NaiveDateTime, message: impl AsRef<str>) {
        let message = message.as_ref();
        let line = format!("{} - {message}\n", at.format(LOG_TIMESTAMP_FORMAT));
        if let Err(error) = self
            .file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
        {
            warn!(%error, path = %self.progress_path.display(), "could not write run log");
        }
    }

    /// Closes the log and renames it to its final name.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the rename.
    pub fn finalize(self) -> io::Result<PathBuf> {
        let Self {
            progress_path,
            final_path,
            file,
        } = self;
        file.sync_all()?;
        drop(file);
        fs::rename(&progress_path, &final_path)?;
        debug!(path = %final_path.display(), "run log finalized");
        Ok(final_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn started() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_lifecycle() {
        let temp = TempDir::new().unwrap();
        let mut log = RunLog::open(temp.path(), "tag-exporter", started()).unwrap();
        assert_eq!(
            log.progress_path(),
            temp.path().join("##tag-exporter__2024-05-17_09-30-05.progress.log")
        );
        assert!(log.progress_path().exists());

        log.record_at(started(), "Starting export...");
        log.record("Tag: Tax, Documents exported: 2");
        let final_path = log.finalize().unwrap();

        assert_eq!(
            final_path,
            temp.path().join("##tag-exporter__2024-05-17_09-30-05.log")
        );
        assert!(!temp
            .path()
            .join("##tag-exporter__2024-05-17_09-30-05.progress.log")
            .exists());
        let content = fs::read_to_string(final_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "2024-05-17 09:30:05.000000 - Starting export...");
        assert!(lines[1].ends_with(" - Tag: Tax, Documents exported: 2"));
    }

    #[test]
    fn test_same_second_takes_over_previous_log() {
        let temp = TempDir::new().unwrap();
        let mut first = RunLog::open(temp.path(), "x", started()).unwrap();
        first.record_at(started(), "first run");
        first.finalize().unwrap();

        let mut second = RunLog::open(temp.path(), "x", started()).unwrap();
        second.record_at(started(), "second run");
        let path = second.finalize().unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("first run"));
        assert!(content.contains("second run"));
    }

    #[test]
    fn test_open_creates_log_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs/nested");
        let log = RunLog::open(&dir, "x", started()).unwrap();
        assert!(log.progress_path().starts_with(&dir));
    }
}
