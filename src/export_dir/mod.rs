//! Export directory manager.
//!
//! Maps jobs to directories below the export root, reconciles remote tags
//! against the local directory names, decides whether the all-documents job
//! already ran today and archives the previous contents of a directory before
//! it is repopulated.

mod archive;
mod error;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info, instrument, warn};

pub use archive::{archive_and_clear, archive_path};
pub use error::ExportDirError;

use crate::api::Tag;
use crate::host::HostInfo;
use crate::job::{ALL_DOCUMENTS_DIR, ExportJob};

/// File written into directories that match no remote tag.
pub const TAG_NOT_FOUND_LOG: &str = "tag_not_found.log";

/// Timestamp format of log lines, e.g. `2024-05-17 09:30:05.123456`.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Remote tags matched against the local directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Tags with a directory of the same name, in remote order.
    pub matched: Vec<Tag>,
    /// Tags without a directory, in remote order.
    pub missing: Vec<Tag>,
    /// Directory names without a remote tag, sorted. Never contains `ALLDocs`.
    pub orphaned: Vec<String>,
}

impl Reconciliation {
    #[must_use]
    pub fn is_matched(&self, tag_id: i64) -> bool {
        self.matched.iter().any(|tag| tag.id == tag_id)
    }
}

/// Whether `name` can be a tag directory: exactly one plain path component
/// (no separators, not `.` or `..`, not empty) and not the all-documents
/// directory.
#[must_use]
pub fn is_tag_dir_name(name: &str) -> bool {
    if name == ALL_DOCUMENTS_DIR || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

/// State of a job directory after [`ExportRoot::prepare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirState {
    /// The all-documents job already produced files today.
    Skipped { dir: PathBuf },
    /// Previous contents were archived (if any); the directory is ready.
    Archived {
        dir: PathBuf,
        archive: Option<PathBuf>,
    },
}

/// The directory holding one subdirectory per exported tag.
#[derive(Debug, Clone)]
pub struct ExportRoot {
    root: PathBuf,
}

impl ExportRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// `{root}/{tag name}` or `{root}/ALLDocs`.
    #[must_use]
    pub fn job_dir(&self, job: &ExportJob) -> PathBuf {
        self.root.join(job.name())
    }

    /// Matches remote tags to subdirectories by exact name.
    ///
    /// Tags whose name fails [`is_tag_dir_name`] never match.
    ///
    /// # Errors
    ///
    /// Returns [`ExportDirError::Io`] when the root cannot be listed.
    #[instrument(skip(self, tags), fields(component = "export_dir", operation = "reconcile"))]
    pub fn reconcile(&self, tags: &[Tag]) -> Result<Reconciliation, ExportDirError> {
        let mut directories = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| ExportDirError::io(&self.root, e))? {
            let entry = entry.map_err(|e| ExportDirError::io(&self.root, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| ExportDirError::io(&entry.path(), e))?
                .is_dir();
            if is_dir {
                directories.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        directories.sort();

        let (matched, missing): (Vec<Tag>, Vec<Tag>) = tags
            .iter()
            .cloned()
            .partition(|tag| is_tag_dir_name(&tag.name) && directories.contains(&tag.name));
        let orphaned = directories
            .into_iter()
            .filter(|name| name != ALL_DOCUMENTS_DIR && !tags.iter().any(|tag| &tag.name == name))
            .collect::<Vec<_>>();

        debug!(
            matched = matched.len(),
            missing = missing.len(),
            orphaned = orphaned.len(),
            "tags reconciled with directories"
        );
        Ok(Reconciliation {
            matched,
            missing,
            orphaned,
        })
    }

    /// Appends `<timestamp> - Tag '<name>' not found on <host> by <user>` to
    /// `{root}/{name}/tag_not_found.log`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportDirError::Io`] when the log cannot be written.
    pub fn record_orphaned_directory(
        &self,
        name: &str,
        host: &HostInfo,
        now: NaiveDateTime,
    ) -> Result<PathBuf, ExportDirError> {
        let path = self.root.join(name).join(TAG_NOT_FOUND_LOG);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ExportDirError::io(&path, e))?;
        writeln!(
            file,
            "{} - Tag '{name}' not found on {} by {}",
            now.format(LOG_TIMESTAMP_FORMAT),
            host.host,
            host.user
        )
        .map_err(|e| ExportDirError::io(&path, e))?;
        warn!(directory = name, "directory has no matching remote tag");
        Ok(path)
    }

    /// Moves a job's directory to a clean state.
    ///
    /// The all-documents job is skipped when its directory already holds a
    /// file modified today; otherwise its directory is created on demand. A
    /// tag job requires its directory to exist. The previous contents are
    /// then archived and cleared.
    ///
    /// # Errors
    ///
    /// [`ExportDirError::Missing`] for a tag job without directory or with a
    /// name that fails [`is_tag_dir_name`]; I/O and zip failures otherwise.
    #[instrument(skip(self), fields(component = "export_dir", operation = "prepare", tag = %job))]
    pub fn prepare(&self, job: &ExportJob, now: NaiveDateTime) -> Result<DirState, ExportDirError> {
        let dir = self.job_dir(job);

        if job.is_all_documents() {
            if has_file_from_date(&dir, now.date()).map_err(|e| ExportDirError::io(&dir, e))? {
                info!(dir = %dir.display(), "already exported today, skipping");
                return Ok(DirState::Skipped { dir });
            }
            fs::create_dir_all(&dir).map_err(|e| ExportDirError::io(&dir, e))?;
        } else if !is_tag_dir_name(job.name()) || !dir.is_dir() {
            return Err(ExportDirError::Missing { path: dir });
        }

        let archive = archive_and_clear(&dir, job.name(), now)?;
        Ok(DirState::Archived { dir, archive })
    }
}

/// Whether `dir` directly contains a regular file modified on `date`
/// (local time). A missing directory yields `false`.
///
/// # Errors
///
/// Returns the I/O error when the directory exists but cannot be read.
pub fn has_file_from_date(dir: &Path, date: NaiveDate) -> std::io::Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    for entry in fs::read_dir(dir)? {
        let metadata = entry?.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let modified: DateTime<Local> = metadata.modified()?.into();
        if modified.date_naive() == date {
            return Ok(true);
        }
    }
    Ok(false)
}

/// [`has_file_from_date`] for the current local date.
///
/// # Errors
///
/// See [`has_file_from_date`].
pub fn has_file_from_today(dir: &Path) -> std::io::Result<bool> {
    has_file_from_date(dir, Local::now().date_naive())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::{Duration, SystemTime};

    use filetime::{FileTime, set_file_mtime};
    use tempfile::TempDir;

    use super::*;

    fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
        }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    #[test]
    fn test_reconcile_partitions_tags_and_directories() {
        let temp = TempDir::new().unwrap();
        for dir in ["Invoices", "Old", ALL_DOCUMENTS_DIR] {
            fs::create_dir(temp.path().join(dir)).unwrap();
        }
        fs::write(temp.path().join("Tax"), b"a file, not a directory").unwrap();

        let root = ExportRoot::new(temp.path());
        let result = root
            .reconcile(&[tag(1, "Tax"), tag(2, "Invoices"), tag(3, "invoices")])
            .unwrap();

        assert_eq!(result.matched, vec![tag(2, "Invoices")]);
        assert_eq!(result.missing, vec![tag(1, "Tax"), tag(3, "invoices")]);
        assert_eq!(result.orphaned, vec!["Old".to_string()]);
        assert!(result.is_matched(2));
        assert!(!result.is_matched(1));
    }

    #[test]
    fn test_orphaned_directory_log_is_appended() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("Old")).unwrap();
        let root = ExportRoot::new(temp.path());
        let host = HostInfo::new("srv01", "alice");

        root.record_orphaned_directory("Old", &host, now()).unwrap();
        let path = root.record_orphaned_directory("Old", &host, now()).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - Tag 'Old' not found on srv01 by alice"));
    }

    #[test]
    fn test_has_file_from_date() {
        let temp = TempDir::new().unwrap();
        let today = Local::now().date_naive();
        assert!(!has_file_from_date(&temp.path().join("absent"), today).unwrap());
        assert!(!has_file_from_date(temp.path(), today).unwrap());

        let file = temp.path().join("old.pdf");
        fs::write(&file, b"x").unwrap();
        let three_days_ago = SystemTime::now() - Duration::from_secs(3 * 24 * 3600);
        set_file_mtime(&file, FileTime::from_system_time(three_days_ago)).unwrap();
        assert!(!has_file_from_today(temp.path()).unwrap());

        fs::write(temp.path().join("new.pdf"), b"x").unwrap();
        assert!(has_file_from_today(temp.path()).unwrap());
    }

    #[test]
    fn test_has_file_from_date_ignores_subdirectories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/new.pdf"), b"x").unwrap();
        assert!(!has_file_from_today(temp.path()).unwrap());
    }

    #[test]
    fn test_prepare_all_documents_creates_then_skips() {
        let temp = TempDir::new().unwrap();
        let root = ExportRoot::new(temp.path());

        let state = root.prepare(&ExportJob::AllDocuments, now()).unwrap();
        let dir = temp.path().join(ALL_DOCUMENTS_DIR);
        assert_eq!(
            state,
            DirState::Archived {
                dir: dir.clone(),
                archive: None
            }
        );
        assert!(dir.is_dir());

        fs::write(dir.join("##ALLDocs-20240517.xlsx"), b"report").unwrap();
        let state = root.prepare(&ExportJob::AllDocuments, now()).unwrap();
        assert_eq!(state, DirState::Skipped { dir });
    }

    #[test]
    fn test_prepare_tag_requires_directory() {
        let temp = TempDir::new().unwrap();
        let root = ExportRoot::new(temp.path());
        let job = ExportJob::from(&tag(1, "Tax"));
        let err = root.prepare(&job, now()).unwrap_err();
        assert!(err.is_missing());
        assert!(!temp.path().join("Tax").exists());
    }

    #[test]
    fn test_prepare_tag_archives_previous_export() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Tax");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("bill.pdf"), b"pdf").unwrap();

        let root = ExportRoot::new(temp.path());
        let state = root.prepare(&ExportJob::from(&tag(1, "Tax")), now()).unwrap();
        let DirState::Archived { archive, .. } = state else {
            panic!("expected archived state");
        };
        assert!(archive.unwrap().exists());
        assert!(!dir.join("bill.pdf").exists());
    }

    #[test]
    fn test_tag_dir_name_accepts_single_plain_component() {
        assert!(is_tag_dir_name("Tax"));
        assert!(is_tag_dir_name("Rechnungen 2024"));
        assert!(is_tag_dir_name(".hidden"));
        for name in ["", ".", "..", "a/b", "a\\b", "/abs", "Tax/", ALL_DOCUMENTS_DIR] {
            assert!(!is_tag_dir_name(name), "{name:?} must be rejected");
        }
    }

    #[test]
    fn test_reconcile_never_matches_unsafe_names() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::create_dir(temp.path().join(ALL_DOCUMENTS_DIR)).unwrap();

        let tags = [
            tag(1, "."),
            tag(2, ".."),
            tag(3, ""),
            tag(4, "a/b"),
            tag(5, ALL_DOCUMENTS_DIR),
        ];
        let result = ExportRoot::new(temp.path()).reconcile(&tags).unwrap();

        assert!(result.matched.is_empty());
        assert_eq!(result.missing, tags.to_vec());
        assert_eq!(result.orphaned, vec!["a".to_string()]);
    }

    #[test]
    fn test_prepare_rejects_names_leaving_the_tag_directory() {
        let temp = TempDir::new().unwrap();
        let root_dir = temp.path().join("export");
        fs::create_dir_all(root_dir.join("a/b")).unwrap();
        fs::write(root_dir.join("keep.txt"), b"keep").unwrap();
        fs::write(temp.path().join("outside.txt"), b"keep").unwrap();
        let root = ExportRoot::new(&root_dir);

        for name in [".", "..", "", "a/b"] {
            let err = root.prepare(&ExportJob::from(&tag(9, name)), now()).unwrap_err();
            assert!(err.is_missing(), "{name:?} should be treated as missing");
        }
        assert!(root_dir.join("keep.txt").exists());
        assert!(root_dir.join("a/b").is_dir());
        assert!(temp.path().join("outside.txt").exists());
    }
}
