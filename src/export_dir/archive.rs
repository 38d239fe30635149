//! Archive-then-clear of a previous export.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::error::ExportDirError;
use crate::artifact::sanitize_title;

const ARCHIVE_EXTENSION: &str = "zip";

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

/// Path of the archive for `label` at `now`: `##{label}_{yyyyMMdd_HHmmss}.zip`,
/// with `-1`, `-2`, ... appended when that name is taken. The label is passed
/// through [`sanitize_title`].
#[must_use]
pub fn archive_path(dir: &Path, label: &str, now: NaiveDateTime) -> PathBuf {
    let stem = format!("##{}_{}", sanitize_title(label), now.format("%Y%m%d_%H%M%S"));
    let mut candidate = dir.join(format!("{stem}.{ARCHIVE_EXTENSION}"));
    let mut counter = 1_u32;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}-{counter}.{ARCHIVE_EXTENSION}"));
        counter += 1;
    }
    candidate
}

/// Moves every non-archive file below `dir` into a new zip inside `dir`.
///
/// Files are stored deflated under their path relative to `dir`. Afterwards
/// the archived files are deleted along with every subdirectory left empty.
/// Existing `.zip` files stay where they are and are not re-archived.
///
/// Returns `None` without creating anything when there is nothing to archive.
///
/// # Errors
///
/// Returns [`ExportDirError`] when walking, zipping or deleting fails. The
/// operation is not transactional: a failure while deleting leaves a
/// partially cleared directory next to a complete archive.
#[instrument(skip(dir), fields(component = "export_dir", operation = "archive_and_clear", dir = %dir.display()))]
pub fn archive_and_clear(
    dir: &Path,
    label: &str,
    now: NaiveDateTime,
) -> Result<Option<PathBuf>, ExportDirError> {
    let files = collect_archivable(dir)?;
    if files.is_empty() {
        debug!("nothing to archive");
        return Ok(None);
    }

    let archive = archive_path(dir, label, now);
    write_archive(dir, &archive, &files)?;

    for file in &files {
        fs::remove_file(file).map_err(|e| ExportDirError::io(file, e))?;
    }
    remove_empty_subdirs(dir)?;

    info!(archive = %archive.display(), files = files.len(), "previous export archived");
    Ok(Some(archive))
}

fn collect_archivable(dir: &Path) -> Result<Vec<PathBuf>, ExportDirError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ExportDirError::io(&path, io::Error::other(e))
        })?;
        if entry.file_type().is_file() && !is_archive(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn entry_name(dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(dir).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_archive(dir: &Path, archive: &Path, files: &[PathBuf]) -> Result<(), ExportDirError> {
    let out = File::create(archive).map_err(|e| ExportDirError::io(archive, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        zip.start_file(entry_name(dir, file), options)
            .map_err(|e| ExportDirError::zip(archive, e))?;
        let mut input = File::open(file).map_err(|e| ExportDirError::io(file, e))?;
        io::copy(&mut input, &mut zip).map_err(|e| ExportDirError::io(file, e))?;
    }

    zip.finish().map_err(|e| ExportDirError::zip(archive, e))?;
    Ok(())
}

fn remove_empty_subdirs(dir: &Path) -> Result<(), ExportDirError> {
    for entry in WalkDir::new(dir).min_depth(1).contents_first(true) {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let is_empty = fs::read_dir(path)
            .map_err(|e| ExportDirError::io(path, e))?
            .next()
            .is_none();
        if is_empty {
            fs::remove_dir(path).map_err(|e| ExportDirError::io(path, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Read;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(9, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_nothing_to_archive() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("old.zip"), b"zip").unwrap();
        let result = archive_and_clear(temp.path(), "Tax", now()).unwrap();
        assert!(result.is_none());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_archives_and_clears_recursively() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::write(dir.join("a.pdf"), b"pdf").unwrap();
        fs::write(dir.join("a.json"), b"{}").unwrap();
        fs::create_dir_all(dir.join("nested/deeper")).unwrap();
        fs::write(dir.join("nested/deeper/b.txt"), b"text").unwrap();
        fs::write(dir.join("##Tax_20240101_000000.zip"), b"older").unwrap();

        let archive = archive_and_clear(dir, "Tax", now()).unwrap().unwrap();
        assert_eq!(
            archive.file_name().unwrap().to_str().unwrap(),
            "##Tax_20240517_093005.zip"
        );

        let mut remaining: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec!["##Tax_20240101_000000.zip", "##Tax_20240517_093005.zip"]
        );

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["a.json", "a.pdf", "nested/deeper/b.txt"]);
        let mut content = String::new();
        zip.by_name("nested/deeper/b.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "text");
    }

    #[test]
    fn test_archive_name_collision_gets_suffix() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("##Tax_20240517_093005.zip"), b"x").unwrap();
        fs::write(temp.path().join("a.pdf"), b"pdf").unwrap();
        let archive = archive_and_clear(temp.path(), "Tax", now()).unwrap().unwrap();
        assert_eq!(
            archive.file_name().unwrap().to_str().unwrap(),
            "##Tax_20240517_093005-1.zip"
        );
    }

    #[test]
    fn test_empty_subdirectories_only() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("empty/child")).unwrap();
        assert!(archive_and_clear(temp.path(), "X", now()).unwrap().is_none());
        // nothing archived, so nothing cleared either
        assert!(temp.path().join("empty/child").exists());
    }

    #[test]
    fn test_archive_path_sanitizes_label() {
        let temp = TempDir::new().unwrap();
        let path = archive_path(temp.path(), "a/b", now());
        assert_eq!(path, temp.path().join("##a-b_20240517_093005.zip"));
    }
}
