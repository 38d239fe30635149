//! The export run: the all-documents job, then one job per remote tag.
//!
//! Everything is sequential. Fetch failures and directory I/O failures abort
//! the run; a failed download, a malformed detail record or a file that cannot
//! be written only affects the document concerned.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{
    ApiClient, CustomFieldDefinitions, DocumentDetail, DocumentSummary, FetchError, Tag, TagMap,
};
use crate::artifact::{
    ArtifactError, ReportContext, SpreadsheetReport, artifact_base_name, write_document_json,
    write_document_pdf,
};
use crate::export_dir::{DirState, ExportDirError, ExportRoot};
use crate::host::HostInfo;
use crate::job::ExportJob;
use crate::normalize::{
    CurrencyLocale, ExportRow, ResolvedNames, build_export_row, custom_column_name,
    resolve_custom_fields,
};
use crate::progress::ProgressReporter;
use crate::run_log::RunLog;

/// Errors that abort an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Directory(#[from] ExportDirError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Settings of an export run besides the API client and the export root.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Name shown in report banners and run log file names.
    pub program: String,
    pub currency_locale: CurrencyLocale,
    pub host: HostInfo,
}

/// Result of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Exported {
        tag: String,
        /// Rows written to the report.
        documents: usize,
        download_failures: usize,
        /// Documents left out of the report.
        skipped_documents: usize,
        report: PathBuf,
        archive: Option<PathBuf>,
    },
    /// The all-documents job already ran today.
    SkippedToday { tag: String },
    /// No local directory for the tag.
    DirectoryMissing { tag: String },
}

impl JobOutcome {
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Exported { tag, .. }
            | Self::SkippedToday { tag }
            | Self::DirectoryMissing { tag } => tag,
        }
    }
}

/// Outcomes of all jobs of a run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub jobs: Vec<JobOutcome>,
    /// Local directories without a remote tag.
    pub orphaned_directories: Vec<String>,
}

impl RunSummary {
    #[must_use]
    pub fn exported_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|job| matches!(job, JobOutcome::Exported { .. }))
            .count()
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|job| matches!(job, JobOutcome::SkippedToday { .. }))
            .count()
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|job| matches!(job, JobOutcome::DirectoryMissing { .. }))
            .count()
    }

    /// Report rows written across all jobs.
    #[must_use]
    pub fn documents_exported(&self) -> usize {
        self.jobs
            .iter()
            .map(|job| match job {
                JobOutcome::Exported { documents, .. } => *documents,
                _ => 0,
            })
            .sum()
    }

    #[must_use]
    pub fn download_failures(&self) -> usize {
        self.jobs
            .iter()
            .map(|job| match job {
                JobOutcome::Exported {
                    download_failures, ..
                } => *download_failures,
                _ => 0,
            })
            .sum()
    }

    /// Outcome of the job named `tag`.
    #[must_use]
    pub fn job(&self, tag: &str) -> Option<&JobOutcome> {
        self.jobs.iter().find(|job| job.tag() == tag)
    }
}

/// Data fetched once per run and shared by every job.
struct Catalog {
    tags: Vec<Tag>,
    tag_map: TagMap,
    documents: Vec<DocumentSummary>,
    definitions: CustomFieldDefinitions,
}

/// A document that made it into the report.
struct ExportedDocument {
    row: ExportRow,
    monetary: Vec<String>,
    download_failed: bool,
}

/// Drives a complete export run.
#[derive(Debug, Clone)]
pub struct Exporter {
    client: ApiClient,
    root: ExportRoot,
    options: ExportOptions,
}

impl Exporter {
    #[must_use]
    pub fn new(client: ApiClient, root: ExportRoot, options: ExportOptions) -> Self {
        Self {
            client,
            root,
            options,
        }
    }

    /// Runs every job and returns their outcomes.
    ///
    /// The failure that aborts a run is recorded in `log` before it is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] on fetch failures, directory I/O failures and
    /// report write failures.
    #[instrument(skip_all, fields(component = "orchestrator", operation = "run", root = %self.root.path().display()))]
    pub async fn run(
        &self,
        log: &mut RunLog,
        progress: &ProgressReporter,
    ) -> Result<RunSummary, ExportError> {
        log.record("Starting export...");
        let result = self.run_jobs(log, progress).await;
        match &result {
            Ok(summary) => {
                log.record(format!(
                    "Export finished: {} jobs exported, {} documents",
                    summary.exported_count(),
                    summary.documents_exported()
                ));
            }
            Err(error) => log.record(format!("Export aborted: {error}")),
        }
        progress.finish();
        result
    }

    async fn run_jobs(
        &self,
        log: &mut RunLog,
        progress: &ProgressReporter,
    ) -> Result<RunSummary, ExportError> {
        let catalog = self.fetch_catalog(progress).await?;
        let mut summary = RunSummary::default();

        let outcome = self
            .run_job(&ExportJob::AllDocuments, &catalog, log, progress)
            .await?;
        summary.jobs.push(outcome);

        let reconciliation = self.root.reconcile(&catalog.tags)?;
        for name in &reconciliation.orphaned {
            let now = Local::now().naive_local();
            if let Err(error) = self
                .root
                .record_orphaned_directory(name, &self.options.host, now)
            {
                warn!(%error, directory = %name, "could not write tag-not-found log");
            }
            log.record(format!("Tag '{name}' not found, directory left untouched"));
        }

        for tag in &catalog.tags {
            let outcome = if reconciliation.is_matched(tag.id) {
                let job = ExportJob::from(tag);
                self.run_job(&job, &catalog, log, progress).await?
            } else {
                log.record(format!(
                    "Directory for tag {} does not exist. Export skipped.",
                    tag.name
                ));
                JobOutcome::DirectoryMissing {
                    tag: tag.name.clone(),
                }
            };
            summary.jobs.push(outcome);
        }
        debug!(missing = reconciliation.missing.len(), "tags without directory skipped");
        summary.orphaned_directories = reconciliation.orphaned;

        info!(
            exported = summary.exported_count(),
            skipped = summary.skipped_count(),
            missing = summary.missing_count(),
            documents = summary.documents_exported(),
            "export run complete"
        );
        Ok(summary)
    }

    async fn fetch_catalog(&self, progress: &ProgressReporter) -> Result<Catalog, FetchError> {
        progress.report("fetching tags");
        let tags = self.client.fetch_tags().await?;
        progress.report("fetching documents");
        let documents = self.client.fetch_documents().await?;
        progress.report("fetching custom fields");
        let definitions = self.client.fetch_custom_field_definitions().await?;

        info!(
            tags = tags.len(),
            documents = documents.len(),
            custom_fields = definitions.len(),
            "catalog fetched"
        );
        Ok(Catalog {
            tag_map: TagMap::from_tags(&tags),
            tags,
            documents,
            definitions,
        })
    }

    #[instrument(skip(self, catalog, log, progress), fields(tag = %job))]
    async fn run_job(
        &self,
        job: &ExportJob,
        catalog: &Catalog,
        log: &mut RunLog,
        progress: &ProgressReporter,
    ) -> Result<JobOutcome, ExportError> {
        let tag = job.name().to_string();
        let (dir, archive) = match self.root.prepare(job, Local::now().naive_local()) {
            Ok(DirState::Archived { dir, archive }) => (dir, archive),
            Ok(DirState::Skipped { .. }) => {
                log.record("Export for all documents skipped since files already exported today");
                return Ok(JobOutcome::SkippedToday { tag });
            }
            Err(error) if error.is_missing() => {
                log.record(format!(
                    "Directory for tag {tag} does not exist. Export skipped."
                ));
                return Ok(JobOutcome::DirectoryMissing { tag });
            }
            Err(error) => return Err(error.into()),
        };

        match job {
            ExportJob::AllDocuments => log.record(format!("Exporting all documents to '{tag}'")),
            ExportJob::Tag { id, name } => {
                log.record(format!("Exporting documents for tag: {name} (ID: {id})"));
            }
        }

        let members: Vec<&DocumentSummary> = catalog
            .documents
            .iter()
            .filter(|document| job.includes(document))
            .collect();
        progress.begin_job(&tag, members.len());

        let mut rows = Vec::with_capacity(members.len());
        let mut monetary: Vec<String> = Vec::new();
        let mut download_failures = 0;
        let mut skipped_documents = 0;

        for document in members {
            match self.export_document(document, &dir, catalog, log).await? {
                Some(exported) => {
                    if exported.download_failed {
                        download_failures += 1;
                    }
                    for name in exported.monetary {
                        if !monetary.contains(&name) {
                            monetary.push(name);
                        }
                    }
                    rows.push(exported.row);
                }
                None => skipped_documents += 1,
            }
            progress.advance();
        }

        let report = SpreadsheetReport::new(ReportContext {
            program: self.options.program.clone(),
            tag_name: tag.clone(),
            generated_at: Local::now().naive_local(),
            user: self.options.host.user.clone(),
            host: self.options.host.host.clone(),
            details_base: self.client.web_base_url().to_string(),
        })
        .write(&rows, &monetary, &dir)?;

        log.record(format!("Tag: {tag}, Documents exported: {}", rows.len()));
        progress.finish_job();
        info!(documents = rows.len(), download_failures, skipped_documents, "job exported");

        Ok(JobOutcome::Exported {
            tag,
            documents: rows.len(),
            download_failures,
            skipped_documents,
            report,
            archive,
        })
    }

    /// Writes one document's files and builds its row.
    ///
    /// `Ok(None)` means the document was left out of the report.
    #[instrument(skip(self, summary, dir, catalog, log), fields(document_id = summary.id))]
    async fn export_document(
        &self,
        summary: &DocumentSummary,
        dir: &Path,
        catalog: &Catalog,
        log: &mut RunLog,
    ) -> Result<Option<ExportedDocument>, FetchError> {
        let raw = self.client.fetch_document_detail(summary.id).await?;
        let detail = match DocumentDetail::from_json(&raw) {
            Ok(detail) => detail,
            Err(error) => {
                warn!(%error, "malformed detail record");
                log.record(format!(
                    "Document {}: malformed detail record skipped ({error})",
                    summary.id
                ));
                return Ok(None);
            }
        };

        let names = ResolvedNames {
            correspondent: self
                .client
                .resolve_name_by_id("correspondents", detail.correspondent)
                .await,
            document_type: self
                .client
                .resolve_name_by_id("document_types", detail.document_type)
                .await,
            storage_path: self
                .client
                .resolve_name_by_id("storage_paths", detail.storage_path)
                .await,
        };
        let fields = resolve_custom_fields(
            &catalog.definitions,
            &detail.custom_fields,
            self.options.currency_locale,
        );
        let base = artifact_base_name(detail.id, &detail.title);

        let mut download_failed = false;
        match self.client.download_document(detail.id).await {
            Ok(bytes) => {
                if let Err(error) = write_document_pdf(dir, &base, &bytes) {
                    warn!(%error, "could not write document PDF");
                    log.record(format!("Document {}: {error}; document skipped", detail.id));
                    return Ok(None);
                }
            }
            Err(failure) => {
                warn!(error = %failure, "download failed");
                log.record(failure.to_string());
                download_failed = true;
            }
        }

        if let Err(error) = write_document_json(dir, &base, &raw) {
            warn!(%error, "could not write document JSON");
            log.record(format!("Document {}: {error}; document skipped", detail.id));
            return Ok(None);
        }

        let row = build_export_row(&detail, &names, &catalog.tag_map, &fields);
        let monetary = fields
            .monetary
            .iter()
            .map(|name| custom_column_name(name))
            .collect();
        Ok(Some(ExportedDocument {
            row,
            monetary,
            download_failed,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn exported(tag: &str, documents: usize, failures: usize) -> JobOutcome {
        JobOutcome::Exported {
            tag: tag.to_string(),
            documents,
            download_failures: failures,
            skipped_documents: 0,
            report: PathBuf::from(format!("##{tag}-20240517.xlsx")),
            archive: None,
        }
    }

    #[test]
    fn test_summary_counters() {
        let summary = RunSummary {
            jobs: vec![
                JobOutcome::SkippedToday {
                    tag: "ALLDocs".to_string(),
                },
                exported("Tax", 2, 1),
                exported("Invoices", 3, 0),
                JobOutcome::DirectoryMissing {
                    tag: "Misc".to_string(),
                },
            ],
            orphaned_directories: vec!["Old".to_string()],
        };
        assert_eq!(summary.exported_count(), 2);
        assert_eq!(summary.skipped_count(), 1);
        assert_eq!(summary.missing_count(), 1);
        assert_eq!(summary.documents_exported(), 5);
        assert_eq!(summary.download_failures(), 1);
        assert_eq!(summary.job("Misc").unwrap().tag(), "Misc");
        assert!(summary.job("Nope").is_none());
    }
}
