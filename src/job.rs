//! Export jobs: one per remote tag plus the all-documents job.

use std::fmt;

use crate::api::{DocumentSummary, Tag};

/// Directory and display name of the all-documents job.
pub const ALL_DOCUMENTS_DIR: &str = "ALLDocs";

/// A unit of export work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportJob {
    /// Every document of the instance, exported at most once per day.
    AllDocuments,
    /// The documents carrying one tag.
    Tag { id: i64, name: String },
}

impl ExportJob {
    /// Directory and display name of the job.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::AllDocuments => ALL_DOCUMENTS_DIR,
            Self::Tag { name, .. } => name,
        }
    }

    /// Whether `document` belongs to this job.
    #[must_use]
    pub fn includes(&self, document: &DocumentSummary) -> bool {
        match self {
            Self::AllDocuments => true,
            Self::Tag { id, .. } => document.tags.contains(id),
        }
    }

    #[must_use]
    pub fn is_all_documents(&self) -> bool {
        matches!(self, Self::AllDocuments)
    }
}

impl From<&Tag> for ExportJob {
    fn from(tag: &Tag) -> Self {
        Self::Tag {
            id: tag.id,
            name: tag.name.clone(),
        }
    }
}

impl fmt::Display for ExportJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
