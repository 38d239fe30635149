//! Error types for field normalization.

use thiserror::Error;

/// Errors raised by the normalizer.
///
/// Parse failures of dates and amounts are not errors: they fall back to an
/// empty cell or `0.0`. Only caller mistakes surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// `format_date` was asked for a pattern other than `yyyy-mm` / `yyyy-mm-dd`.
    #[error("unsupported date format '{pattern}' (expected 'yyyy-mm' or 'yyyy-mm-dd')")]
    UnsupportedFormat {
        /// The rejected pattern.
        pattern: String,
    },

    /// A currency locale tag that has no known conventions.
    #[error("unknown currency locale '{tag}' (supported: de_DE, de_AT, de_CH, en_US, en_GB, fr_FR)")]
    UnknownLocale {
        /// The rejected locale tag.
        tag: String,
    },
}
