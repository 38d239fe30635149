//! Field normalizer: raw document records to flat, typed report rows.
//!
//! Everything here is pure. Parse failures degrade to empty cells or `0.0`
//! instead of errors.

mod currency;
mod date;
mod error;
mod fields;
mod row;

pub use currency::{CurrencyLocale, format_amount, format_currency, parse_currency};
pub use date::{CanonicalDate, YEAR_MONTH, YEAR_MONTH_DAY, format_date, normalize_date};
pub use error::NormalizeError;
pub use fields::{FORMATTED_SUFFIX, ResolvedFields, json_cell, resolve_custom_fields};
pub use row::{
    Cell, ExportRow, LEADING_COLUMNS, ResolvedNames, TRAILING_COLUMNS, build_export_row,
    custom_column_name, report_columns,
};
