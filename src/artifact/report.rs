//! The per-tag spreadsheet report.
//!
//! Layout of the single sheet `Documents`:
//!
//! | row | content                                                     |
//! |-----|-------------------------------------------------------------|
//! | 1   | banner: program, tag, timestamp, user, host (merged)        |
//! | 2   | `=SUM(...)` under each monetary column                      |
//! | 3   | column headers with auto-filter                             |
//! | 4.. | one row per document, banded by conditional formats         |

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rust_xlsxwriter::{
    Color, ConditionalFormatFormula, Format, FormatUnderline, Formula, Workbook, Worksheet,
    XlsxError,
};
use tracing::{info, instrument};

use super::error::ArtifactError;
use super::filename::report_path;
use crate::normalize::{Cell, ExportRow, report_columns};

/// Name of the report's only worksheet.
pub const SHEET_NAME: &str = "Documents";

const FONT: &str = "Arial";
const BANNER_BACKGROUND: u32 = 0x0000_2060;
const HEADER_BACKGROUND: u32 = 0x004F_81BD;
const BAND_BACKGROUND: u32 = 0x00DC_E6F1;

const BANNER_ROW: u32 = 0;
const SUM_ROW: u32 = 1;
const HEADER_ROW: u32 = 2;
const FIRST_DATA_ROW: u32 = 3;

const MIN_COLUMN_WIDTH: usize = 8;
const MAX_COLUMN_WIDTH: usize = 60;

/// Banner and link information of one report.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub program: String,
    pub tag_name: String,
    pub generated_at: NaiveDateTime,
    pub user: String,
    pub host: String,
    /// Web UI root; document links are `{details_base}/documents/{id}/details`.
    pub details_base: String,
}

impl ReportContext {
    fn banner(&self) -> String {
        format!(
            "{} -- {} -- {} -- {} -- {}",
            self.program,
            self.tag_name,
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.user,
            self.host
        )
    }

    fn details_url(&self, document_id: i64) -> String {
        format!("{}/documents/{document_id}/details", self.details_base)
    }
}

struct Formats {
    banner: Format,
    sum: Format,
    header: Format,
    data: Format,
    link: Format,
    band_even: Format,
    band_odd: Format,
}

impl Formats {
    fn new() -> Self {
        let base = Format::new().set_font_name(FONT);
        Self {
            banner: base
                .clone()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(BANNER_BACKGROUND)),
            sum: base.clone().set_bold(),
            header: base
                .clone()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_BACKGROUND)),
            link: base
                .clone()
                .set_font_color(Color::Blue)
                .set_underline(FormatUnderline::Single),
            data: base,
            band_even: Format::new().set_background_color(Color::RGB(BAND_BACKGROUND)),
            band_odd: Format::new().set_background_color(Color::White),
        }
    }
}

/// Writes the spreadsheet report of one job.
#[derive(Debug, Clone)]
pub struct SpreadsheetReport {
    context: ReportContext,
}

impl SpreadsheetReport {
    #[must_use]
    pub fn new(context: ReportContext) -> Self {
        Self { context }
    }

    /// Writes `rows` to a new `##{tag}-{yyyyMMdd}[-k].xlsx` in `dir`.
    ///
    /// `monetary` names the numeric columns that get a sum in row 2.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Spreadsheet`] when the workbook cannot be
    /// built or saved.
    #[instrument(skip(self, rows, monetary, dir), fields(component = "artifact", operation = "write_report", tag = %self.context.tag_name, rows = rows.len()))]
    pub fn write(
        &self,
        rows: &[ExportRow],
        monetary: &[String],
        dir: &Path,
    ) -> Result<PathBuf, ArtifactError> {
        let path = report_path(dir, &self.context.tag_name, self.context.generated_at.date());
        let columns = report_columns(rows);

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        self.fill(worksheet, &columns, rows, monetary)
            .map_err(|e| ArtifactError::spreadsheet(&path, e))?;
        workbook
            .save(&path)
            .map_err(|e| ArtifactError::spreadsheet(&path, e))?;

        info!(path = %path.display(), "report written");
        Ok(path)
    }

    #[allow(clippy::cast_precision_loss)]
    fn fill(
        &self,
        worksheet: &mut Worksheet,
        columns: &[String],
        rows: &[ExportRow],
        monetary: &[String],
    ) -> Result<(), XlsxError> {
        let formats = Formats::new();
        worksheet.set_name(SHEET_NAME)?;

        let last_col = to_col(columns.len().saturating_sub(1))?;
        let last_row = FIRST_DATA_ROW + to_row(rows.len())?.saturating_sub(1);

        worksheet.merge_range(
            BANNER_ROW,
            0,
            BANNER_ROW,
            last_col,
            &self.context.banner(),
            &formats.banner,
        )?;

        for (index, name) in columns.iter().enumerate() {
            worksheet.write_string_with_format(HEADER_ROW, to_col(index)?, name, &formats.header)?;
        }
        worksheet.autofilter(HEADER_ROW, 0, HEADER_ROW.max(last_row), last_col)?;
        worksheet.set_freeze_panes(FIRST_DATA_ROW, 0)?;

        for (offset, row) in rows.iter().enumerate() {
            let excel_row = FIRST_DATA_ROW + to_row(offset)?;
            for (index, name) in columns.iter().enumerate() {
                let col = to_col(index)?;
                let cell = row.get(name).unwrap_or(&Cell::Empty);
                if name == "ID" {
                    self.write_link(worksheet, excel_row, col, row.document_id, &formats.link)?;
                } else {
                    write_cell(worksheet, excel_row, col, cell, &formats.data)?;
                }
            }
        }

        if !rows.is_empty() {
            for (index, name) in columns.iter().enumerate() {
                if !monetary.contains(name) {
                    continue;
                }
                let col = to_col(index)?;
                let letter = column_letter(col);
                let total: f64 = rows
                    .iter()
                    .filter_map(|row| match row.get(name) {
                        Some(Cell::Number(value)) => Some(*value),
                        _ => None,
                    })
                    .sum();
                let formula = Formula::new(format!(
                    "=SUM({letter}{}:{letter}{})",
                    FIRST_DATA_ROW + 1,
                    last_row + 1
                ))
                .set_result(total.to_string());
                worksheet.write_formula_with_format(SUM_ROW, col, formula, &formats.sum)?;
            }

            let even = ConditionalFormatFormula::new()
                .set_rule("=MOD(ROW(),2)=0")
                .set_format(&formats.band_even);
            let odd = ConditionalFormatFormula::new()
                .set_rule("=MOD(ROW(),2)<>0")
                .set_format(&formats.band_odd);
            worksheet.add_conditional_format(FIRST_DATA_ROW, 0, last_row, last_col, &even)?;
            worksheet.add_conditional_format(FIRST_DATA_ROW, 0, last_row, last_col, &odd)?;
        }

        for (index, name) in columns.iter().enumerate() {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(name))
                .map(|cell| cell.to_string().chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(MIN_COLUMN_WIDTH);
            let width = (widest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
            worksheet.set_column_width(to_col(index)?, width as f64)?;
        }

        Ok(())
    }

    fn write_link(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        document_id: i64,
        format: &Format,
    ) -> Result<(), XlsxError> {
        let url = self.context.details_url(document_id);
        let formula = Formula::new(format!("=HYPERLINK(\"{url}\",\"{document_id}\")"))
            .set_result(document_id.to_string());
        worksheet.write_formula_with_format(row, col, formula, format)?;
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => worksheet.write_blank(row, col, format)?,
        Cell::Text(text) => worksheet.write_string_with_format(row, col, text, format)?,
        Cell::Integer(value) => worksheet.write_number_with_format(row, col, *value as f64, format)?,
        Cell::Number(value) => worksheet.write_number_with_format(row, col, *value, format)?,
    };
    Ok(())
}

fn to_row(value: usize) -> Result<u32, XlsxError> {
    u32::try_from(value).map_err(|_| XlsxError::RowColumnLimitError)
}

fn to_col(value: usize) -> Result<u16, XlsxError> {
    u16::try_from(value).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Zero-based column index to its letter name: 0 → `A`, 27 → `AB`.
fn column_letter(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}
