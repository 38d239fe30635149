//! The flat report row of one document.

use std::fmt;

use serde_json::Value;

use super::date::{YEAR_MONTH, YEAR_MONTH_DAY, format_date, normalize_date};
use super::fields::{ResolvedFields, json_cell};
use crate::api::{DocumentDetail, TagMap};

/// Core columns placed before the custom-field columns.
pub const LEADING_COLUMNS: &[&str] = &["ID", "Correspondent", "Title", "Tags"];

/// Core columns placed after the custom-field columns.
pub const TRAILING_COLUMNS: &[&str] = &[
    "Created",
    "CreatedMonth",
    "CreatedDate",
    "Modified",
    "ModifiedMonth",
    "ModifiedDate",
    "Added",
    "AddedMonth",
    "AddedDate",
    "Pages",
    "DocumentType",
    "StoragePath",
    "OriginalName",
    "ArchivedName",
    "Owner",
    "Notes",
];

/// A typed report cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

/// Display names looked up for a document's related records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNames {
    pub correspondent: String,
    pub document_type: String,
    pub storage_path: String,
}

/// One report row: ordered `(column, cell)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRow {
    pub document_id: i64,
    cells: Vec<(String, Cell)>,
}

impl ExportRow {
    /// Cell of `column`, if the row has that column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    /// Column names in row order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn cells(&self) -> &[(String, Cell)] {
        &self.cells
    }

    fn push(&mut self, column: impl Into<String>, cell: Cell) {
        self.cells.push((column.into(), cell));
    }
}

fn is_core_column(name: &str) -> bool {
    LEADING_COLUMNS.contains(&name) || TRAILING_COLUMNS.contains(&name)
}

/// Custom-field column name, kept apart from the core column of the same name.
#[must_use]
pub fn custom_column_name(name: &str) -> String {
    if is_core_column(name) {
        format!("{name} (custom)")
    } else {
        name.to_string()
    }
}

/// Assembles a document's row: leading core columns, the resolved custom
/// fields in document order, then the trailing core columns.
#[must_use]
pub fn build_export_row(
    detail: &DocumentDetail,
    names: &ResolvedNames,
    tags: &TagMap,
    fields: &ResolvedFields,
) -> ExportRow {
    let mut row = ExportRow {
        document_id: detail.id,
        cells: Vec::with_capacity(LEADING_COLUMNS.len() + fields.columns.len() + TRAILING_COLUMNS.len()),
    };

    row.push("ID", Cell::Integer(detail.id));
    row.push("Correspondent", Cell::text(names.correspondent.as_str()));
    row.push("Title", Cell::text(detail.title.as_str()));
    row.push("Tags", Cell::text(tags.join_names(&detail.tags)));

    for (name, cell) in &fields.columns {
        row.push(custom_column_name(name), cell.clone());
    }

    for (label, raw) in [
        ("Created", &detail.created),
        ("Modified", &detail.modified),
        ("Added", &detail.added),
    ] {
        let [full, month, day] = date_cells(raw.as_deref());
        row.push(label, full);
        row.push(format!("{label}Month"), month);
        row.push(format!("{label}Date"), day);
    }

    row.push("Pages", detail.page_count.map_or(Cell::Empty, Cell::Integer));
    row.push("DocumentType", Cell::text(names.document_type.as_str()));
    row.push("StoragePath", Cell::text(names.storage_path.as_str()));
    row.push(
        "OriginalName",
        Cell::text(detail.original_file_name.clone().unwrap_or_default()),
    );
    row.push(
        "ArchivedName",
        Cell::text(detail.archived_file_name.clone().unwrap_or_default()),
    );
    row.push("Owner", json_cell(&detail.owner));
    row.push("Notes", notes_cell(&detail.notes));

    row
}

fn date_cells(raw: Option<&str>) -> [Cell; 3] {
    let Some(date) = raw.and_then(normalize_date) else {
        return [Cell::Empty, Cell::Empty, Cell::Empty];
    };
    let render = |pattern| format_date(&date, pattern).map_or(Cell::Empty, Cell::Text);
    [
        Cell::Text(date.to_string()),
        render(YEAR_MONTH),
        render(YEAR_MONTH_DAY),
    ]
}

/// Notes arrive as `[{"note": "..."}, ...]`; their texts are joined with `; `.
fn notes_cell(notes: &Value) -> Cell {
    match notes {
        Value::Array(items) => {
            let texts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => map.get("note").and_then(Value::as_str).map(str::to_string),
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .filter(|text| !text.is_empty())
                .collect();
            Cell::text(texts.join("; "))
        }
        other => json_cell(other),
    }
}

/// Ordered union of the columns of all rows: leading core columns, custom
/// columns in first-seen order, trailing core columns.
#[must_use]
pub fn report_columns(rows: &[ExportRow]) -> Vec<String> {
    let mut columns: Vec<String> = LEADING_COLUMNS.iter().map(ToString::to_string).collect();
    for row in rows {
        for name in row.columns() {
            if !is_core_column(name) && !columns.iter().any(|existing| existing == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns.extend(TRAILING_COLUMNS.iter().map(ToString::to_string));
    columns
}
