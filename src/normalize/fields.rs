//! Custom-field resolution against the instance's field definitions.

use serde_json::Value;
use tracing::warn;

use super::currency::{CurrencyLocale, format_amount, format_currency, parse_currency};
use super::row::Cell;
use crate::api::{CustomFieldDefinitions, CustomFieldValue, FieldDataType};

/// Suffix of the second column emitted for monetary fields.
pub const FORMATTED_SUFFIX: &str = "_formatted";

/// The flattened custom-field columns of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFields {
    /// Column name → cell, in the order the document lists its fields.
    pub columns: Vec<(String, Cell)>,
    /// Names of the numeric monetary columns (the ones that get a sum).
    pub monetary: Vec<String>,
}

impl ResolvedFields {
    fn set(&mut self, name: String, cell: Cell) {
        if let Some(slot) = self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = cell;
        } else {
            self.columns.push((name, cell));
        }
    }
}

/// Resolves a document's custom-field values into report columns.
///
/// - monetary: `<name>` (parsed amount) and `<name>_formatted`
/// - select: the choice label, or `value <raw>` when the key is unknown
/// - anything else: the raw value
///
/// Values whose definition is missing are labelled `Field <id>` and passed
/// through. Values without a field id are ignored.
#[must_use]
pub fn resolve_custom_fields(
    definitions: &CustomFieldDefinitions,
    values: &[CustomFieldValue],
    locale: CurrencyLocale,
) -> ResolvedFields {
    let mut resolved = ResolvedFields::default();

    for value in values {
        let Some(field_id) = value.field.filter(|id| *id != 0) else {
            continue;
        };
        let Some(definition) = definitions.get(field_id) else {
            resolved.set(format!("Field {field_id}"), json_cell(&value.value));
            continue;
        };
        let name = definition.name.clone();

        match definition.data_type {
            FieldDataType::Monetary => {
                let raw = monetary_text(&value.value);
                let amount = raw.as_deref().map_or(0.0, parse_currency);
                let formatted = match raw.as_deref() {
                    Some(text) => {
                        let scaled = format_amount(amount, locale);
                        let minor_units = format_currency(Some(text), locale);
                        if scaled != minor_units {
                            warn!(
                                field = %name,
                                raw = text,
                                scaled = %scaled,
                                minor_units = %minor_units,
                                "monetary value reads differently as scaled amount and as minor units"
                            );
                        }
                        scaled
                    }
                    None => String::new(),
                };
                resolved.set(name.clone(), Cell::Number(amount));
                resolved.set(format!("{name}{FORMATTED_SUFFIX}"), Cell::Text(formatted));
                if !resolved.monetary.contains(&name) {
                    resolved.monetary.push(name);
                }
            }
            FieldDataType::Select => {
                let label = match definition.choice_label(&value.value) {
                    Some(label) => label.to_string(),
                    None => format!("value {}", display_raw(&value.value)),
                };
                resolved.set(name, Cell::Text(label));
            }
            FieldDataType::String | FieldDataType::Other(_) => {
                resolved.set(name, json_cell(&value.value));
            }
        }
    }

    resolved
}

/// Maps an arbitrary JSON value to a report cell.
#[must_use]
pub fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::Bool(b) => Cell::Text(b.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Integer(i),
            None => n.as_f64().map_or(Cell::Empty, Cell::Number),
        },
        Value::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

fn monetary_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
