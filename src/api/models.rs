//! Wire types for the document-management REST API.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

/// One page of a paginated collection endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Whether the server advertised a following page.
    pub(crate) fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|next| !next.is_empty())
    }
}

/// A single-record lookup answer (`correspondents`, `document_types`, ...).
#[derive(Debug, Deserialize)]
pub(crate) struct NamedRecord {
    #[serde(default)]
    pub name: String,
}

/// A remote tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Tag id → display name, built once per run.
#[derive(Debug, Clone, Default)]
pub struct TagMap {
    names: HashMap<i64, String>,
}

impl TagMap {
    /// Builds the lookup table from the fetched tags.
    #[must_use]
    pub fn from_tags(tags: &[Tag]) -> Self {
        Self {
            names: tags.iter().map(|tag| (tag.id, tag.name.clone())).collect(),
        }
    }

    /// Display name for `id`, or `Tag <id>` when the tag is unknown.
    #[must_use]
    pub fn name_of(&self, id: i64) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Tag {id}"))
    }

    /// Comma-separated display names for a document's tag list.
    #[must_use]
    pub fn join_names(&self, ids: &[i64]) -> String {
        ids.iter()
            .map(|id| self.name_of(*id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The subset of a document used to decide tag membership.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSummary {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub added: Option<String>,
}

/// A custom-field value as stored on a document.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldValue {
    #[serde(default)]
    pub field: Option<i64>,
    #[serde(default)]
    pub value: Value,
}

/// The full detail record of a document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentDetail {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub correspondent: Option<i64>,
    #[serde(default)]
    pub document_type: Option<i64>,
    #[serde(default)]
    pub storage_path: Option<i64>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub added: Option<String>,
    #[serde(default)]
    pub page_count: Option<i64>,
    #[serde(default)]
    pub original_file_name: Option<String>,
    #[serde(default)]
    pub archived_file_name: Option<String>,
    #[serde(default)]
    pub owner: Value,
    #[serde(default)]
    pub notes: Value,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
}

impl DocumentDetail {
    /// Decodes a detail record from the raw JSON returned by the API.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the record does not have the detail shape.
    pub fn from_json(raw: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(raw)
    }
}

/// Storage type of a custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDataType {
    String,
    Monetary,
    Select,
    Other(String),
}

impl From<&str> for FieldDataType {
    fn from(value: &str) -> Self {
        match value {
            "string" => Self::String,
            "monetary" => Self::Monetary,
            "select" => Self::Select,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A custom-field definition with its select choices resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomFieldDefinition {
    pub id: i64,
    pub name: String,
    pub data_type: FieldDataType,
    /// Option key → label. Empty unless `data_type` is [`FieldDataType::Select`].
    pub choices: BTreeMap<String, String>,
}

impl CustomFieldDefinition {
    /// Looks up the label stored under a document's raw select value.
    #[must_use]
    pub fn choice_label(&self, raw: &Value) -> Option<&str> {
        let key = match raw {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        self.choices.get(&key).map(String::as_str)
    }
}

/// All custom-field definitions of the remote instance, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CustomFieldDefinitions {
    by_id: HashMap<i64, CustomFieldDefinition>,
}

impl CustomFieldDefinitions {
    /// Builds the lookup table from resolved definitions.
    pub fn new(definitions: impl IntoIterator<Item = CustomFieldDefinition>) -> Self {
        Self {
            by_id: definitions.into_iter().map(|def| (def.id, def)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&CustomFieldDefinition> {
        self.by_id.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// A custom-field definition as served by `custom_fields/`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawCustomField {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub extra_data: Option<ExtraData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExtraData {
    #[serde(default)]
    pub select_options: Option<Vec<SelectOption>>,
}

/// Select options come either as plain labels (keyed by position) or as
/// `{id, label}` objects (keyed by id), depending on the server version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SelectOption {
    Label(String),
    Keyed { id: Value, label: String },
}

impl RawCustomField {
    /// Resolves the wire form into a definition with an option key → label map.
    pub(crate) fn into_definition(self) -> CustomFieldDefinition {
        let data_type = FieldDataType::from(self.data_type.as_str());
        let choices = if data_type == FieldDataType::Select {
            self.extra_data
                .and_then(|extra| extra.select_options)
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(index, option)| match option {
                    SelectOption::Label(label) => (index.to_string(), label),
                    SelectOption::Keyed { id, label } => {
                        let key = match id {
                            Value::String(s) => s,
                            other => other.to_string(),
                        };
                        (key, label)
                    }
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        CustomFieldDefinition {
            id: self.id,
            name: self.name,
            data_type,
            choices,
        }
    }
}
