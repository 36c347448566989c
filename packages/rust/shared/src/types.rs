//! Core domain types: normalized documents, extracted tables, search results,
//! and the error-as-value [`Outcome`] returned by every tool.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::error::BridgeError;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A table extracted from storage-format markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Column labels, absent when the source had no header cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    /// Data rows in source order.
    pub rows: Vec<Row>,
}

/// One data row of a [`Table`].
///
/// Serializes as a JSON object (`Labeled`) or a JSON array (`Plain`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// Header label → cell text, in header order.
    Labeled(Vec<(String, String)>),
    /// Cell texts in column order.
    Plain(Vec<String>),
}

impl Row {
    /// Zip header labels with cells positionally.
    ///
    /// Cells past the last header are dropped and missing cells become `""`.
    /// A repeated label keeps its first position and takes the later value.
    pub fn labeled(headers: &[String], cells: Vec<String>) -> Self {
        let mut cells = cells.into_iter();
        let mut pairs: Vec<(String, String)> = Vec::with_capacity(headers.len());

        for header in headers {
            let value = cells.next().unwrap_or_default();
            match pairs.iter_mut().find(|(label, _)| label == header) {
                Some(existing) => existing.1 = value,
                None => pairs.push((header.clone(), value)),
            }
        }

        Self::Labeled(pairs)
    }

    /// Look up a cell by header label (labeled rows only).
    pub fn get(&self, label: &str) -> Option<&str> {
        match self {
            Self::Labeled(pairs) => pairs
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| v.as_str()),
            Self::Plain(_) => None,
        }
    }

    /// Number of cells in the row.
    pub fn len(&self) -> usize {
        match self {
            Self::Labeled(pairs) => pairs.len(),
            Self::Plain(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Labeled(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (label, value) in pairs {
                    map.serialize_entry(label, value)?;
                }
                map.end()
            }
            Self::Plain(cells) => cells.serialize(serializer),
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Space (collection) a document belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpaceRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Revision information of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    /// Monotonically increasing revision number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    /// Opaque last-change timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Editor display name (or username).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
}

/// Body of a normalized document: extracted tables, or the raw markup when
/// no table was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentBody {
    Tables(Vec<Table>),
    Content(String),
}

/// A single document, normalized for compact consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub space: SpaceRef,
    pub version: VersionInfo,
    /// View URL built from the site root and the requested page id.
    pub url: String,
    #[serde(flatten)]
    pub body: DocumentBody,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Lightweight document entry in a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Space key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    /// Revision number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Simplified search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    pub results: Vec<DocumentSummary>,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Error body handed back to the caller in place of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub error: Value,
}

/// Result of a tool operation with backend faults captured as values.
///
/// Serialized untagged: a success is the entity itself, a failure is
/// `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Success(T),
    Failure(ErrorPayload),
}

impl<T> Outcome<T> {
    /// Build a failure carrying `detail`.
    pub fn failure(detail: impl Into<Value>) -> Self {
        Self::Failure(ErrorPayload {
            error: detail.into(),
        })
    }

    /// Capture a backend error as a failure value.
    pub fn from_error(err: &BridgeError) -> Self {
        Self::failure(err.detail())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The success value, if any.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Transform the success value, passing failures through.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(payload) => Outcome::Failure(payload),
        }
    }
}

/// Render an error detail for embedding in a message: strings as-is,
/// anything else as compact JSON.
pub fn detail_text(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
