//! Document model and its wire shape.
//!
//! Serializes as `{"id", "meta": {"name"}, "data"}` with `data` omitted when
//! absent. Core never inspects `data`.

use super::Id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Human-facing metadata stored next to the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub name: String,
}

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Id,
    pub meta: DocumentMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Document {
    /// Creates a document with a freshly generated id.
    pub fn new(name: impl Into<String>, data: Option<Value>) -> Self {
        Self::with_id(Uuid::new_v4(), name, data)
    }

    /// Creates a document with a caller-provided id (import paths).
    pub fn with_id(id: Id, name: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            id,
            meta: DocumentMeta { name: name.into() },
            data,
        }
    }
}
