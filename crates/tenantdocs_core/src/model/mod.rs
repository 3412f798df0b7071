//! Domain model shared by the index, predicates and document store.
//!
//! # Invariants
//! - Every document, user and organization is identified by a stable `Id`.
//! - Ownership edges are append-only; nothing in core updates them.

pub mod document;
pub mod principal;

use uuid::Uuid;

/// Opaque identifier for documents, users and organizations.
///
/// Kept as an alias so signatures read by role (`doc_id`, `org_id`) while the
/// representation stays a single comparable type.
pub type Id = Uuid;

/// Parses a persisted id column, reporting the column on failure.
pub(crate) fn parse_id(value: &str, column: &'static str) -> Result<Id, String> {
    Uuid::parse_str(value).map_err(|_| format!("invalid id value `{value}` in {column}"))
}
