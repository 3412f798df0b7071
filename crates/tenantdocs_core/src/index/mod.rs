//! Ownership index contract.
//!
//! # Responsibility
//! - Record which principal owns which document.
//! - Answer organization membership and ownership questions.
//!
//! # Invariants
//! - `add_document_owner` only targets the document currently being created;
//!   an index without a document in scope rejects it.
//! - Ownership edges are append-only.
//! - Org owners are also org members.
//!
//! Implementations: [`SqliteDocumentIndex`](crate::repo::index_repo::SqliteDocumentIndex)
//! for persistence, [`MemoryDocumentIndex`] for tests and embedding.

pub mod memory;

use crate::db::DbError;
use crate::model::principal::OwnerType;
use crate::model::Id;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use memory::MemoryDocumentIndex;

pub type IndexResult<T> = Result<T, IndexError>;

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Acting principal lacks the required relationship.
    Unauthorized,
    /// Named org, store or document does not exist.
    NotFound,
    /// Request conflicts with existing state.
    Conflict,
    /// Caller supplied malformed input.
    Invalid,
    /// Backing store failure.
    Index,
}

/// Error returned by ownership index operations.
#[derive(Debug)]
pub enum IndexError {
    Unauthorized(String),
    NotFound(String),
    /// `add_document_owner` was called outside a document creation.
    NoDocumentInScope,
    Db(DbError),
    /// Failure reported by a non-SQLite backend.
    Backend(String),
    InvalidData(String),
}

impl IndexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NoDocumentInScope | Self::Db(_) | Self::Backend(_) | Self::InvalidData(_) => {
                ErrorKind::Index
            }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(message) => write!(f, "unauthorized: {message}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::NoDocumentInScope => write!(f, "no document is being created"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Backend(message) => write!(f, "index backend failure: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted index data: {message}"),
        }
    }
}

impl Error for IndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for IndexError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for IndexError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Source of truth for ownership and membership facts.
pub trait DocumentIndex {
    /// Registers `owner_id` as an owner of the document being created.
    ///
    /// Repeating an existing edge is a no-op. Fails with `NotFound` when the
    /// principal does not exist.
    fn add_document_owner(&mut self, owner_type: OwnerType, owner_id: Id) -> IndexResult<()>;

    /// Documents owned directly by the principal.
    fn get_owners_documents(&self, owner_type: OwnerType, owner_id: Id)
        -> IndexResult<BTreeSet<Id>>;

    /// Direct owners of a document, regardless of owner type.
    fn get_documents_owners(&self, doc_id: Id) -> IndexResult<BTreeSet<Id>>;

    /// Succeeds iff `user_id` administers `org_id`.
    fn is_org_owner(&self, user_id: Id, org_id: Id) -> IndexResult<()>;

    /// Succeeds iff `user_id` belongs to `org_id` as owner or member.
    fn is_org_member(&self, user_id: Id, org_id: Id) -> IndexResult<()>;

    /// Organizations the user belongs to in any role.
    fn users_orgs(&self, user_id: Id) -> IndexResult<BTreeSet<Id>>;

    fn find_organization_by_name(&self, name: &str) -> IndexResult<Id>;
}

pub(crate) fn not_org_owner(user_id: Id, org_id: Id) -> IndexError {
    IndexError::Unauthorized(format!("user {user_id} is not an owner of org {org_id}"))
}

pub(crate) fn not_org_member(user_id: Id, org_id: Id) -> IndexError {
    IndexError::Unauthorized(format!("user {user_id} is not a member of org {org_id}"))
}

pub(crate) fn org_name_not_found(name: &str) -> IndexError {
    IndexError::NotFound(format!("organization named `{name}`"))
}
