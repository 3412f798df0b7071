//! Ownership-aware document storage core.
//!
//! Documents are stored per named store; who may create and see them is
//! decided by predicates evaluated against an ownership index.

pub mod auth;
pub mod config;
pub mod db;
pub mod index;
pub mod logging;
pub mod model;
pub mod predicate;
pub mod repo;
pub mod service;

pub use auth::{Authorizer, UserSession};
pub use config::CoreConfig;
pub use index::{DocumentIndex, ErrorKind, IndexError, IndexResult, MemoryDocumentIndex};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::document::{Document, DocumentMeta};
pub use model::principal::{OrgRole, Organization, OwnerType};
pub use model::Id;
pub use predicate::{
    AuthorizedWhere, AuthorizedWhereId, AuthorizedWhereOrg, AuthorizedWithOrg, AuthorizedWithUser,
    CreatePredicate, FindPredicate, WhereId, WhereOrg, WithOrg, WithUser,
};
pub use repo::directory_repo::{DirectoryError, SqliteDirectory};
pub use repo::document_repo::RepoError;
pub use repo::index_repo::SqliteDocumentIndex;
pub use service::document_service::{DocumentService, SqliteDocumentService};
pub use service::document_store::{DocumentStore, SqliteDocumentStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
