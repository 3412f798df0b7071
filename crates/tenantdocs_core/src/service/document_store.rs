//! Document store contract and its SQLite implementation.

use crate::db::DbError;
use crate::index::{ErrorKind, IndexError};
use crate::model::document::Document;
use crate::model::Id;
use crate::predicate::{
    apply_create_predicates, resolve_find_predicates, CreatePredicate, FindPredicate,
};
use crate::repo::document_repo::{RepoError, SqliteDocumentRepository, StoreRecord};
use crate::repo::index_repo::SqliteDocumentIndex;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from document store and service operations.
#[derive(Debug)]
pub enum StoreError {
    /// Predicate or index failure, including authorization denials.
    Index(IndexError),
    /// Persistence failure.
    Repo(RepoError),
    StoreNotFound(String),
    DocumentNotFound(Id),
    /// Find or delete was called without any find predicate.
    MissingFindPredicate,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Index(err) => err.kind(),
            Self::Repo(RepoError::InvalidStoreName) | Self::MissingFindPredicate => {
                ErrorKind::Invalid
            }
            Self::Repo(RepoError::StoreNameTaken(_) | RepoError::DocumentExists(_)) => {
                ErrorKind::Conflict
            }
            Self::Repo(_) => ErrorKind::Index,
            Self::StoreNotFound(_) | Self::DocumentNotFound(_) => ErrorKind::NotFound,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::StoreNotFound(name) => write!(f, "document store not found: `{name}`"),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::MissingFindPredicate => write!(f, "at least one find predicate is required"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Index(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IndexError> for StoreError {
    fn from(value: IndexError) -> Self {
        Self::Index(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

/// Create/find/delete over one named store.
pub trait DocumentStore {
    /// Persists `document` after every creation predicate succeeded.
    fn create_document(
        &self,
        document: &Document,
        predicates: &[&dyn CreatePredicate],
    ) -> StoreResult<()>;

    /// Loads documents by id in request order, without authorization.
    ///
    /// Fails with `DocumentNotFound` if any id is not in this store.
    fn find_documents_by_id(&self, ids: &[Id]) -> StoreResult<Vec<Document>>;

    /// Loads the documents of this store selected by all predicates.
    fn find_documents(&self, predicates: &[&dyn FindPredicate]) -> StoreResult<Vec<Document>>;

    /// Deletes the documents of this store selected by all predicates and
    /// returns how many were removed.
    fn delete_documents(&self, predicates: &[&dyn FindPredicate]) -> StoreResult<usize>;
}

/// SQLite-backed store namespace.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    store: StoreRecord,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub(crate) fn new(conn: &'conn Connection, store: StoreRecord) -> Self {
        Self { conn, store }
    }

    pub fn id(&self) -> Id {
        self.store.id
    }

    pub fn name(&self) -> &str {
        &self.store.name
    }

    fn create_in_tx(
        &self,
        document: &Document,
        predicates: &[&dyn CreatePredicate],
    ) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteDocumentRepository::try_new(&tx)?;
        if repo.document_exists(document.id)? {
            return Err(RepoError::DocumentExists(document.id).into());
        }

        let mut index = SqliteDocumentIndex::for_document(&tx, document.id)?;
        apply_create_predicates(&mut index, predicates)?;
        repo.insert_document(self.store.id, document)?;
        tx.commit()?;
        Ok(())
    }

    fn select(
        &self,
        conn: &Connection,
        predicates: &[&dyn FindPredicate],
    ) -> StoreResult<BTreeSet<Id>> {
        let index = SqliteDocumentIndex::try_new(conn)?;
        resolve_find_predicates(&index, predicates)?.ok_or(StoreError::MissingFindPredicate)
    }

    fn find_in_tx(&self, predicates: &[&dyn FindPredicate]) -> StoreResult<Vec<Document>> {
        // One read transaction keeps every index lookup on the same snapshot.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let selection = self.select(&tx, predicates)?;
        let documents =
            SqliteDocumentRepository::try_new(&tx)?.get_documents(self.store.id, &selection)?;
        tx.commit()?;
        Ok(documents)
    }

    fn delete_in_tx(&self, predicates: &[&dyn FindPredicate]) -> StoreResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let selection = self.select(&tx, predicates)?;
        let removed =
            SqliteDocumentRepository::try_new(&tx)?.delete_documents(self.store.id, &selection)?;
        tx.commit()?;
        Ok(removed)
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn create_document(
        &self,
        document: &Document,
        predicates: &[&dyn CreatePredicate],
    ) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self.create_in_tx(document, predicates);
        match &result {
            Ok(()) => info!(
                "event=document_create module=store status=ok store_id={} doc_id={} predicates={} duration_ms={}",
                self.store.id,
                document.id,
                predicates.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=document_create module=store status=error store_id={} doc_id={} error_kind={:?} error={err}",
                self.store.id,
                document.id,
                err.kind()
            ),
        }
        result
    }

    fn find_documents_by_id(&self, ids: &[Id]) -> StoreResult<Vec<Document>> {
        let wanted: BTreeSet<Id> = ids.iter().copied().collect();
        let found: HashMap<Id, Document> = SqliteDocumentRepository::try_new(self.conn)?
            .get_documents(self.store.id, &wanted)?
            .into_iter()
            .map(|document| (document.id, document))
            .collect();

        ids.iter()
            .map(|id| {
                found
                    .get(id)
                    .cloned()
                    .ok_or(StoreError::DocumentNotFound(*id))
            })
            .collect()
    }

    fn find_documents(&self, predicates: &[&dyn FindPredicate]) -> StoreResult<Vec<Document>> {
        let started_at = Instant::now();
        let result = self.find_in_tx(predicates);
        match &result {
            Ok(documents) => info!(
                "event=document_find module=store status=ok store_id={} predicates={} results={} duration_ms={}",
                self.store.id,
                predicates.len(),
                documents.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=document_find module=store status=error store_id={} error_kind={:?} error={err}",
                self.store.id,
                err.kind()
            ),
        }
        result
    }

    fn delete_documents(&self, predicates: &[&dyn FindPredicate]) -> StoreResult<usize> {
        let started_at = Instant::now();
        let result = self.delete_in_tx(predicates);
        match &result {
            Ok(removed) => info!(
                "event=document_delete module=store status=ok store_id={} removed={removed} duration_ms={}",
                self.store.id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=document_delete module=store status=error store_id={} error_kind={:?} error={err}",
                self.store.id,
                err.kind()
            ),
        }
        result
    }
}
