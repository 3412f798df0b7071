//! Named store namespaces.

use crate::repo::document_repo::SqliteDocumentRepository;
use crate::service::document_store::{
    DocumentStore, SqliteDocumentStore, StoreError, StoreResult,
};
use log::info;
use rusqlite::Connection;

/// Creates and resolves document stores by name.
pub trait DocumentService {
    type Store: DocumentStore;

    /// Fails with a conflict when the name is already in use.
    fn create_document_store(&self, name: &str) -> StoreResult<Self::Store>;

    fn find_document_store(&self, name: &str) -> StoreResult<Self::Store>;
}

pub struct SqliteDocumentService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl<'conn> DocumentService for SqliteDocumentService<'conn> {
    type Store = SqliteDocumentStore<'conn>;

    fn create_document_store(&self, name: &str) -> StoreResult<Self::Store> {
        let store = SqliteDocumentRepository::try_new(self.conn)?.create_store(name)?;
        info!(
            "event=store_create module=service status=ok store_id={}",
            store.id
        );
        Ok(SqliteDocumentStore::new(self.conn, store))
    }

    fn find_document_store(&self, name: &str) -> StoreResult<Self::Store> {
        SqliteDocumentRepository::try_new(self.conn)?
            .find_store(name)?
            .map(|store| SqliteDocumentStore::new(self.conn, store))
            .ok_or_else(|| StoreError::StoreNotFound(name.trim().to_string()))
    }
}
