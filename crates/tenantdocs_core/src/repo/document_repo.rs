//! Raw document persistence.
//!
//! # Responsibility
//! - Manage named store namespaces.
//! - Insert, load and delete document rows scoped to one store.
//!
//! # Invariants
//! - Store names are trimmed, non-empty and unique.
//! - `data` is stored as JSON text; `NULL` means absent.
//! - Reads reject rows whose id or payload cannot be parsed.

use crate::db::DbError;
use crate::model::document::{Document, DocumentMeta};
use crate::model::{parse_id, Id};
use crate::repo::first_missing_table;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    InvalidStoreName,
    StoreNameTaken(String),
    DocumentExists(Id),
    MissingRequiredTable(&'static str),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStoreName => write!(f, "document store name must not be blank"),
            Self::StoreNameTaken(name) => write!(f, "document store already exists: `{name}`"),
            Self::DocumentExists(id) => write!(f, "document already exists: {id}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// A named store namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    pub id: Id,
    pub name: String,
}

pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if let Some(table) = first_missing_table(conn, &["document_stores", "documents"])? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        Ok(Self { conn })
    }

    pub fn create_store(&self, name: &str) -> RepoResult<StoreRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidStoreName);
        }
        if self.find_store(name)?.is_some() {
            return Err(RepoError::StoreNameTaken(name.to_string()));
        }

        let store = StoreRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.conn.execute(
            "INSERT INTO document_stores (id, name) VALUES (?1, ?2);",
            params![store.id.to_string(), store.name.as_str()],
        )?;
        Ok(store)
    }

    pub fn find_store(&self, name: &str) -> RepoResult<Option<StoreRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM document_stores WHERE name = ?1;",
                [name.trim()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, name)| {
            let id = parse_id(&id, "document_stores.id").map_err(RepoError::InvalidData)?;
            Ok(StoreRecord { id, name })
        })
        .transpose()
    }

    /// Returns whether a document with this id exists in any store.
    pub fn document_exists(&self, doc_id: Id) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE id = ?1);",
            [doc_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    pub fn insert_document(&self, store_id: Id, document: &Document) -> RepoResult<()> {
        if self.document_exists(document.id)? {
            return Err(RepoError::DocumentExists(document.id));
        }

        let data = document
            .data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| RepoError::InvalidData(format!("unserializable data: {err}")))?;

        self.conn.execute(
            "INSERT INTO documents (id, store_id, name, data) VALUES (?1, ?2, ?3, ?4);",
            params![
                document.id.to_string(),
                store_id.to_string(),
                document.meta.name.as_str(),
                data,
            ],
        )?;
        Ok(())
    }

    /// Loads the documents of `store_id` whose ids are in `ids`.
    ///
    /// Ids that do not belong to the store are skipped. Output is ordered by
    /// creation time, then id.
    pub fn get_documents(&self, store_id: Id, ids: &BTreeSet<Id>) -> RepoResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, name, data FROM documents
             WHERE store_id = ? AND id IN ({})
             ORDER BY created_at ASC, id ASC;",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values(store_id, ids)))?;
        let mut documents = Vec::with_capacity(ids.len());
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    /// Deletes the documents of `store_id` whose ids are in `ids`.
    ///
    /// Returns the number of removed rows. Ownership edges cascade.
    pub fn delete_documents(&self, store_id: Id, ids: &BTreeSet<Id>) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM documents WHERE store_id = ? AND id IN ({});",
            placeholders(ids.len())
        );
        let removed = self
            .conn
            .execute(&sql, params_from_iter(bind_values(store_id, ids)))?;
        Ok(removed)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn bind_values(store_id: Id, ids: &BTreeSet<Id>) -> Vec<Value> {
    std::iter::once(store_id)
        .chain(ids.iter().copied())
        .map(|id| Value::Text(id.to_string()))
        .collect()
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let id_text: String = row.get("id")?;
    let id = parse_id(&id_text, "documents.id").map_err(RepoError::InvalidData)?;

    let data = match row.get::<_, Option<String>>("data")? {
        Some(text) => Some(serde_json::from_str(&text).map_err(|err| {
            RepoError::InvalidData(format!("invalid json in documents.data for {id}: {err}"))
        })?),
        None => None,
    };

    Ok(Document {
        id,
        meta: DocumentMeta {
            name: row.get("name")?,
        },
        data,
    })
}
