//! Persistent ownership index over the directory and `document_owners`.
//!
//! # Invariants
//! - Edges are written with `INSERT OR IGNORE`; repeating one is a no-op.
//! - An edge for a document that is never inserted fails at commit, because
//!   `document_owners.document_id` is a deferred foreign key.

use crate::index::{
    not_org_member, not_org_owner, org_name_not_found, DocumentIndex, IndexError, IndexResult,
};
use crate::model::principal::{OrgRole, OwnerType};
use crate::model::{parse_id, Id};
use crate::repo::first_missing_table;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Params};
use std::collections::BTreeSet;

const REQUIRED_TABLES: &[&str] = &["users", "orgs", "org_memberships", "document_owners"];

/// SQLite-backed [`DocumentIndex`].
///
/// Construct with [`SqliteDocumentIndex::for_document`] inside the creating
/// transaction to allow `add_document_owner`; the plain constructor is
/// read-only with respect to edges.
pub struct SqliteDocumentIndex<'conn> {
    conn: &'conn Connection,
    document: Option<Id>,
}

impl<'conn> SqliteDocumentIndex<'conn> {
    pub fn try_new(conn: &'conn Connection) -> IndexResult<Self> {
        if let Some(table) = first_missing_table(conn, REQUIRED_TABLES)? {
            return Err(IndexError::InvalidData(format!(
                "missing required table `{table}`"
            )));
        }
        Ok(Self {
            conn,
            document: None,
        })
    }

    pub fn for_document(conn: &'conn Connection, doc_id: Id) -> IndexResult<Self> {
        let mut index = Self::try_new(conn)?;
        index.document = Some(doc_id);
        Ok(index)
    }

    fn principal_exists(&self, owner_type: OwnerType, owner_id: Id) -> IndexResult<bool> {
        let table = match owner_type {
            OwnerType::User => "users",
            OwnerType::Org => "orgs",
        };
        let exists: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
            [owner_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn org_role(&self, user_id: Id, org_id: Id) -> IndexResult<Option<OrgRole>> {
        let role = self
            .conn
            .query_row(
                "SELECT role FROM org_memberships WHERE user_id = ?1 AND org_id = ?2;",
                params![user_id.to_string(), org_id.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        role.map(|value| {
            OrgRole::parse(&value).ok_or_else(|| {
                IndexError::InvalidData(format!("invalid role `{value}` in org_memberships.role"))
            })
        })
        .transpose()
    }

    fn query_ids<P: Params>(
        &self,
        sql: &str,
        params: P,
        column: &'static str,
    ) -> IndexResult<BTreeSet<Id>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut ids = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.insert(parse_id(&value, column).map_err(IndexError::InvalidData)?);
        }
        Ok(ids)
    }
}

impl DocumentIndex for SqliteDocumentIndex<'_> {
    fn add_document_owner(&mut self, owner_type: OwnerType, owner_id: Id) -> IndexResult<()> {
        let doc_id = self.document.ok_or(IndexError::NoDocumentInScope)?;
        if !self.principal_exists(owner_type, owner_id)? {
            return Err(IndexError::NotFound(format!("{owner_type} {owner_id}")));
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO document_owners (document_id, owner_type, owner_id)
             VALUES (?1, ?2, ?3);",
            params![
                doc_id.to_string(),
                owner_type.as_str(),
                owner_id.to_string()
            ],
        )?;
        debug!(
            "event=owner_add module=index status=ok doc_id={doc_id} owner_type={owner_type} owner_id={owner_id}"
        );
        Ok(())
    }

    fn get_owners_documents(
        &self,
        owner_type: OwnerType,
        owner_id: Id,
    ) -> IndexResult<BTreeSet<Id>> {
        self.query_ids(
            "SELECT document_id FROM document_owners WHERE owner_type = ?1 AND owner_id = ?2;",
            params![owner_type.as_str(), owner_id.to_string()],
            "document_owners.document_id",
        )
    }

    fn get_documents_owners(&self, doc_id: Id) -> IndexResult<BTreeSet<Id>> {
        self.query_ids(
            "SELECT owner_id FROM document_owners WHERE document_id = ?1;",
            [doc_id.to_string()],
            "document_owners.owner_id",
        )
    }

    fn is_org_owner(&self, user_id: Id, org_id: Id) -> IndexResult<()> {
        match self.org_role(user_id, org_id)? {
            Some(OrgRole::Owner) => Ok(()),
            _ => Err(not_org_owner(user_id, org_id)),
        }
    }

    fn is_org_member(&self, user_id: Id, org_id: Id) -> IndexResult<()> {
        match self.org_role(user_id, org_id)? {
            Some(_) => Ok(()),
            None => Err(not_org_member(user_id, org_id)),
        }
    }

    fn users_orgs(&self, user_id: Id) -> IndexResult<BTreeSet<Id>> {
        self.query_ids(
            "SELECT org_id FROM org_memberships WHERE user_id = ?1;",
            [user_id.to_string()],
            "org_memberships.org_id",
        )
    }

    fn find_organization_by_name(&self, name: &str) -> IndexResult<Id> {
        let id = self
            .conn
            .query_row("SELECT id FROM orgs WHERE name = ?1;", [name], |row| {
                row.get::<_, String>(0)
            })
            .optional()?
            .ok_or_else(|| org_name_not_found(name))?;
        parse_id(&id, "orgs.id").map_err(IndexError::InvalidData)
    }
}
