//! Organization directory backed by SQLite.
//!
//! # Responsibility
//! - Create users and organizations.
//! - Grant membership roles that the ownership index later reads.
//!
//! # Invariants
//! - Organization names are trimmed, non-empty and unique.
//! - A user holds at most one role per organization; granting replaces it.

use crate::db::DbError;
use crate::model::principal::{OrgRole, Organization};
use crate::model::{parse_id, Id};
use crate::repo::first_missing_table;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug)]
pub enum DirectoryError {
    /// Organization name is blank after trim.
    InvalidOrgName,
    OrgNameTaken(String),
    UserNotFound(Id),
    OrgNotFound(Id),
    MissingRequiredTable(&'static str),
    Db(DbError),
    InvalidData(String),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOrgName => write!(f, "organization name must not be blank"),
            Self::OrgNameTaken(name) => write!(f, "organization name already taken: `{name}`"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::OrgNotFound(id) => write!(f, "organization not found: {id}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted directory data: {message}"),
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DirectoryError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DirectoryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQLite-backed users/orgs/memberships directory.
pub struct SqliteDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectory<'conn> {
    pub fn try_new(conn: &'conn Connection) -> DirectoryResult<Self> {
        if let Some(table) = first_missing_table(conn, &["users", "orgs", "org_memberships"])? {
            return Err(DirectoryError::MissingRequiredTable(table));
        }
        Ok(Self { conn })
    }

    /// Registers a new user with a generated id.
    pub fn create_user(&self) -> DirectoryResult<Id> {
        let id = Uuid::new_v4();
        self.conn
            .execute("INSERT INTO users (id) VALUES (?1);", [id.to_string()])?;
        info!("event=user_create module=directory status=ok user_id={id}");
        Ok(id)
    }

    pub fn create_org(&self, name: &str) -> DirectoryResult<Organization> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DirectoryError::InvalidOrgName);
        }
        if self.find_org_by_name(name)?.is_some() {
            return Err(DirectoryError::OrgNameTaken(name.to_string()));
        }

        let org = Organization {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.conn.execute(
            "INSERT INTO orgs (id, name) VALUES (?1, ?2);",
            params![org.id.to_string(), org.name.as_str()],
        )?;
        info!("event=org_create module=directory status=ok org_id={}", org.id);
        Ok(org)
    }

    pub fn find_org_by_name(&self, name: &str) -> DirectoryResult<Option<Organization>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM orgs WHERE name = ?1;",
                [name],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, name)| {
            let id = parse_id(&id, "orgs.id").map_err(DirectoryError::InvalidData)?;
            Ok(Organization { id, name })
        })
        .transpose()
    }

    /// Grants `role` in `org_id` to `user_id`, replacing any existing role.
    pub fn grant_org_role(&self, user_id: Id, org_id: Id, role: OrgRole) -> DirectoryResult<()> {
        if !self.exists("users", user_id)? {
            return Err(DirectoryError::UserNotFound(user_id));
        }
        if !self.exists("orgs", org_id)? {
            return Err(DirectoryError::OrgNotFound(org_id));
        }

        self.conn.execute(
            "INSERT INTO org_memberships (user_id, org_id, role) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, org_id) DO UPDATE SET role = excluded.role;",
            params![user_id.to_string(), org_id.to_string(), role.as_str()],
        )?;
        info!(
            "event=org_grant module=directory status=ok user_id={user_id} org_id={org_id} role={}",
            role.as_str()
        );
        Ok(())
    }

    /// Returns the user's role in the organization, if any.
    pub fn org_role(&self, user_id: Id, org_id: Id) -> DirectoryResult<Option<OrgRole>> {
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
                DirectoryError::InvalidData(format!(
                    "invalid role `{value}` in org_memberships.role"
                ))
            })
        })
        .transpose()
    }

    fn exists(&self, table: &'static str, id: Id) -> DirectoryResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}
