//! SQLite repositories behind the document store.
//!
//! # Responsibility
//! - `directory_repo`: users, organizations and membership roles.
//! - `index_repo`: the persistent ownership index.
//! - `document_repo`: store namespaces and raw document rows.
//!
//! # Invariants
//! - Repositories only accept connections opened through `db::open_*`;
//!   `try_new` refuses a connection missing their tables.

pub mod directory_repo;
pub mod document_repo;
pub mod index_repo;

use crate::db::DbResult;
use rusqlite::Connection;

/// Returns the first table in `tables` that does not exist.
pub(crate) fn first_missing_table(
    conn: &Connection,
    tables: &[&'static str],
) -> DbResult<Option<&'static str>> {
    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Ok(Some(table));
        }
    }
    Ok(None)
}
