// SQLite-backed persistence gateway for reconciled entries

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use clubfund_recon::model::{EntryStatus, ReconciledEntry};
use clubfund_recon::store::{EntryStore, StoreError, StoredEntry};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    journal_ref TEXT NOT NULL,
    normalized_ref TEXT NOT NULL UNIQUE,
    date TEXT NOT NULL,               -- ISO yyyy-mm-dd
    description TEXT NOT NULL,
    designation TEXT,
    gross_cents INTEGER NOT NULL,
    fees_cents INTEGER NOT NULL,      -- net is derived, never stored
    assigned_club TEXT,
    status TEXT NOT NULL              -- needs_review | reconciled | ignored
);
"#;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self { conn })
    }
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn row_to_stored(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, ReconciledEntry)> {
    let id: i64 = row.get(0)?;
    let date_s: String = row.get(3)?;
    let status_s: String = row.get(9)?;
    let gross_cents: i64 = row.get(6)?;
    let fees_cents: i64 = row.get(7)?;
    Ok((
        id,
        ReconciledEntry {
            journal_ref: row.get(1)?,
            normalized_ref: row.get(2)?,
            date: NaiveDate::parse_from_str(&date_s, "%Y-%m-%d").unwrap_or_default(),
            description: row.get(4)?,
            designation: row.get(5)?,
            gross_cents,
            fees_cents,
            net_cents: gross_cents - fees_cents,
            assigned_club: row.get(8)?,
            status: EntryStatus::parse(&status_s).unwrap_or(EntryStatus::NeedsReview),
        },
    ))
}

const SELECT_COLUMNS: &str = "id, journal_ref, normalized_ref, date, description, designation, \
     gross_cents, fees_cents, assigned_club, status";

impl EntryStore for SqliteStore {
    fn known_refs(&self) -> Result<HashSet<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT normalized_ref FROM entries")
            .map_err(backend)?;
        let refs = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(backend)?
            .collect::<Result<HashSet<_>, _>>()
            .map_err(backend)?;
        Ok(refs)
    }

    fn contains_ref(&self, normalized_ref: &str) -> Result<bool, StoreError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM entries WHERE normalized_ref = ?1",
                params![normalized_ref],
                |row| row.get(0),
            )
            .map_err(backend)?;
        Ok(count > 0)
    }

    fn commit(&mut self, entries: &[ReconciledEntry]) -> Result<(), StoreError> {
        let tx = self.conn.transaction().map_err(backend)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO entries (journal_ref, normalized_ref, date, description, \
                     designation, gross_cents, fees_cents, assigned_club, status) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(backend)?;
            for entry in entries {
                stmt.execute(params![
                    entry.journal_ref,
                    entry.normalized_ref,
                    entry.date.format("%Y-%m-%d").to_string(),
                    entry.description,
                    entry.designation,
                    entry.gross_cents,
                    entry.fees_cents,
                    entry.assigned_club,
                    entry.status.as_str(),
                ])
                .map_err(|e| match e {
                    rusqlite::Error::SqliteFailure(err, _)
                        if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        StoreError::DuplicateRef(entry.normalized_ref.clone())
                    }
                    other => backend(other),
                })?;
            }
        }
        tx.commit().map_err(backend)
    }

    fn needs_review(&self) -> Result<Vec<StoredEntry>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM entries WHERE status = 'needs_review' ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(backend)?;
        let entries = stmt
            .query_map([], |row| {
                let (id, entry) = row_to_stored(row)?;
                Ok(StoredEntry { id, entry })
            })
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(entries)
    }

    fn get(&self, id: i64) -> Result<StoredEntry, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM entries WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], |row| {
                let (id, entry) = row_to_stored(row)?;
                Ok(StoredEntry { id, entry })
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id),
                other => backend(other),
            })
    }

    fn assign_club(&mut self, id: i64, club: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE entries SET assigned_club = ?1, status = 'reconciled' WHERE id = ?2",
                params![club, id],
            )
            .map_err(backend)?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM entries", []).map_err(backend)?;
        Ok(())
    }
}
