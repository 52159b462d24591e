//! Persistence gateway for reconciled entries.
//!
//! The engine never owns storage: it asks "is this reference known",
//! hands back newly-discovered entries for the caller to commit, and the
//! review workflow assigns clubs through the same seam. `MemoryStore`
//! backs tests; the CLI provides a SQLite implementation.

use std::collections::HashSet;
use std::fmt;

use crate::model::{EntryStatus, ReconciledEntry};

#[derive(Debug)]
pub enum StoreError {
    /// Entry id not present in the store.
    NotFound(i64),
    /// A commit would duplicate an existing normalized reference.
    DuplicateRef(String),
    /// Backend failure (connection, constraint, serialization).
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "entry {id} not found"),
            Self::DuplicateRef(r) => write!(f, "reference '{r}' already committed"),
            Self::Backend(msg) => write!(f, "store backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// A persisted entry plus its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub id: i64,
    pub entry: ReconciledEntry,
}

/// Injected persistence gateway. Commit must be transactional: on error
/// no entry from the batch may remain behind.
pub trait EntryStore {
    /// Normalized references of every committed entry.
    fn known_refs(&self) -> Result<HashSet<String>, StoreError>;

    fn contains_ref(&self, normalized_ref: &str) -> Result<bool, StoreError>;

    /// Commit a batch of newly-discovered entries.
    fn commit(&mut self, entries: &[ReconciledEntry]) -> Result<(), StoreError>;

    /// Entries awaiting manual review, ordered by id.
    fn needs_review(&self) -> Result<Vec<StoredEntry>, StoreError>;

    fn get(&self, id: i64) -> Result<StoredEntry, StoreError>;

    /// Assign a club and mark the entry reconciled.
    fn assign_club(&mut self, id: i64, club: &str) -> Result<(), StoreError>;

    /// Remove every entry.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<StoredEntry>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_id: 1 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntryStore for MemoryStore {
    fn known_refs(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self
            .entries
            .iter()
            .map(|e| e.entry.normalized_ref.clone())
            .collect())
    }

    fn contains_ref(&self, normalized_ref: &str) -> Result<bool, StoreError> {
        Ok(self
            .entries
            .iter()
            .any(|e| e.entry.normalized_ref == normalized_ref))
    }

    fn commit(&mut self, entries: &[ReconciledEntry]) -> Result<(), StoreError> {
        // Validate the whole batch before touching state, so a failure
        // leaves the store exactly as it was.
        let mut seen: HashSet<&str> = HashSet::new();
        for entry in entries {
            if self.contains_ref(&entry.normalized_ref)?
                || !seen.insert(entry.normalized_ref.as_str())
            {
                return Err(StoreError::DuplicateRef(entry.normalized_ref.clone()));
            }
        }
        for entry in entries {
            let id = self.next_id.max(1);
            self.next_id = id + 1;
            self.entries.push(StoredEntry { id, entry: entry.clone() });
        }
        Ok(())
    }

    fn needs_review(&self) -> Result<Vec<StoredEntry>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.entry.status == EntryStatus::NeedsReview)
            .cloned()
            .collect())
    }

    fn get(&self, id: i64) -> Result<StoredEntry, StoreError> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn assign_club(&mut self, id: i64, club: &str) -> Result<(), StoreError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))?;
        entry.entry.assigned_club = Some(club.to_string());
        entry.entry.status = EntryStatus::Reconciled;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        self.next_id = 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(normalized_ref: &str, club: Option<&str>) -> ReconciledEntry {
        ReconciledEntry {
            journal_ref: normalized_ref.to_string(),
            normalized_ref: normalized_ref.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            description: "Jane Donor".into(),
            designation: Some("Archery Club".into()),
            gross_cents: 10000,
            fees_cents: 500,
            net_cents: 9500,
            assigned_club: club.map(str::to_string),
            status: match club {
                Some(_) => EntryStatus::Reconciled,
                None => EntryStatus::NeedsReview,
            },
        }
    }

    #[test]
    fn commit_and_lookup() {
        let mut store = MemoryStore::new();
        store
            .commit(&[entry("AB1234", Some("Archery Club")), entry("CD5678", None)])
            .unwrap();
        assert!(store.contains_ref("AB1234").unwrap());
        assert!(!store.contains_ref("ZZ0000").unwrap());
        assert_eq!(store.known_refs().unwrap().len(), 2);
        assert_eq!(store.needs_review().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_commit_rejected_atomically() {
        let mut store = MemoryStore::new();
        store.commit(&[entry("AB1234", None)]).unwrap();

        let err = store
            .commit(&[entry("EF9999", None), entry("AB1234", None)])
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRef(_)));
        // Nothing from the failed batch landed.
        assert!(!store.contains_ref("EF9999").unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn assign_club_flips_status() {
        let mut store = MemoryStore::new();
        store.commit(&[entry("AB1234", None)]).unwrap();
        let id = store.needs_review().unwrap()[0].id;

        store.assign_club(id, "Archery Club").unwrap();
        let stored = store.get(id).unwrap();
        assert_eq!(stored.entry.assigned_club.as_deref(), Some("Archery Club"));
        assert_eq!(stored.entry.status, EntryStatus::Reconciled);
        assert!(store.needs_review().unwrap().is_empty());
    }

    #[test]
    fn missing_id_errors() {
        let mut store = MemoryStore::new();
        assert!(matches!(store.get(42), Err(StoreError::NotFound(42))));
        assert!(matches!(store.assign_club(42, "x"), Err(StoreError::NotFound(42))));
    }

    #[test]
    fn clear_empties_store() {
        let mut store = MemoryStore::new();
        store.commit(&[entry("AB1234", None)]).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(store.known_refs().unwrap().is_empty());
    }
}
