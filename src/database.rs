//! Database initialization and the URL store
//!
//! This module handles the setup of the embedded redb database and exposes
//! `UrlStore`, the only component that owns alias -> URL records.
//! redb allows a single write transaction at a time, so the exists-check and
//! insert in `save_url` cannot interleave with another writer.

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::error::StorageError;
use crate::handler::{UrlDeleter, UrlGetter, UrlSaver};
use crate::model::UrlRecord;

/// Main table for storing URL records
///
/// Key: alias as string
/// Value: JSON-serialized UrlRecord as string
///
/// Example:
/// - Key: "abc123"
/// - Value: '{"id":1,"alias":"abc123","url":"https://example.com",...}'
pub const TABLE_URLS: TableDefinition<&str, &str> = TableDefinition::new("urls_v1");

/// Monotonic counters, keyed by sequence name
pub const TABLE_SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences_v1");

const URL_ID_SEQUENCE: &str = "url_id";

/// Initializes the embedded database and creates required tables
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "storage.db")
///
/// # Example
///
/// ```no_run
/// # use url_shortener::database::init_db;
/// let db = init_db("storage.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_URLS)?;
        write_txn.open_table(TABLE_SEQUENCES)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Durable alias -> URL mapping
pub struct UrlStore {
    db: Database,
}

impl UrlStore {
    /// Opens (or creates) the store at `db_path`
    pub fn open(db_path: &str) -> Result<Self, StorageError> {
        Ok(Self {
            db: init_db(db_path)?,
        })
    }

    /// Inserts a new mapping and returns its assigned id
    ///
    /// Fails with `AliasExists` when the alias is taken; the existing record
    /// is left untouched.
    pub fn save_url(&self, url: &str, alias: &str) -> Result<u64, StorageError> {
        if url.is_empty() {
            return Err(StorageError::EmptyField("url"));
        }
        if alias.is_empty() {
            return Err(StorageError::EmptyField("alias"));
        }

        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut urls = write_txn.open_table(TABLE_URLS)?;

            if urls.get(alias)?.is_some() {
                None
            } else {
                let mut sequences = write_txn.open_table(TABLE_SEQUENCES)?;
                let id = sequences
                    .get(URL_ID_SEQUENCE)?
                    .map(|guard| guard.value())
                    .unwrap_or(0)
                    + 1;
                sequences.insert(URL_ID_SEQUENCE, id)?;

                let record = UrlRecord {
                    id,
                    alias: alias.to_string(),
                    url: url.to_string(),
                    created_at: Utc::now(),
                };
                let record_json = serde_json::to_string(&record)?;
                urls.insert(alias, record_json.as_str())?;

                Some(id)
            }
        };

        match inserted {
            Some(id) => {
                write_txn.commit()?;
                Ok(id)
            }
            None => {
                write_txn.abort()?;
                Err(StorageError::AliasExists)
            }
        }
    }

    /// Returns the full record stored under `alias`
    pub fn get_record(&self, alias: &str) -> Result<UrlRecord, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_URLS)?;

        let raw = match table.get(alias)? {
            Some(guard) => guard.value().to_string(),
            None => return Err(StorageError::NotFound),
        };

        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolves `alias` to its target URL
    pub fn get_url(&self, alias: &str) -> Result<String, StorageError> {
        self.get_record(alias).map(|record| record.url)
    }

    /// Removes the mapping for `alias`
    ///
    /// Repeated deletes of the same alias report `NotFound` after the first.
    pub fn delete_url(&self, alias: &str) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut urls = write_txn.open_table(TABLE_URLS)?;
            let removed = urls.remove(alias)?.is_some();
            removed
        };

        if removed {
            write_txn.commit()?;
            Ok(())
        } else {
            write_txn.abort()?;
            Err(StorageError::NotFound)
        }
    }
}

impl UrlSaver for UrlStore {
    fn save_url(&self, url: &str, alias: &str) -> Result<u64, StorageError> {
        UrlStore::save_url(self, url, alias)
    }
}

impl UrlGetter for UrlStore {
    fn get_url(&self, alias: &str) -> Result<String, StorageError> {
        UrlStore::get_url(self, alias)
    }
}

impl UrlDeleter for UrlStore {
    fn delete_url(&self, alias: &str) -> Result<(), StorageError> {
        UrlStore::delete_url(self, alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn temp_store() -> (UrlStore, NamedTempFile) {
        let temp_db = NamedTempFile::new().expect("Failed to create temp file");
        let store = UrlStore::open(temp_db.path().to_str().unwrap())
            .expect("Failed to initialize test database");
        (store, temp_db)
    }

    #[test]
    fn save_then_get_returns_same_url() {
        let (store, _temp_db) = temp_store();

        store.save_url("https://example.com/a", "alias-a").unwrap();

        assert_eq!(store.get_url("alias-a").unwrap(), "https://example.com/a");
    }

    #[test]
    fn ids_are_assigned_in_sequence() {
        let (store, _temp_db) = temp_store();

        let first = store.save_url("https://example.com/1", "one").unwrap();
        let second = store.save_url("https://example.com/2", "two").unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.get_record("two").unwrap().id, 2);
    }

    #[test]
    fn duplicate_alias_is_rejected_and_original_kept() {
        let (store, _temp_db) = temp_store();

        store.save_url("https://example.com/first", "dup").unwrap();
        let err = store
            .save_url("https://example.com/second", "dup")
            .unwrap_err();

        assert!(matches!(err, StorageError::AliasExists));
        assert_eq!(store.get_url("dup").unwrap(), "https://example.com/first");
    }

    #[test]
    fn rejected_save_does_not_consume_an_id() {
        let (store, _temp_db) = temp_store();

        store.save_url("https://example.com/first", "dup").unwrap();
        let _ = store.save_url("https://example.com/second", "dup");
        let next = store.save_url("https://example.com/third", "other").unwrap();

        assert_eq!(next, 2);
    }

    #[test]
    fn get_unknown_alias_is_not_found() {
        let (store, _temp_db) = temp_store();

        assert!(matches!(
            store.get_url("missing"),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn delete_then_get_and_delete_again_are_not_found() {
        let (store, _temp_db) = temp_store();
        store.save_url("https://example.com/gone", "gone").unwrap();

        store.delete_url("gone").unwrap();

        assert!(matches!(store.get_url("gone"), Err(StorageError::NotFound)));
        assert!(matches!(
            store.delete_url("gone"),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn deleted_alias_can_be_saved_again() {
        let (store, _temp_db) = temp_store();
        store.save_url("https://example.com/old", "reuse").unwrap();
        store.delete_url("reuse").unwrap();

        store.save_url("https://example.com/new", "reuse").unwrap();

        assert_eq!(store.get_url("reuse").unwrap(), "https://example.com/new");
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let (store, _temp_db) = temp_store();

        assert!(matches!(
            store.save_url("", "alias"),
            Err(StorageError::EmptyField("url"))
        ));
        assert!(matches!(
            store.save_url("https://example.com", ""),
            Err(StorageError::EmptyField("alias"))
        ));
    }

    #[test]
    fn records_survive_reopen() {
        let temp_db = NamedTempFile::new().unwrap();
        let path = temp_db.path().to_str().unwrap().to_string();

        {
            let store = UrlStore::open(&path).unwrap();
            store.save_url("https://example.com/kept", "kept").unwrap();
        }

        let store = UrlStore::open(&path).unwrap();
        assert_eq!(store.get_url("kept").unwrap(), "https://example.com/kept");
        assert_eq!(store.save_url("https://example.com/n", "next").unwrap(), 2);
    }

    #[test]
    fn concurrent_saves_of_one_alias_have_a_single_winner() {
        let (store, _temp_db) = temp_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .save_url(&format!("https://example.com/{i}"), "race")
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(winners, 1);
    }
}
