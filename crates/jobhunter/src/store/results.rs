//! Result store: one extracted record per posting URL.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::store::json_file::JsonFile;

/// An extracted posting. Free-form apart from [`KEY_FIELD`] and [`CAPTURED_AT_FIELD`].
pub type Record = Map<String, Value>;

/// Field holding the posting URL; the dedup key.
pub const KEY_FIELD: &str = "job_url";
/// Field holding the RFC 3339 capture time.
pub const CAPTURED_AT_FIELD: &str = "scraped_at";

/// Returns the record's key, if it has a string one.
pub fn record_key(record: &Record) -> Option<&str> {
    record.get(KEY_FIELD).and_then(Value::as_str)
}

/// Keys the record by the submitted `url` and fills in the capture time if missing.
///
/// Whatever URL the extractor reported (a canonical or redirected one) is
/// overwritten, so the stored key always matches the task that produced it.
pub fn stamp_record(record: &mut Record, url: &str, captured_at: DateTime<Utc>) {
    record.insert(KEY_FIELD.to_string(), Value::String(url.to_string()));
    if !record.contains_key(CAPTURED_AT_FIELD) {
        record.insert(
            CAPTURED_AT_FIELD.to_string(),
            Value::String(captured_at.to_rfc3339()),
        );
    }
}

/// Flat-file store of extracted records keyed by [`KEY_FIELD`].
///
/// Every mutation is a full read-modify-write under the store's lock, so a
/// drain-loop upsert and a user delete never interleave.
pub struct ResultStore {
    file: Mutex<JsonFile>,
}

impl ResultStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file: Mutex::new(JsonFile::new(path)),
        }
    }

    /// Creates the store and bootstraps an empty collection on disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self::new(path);
        store.lock().ensure_exists()?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, JsonFile> {
        match self.file.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("Result store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Replaces any record with the same key, otherwise appends.
    ///
    /// Records without a key are appended as-is.
    pub fn upsert(&self, record: Record) -> Result<(), StoreError> {
        let file = self.lock();
        let mut records: Vec<Record> = file.read();

        if let Some(key) = record_key(&record) {
            let before = records.len();
            records.retain(|existing| record_key(existing) != Some(key));
            if records.len() < before {
                debug!("Replacing existing record for {}", key);
            }
        }

        records.push(record);
        file.write(&records)
    }

    /// All records in file order.
    pub fn read_all(&self) -> Vec<Record> {
        self.lock().read()
    }

    /// Removes every record whose key is in `keys`. Returns how many were removed.
    ///
    /// A missing or unreadable file deletes nothing.
    pub fn delete(&self, keys: &HashSet<String>) -> Result<usize, StoreError> {
        let file = self.lock();
        let Some(mut records) = file.try_read::<Record>() else {
            return Ok(0);
        };

        let before = records.len();
        records.retain(|record| record_key(record).map_or(true, |key| !keys.contains(key)));
        let deleted = before - records.len();

        if deleted > 0 {
            file.write(&records)?;
            info!("Deleted {} records from {}", deleted, file.path().display());
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(url: &str, title: &str) -> Record {
        match json!({ "job_url": url, "job_title": title }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn keys(urls: &[&str]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_open_bootstraps_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job_details.json");

        let store = ResultStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn test_upsert_appends_new_keys_in_order() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("r.json"));

        store.upsert(record("https://a", "A")).unwrap();
        store.upsert(record("https://b", "B")).unwrap();

        let all = store.read_all();
        assert_eq!(all.len(), 2);
        assert_eq!(record_key(&all[0]), Some("https://a"));
        assert_eq!(record_key(&all[1]), Some("https://b"));
    }

    #[test]
    fn test_upsert_keeps_latest_per_key() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("r.json"));

        let sequence = [
            ("k1", "v1"),
            ("k2", "v1"),
            ("k1", "v2"),
            ("k3", "v1"),
            ("k2", "v2"),
            ("k1", "v3"),
        ];
        for (key, title) in sequence {
            store.upsert(record(key, title)).unwrap();
        }

        let all = store.read_all();
        assert_eq!(all.len(), 3);
        let latest = |key: &str| {
            all.iter()
                .find(|r| record_key(r) == Some(key))
                .and_then(|r| r.get("job_title"))
                .cloned()
        };
        assert_eq!(latest("k1"), Some(json!("v3")));
        assert_eq!(latest("k2"), Some(json!("v2")));
        assert_eq!(latest("k3"), Some(json!("v1")));
        // Replaced records move to the end.
        assert_eq!(record_key(all.last().unwrap()), Some("k1"));
    }

    #[test]
    fn test_upsert_over_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = ResultStore::new(&path);
        store.upsert(record("https://a", "A")).unwrap();

        assert_eq!(store.read_all().len(), 1);
    }

    #[test]
    fn test_delete_by_keys() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("r.json"));
        store.upsert(record("https://a", "A")).unwrap();
        store.upsert(record("https://b", "B")).unwrap();
        store.upsert(record("https://c", "C")).unwrap();

        let deleted = store.delete(&keys(&["https://a", "https://c", "https://zzz"])).unwrap();
        assert_eq!(deleted, 2);

        let all = store.read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(record_key(&all[0]), Some("https://b"));
    }

    #[test]
    fn test_delete_without_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.json");
        let store = ResultStore::new(&path);

        assert_eq!(store.delete(&keys(&["https://a"])).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_on_corrupt_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.json");
        std::fs::write(&path, "{{{").unwrap();
        let store = ResultStore::new(&path);

        assert_eq!(store.delete(&keys(&["https://a"])).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{{{");
    }

    #[test]
    fn test_stamp_record_fills_missing_fields() {
        let now = Utc::now();
        let mut rec = Record::new();
        rec.insert("job_title".to_string(), json!("Engineer"));

        stamp_record(&mut rec, "https://a", now);
        assert_eq!(record_key(&rec), Some("https://a"));
        assert_eq!(rec.get(CAPTURED_AT_FIELD), Some(&json!(now.to_rfc3339())));
    }

    #[test]
    fn test_stamp_record_submitted_url_wins() {
        let mut rec = record("https://canonical", "Engineer");
        rec.insert(CAPTURED_AT_FIELD.to_string(), json!("2024-01-01T00:00:00Z"));

        stamp_record(&mut rec, "https://submitted", Utc::now());
        assert_eq!(record_key(&rec), Some("https://submitted"));
        assert_eq!(rec.get(CAPTURED_AT_FIELD), Some(&json!("2024-01-01T00:00:00Z")));
    }
}
