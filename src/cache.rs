//! Content-addressed persistent cache for LLM answers.
//!
//! LLM calls are the expensive, rate-limited part of a run, and the same
//! (question, context, model) triple comes up again whenever a batch is
//! restarted. The cache keys each answer by a SHA-256 fingerprint of the
//! fully assembled prompt plus the model identifier, so any change to the
//! question text, the reconstructed document, or the model forces a fresh
//! query — and nothing else does.
//!
//! ## Fingerprint compatibility
//!
//! The fingerprint is the hex SHA-256 digest of the UTF-8 bytes of
//! `full_prompt + "\n" + "INFO: llm=" + model`. Existing cache files from
//! earlier runs were written with exactly this composition; changing it
//! would orphan every stored answer, so treat it as a wire format.
//!
//! ## Durability
//!
//! Writes go through an explicit commit boundary: [`KvStore::put`] stages,
//! [`KvStore::commit`] makes durable. A crash between the two leaves the old
//! state visible, never a partial entry.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::CardAgreeError;

/// Compute the cache fingerprint for an assembled prompt and model.
pub fn fingerprint(full_prompt: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(full_prompt.as_bytes());
    hasher.update(b"\n");
    hasher.update(b"INFO: llm=");
    hasher.update(model.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Durable key/value capability backing the cache.
///
/// Keys are hex fingerprint strings; values are JSON answers. Staged writes
/// become visible to other connections only after [`KvStore::commit`].
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<Value>, CardAgreeError>;
    fn put(&mut self, key: &str, value: &Value) -> Result<(), CardAgreeError>;
    fn commit(&mut self) -> Result<(), CardAgreeError>;
}

// ── Sqlite backend ───────────────────────────────────────────────────────

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    fingerprint TEXT PRIMARY KEY,
    answer      TEXT NOT NULL
);
";

/// Embedded sqlite store, one file per processing period.
pub struct SqliteStore {
    conn: Connection,
    in_txn: bool,
}

impl SqliteStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, CardAgreeError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            in_txn: false,
        })
    }

    /// In-memory sqlite database, for tests.
    pub fn open_in_memory() -> Result<Self, CardAgreeError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            in_txn: false,
        })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, CardAgreeError> {
        let mut stmt = self
            .conn
            .prepare("SELECT answer FROM kv WHERE fingerprint = ?1")?;
        let raw: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;
        match raw {
            None => Ok(None),
            Some(text) => {
                let value =
                    serde_json::from_str(&text).map_err(|e| CardAgreeError::CacheValue {
                        fingerprint: key.to_string(),
                        detail: e.to_string(),
                    })?;
                Ok(Some(value))
            }
        }
    }

    fn put(&mut self, key: &str, value: &Value) -> Result<(), CardAgreeError> {
        if !self.in_txn {
            self.conn.execute_batch("BEGIN IMMEDIATE;")?;
            self.in_txn = true;
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (fingerprint, answer) VALUES (?1, ?2)",
            params![key, value.to_string()],
        )?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), CardAgreeError> {
        if self.in_txn {
            self.conn.execute_batch("COMMIT;")?;
            self.in_txn = false;
        }
        Ok(())
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        // Uncommitted writes are rolled back, preserving the commit boundary.
        if self.in_txn {
            let _ = self.conn.execute_batch("ROLLBACK;");
        }
    }
}

// ── In-memory backend ────────────────────────────────────────────────────

/// HashMap-backed store for tests. Keeps the staged/committed split so the
/// commit boundary stays observable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: HashMap<String, Value>,
    staged: Vec<(String, Value)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries visible to a fresh connection (committed only).
    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, CardAgreeError> {
        if let Some((_, v)) = self.staged.iter().rev().find(|(k, _)| k == key) {
            return Ok(Some(v.clone()));
        }
        Ok(self.committed.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &Value) -> Result<(), CardAgreeError> {
        self.staged.push((key.to_string(), value.clone()));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), CardAgreeError> {
        for (k, v) in self.staged.drain(..) {
            self.committed.insert(k, v);
        }
        Ok(())
    }
}

// ── LlmCache ─────────────────────────────────────────────────────────────

/// The oracle-facing cache: fingerprint lookup plus transactional insert.
pub struct LlmCache {
    store: Box<dyn KvStore>,
}

impl LlmCache {
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Open the sqlite-backed cache for one processing period:
    /// `dir/<period>.sqlite`.
    pub fn open_period(dir: &Path, period: &str) -> Result<Self, CardAgreeError> {
        let path = dir.join(format!("{period}.sqlite"));
        info!("Connecting to LLM cache \"{}\"", path.display());
        Ok(Self::new(Box::new(SqliteStore::open(&path)?)))
    }

    /// Look up a previously committed answer.
    pub fn get(&self, fingerprint: &str) -> Result<Option<Value>, CardAgreeError> {
        self.store.get(fingerprint)
    }

    /// Insert one answer and commit it durably. Exactly one entry per
    /// fingerprint; a re-insert overwrites with identical content by
    /// construction (the fingerprint determines the prompt and model).
    pub fn put(&mut self, fingerprint: &str, answer: &Value) -> Result<(), CardAgreeError> {
        self.store.put(fingerprint, answer)?;
        self.store.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_matches_known_composition() {
        // Same digest as hashing the concatenated string in one shot.
        let concatenated = format!("{}\nINFO: llm={}", "Q: who?CONTEXT", "gpt-4o-2024-05-13");
        let mut hasher = Sha256::new();
        hasher.update(concatenated.as_bytes());
        let expected = format!("{:x}", hasher.finalize());
        assert_eq!(fingerprint("Q: who?CONTEXT", "gpt-4o-2024-05-13"), expected);
    }

    #[test]
    fn fingerprint_is_deterministic_and_model_sensitive() {
        let a = fingerprint("prompt", "model-a");
        assert_eq!(a, fingerprint("prompt", "model-a"));
        assert_ne!(a, fingerprint("prompt", "model-b"));
        assert_ne!(a, fingerprint("prompt!", "model-a"));
        assert_eq!(a.len(), 64, "hex sha-256 digest");
    }

    #[test]
    fn sqlite_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let answer = json!({"bank_name": "Acme Bank", "usage": 812});
        store.put("fp1", &answer).unwrap();
        store.commit().unwrap();
        assert_eq!(store.get("fp1").unwrap(), Some(answer));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn sqlite_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2023Q4.sqlite");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.put("fp", &json!({"product_name": "Cash Card"})).unwrap();
            store.commit().unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get("fp").unwrap().unwrap()["product_name"],
            "Cash Card"
        );
    }

    #[test]
    fn uncommitted_sqlite_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.put("fp", &json!({"x": 1})).unwrap();
            // Dropped without commit.
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("fp").unwrap(), None);
    }

    #[test]
    fn memory_store_commit_boundary() {
        let mut store = MemoryStore::new();
        store.put("k", &json!({"a": 1})).unwrap();
        assert_eq!(store.committed_len(), 0, "put alone must not be durable");
        // Staged writes are visible through the same connection.
        assert!(store.get("k").unwrap().is_some());
        store.commit().unwrap();
        assert_eq!(store.committed_len(), 1);
    }

    #[test]
    fn open_period_derives_deterministic_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = LlmCache::open_period(dir.path(), "2023Q4").unwrap();
        cache.put("fp", &json!({"ok": true})).unwrap();
        drop(cache);
        assert!(dir.path().join("2023Q4.sqlite").is_file());
        let cache = LlmCache::open_period(dir.path(), "2023Q4").unwrap();
        assert!(cache.get("fp").unwrap().is_some());
    }
}
