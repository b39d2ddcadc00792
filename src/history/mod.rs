//! Bounded, most-recent-first cache of past analyses.
//!
//! Holds at most [`HISTORY_LIMIT`] items, newest at index 0. Insertion
//! prepends and truncates; nothing is reordered on access. Every mutating
//! call writes the whole sequence through to the backend before returning.
//!
//! The durable form is a single storage slot containing only the history
//! sequence:
//!
//! ```json
//! { "analysis_history": [ { "id": "...", "date": "...", ... } ] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};
use crate::model::AnalysisResult;

/// Maximum number of analyses kept.
pub const HISTORY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// One past analysis. Created once when an analysis completes; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisHistoryItem {
    /// Millisecond timestamp, unique within the cache.
    pub id: String,
    /// RFC 3339 creation time (UTC).
    pub date: String,
    /// Copied from `result` for list display.
    pub partner_name: String,
    /// Copied from `result` for list display.
    pub summary: String,
    pub result: AnalysisResult,
}

/// Serialized shape of the storage slot.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedHistory {
    #[serde(default)]
    analysis_history: Vec<AnalysisHistoryItem>,
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Where the history sequence lives between sessions.
pub trait HistoryBackend: Send {
    /// Load the stored sequence; a missing slot is an empty sequence.
    fn load(&self) -> Result<Vec<AnalysisHistoryItem>>;
    /// Replace the stored sequence.
    fn save(&self, items: &[AnalysisHistoryItem]) -> Result<()>;
    /// Human-readable location for diagnostics.
    fn describe(&self) -> String;
}

/// JSON file backend (the named storage slot).
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryBackend for FileBackend {
    fn load(&self) -> Result<Vec<AnalysisHistoryItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let persisted: PersistedHistory = serde_json::from_str(&content).map_err(|e| {
            AnalyzerError::Storage(format!("unreadable {}: {e}", self.path.display()))
        })?;
        Ok(persisted.analysis_history)
    }

    fn save(&self, items: &[AnalysisHistoryItem]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let persisted = PersistedHistory {
            analysis_history: items.to_vec(),
        };
        // Write to a sibling file first so a crash never leaves half a slot.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&persisted)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend. Clones share the same storage, which lets tests
/// reopen a cache to observe what was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    items: Arc<Mutex<Vec<AnalysisHistoryItem>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<AnalysisHistoryItem>> {
        let items = self
            .items
            .lock()
            .map_err(|_| AnalyzerError::Storage("memory backend poisoned".to_string()))?;
        Ok(items.clone())
    }

    fn save(&self, items: &[AnalysisHistoryItem]) -> Result<()> {
        let mut stored = self
            .items
            .lock()
            .map_err(|_| AnalyzerError::Storage("memory backend poisoned".to_string()))?;
        *stored = items.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

pub struct HistoryCache {
    items: Vec<AnalysisHistoryItem>,
    backend: Box<dyn HistoryBackend>,
}

impl std::fmt::Debug for HistoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryCache")
            .field("items", &self.items.len())
            .field("backend", &self.backend.describe())
            .finish()
    }
}

impl HistoryCache {
    /// Load the stored sequence. Sequences longer than the bound are cut to
    /// the newest [`HISTORY_LIMIT`] items.
    pub fn open(backend: Box<dyn HistoryBackend>) -> Result<Self> {
        let mut items = backend.load()?;
        items.truncate(HISTORY_LIMIT);
        Ok(Self { items, backend })
    }

    /// Like [`HistoryCache::open`], but an unreadable slot yields an empty
    /// cache on the same backend together with the load error.
    pub fn open_or_empty(backend: Box<dyn HistoryBackend>) -> (Self, Option<AnalyzerError>) {
        match backend.load() {
            Ok(mut items) => {
                items.truncate(HISTORY_LIMIT);
                (Self { items, backend }, None)
            }
            Err(err) => (Self::empty(backend), Some(err)),
        }
    }

    /// Start empty, ignoring whatever the backend holds until the next write.
    pub fn empty(backend: Box<dyn HistoryBackend>) -> Self {
        Self {
            items: Vec::new(),
            backend,
        }
    }

    /// Wrap `result` in a new item, prepend it, keep the newest ten, and
    /// persist. Returns the new item.
    pub fn add(&mut self, result: AnalysisResult) -> Result<AnalysisHistoryItem> {
        let item = AnalysisHistoryItem {
            id: self.next_id(),
            date: Utc::now().to_rfc3339(),
            partner_name: result.partner_name.clone(),
            summary: result.summary.clone(),
            result,
        };
        self.items.insert(0, item.clone());
        self.items.truncate(HISTORY_LIMIT);
        self.persist()?;
        Ok(item)
    }

    /// Remove the item with `id`. Absent ids are a no-op, not an error.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.persist()?;
        Ok(self.items.len() != before)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.persist()
    }

    /// Most-recent-first view.
    pub fn list(&self) -> &[AnalysisHistoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&AnalysisHistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn location(&self) -> String {
        self.backend.describe()
    }

    fn persist(&self) -> Result<()> {
        self.backend.save(&self.items)
    }

    /// Current time in milliseconds, bumped past any id already in use.
    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.items.iter().any(|item| item.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn result(partner: &str) -> AnalysisResult {
        AnalysisResult {
            partner_name: partner.to_string(),
            summary: format!("chat with {partner}"),
            ..Default::default()
        }
    }

    fn cache() -> (HistoryCache, MemoryBackend) {
        let backend = MemoryBackend::new();
        let cache = HistoryCache::open(Box::new(backend.clone())).unwrap();
        (cache, backend)
    }

    #[test]
    fn add_prepends_and_denormalizes() {
        let (mut cache, _) = cache();
        cache.add(result("A")).unwrap();
        let item = cache.add(result("B")).unwrap();

        assert_eq!(cache.list()[0], item);
        assert_eq!(cache.list()[0].partner_name, "B");
        assert_eq!(cache.list()[0].summary, "chat with B");
        assert_eq!(cache.list()[1].partner_name, "A");
        assert!(chrono::DateTime::parse_from_rfc3339(&item.date).is_ok());
    }

    #[test]
    fn eleventh_add_evicts_oldest() {
        let (mut cache, _) = cache();
        for i in 0..11 {
            cache.add(result(&format!("p{i}"))).unwrap();
        }
        assert_eq!(cache.len(), HISTORY_LIMIT);
        assert!(cache.list().iter().all(|item| item.partner_name != "p0"));
        assert_eq!(cache.list()[0].partner_name, "p10");
        assert_eq!(cache.list()[9].partner_name, "p1");
    }

    #[test]
    fn ids_are_unique_even_within_one_millisecond() {
        let (mut cache, _) = cache();
        for i in 0..10 {
            cache.add(result(&i.to_string())).unwrap();
        }
        let mut ids: Vec<&str> = cache.list().iter().map(|i| i.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn remove_missing_id_is_noop() {
        let (mut cache, _) = cache();
        cache.add(result("A")).unwrap();
        let before = cache.list().to_vec();
        assert!(!cache.remove("does-not-exist").unwrap());
        assert_eq!(cache.list(), before.as_slice());
    }

    #[test]
    fn remove_existing_id() {
        let (mut cache, _) = cache();
        let a = cache.add(result("A")).unwrap();
        cache.add(result("B")).unwrap();
        assert!(cache.remove(&a.id).unwrap());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&a.id).is_none());
    }

    #[test]
    fn clear_twice_stays_empty() {
        let (mut cache, _) = cache();
        cache.add(result("A")).unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty());
        cache.clear().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn every_mutation_writes_through() {
        let (mut cache, backend) = cache();
        let a = cache.add(result("A")).unwrap();
        assert_eq!(backend.load().unwrap().len(), 1);

        cache.add(result("B")).unwrap();
        cache.remove(&a.id).unwrap();
        let stored = backend.load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].partner_name, "B");

        cache.clear().unwrap();
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn reopen_sees_persisted_order() {
        let (mut cache, backend) = cache();
        cache.add(result("A")).unwrap();
        cache.add(result("B")).unwrap();

        let reopened = HistoryCache::open(Box::new(backend)).unwrap();
        let names: Vec<&str> = reopened
            .list()
            .iter()
            .map(|i| i.partner_name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn open_truncates_oversized_slot() {
        let backend = MemoryBackend::new();
        let items: Vec<AnalysisHistoryItem> = (0..15)
            .map(|i| AnalysisHistoryItem {
                id: i.to_string(),
                date: Utc::now().to_rfc3339(),
                partner_name: format!("p{i}"),
                summary: String::new(),
                result: result(&format!("p{i}")),
            })
            .collect();
        backend.save(&items).unwrap();

        let cache = HistoryCache::open(Box::new(backend)).unwrap();
        assert_eq!(cache.len(), HISTORY_LIMIT);
        assert_eq!(cache.list()[0].partner_name, "p0");
    }

    #[test]
    fn file_backend_roundtrip_and_slot_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("slot.json");
        let backend = FileBackend::new(&path);

        assert!(backend.load().unwrap().is_empty());

        let mut cache = HistoryCache::open(Box::new(backend.clone())).unwrap();
        cache.add(result("민수")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<&String> = raw.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["analysis_history"]);

        let reopened = HistoryCache::open(Box::new(backend)).unwrap();
        assert_eq!(reopened.list()[0].partner_name, "민수");
    }

    #[test]
    fn file_backend_reports_malformed_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");
        fs::write(&path, "{ not json").unwrap();
        let err = FileBackend::new(&path).load().unwrap_err();
        assert!(matches!(err, AnalyzerError::Storage(_)));
    }
}
