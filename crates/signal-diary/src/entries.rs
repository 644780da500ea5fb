//! The canonical log of signal problems.
//!
//! [`EntryStore`] is the only writer of the entry collection. Every mutation
//! is applied in memory and then persisted through the [`RecordStore`] port
//! before the call returns. If the write fails, the in-memory change is
//! rolled back and the error propagates, so memory and storage never
//! disagree.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::entry::{normalize_location, IssueType, LogEntry};
use crate::error::Result;
use crate::storage::{RecordStore, ENTRIES_KEY};

/// Source of creation timestamps.
pub type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Predicates for [`EntryStore::query`]. Omitted predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    /// Only entries of this type.
    pub issue_type: Option<IssueType>,
    /// Only entries at this location (compared after the same trimming `add` applies).
    pub location: Option<String>,
    /// Only entries at or after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Only entries at or before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl EntryQuery {
    /// A query that matches every entry.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one issue type.
    #[must_use]
    pub fn issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = Some(issue_type);
        self
    }

    /// Restrict to one location.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Restrict to entries at or after `from`.
    #[must_use]
    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Restrict to entries at or before `to`.
    #[must_use]
    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Whether `entry` satisfies every supplied predicate.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.issue_type.map_or(true, |t| entry.issue_type == t)
            && self
                .location
                .as_deref()
                .map_or(true, |l| entry.location == normalize_location(l))
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.to.map_or(true, |to| entry.timestamp <= to)
    }
}

/// First half of a two-step clear.
///
/// Carries what the caller needs to ask for confirmation. It goes stale if
/// the diary changes before [`EntryStore::confirm_clear`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearRequest {
    /// Number of entries that would be deleted.
    pub entry_count: usize,
    version: u64,
}

/// Owns the entry collection, newest first.
pub struct EntryStore<P: RecordStore> {
    port: P,
    entries: Vec<LogEntry>,
    version: u64,
    clock: Clock,
}

impl<P: RecordStore> fmt::Debug for EntryStore<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryStore")
            .field("entries", &self.entries.len())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<P: RecordStore> EntryStore<P> {
    /// Load the store from `port`, stamping new entries with the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error only if the medium cannot be read at all. Missing or
    /// malformed data yields an empty store.
    pub fn load(port: P) -> Result<Self> {
        Self::with_clock(port, Box::new(Utc::now))
    }

    /// Load the store from `port` with a custom clock.
    ///
    /// # Errors
    ///
    /// Returns an error only if the medium cannot be read at all.
    pub fn with_clock(port: P, clock: Clock) -> Result<Self> {
        let entries = match port.read(ENTRIES_KEY)? {
            None => Vec::new(),
            Some(raw) => Self::decode(&raw),
        };
        info!(count = entries.len(), "Entry store loaded");
        Ok(Self {
            port,
            entries,
            version: 0,
            clock,
        })
    }

    fn decode(raw: &str) -> Vec<LogEntry> {
        match serde_json::from_str::<Vec<LogEntry>>(raw) {
            Ok(mut entries) => {
                for entry in &mut entries {
                    entry.location = normalize_location(&entry.location);
                }
                // Older data was appended oldest-first. The sort is stable, so
                // equal timestamps keep their stored order.
                entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                entries
            }
            Err(e) => {
                warn!(error = %e, "Persisted entries are malformed, starting with an empty diary");
                Vec::new()
            }
        }
    }

    /// Record a new entry and persist the collection.
    ///
    /// A blank `location` is stored as "Not specified".
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted. The entry is
    /// not kept in that case.
    pub fn add(
        &mut self,
        issue_type: IssueType,
        location: &str,
        notes: Option<&str>,
    ) -> Result<LogEntry> {
        let mut entry = LogEntry::new(issue_type, location, notes, (self.clock)());
        while self.entries.iter().any(|e| e.id == entry.id) {
            entry.id = LogEntry::generate_id(entry.timestamp);
        }

        // Newest first; a newer insertion goes ahead of equal timestamps.
        let index = self
            .entries
            .iter()
            .position(|e| e.timestamp <= entry.timestamp)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry.clone());

        if let Err(e) = self.persist() {
            self.entries.remove(index);
            return Err(e);
        }

        self.version += 1;
        debug!(id = %entry.id, issue_type = %entry.issue_type, "Entry added");
        Ok(entry)
    }

    /// Delete the entry with `id`. Unknown ids are ignored.
    ///
    /// Returns whether an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted. The entry is
    /// restored in that case.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            debug!(id, "Delete of unknown entry ignored");
            return Ok(false);
        };

        let removed = self.entries.remove(index);
        if let Err(e) = self.persist() {
            self.entries.insert(index, removed);
            return Err(e);
        }

        self.version += 1;
        debug!(id, "Entry deleted");
        Ok(true)
    }

    /// Delete every entry and erase the persisted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be erased. The entries are
    /// restored in that case.
    pub fn clear(&mut self) -> Result<()> {
        let previous = std::mem::take(&mut self.entries);
        if let Err(e) = self.port.remove(ENTRIES_KEY) {
            self.entries = previous;
            return Err(e);
        }

        self.version += 1;
        info!(removed = previous.len(), "Diary cleared");
        Ok(())
    }

    /// Start a two-step clear.
    #[must_use]
    pub fn request_clear(&self) -> ClearRequest {
        ClearRequest {
            entry_count: self.entries.len(),
            version: self.version,
        }
    }

    /// Finish a two-step clear.
    ///
    /// Returns `Ok(false)` without touching anything when the diary changed
    /// after `request` was issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be erased.
    pub fn confirm_clear(&mut self, request: &ClearRequest) -> Result<bool> {
        if request.version != self.version {
            warn!("Clear request is stale, diary changed since it was issued");
            return Ok(false);
        }
        self.clear()?;
        Ok(true)
    }

    /// Entries matching `query`, newest first.
    #[must_use]
    pub fn query(&self, query: &EntryQuery) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect()
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the diary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counter bumped on every successful mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        self.port.write(ENTRIES_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::entry::UNSPECIFIED_LOCATION;
    use crate::error::Error;
    use crate::storage::MemoryStore;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    /// A clock that advances one minute per call.
    fn ticking_clock() -> Clock {
        let tick = Cell::new(0);
        Box::new(move || {
            let n = tick.get();
            tick.set(n + 1);
            base_time() + Duration::minutes(n)
        })
    }

    fn create_test_store(port: &MemoryStore) -> EntryStore<&MemoryStore> {
        EntryStore::with_clock(port, ticking_clock()).unwrap()
    }

    /// A port whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        broken: Cell<bool>,
    }

    impl RecordStore for FlakyStore {
        fn read(&self, key: &str) -> Result<Option<String>> {
            self.inner.read(key)
        }

        fn write(&self, key: &str, value: &str) -> Result<()> {
            if self.broken.get() {
                return Err(Error::storage_unavailable(key, "medium offline"));
            }
            self.inner.write(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            if self.broken.get() {
                return Err(Error::storage_unavailable(key, "medium offline"));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_add_returns_entry_and_persists() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);

        let entry = store.add(IssueType::NoSignal, "Kitchen", Some("one bar")).unwrap();
        assert_eq!(entry.location, "Kitchen");
        assert_eq!(entry.notes.as_deref(), Some("one bar"));
        assert_eq!(store.len(), 1);
        assert!(port.contains(ENTRIES_KEY));
    }

    #[test]
    fn test_blank_location_is_coerced() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);

        let entry = store.add(IssueType::CallFailed, "", None).unwrap();
        assert_eq!(entry.location, UNSPECIFIED_LOCATION);
    }

    #[test]
    fn test_newest_first_after_every_add() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);

        for i in 0..6 {
            store.add(IssueType::all()[i % 3], "Porch", None).unwrap();
            let all = store.query(&EntryQuery::all());
            assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        }
    }

    #[test]
    fn test_equal_timestamps_keep_newest_insertion_first() {
        let port = MemoryStore::new();
        let mut store =
            EntryStore::with_clock(&port, Box::new(base_time)).unwrap();

        let first = store.add(IssueType::NoSignal, "A", None).unwrap();
        let second = store.add(IssueType::NoSignal, "B", None).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.entries()[0].id, second.id);
        assert_eq!(store.entries()[1].id, first.id);
    }

    #[test]
    fn test_backwards_clock_still_sorted() {
        let port = MemoryStore::new();
        let offsets = Rc::new(Cell::new(0i64));
        let handle = Rc::clone(&offsets);
        let mut store = EntryStore::with_clock(
            &port,
            Box::new(move || base_time() + Duration::minutes(handle.get())),
        )
        .unwrap();

        offsets.set(10);
        store.add(IssueType::NoSignal, "late", None).unwrap();
        offsets.set(5);
        store.add(IssueType::NoSignal, "early", None).unwrap();

        let locations: Vec<_> = store.entries().iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, ["late", "early"]);
    }

    #[test]
    fn test_round_trip_through_port() {
        let port = MemoryStore::new();
        let before = {
            let mut store = create_test_store(&port);
            store.add(IssueType::NoSignal, "Kitchen", None).unwrap();
            store.add(IssueType::CallFailed, "Porch", Some("dropped twice")).unwrap();
            store.add(IssueType::MessageFailed, "", None).unwrap();
            store.entries().to_vec()
        };

        let reloaded = EntryStore::load(&port).unwrap();
        assert_eq!(reloaded.entries(), before.as_slice());
    }

    #[test]
    fn test_delete_existing_and_missing() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);
        let entry = store.add(IssueType::NoSignal, "Kitchen", None).unwrap();
        store.add(IssueType::NoSignal, "Porch", None).unwrap();

        assert!(!store.delete("does-not-exist").unwrap());
        assert_eq!(store.len(), 2);

        assert!(store.delete(&entry.id).unwrap());
        assert!(store.get(&entry.id).is_none());
        assert!(!store.delete(&entry.id).unwrap());
        assert_eq!(EntryStore::load(&port).unwrap().len(), 1);
    }

    #[test]
    fn test_clear_erases_persisted_state() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);
        store.add(IssueType::NoSignal, "Kitchen", None).unwrap();

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(!port.contains(ENTRIES_KEY));
    }

    #[test]
    fn test_two_step_clear() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);
        store.add(IssueType::NoSignal, "Kitchen", None).unwrap();
        store.add(IssueType::NoSignal, "Kitchen", None).unwrap();

        let request = store.request_clear();
        assert_eq!(request.entry_count, 2);
        assert!(store.confirm_clear(&request).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_clear_request_is_refused() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);
        store.add(IssueType::NoSignal, "Kitchen", None).unwrap();

        let request = store.request_clear();
        store.add(IssueType::CallFailed, "Porch", None).unwrap();

        assert!(!store.confirm_clear(&request).unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_query_predicates() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);
        store.add(IssueType::NoSignal, "Kitchen", None).unwrap(); // 09:00
        store.add(IssueType::CallFailed, "Porch", None).unwrap(); // 09:01
        store.add(IssueType::NoSignal, "Porch", None).unwrap(); // 09:02

        assert_eq!(store.query(&EntryQuery::all()).len(), 3);
        assert_eq!(
            store.query(&EntryQuery::all().issue_type(IssueType::NoSignal)).len(),
            2
        );
        assert_eq!(store.query(&EntryQuery::all().location(" Porch ")).len(), 2);

        let porch_no_signal = store.query(
            &EntryQuery::all()
                .issue_type(IssueType::NoSignal)
                .location("Porch"),
        );
        assert_eq!(porch_no_signal.len(), 1);

        let window = store.query(
            &EntryQuery::all()
                .from(base_time() + Duration::minutes(1))
                .to(base_time() + Duration::minutes(1)),
        );
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].issue_type, IssueType::CallFailed);
    }

    #[test]
    fn test_query_preserves_newest_first() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);
        for _ in 0..4 {
            store.add(IssueType::NoSignal, "Kitchen", None).unwrap();
        }
        let results = store.query(&EntryQuery::all().location("Kitchen"));
        assert!(results.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[test]
    fn test_malformed_data_loads_empty() {
        let port = MemoryStore::new();
        port.write(ENTRIES_KEY, "{not json").unwrap();
        assert!(EntryStore::load(&port).unwrap().is_empty());

        port.write(ENTRIES_KEY, "{\"id\": 1}").unwrap();
        assert!(EntryStore::load(&port).unwrap().is_empty());
    }

    #[test]
    fn test_legacy_oldest_first_data_is_reordered() {
        let port = MemoryStore::new();
        port.write(
            ENTRIES_KEY,
            r#"[
                {"id":"1","type":"no_signal","location":"Kitchen","timestamp":"2024-03-01T08:00:00Z"},
                {"id":"2","type":"call-failed","location":"Porch","timestamp":"2024-03-02T08:00:00Z"}
            ]"#,
        )
        .unwrap();

        let store = EntryStore::load(&port).unwrap();
        assert_eq!(store.entries()[0].id, "2");
        assert_eq!(store.entries()[1].issue_type, IssueType::NoSignal);
    }

    #[test]
    fn test_legacy_blank_locations_are_normalized() {
        let port = MemoryStore::new();
        port.write(
            ENTRIES_KEY,
            r#"[
                {"id":"2","type":"no-signal","location":"  ","timestamp":"2024-03-02T08:00:00Z"},
                {"id":"1","type":"no-signal","location":" Porch ","timestamp":"2024-03-01T08:00:00Z"}
            ]"#,
        )
        .unwrap();

        let store = EntryStore::load(&port).unwrap();
        assert_eq!(store.entries()[0].location, UNSPECIFIED_LOCATION);
        assert_eq!(store.query(&EntryQuery::all().location("Porch")).len(), 1);
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let port = FlakyStore::default();
        let mut store = EntryStore::with_clock(&port, ticking_clock()).unwrap();
        let kept = store.add(IssueType::NoSignal, "Kitchen", None).unwrap();
        let version = store.version();

        port.broken.set(true);
        let err = store.add(IssueType::CallFailed, "Porch", None).unwrap_err();
        assert!(err.is_storage_failure());
        assert_eq!(store.len(), 1);

        assert!(store.delete(&kept.id).is_err());
        assert!(store.get(&kept.id).is_some());

        assert!(store.clear().is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.version(), version);
    }

    #[test]
    fn test_version_bumps_on_mutation_only() {
        let port = MemoryStore::new();
        let mut store = create_test_store(&port);
        assert_eq!(store.version(), 0);

        let entry = store.add(IssueType::NoSignal, "Kitchen", None).unwrap();
        assert_eq!(store.version(), 1);

        store.delete("missing").unwrap();
        assert_eq!(store.version(), 1);

        store.delete(&entry.id).unwrap();
        assert_eq!(store.version(), 2);
    }
}
