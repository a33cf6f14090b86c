use tracing::debug;

use crate::record::{IdSource, Record, RecordId, TimestampIds};
use crate::storage::KeyValueStore;

/// Ordered in-memory list of one record type, mirrored to a single store key.
///
/// The list is the source of truth; every mutation rewrites the whole stored
/// entry. A failed write leaves the in-memory list as mutated.
pub struct Collection<T: Record> {
    key: String,
    records: Vec<T>,
    store: KeyValueStore,
    ids: Box<dyn IdSource>,
}

impl<T: Record> Collection<T> {
    /// Opens the collection under the record type's default key.
    pub fn open(store: &KeyValueStore) -> Self {
        Self::open_with_key(store, T::KEY)
    }

    pub fn open_with_key(store: &KeyValueStore, key: &str) -> Self {
        let records: Vec<T> = store.load_or_default(key);
        debug!("Opened '{}' with {} record(s)", key, records.len());
        Self {
            key: key.to_string(),
            records,
            store: store.clone(),
            ids: Box::new(TimestampIds),
        }
    }

    /// Replaces the id source used by `add`.
    pub fn with_ids<I: IdSource + 'static>(mut self, ids: I) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Draws a fresh id without creating a record. Used for nested items.
    pub fn next_id(&mut self) -> RecordId {
        self.ids.next_id()
    }

    /// Appends a new record built from `draft` and persists the list.
    pub fn add(&mut self, draft: T::Draft) -> &T {
        let id = self.ids.next_id();
        self.records.push(T::from_draft(id, draft));
        self.persist();
        debug!("Added {} {} to '{}'", T::KIND, id, self.key);
        &self.records[self.records.len() - 1]
    }

    /// First record with a matching id.
    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Shallow-merges `patch` over the first record with a matching id.
    /// Returns `false` and leaves everything untouched when there is no match.
    pub fn update(&mut self, id: RecordId, patch: T::Patch) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id() == id) else {
            debug!("Update of missing {} {} ignored", T::KIND, id);
            return false;
        };
        record.apply_patch(patch);
        self.persist();
        true
    }

    /// Removes every record with a matching id and returns how many were removed.
    pub fn delete(&mut self, id: RecordId) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.id() != id);
        let removed = before - self.records.len();
        self.persist();
        if removed > 0 {
            debug!("Deleted {} {} from '{}'", T::KIND, id, self.key);
        }
        removed
    }

    /// Swaps the whole list, as an import does, and persists it.
    pub fn replace_all(&mut self, records: Vec<T>) {
        self.records = records;
        self.persist();
    }

    // Write failures are already reported to the user by the store.
    fn persist(&self) {
        let _ = self.store.save(&self.key, &self.records);
    }
}
