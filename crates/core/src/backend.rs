use std::collections::{BTreeMap, HashMap};

use chronostore_datastore::Result as DsResult;
use chronostore_primitives::TemporalId;
use parking_lot::RwLock;

/// The composite key a root record class's tree is physically ordered by: `key`, then a
/// NUL separator (so a key's byte string can never alias a longer key's prefix), then
/// `dataset`, then the bitwise complement of `id`. Ascending byte order over this key
/// therefore visits, for a fixed `(key, dataset)`, the newest id first — the access
/// pattern `load_or_null` needs as a single bounded forward scan.
pub struct CompositeKey;

impl CompositeKey {
    pub fn build(key: &str, dataset: TemporalId, id: TemporalId) -> Vec<u8> {
        let mut out = Vec::with_capacity(key.len() + 1 + 12 + 12);
        out.extend_from_slice(key.as_bytes());
        out.push(0);
        out.extend_from_slice(dataset.as_bytes());
        out.extend_from_slice(&id.complement());
        out
    }

    /// Prefix matching every version of `key` in `dataset`, across all ids.
    pub fn prefix_for_key_dataset(key: &str, dataset: TemporalId) -> Vec<u8> {
        let mut out = Vec::with_capacity(key.len() + 1 + 12);
        out.extend_from_slice(key.as_bytes());
        out.push(0);
        out.extend_from_slice(dataset.as_bytes());
        out
    }
}

/// The embedded, ordered byte-keyed collection `TemporalDataSource` is built on. One
/// logical tree per root record class; within a class, one composite-keyed tree plus an
/// id-keyed index for verbatim `load_by_id` / class-wide scans: rather than a second
/// `{_dataset, _id desc}` tree, the secondary index is keyed on bare `_id`, since
/// `load_by_id` never needs dataset scoping.
///
/// A disk-resident implementation would slot in here without `TemporalDataSource` itself
/// changing; none ships in this repository.
pub trait StorageBackend: Send + Sync {
    fn append(&self, class_tag: &str, composite_key: Vec<u8>, id: TemporalId, document: Vec<u8>) -> DsResult<()>;

    /// Ascending-byte-order scan over `prefix`; callers rely on this being equivalent to
    /// `(key, dataset, id desc)` order for a prefix built by [`CompositeKey`].
    fn scan_prefix(&self, class_tag: &str, prefix: &[u8]) -> DsResult<Vec<(Vec<u8>, Vec<u8>)>>;

    fn get_by_id(&self, class_tag: &str, id: TemporalId) -> DsResult<Option<Vec<u8>>>;

    /// Every document currently stored for `class_tag`, in no particular order. Used by
    /// `query` and by dataset-detail lookups, which scan a whole class rather than one
    /// `(key, dataset)` pair.
    fn all_documents(&self, class_tag: &str) -> DsResult<Vec<Vec<u8>>>;

    fn drop_all(&self) -> DsResult<()>;
}

#[derive(Default)]
struct ClassTree {
    composite: BTreeMap<Vec<u8>, Vec<u8>>,
    by_id: HashMap<[u8; 12], Vec<u8>>,
}

/// Reference `StorageBackend`: an ordered map per class guarded by a reader-writer lock.
/// No durability: the store's entire contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryBackend {
    classes: RwLock<HashMap<String, ClassTree>>,
}

impl InMemoryBackend {
    pub fn new() -> InMemoryBackend {
        InMemoryBackend::default()
    }
}

impl StorageBackend for InMemoryBackend {
    fn append(&self, class_tag: &str, composite_key: Vec<u8>, id: TemporalId, document: Vec<u8>) -> DsResult<()> {
        let mut classes = self.classes.write();
        let tree = classes.entry(class_tag.to_owned()).or_default();
        tree.composite.insert(composite_key, document.clone());
        tree.by_id.insert(*id.as_bytes(), document);
        Ok(())
    }

    fn scan_prefix(&self, class_tag: &str, prefix: &[u8]) -> DsResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let classes = self.classes.read();
        let Some(tree) = classes.get(class_tag) else {
            return Ok(Vec::new());
        };
        Ok(tree
            .composite
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn get_by_id(&self, class_tag: &str, id: TemporalId) -> DsResult<Option<Vec<u8>>> {
        let classes = self.classes.read();
        Ok(classes.get(class_tag).and_then(|tree| tree.by_id.get(id.as_bytes()).cloned()))
    }

    fn all_documents(&self, class_tag: &str) -> DsResult<Vec<Vec<u8>>> {
        let classes = self.classes.read();
        Ok(classes.get(class_tag).map(|tree| tree.by_id.values().cloned().collect()).unwrap_or_default())
    }

    fn drop_all(&self) -> DsResult<()> {
        self.classes.write().clear();
        Ok(())
    }
}