use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chronostore_primitives::TemporalId;
use parking_lot::RwLock;

use crate::dataset::DataSet;
use crate::error::{DatastoreError, Result};

/// Loads a `DataSet` record by id. Implemented by the concrete engine; the cache itself
/// never talks to storage directly, keeping the read path separate from the
/// committed-state holder it reads from.
pub trait DataSetLoader {
    fn load_dataset(&self, id: TemporalId) -> Result<Option<DataSet>>;
}

/// Per-data-source cache of dataset name resolution and transitive import sets.
///
/// Grown only by reads; there is no background invalidation. A caller that depends on
/// observing a dataset graph change made by another process must call
/// [`DatasetCache::clear`].
#[derive(Default)]
pub struct DatasetCache {
    name_to_id: RwLock<HashMap<(TemporalId, String), TemporalId>>,
    import_set: RwLock<HashMap<TemporalId, Arc<HashSet<TemporalId>>>>,
}

impl DatasetCache {
    pub fn new() -> DatasetCache {
        DatasetCache::default()
    }

    pub fn clear(&self) {
        self.name_to_id.write().clear();
        self.import_set.write().clear();
    }

    pub fn cached_id(&self, scope: TemporalId, name: &str) -> Option<TemporalId> {
        self.name_to_id.read().get(&(scope, name.to_owned())).copied()
    }

    pub fn remember_id(&self, scope: TemporalId, name: &str, id: TemporalId) {
        self.name_to_id.write().insert((scope, name.to_owned()), id);
    }

    /// Returns `{ds_id} ∪ build_lookup_list(parent)` for every parent, memoized in
    /// `import_set`. Fails with `DataSetNotFound` or `SelfParent` on a missing or
    /// self-referential dataset graph.
    pub fn build_lookup_list(
        &self,
        ds_id: TemporalId,
        loader: &dyn DataSetLoader,
    ) -> Result<Arc<HashSet<TemporalId>>> {
        if ds_id.is_empty() {
            let mut only_empty = HashSet::new();
            only_empty.insert(TemporalId::EMPTY);
            return Ok(Arc::new(only_empty));
        }
        if let Some(cached) = self.import_set.read().get(&ds_id) {
            return Ok(cached.clone());
        }
        let set = self.build_lookup_list_uncached(ds_id, loader, &mut HashSet::new())?;
        let set = Arc::new(set);
        self.import_set.write().insert(ds_id, set.clone());
        Ok(set)
    }

    fn build_lookup_list_uncached(
        &self,
        ds_id: TemporalId,
        loader: &dyn DataSetLoader,
        visiting: &mut HashSet<TemporalId>,
    ) -> Result<HashSet<TemporalId>> {
        let dataset = loader
            .load_dataset(ds_id)
            .and_then(|opt| opt.ok_or_else(|| DatastoreError::DataSetNotFound(ds_id.to_hex())))?;
        visiting.insert(ds_id);
        let mut out = HashSet::new();
        out.insert(ds_id);
        // The root dataset is the ultimate ancestor of every dataset, whether or not it is
        // listed as an explicit parent: root-only classes (DataSource, DbName, DbServer,
        // DataSet) live there, so every non-root lookup list must still be able to see it.
        out.insert(TemporalId::EMPTY);
        for parent in &dataset.parents {
            if *parent == ds_id {
                return Err(DatastoreError::SelfParent(ds_id));
            }
            out.insert(*parent);
            if visiting.contains(parent) {
                return Err(DatastoreError::SelfParent(*parent));
            }
            let parent_list = if let Some(cached) = self.import_set.read().get(parent) {
                cached.as_ref().clone()
            } else {
                self.build_lookup_list_uncached(*parent, loader, visiting)?
            };
            out.extend(parent_list);
        }
        visiting.remove(&ds_id);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap as StdHashMap;

    struct FakeLoader(RefCell<StdHashMap<TemporalId, DataSet>>);

    impl DataSetLoader for FakeLoader {
        fn load_dataset(&self, id: TemporalId) -> Result<Option<DataSet>> {
            Ok(self.0.borrow().get(&id).cloned())
        }
    }

    fn id(n: u32) -> TemporalId {
        TemporalId::from_parts(n, [0, 0, 0], 0, 0)
    }

    #[test]
    fn empty_lookup_list_is_just_empty() {
        let cache = DatasetCache::new();
        let loader = FakeLoader(RefCell::new(StdHashMap::new()));
        let list = cache.build_lookup_list(TemporalId::EMPTY, &loader).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.contains(&TemporalId::EMPTY));
    }

    #[test]
    fn lookup_list_includes_transitive_parents() {
        let cache = DatasetCache::new();
        let mut datasets = StdHashMap::new();
        datasets.insert(
            id(3),
            DataSet { id: id(3), name: "grandparent".into(), parents: vec![] },
        );
        datasets.insert(
            id(2),
            DataSet { id: id(2), name: "parent".into(), parents: vec![id(3)] },
        );
        datasets.insert(
            id(1),
            DataSet { id: id(1), name: "child".into(), parents: vec![id(2)] },
        );
        let loader = FakeLoader(RefCell::new(datasets));
        let list = cache.build_lookup_list(id(1), &loader).unwrap();
        assert_eq!(list.len(), 4);
        assert!(list.contains(&id(1)));
        assert!(list.contains(&id(2)));
        assert!(list.contains(&id(3)));
        assert!(list.contains(&TemporalId::EMPTY));
    }

    #[test]
    fn a_dataset_with_no_declared_parents_still_sees_the_root() {
        let cache = DatasetCache::new();
        let mut datasets = StdHashMap::new();
        datasets.insert(id(1), DataSet { id: id(1), name: "Common".into(), parents: vec![] });
        let loader = FakeLoader(RefCell::new(datasets));
        let list = cache.build_lookup_list(id(1), &loader).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&id(1)));
        assert!(list.contains(&TemporalId::EMPTY));
    }

    #[test]
    fn self_parent_is_rejected() {
        let cache = DatasetCache::new();
        let mut datasets = StdHashMap::new();
        datasets.insert(id(1), DataSet { id: id(1), name: "loop".into(), parents: vec![id(1)] });
        let loader = FakeLoader(RefCell::new(datasets));
        assert!(matches!(
            cache.build_lookup_list(id(1), &loader),
            Err(DatastoreError::SelfParent(_))
        ));
    }

    #[test]
    fn missing_dataset_is_not_found() {
        let cache = DatasetCache::new();
        let loader = FakeLoader(RefCell::new(StdHashMap::new()));
        assert!(matches!(
            cache.build_lookup_list(id(9), &loader),
            Err(DatastoreError::DataSetNotFound(_))
        ));
    }
}
