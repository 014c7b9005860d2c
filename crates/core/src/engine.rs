use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chronostore_datastore::{
    is_root_only_class, CancelToken, DataSet, DataSetDetail, DataSetLoader, DatasetCache, DataSource, DatastoreError,
    Key, KeyElementKind, OrderBy, Payload, Predicate, Query, Record, Result as DsResult, CLASS_DATASET,
    CLASS_DATASET_DETAIL,
};
use chronostore_primitives::{IdGenerator, TemporalId};
use tracing::instrument;

use crate::backend::{CompositeKey, InMemoryBackend, StorageBackend};
use crate::codec::{decode_record, encode_record};
use crate::config::StoreConfig;
use crate::query_exec::eval_predicate;

/// A record-identifying key is itself a degenerate one-element `Key` (a single `Str`):
/// parsing it against that schema is how the engine enforces the sats key encoding's one
/// real constraint on scalar keys, that `;` is reserved and may not appear in an element's
/// own encoding, before the key is ever used to build a `CompositeKey`.
fn validate_key(key: &str) -> DsResult<()> {
    Key::parse(&[KeyElementKind::Str], key)?;
    Ok(())
}

/// The concrete engine: implements [`DataSource`] against a [`StorageBackend`], running
/// the `load_or_null` visibility algorithm over it.
///
/// One lock-guarded committed-state holder, one id generator, all state reachable
/// through `&self` so the engine can be shared behind an `Arc` across threads, without
/// a transaction log or multi-table schema machinery, which this store has no use for.
pub struct TemporalDataSource {
    backend: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    cache: DatasetCache,
    config: StoreConfig,
    revision_cutoff: Option<TemporalId>,
}

impl TemporalDataSource {
    /// Builds a store backed by the in-memory reference backend.
    pub fn new(config: StoreConfig) -> DsResult<TemporalDataSource> {
        TemporalDataSource::with_backend(Arc::new(InMemoryBackend::new()), config)
    }

    pub fn with_backend(backend: Arc<dyn StorageBackend>, config: StoreConfig) -> DsResult<TemporalDataSource> {
        let revision_cutoff = config.revision_cutoff()?;
        let id_gen = IdGenerator::new(config.machine, config.pid);
        Ok(TemporalDataSource { backend, id_gen, cache: DatasetCache::new(), config, revision_cutoff })
    }

    fn effective_read_only(&self) -> bool {
        self.config.read_only || self.revision_cutoff.is_some()
    }

    fn store_record(&self, record: &Record) -> DsResult<()> {
        let composite_key = CompositeKey::build(&record.key, record.dataset, record.id);
        self.backend.append(&record.class_tag, composite_key, record.id, encode_record(record))
    }

    /// Newest version of `(key, dataset)` satisfying the revision cutoff, ignoring the
    /// lookup-list and imports-cutoff rules — used both as the per-dataset probe inside
    /// `winner_for_key` and directly by `dataset_detail`, which must not recurse back
    /// into the visibility machinery it is itself computing inputs for.
    fn fetch_newest_in_dataset(&self, class_tag: &str, key: &str, dataset: TemporalId) -> DsResult<Option<Record>> {
        let prefix = CompositeKey::prefix_for_key_dataset(key, dataset);
        for (_, doc) in self.backend.scan_prefix(class_tag, &prefix)? {
            let record = decode_record(&doc)?;
            if let Some(cutoff) = self.revision_cutoff {
                if record.id >= cutoff {
                    continue;
                }
            }
            return Ok(Some(record));
        }
        Ok(None)
    }

    fn dataset_detail(&self, dataset: TemporalId) -> DsResult<Option<DataSetDetail>> {
        match self.fetch_newest_in_dataset(CLASS_DATASET_DETAIL, &dataset.to_hex(), TemporalId::EMPTY)? {
            None => Ok(None),
            Some(record) => {
                let value = record.payload.as_data().cloned().unwrap_or(serde_json::Value::Null);
                let detail: DataSetDetail =
                    serde_json::from_value(value).map_err(|e| DatastoreError::Unavailable(e.to_string()))?;
                Ok(Some(detail))
            }
        }
    }

    /// For every dataset `d` in `lookup_list` with an `imports_cutoff_time`, maps `d` to
    /// `(cutoff, build_lookup_list(d) \ {d})` — the set of datasets an import from `d`
    /// reaches, excluding `d` itself: the cutoff on `d` never hides records written
    /// in `d` directly, only ones reached through importing another dataset.
    fn cutoff_map(&self, lookup_list: &HashSet<TemporalId>) -> DsResult<HashMap<TemporalId, (TemporalId, HashSet<TemporalId>)>> {
        let mut map = HashMap::new();
        for &d in lookup_list {
            if let Some(detail) = self.dataset_detail(d)? {
                if let Some(cutoff) = detail.imports_cutoff_time {
                    let mut imports = (*self.cache.build_lookup_list(d, self)?).clone();
                    imports.remove(&d);
                    map.insert(d, (cutoff, imports));
                }
            }
        }
        Ok(map)
    }

    fn winner_for_key(
        &self,
        class_tag: &str,
        key: &str,
        lookup_list: &HashSet<TemporalId>,
        cutoff_map: &HashMap<TemporalId, (TemporalId, HashSet<TemporalId>)>,
    ) -> DsResult<Option<Record>> {
        let mut best: Option<Record> = None;
        for &d in lookup_list {
            let Some(record) = self.fetch_newest_in_dataset(class_tag, key, d)? else {
                continue;
            };
            let excluded = cutoff_map
                .values()
                .any(|(cutoff, imports)| imports.contains(&d) && record.id >= *cutoff);
            if excluded {
                continue;
            }
            if best.as_ref().map_or(true, |b| record.id > b.id) {
                best = Some(record);
            }
        }
        Ok(best)
    }

    fn resolve_scope(&self, class_tag: &str, load_from: TemporalId) -> TemporalId {
        // Root-only classes (DataSource, DbName, DbServer, DataSet) must be resolvable
        // before any lookup list can even be computed, so they are always read from the
        // root dataset regardless of the caller's `load_from`.
        if is_root_only_class(class_tag) {
            TemporalId::EMPTY
        } else {
            load_from
        }
    }
}

impl DataSetLoader for TemporalDataSource {
    fn load_dataset(&self, id: TemporalId) -> DsResult<Option<DataSet>> {
        let Some(doc) = self.backend.get_by_id(CLASS_DATASET, id)? else {
            return Ok(None);
        };
        let record = decode_record(&doc)?;
        if !record.dataset.is_empty() {
            return Err(DatastoreError::DataSetNotInRoot(id));
        }
        let value = record
            .payload
            .as_data()
            .cloned()
            .ok_or_else(|| DatastoreError::WrongType(CLASS_DATASET.to_owned()))?;
        let dataset: DataSet = serde_json::from_value(value).map_err(|e| DatastoreError::Unavailable(e.to_string()))?;
        Ok(Some(dataset))
    }
}

impl DataSource for TemporalDataSource {
    #[instrument(skip(self, payload, cancel), fields(dataset = %save_to))]
    fn save(
        &self,
        class_tag: &str,
        key: &str,
        payload: serde_json::Value,
        save_to: TemporalId,
        cancel: &CancelToken,
    ) -> DsResult<TemporalId> {
        cancel.check()?;
        if self.effective_read_only() {
            return Err(DatastoreError::ReadOnlyDataSource);
        }
        if is_root_only_class(class_tag) && !save_to.is_empty() {
            return Err(DatastoreError::MustSaveInRoot(class_tag.to_owned()));
        }
        validate_key(key)?;
        let id = self.id_gen.next();
        let record = Record {
            id,
            dataset: save_to,
            key: key.to_owned(),
            class_tag: class_tag.to_owned(),
            payload: Payload::Data(payload),
        };
        self.store_record(&record)?;
        tracing::trace!(id = %id, key, class_tag, "saved record");
        Ok(id)
    }

    fn save_many(
        &self,
        records: Vec<(String, String, serde_json::Value)>,
        save_to: TemporalId,
        cancel: &CancelToken,
    ) -> DsResult<Vec<TemporalId>> {
        records
            .into_iter()
            .map(|(class_tag, key, payload)| self.save(&class_tag, &key, payload, save_to, cancel))
            .collect()
    }

    #[instrument(skip(self, cancel), fields(dataset = %delete_in))]
    fn delete(&self, class_tag: &str, key: &str, delete_in: TemporalId, cancel: &CancelToken) -> DsResult<TemporalId> {
        cancel.check()?;
        if self.effective_read_only() {
            return Err(DatastoreError::ReadOnlyDataSource);
        }
        validate_key(key)?;
        let id = self.id_gen.next();
        let record = Record { id, dataset: delete_in, key: key.to_owned(), class_tag: class_tag.to_owned(), payload: Payload::Delete };
        self.store_record(&record)?;
        tracing::trace!(id = %id, key, class_tag, "wrote tombstone");
        Ok(id)
    }

    #[instrument(skip(self, cancel), fields(dataset = %load_from))]
    fn load_or_null(&self, class_tag: &str, key: &str, load_from: TemporalId, cancel: &CancelToken) -> DsResult<Option<Record>> {
        cancel.check()?;
        let scope = self.resolve_scope(class_tag, load_from);
        if self.config.non_temporal {
            let winner = self.fetch_newest_in_dataset(class_tag, key, scope)?;
            return Ok(winner.filter(|r| !r.payload.is_delete()));
        }
        let lookup_list = self.cache.build_lookup_list(scope, self)?;
        let cutoff_map = self.cutoff_map(&lookup_list)?;
        let winner = self.winner_for_key(class_tag, key, &lookup_list, &cutoff_map)?;
        Ok(winner.filter(|r| !r.payload.is_delete()))
    }

    fn load_by_id(&self, class_tag: &str, id: TemporalId, cancel: &CancelToken) -> DsResult<Option<Record>> {
        cancel.check()?;
        // `StorageBackend::get_by_id` is scoped to `class_tag`'s own tree, and `append`
        // only ever stores a record under its own `class_tag`, so any document returned
        // here structurally already satisfies `record.class_tag == class_tag` — there is
        // no decoded-class mismatch left for this method to guard against.
        match self.backend.get_by_id(class_tag, id)? {
            None => Ok(None),
            Some(doc) => Ok(Some(decode_record(&doc)?)),
        }
    }

    fn query(&self, class_tag: &str, load_from: TemporalId, query: Query, cancel: &CancelToken) -> DsResult<Vec<Record>> {
        cancel.check()?;
        let scope = self.resolve_scope(class_tag, load_from);
        let lookup_list = if self.config.non_temporal {
            let mut only_scope = HashSet::new();
            only_scope.insert(scope);
            only_scope
        } else {
            (*self.cache.build_lookup_list(scope, self)?).clone()
        };
        let cutoff_map = if self.config.non_temporal { HashMap::new() } else { self.cutoff_map(&lookup_list)? };

        let mut keys: HashSet<String> = HashSet::new();
        for doc in self.backend.all_documents(class_tag)? {
            cancel.check()?;
            let record = decode_record(&doc)?;
            if lookup_list.contains(&record.dataset) {
                keys.insert(record.key);
            }
        }

        let mut winners = Vec::new();
        for key in keys {
            cancel.check()?;
            let winner = if self.config.non_temporal {
                self.fetch_newest_in_dataset(class_tag, &key, scope)?
            } else {
                self.winner_for_key(class_tag, &key, &lookup_list, &cutoff_map)?
            };
            let Some(record) = winner else {
                continue;
            };
            if record.payload.is_delete() {
                continue;
            }
            if let Some(predicate) = query.predicate() {
                if !eval_predicate(predicate, &record) {
                    continue;
                }
            }
            winners.push(record);
        }

        match query.order() {
            Some(OrderBy::IdAsc) => winners.sort_by_key(|r| r.id),
            Some(OrderBy::IdDesc) => {
                winners.sort_by_key(|r| r.id);
                winners.reverse();
            }
            None => {}
        }
        Ok(winners)
    }

    fn create_dataset(&self, name: &str, parents: Vec<TemporalId>, save_to: TemporalId, cancel: &CancelToken) -> DsResult<TemporalId> {
        cancel.check()?;
        if self.effective_read_only() {
            return Err(DatastoreError::ReadOnlyDataSource);
        }
        if !save_to.is_empty() {
            return Err(DatastoreError::MustSaveInRoot(CLASS_DATASET.to_owned()));
        }
        validate_key(name)?;
        let id = self.id_gen.next();
        for &parent in &parents {
            if parent == id {
                return Err(DatastoreError::SelfParent(id));
            }
            if self.load_dataset(parent)?.is_none() {
                return Err(DatastoreError::DataSetNotFound(parent.to_hex()));
            }
        }
        let dataset = DataSet { id, name: name.to_owned(), parents };
        let payload = serde_json::to_value(&dataset).map_err(|e| DatastoreError::Unavailable(e.to_string()))?;
        let record = Record { id, dataset: TemporalId::EMPTY, key: name.to_owned(), class_tag: CLASS_DATASET.to_owned(), payload: Payload::Data(payload) };
        self.store_record(&record)?;
        self.cache.remember_id(TemporalId::EMPTY, name, id);
        Ok(id)
    }

    fn build_lookup_list(&self, ds_id: TemporalId, cancel: &CancelToken) -> DsResult<Arc<HashSet<TemporalId>>> {
        cancel.check()?;
        self.cache.build_lookup_list(ds_id, self)
    }

    fn get_data_set_or_empty(&self, name: &str, scope: TemporalId, cancel: &CancelToken) -> DsResult<TemporalId> {
        cancel.check()?;
        if let Some(id) = self.cache.cached_id(TemporalId::EMPTY, name) {
            return Ok(id);
        }
        match self.load_or_null(CLASS_DATASET, name, scope, cancel)? {
            Some(record) => {
                self.cache.remember_id(TemporalId::EMPTY, name, record.id);
                let _ = self.cache.build_lookup_list(record.id, self)?;
                Ok(record.id)
            }
            None => Ok(TemporalId::EMPTY),
        }
    }

    fn get_data_set(&self, name: &str, scope: TemporalId, cancel: &CancelToken) -> DsResult<TemporalId> {
        let id = self.get_data_set_or_empty(name, scope, cancel)?;
        if id.is_empty() {
            return Err(DatastoreError::DataSetNotFound(name.to_owned()));
        }
        Ok(id)
    }

    fn create_common(&self, cancel: &CancelToken) -> DsResult<TemporalId> {
        self.create_dataset("Common", Vec::new(), TemporalId::EMPTY, cancel)
    }

    fn clear_dataset_cache(&self) {
        self.cache.clear();
    }

    fn delete_db(&self) -> DsResult<()> {
        self.backend.drop_all()?;
        self.cache.clear();
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.effective_read_only()
    }
}
