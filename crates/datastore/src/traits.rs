use std::collections::HashSet;
use std::sync::Arc;

use chronostore_primitives::TemporalId;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::query::Query;
use crate::record::Record;

/// The public surface of a temporal, dataset-layered record store.
///
/// Implementations own id assignment, the dataset cache, and the revision-time
/// constraint; callers never construct a `TemporalId` themselves.
///
/// Every method below may block on the underlying storage and takes a [`CancelToken`]
/// it must honor at each suspension point it passes through, not only on entry. A
/// canceled call returns `Canceled` without completing its write or returning a result;
/// an id already reserved by the id generator before cancellation was observed is never
/// reused.
pub trait DataSource: Send + Sync {
    /// Assigns a fresh id, sets `dataset = save_to`, and appends the record. Fails with
    /// `ReadOnlyDataSource` or `MustSaveInRoot` before any write takes effect.
    fn save(
        &self,
        class_tag: &str,
        key: &str,
        payload: serde_json::Value,
        save_to: TemporalId,
        cancel: &CancelToken,
    ) -> Result<TemporalId>;

    /// Same as repeated `save` calls, but the assigned ids are strictly increasing in the
    /// order the records were supplied.
    fn save_many(
        &self,
        records: Vec<(String, String, serde_json::Value)>,
        save_to: TemporalId,
        cancel: &CancelToken,
    ) -> Result<Vec<TemporalId>>;

    /// Writes a fresh tombstone for `key` in `delete_in`. No existence check is
    /// performed. Rejected by a read-only data source exactly like `save`.
    fn delete(&self, class_tag: &str, key: &str, delete_in: TemporalId, cancel: &CancelToken) -> Result<TemporalId>;

    /// Resolves the winning version of `key` visible from `load_from`'s lookup list,
    /// honoring the revision cutoff, per-dataset imports cutoff, and tombstone masking.
    /// Returns `Ok(None)` when the winning record is a delete marker.
    fn load_or_null(&self, class_tag: &str, key: &str, load_from: TemporalId, cancel: &CancelToken) -> Result<Option<Record>>;

    /// Loads a record verbatim by id, ignoring lookup list, revision cutoff, and cutoff
    /// rules. `class_tag` scopes which class's records are searched: a record saved
    /// under a different class never matches and the call returns `Ok(None)`, the same
    /// way a lookup by the wrong id does.
    fn load_by_id(&self, class_tag: &str, id: TemporalId, cancel: &CancelToken) -> Result<Option<Record>>;

    /// Returns at most one winning record per key for `class_tag`, filtered by the same
    /// visibility rules as `load_or_null`, in addition to `query`'s own predicate.
    fn query(&self, class_tag: &str, load_from: TemporalId, query: Query, cancel: &CancelToken) -> Result<Vec<Record>>;

    fn create_dataset(&self, name: &str, parents: Vec<TemporalId>, save_to: TemporalId, cancel: &CancelToken) -> Result<TemporalId>;

    /// The transitive set of dataset ids a read from `ds_id` sees: `ds_id` itself, the
    /// root dataset, and every ancestor reachable through `parents`. Exposed on the trait
    /// (rather than kept as an engine-private helper) because callers outside this crate
    /// reason about its exact membership — see the dataset-bootstrap and import-override
    /// scenarios this type exists to make observable.
    fn build_lookup_list(&self, ds_id: TemporalId, cancel: &CancelToken) -> Result<Arc<HashSet<TemporalId>>>;

    /// Returns `TemporalId::EMPTY` when no dataset named `name` exists in `scope`.
    fn get_data_set_or_empty(&self, name: &str, scope: TemporalId, cancel: &CancelToken) -> Result<TemporalId>;

    /// Fails with `DataSetNotFound` when no dataset named `name` exists in `scope`.
    fn get_data_set(&self, name: &str, scope: TemporalId, cancel: &CancelToken) -> Result<TemporalId>;

    /// Shorthand for `create_dataset("Common", [], Empty)`.
    fn create_common(&self, cancel: &CancelToken) -> Result<TemporalId>;

    /// Drops the `clear`-triggered cache state for datasets and their import sets.
    fn clear_dataset_cache(&self);

    /// Hard-reset: drops every document the store holds and forgets every cached
    /// dataset lookup. Used by the test harness.
    fn delete_db(&self) -> Result<()>;

    fn is_read_only(&self) -> bool;
}
