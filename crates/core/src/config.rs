use chronostore_datastore::DatastoreError;
use chronostore_primitives::TemporalId;
use chrono::{DateTime, Utc};

/// Explicit construction-time configuration for one `TemporalDataSource` instance.
///
/// Built by callers (the CLI, from flags/environment; tests, from literals) and passed to
/// the constructor. There is no process-wide mutable singleton.
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    pub read_only: bool,
    pub revised_before: Option<DateTime<Utc>>,
    pub revised_before_id: Option<TemporalId>,
    pub non_temporal: bool,
    pub machine: [u8; 3],
    pub pid: u16,
}

impl StoreConfig {
    /// Derives the single revision cutoff id from whichever of `revised_before` /
    /// `revised_before_id` is set. Fails with `ConfigConflict` when both are set.
    pub fn revision_cutoff(&self) -> Result<Option<TemporalId>, DatastoreError> {
        match (self.revised_before, self.revised_before_id) {
            (None, None) => Ok(None),
            (Some(before), None) => Ok(Some(TemporalId::least_with_secs(before.timestamp() as u32))),
            (None, Some(id)) => Ok(Some(id)),
            (Some(_), Some(_)) => Err(DatastoreError::ConfigConflict),
        }
    }
}
