use chronostore_primitives::TemporalId;
use serde::{Deserialize, Serialize};

/// `{id, name, parents}`. A dataset may not list itself as a parent, directly or
/// transitively (enforced by `create_dataset`, not by this struct).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub id: TemporalId,
    pub name: String,
    pub parents: Vec<TemporalId>,
}

/// Per-dataset overrides, attached by `dataset_id` rather than by name so that the detail
/// applies to one specific dataset record, not to every dataset that shares its name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSetDetail {
    pub dataset_id: TemporalId,
    pub read_only: Option<bool>,
    pub imports_cutoff_time: Option<TemporalId>,
}
