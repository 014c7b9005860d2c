use chronostore_primitives::TemporalId;

pub const CLASS_DATA_SOURCE: &str = "DataSource";
pub const CLASS_DB_NAME: &str = "DbName";
pub const CLASS_DB_SERVER: &str = "DbServer";
pub const CLASS_DATASET: &str = "DataSet";
pub const CLASS_DATASET_DETAIL: &str = "DataSetDetail";

/// The four record kinds that may only ever be saved to the root dataset (`Empty`).
///
/// `DataSetDetail` is deliberately excluded: it is attached by dataset id rather than by
/// name, and nothing enforces a save location for it the way it does for these four (see
/// the dataset-detail resolution recorded in DESIGN.md).
const ROOT_ONLY_CLASSES: [&str; 4] = [CLASS_DATA_SOURCE, CLASS_DB_NAME, CLASS_DB_SERVER, CLASS_DATASET];

pub fn is_root_only_class(class_tag: &str) -> bool {
    ROOT_ONLY_CLASSES.contains(&class_tag)
}

/// A record's payload: either application data, or a [`Payload::Delete`] tombstone.
///
/// A `Delete` payload carries no data of its own; its presence as the newest version of
/// `(key, dataset)` masks every older version of that key in that dataset and its
/// descendants (see `load_or_null` in `chronostore-core`).
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Data(serde_json::Value),
    Delete,
}

impl Payload {
    pub fn is_delete(&self) -> bool {
        matches!(self, Payload::Delete)
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Data(v) => Some(v),
            Payload::Delete => None,
        }
    }
}

/// An append-only versioned record.
///
/// `class_tag` identifies the concrete record class for polymorphic decoding; it is never
/// inferred from the payload shape. A record is root-dataset-only when `dataset` is
/// [`TemporalId::EMPTY`] and `class_tag` is one of the four kinds named in
/// [`is_root_only_class`].
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id: TemporalId,
    pub dataset: TemporalId,
    pub key: String,
    pub class_tag: String,
    pub payload: Payload,
}

impl Record {
    pub fn is_root_only(&self) -> bool {
        is_root_only_class(&self.class_tag)
    }
}
