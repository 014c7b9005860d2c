use chronostore_primitives::TemporalId;
use chronostore_sats::KeyError;
use thiserror::Error;

/// Every way a `DataSource` operation can fail. Variant names mirror the semantic failure
/// case each one represents, not arbitrary text.
#[derive(Error, Debug)]
pub enum DatastoreError {
    #[error("data source is read-only")]
    ReadOnlyDataSource,

    #[error("records of class `{0}` must be saved to the root dataset")]
    MustSaveInRoot(String),

    #[error("revised_before and revised_before_id are mutually exclusive")]
    ConfigConflict,

    #[error("dataset `{0}` not found")]
    DataSetNotFound(String),

    #[error("dataset {0} is not declared in the root dataset")]
    DataSetNotInRoot(TemporalId),

    #[error("dataset {0} cannot declare itself as a parent, directly or transitively")]
    SelfParent(TemporalId),

    /// Wraps `KeyError::InvalidKeyElement` / `KeyError::BadFormat` — key/value encoding
    /// failures, nested the same way lower-level table/index/sequence errors nest under
    /// a datastore's top-level error type.
    #[error(transparent)]
    KeyEncoding(#[from] KeyError),

    #[error("record does not satisfy the requested type `{0}`")]
    WrongType(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("operation canceled")]
    Canceled,
}

pub type Result<T> = std::result::Result<T, DatastoreError>;
