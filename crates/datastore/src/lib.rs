//! The abstract data source contract: record and dataset models, the dataset cache, the
//! query builder, layered errors, and the ambient `Context` collaborator.
//!
//! This crate defines *what* a temporal, dataset-layered store looks like from the
//! outside. The concrete engine that implements [`DataSource`] against an embedded
//! storage backend lives in `chronostore-core`.

mod cache;
mod cancel;
mod context;
mod dataset;
mod error;
mod query;
mod record;
mod traits;

pub use cache::{DataSetLoader, DatasetCache};
pub use cancel::CancelToken;
pub use context::Context;
pub use dataset::{DataSet, DataSetDetail};
pub use error::{DatastoreError, Result};
pub use query::{OrderBy, Predicate, Query};
pub use record::{is_root_only_class, Payload, Record, CLASS_DATASET, CLASS_DATASET_DETAIL, CLASS_DATA_SOURCE, CLASS_DB_NAME, CLASS_DB_SERVER};
pub use traits::DataSource;

pub use chronostore_primitives::TemporalId;
pub use chronostore_sats::{Key, KeyElement, KeyElementKind, KeyError};
