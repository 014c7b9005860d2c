//! The concrete, in-memory temporal data source engine.
//!
//! `chronostore-datastore` defines the abstract `DataSource` contract; this crate
//! implements it against an embedded [`StorageBackend`], running the dataset-visibility
//! lookup algorithm that picks the newest live record across a dataset's import chain.

mod backend;
mod codec;
mod config;
mod engine;
mod query_exec;

pub use backend::{CompositeKey, InMemoryBackend, StorageBackend};
pub use codec::{decode_record, encode_record};
pub use config::StoreConfig;
pub use engine::TemporalDataSource;
