//! Temporal identifiers: a 12-byte, chronologically-ordered id used as both
//! primary key and logical clock throughout chronostore.

mod id;

pub use id::{IdError, IdGenerator, TemporalId};
