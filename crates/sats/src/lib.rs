//! Key and temporal value encodings for chronostore records.
//!
//! A [`Key`] is an ordered list of [`KeyElement`]s with a single canonical string form
//! (elements joined by `;`). `Double` has no `KeyElement` variant: it is forbidden in keys
//! by construction rather than by a runtime check.

mod error;
mod key;
mod temporal;

pub use error::KeyError;
pub use key::{Key, KeyElement, KeyElementKind};
pub use temporal::{LocalDate, LocalDateTime, LocalMinute, LocalTime};
