use std::cmp::Ordering;

use chronostore_datastore::{Predicate, Record};
use chronostore_primitives::TemporalId;
use serde_json::Value;

/// Lowers a [`Predicate`] against a decoded record's payload. `_id` is handled specially,
/// comparing against the record's own id rather than a payload field; every other field
/// name is looked up inside the payload's top-level JSON object.
pub fn eval_predicate(predicate: &Predicate, record: &Record) -> bool {
    match predicate {
        Predicate::And(predicates) => predicates.iter().all(|p| eval_predicate(p, record)),
        Predicate::Eq(field, expected) => field_value(record, field).as_ref() == Some(expected),
        Predicate::In(field, candidates) => field_value(record, field).map_or(false, |v| candidates.contains(&v)),
        Predicate::Lt(field, other) => compare(record, field, other) == Some(Ordering::Less),
        Predicate::Gt(field, other) => compare(record, field, other) == Some(Ordering::Greater),
    }
}

fn field_value(record: &Record, field: &str) -> Option<Value> {
    if field == "_id" {
        return Some(Value::String(record.id.to_hex()));
    }
    record.payload.as_data().and_then(|v| v.get(field)).cloned()
}

fn compare(record: &Record, field: &str, other: &Value) -> Option<Ordering> {
    if field == "_id" {
        let other_id = other.as_str().and_then(|s| TemporalId::parse_hex(s).ok())?;
        return Some(record.id.cmp(&other_id));
    }
    let value = record.payload.as_data()?.get(field)?;
    value.as_f64()?.partial_cmp(&other.as_f64()?)
}
