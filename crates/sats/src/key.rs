use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::KeyError;
use crate::temporal::{LocalDate, LocalDateTime, LocalMinute, LocalTime};

/// One atomic value making up a [`Key`]. There is deliberately no `Double` variant: keys
/// forbid floating-point elements by construction rather than by a runtime check.
#[derive(Clone, PartialEq, Debug)]
pub enum KeyElement {
    Str(String),
    Bool(bool),
    I32(i32),
    I64(i64),
    LocalDate(LocalDate),
    LocalTime(LocalTime),
    LocalMinute(LocalMinute),
    LocalDateTime(LocalDateTime),
    Instant(DateTime<Utc>),
    /// The symbolic name of an enum variant.
    Enum(String),
    /// A key, recursively encoded as its own canonical string.
    Key(Box<Key>),
}

impl KeyElement {
    fn encode(&self) -> String {
        match self {
            KeyElement::Str(s) => s.clone(),
            KeyElement::Bool(b) => b.to_string(),
            KeyElement::I32(v) => v.to_string(),
            KeyElement::I64(v) => v.to_string(),
            KeyElement::LocalDate(v) => v.to_iso_int().to_string(),
            KeyElement::LocalTime(v) => v.to_iso_int().to_string(),
            KeyElement::LocalMinute(v) => v.to_iso_int().to_string(),
            KeyElement::LocalDateTime(v) => v.to_iso_int().to_string(),
            KeyElement::Instant(v) => v.timestamp_millis().to_string(),
            KeyElement::Enum(name) => name.clone(),
            KeyElement::Key(inner) => inner.encode(),
        }
    }
}

/// The schema a [`Key`] is parsed against: the declared kind of each element, in order.
///
/// `Key(kinds)` declares a nested key whose own elements have the given kinds; it is the
/// schema-side counterpart of [`KeyElement::Key`].
#[derive(Clone, PartialEq, Debug)]
pub enum KeyElementKind {
    Str,
    Bool,
    I32,
    I64,
    LocalDate,
    LocalTime,
    LocalMinute,
    LocalDateTime,
    Instant,
    Enum,
    Key(Vec<KeyElementKind>),
}

impl KeyElementKind {
    /// Number of `;`-delimited segments this kind consumes when parsing, counting a
    /// nested key's own elements recursively (a nested key is not escaped on the wire, so
    /// its arity must come from the schema, not from the string itself).
    fn segment_count(&self) -> usize {
        match self {
            KeyElementKind::Key(kinds) => kinds.iter().map(KeyElementKind::segment_count).sum(),
            _ => 1,
        }
    }
}

/// A typed, ordered key with a single canonical string form: its elements' encodings
/// joined by `;`. No escaping of `;` is defined, so an element's own encoding must not
/// contain one — nested keys rely on schema-driven arity (see [`KeyElementKind::Key`])
/// rather than delimiter escaping to stay unambiguous when parsed back.
#[derive(Clone, PartialEq, Debug)]
pub struct Key(Vec<KeyElement>);

impl Key {
    /// Builds a key from fully-populated elements.
    pub fn new(elements: Vec<KeyElement>) -> Key {
        Key(elements)
    }

    /// Builds a key from optional elements, failing on the first unset one: an explicit
    /// nil/unset element is an `InvalidKeyElement`, distinct from an empty string (which
    /// is a valid `Str` element).
    pub fn from_options(elements: Vec<Option<KeyElement>>) -> Result<Key, KeyError> {
        let mut out = Vec::with_capacity(elements.len());
        for (position, elem) in elements.into_iter().enumerate() {
            match elem {
                Some(e) => out.push(e),
                None => {
                    return Err(KeyError::InvalidKeyElement {
                        position,
                        reason: "element is unset".to_owned(),
                    })
                }
            }
        }
        Ok(Key(out))
    }

    pub fn elements(&self) -> &[KeyElement] {
        &self.0
    }

    /// Joins each element's encoding with `;`.
    pub fn encode(&self) -> String {
        self.0.iter().map(KeyElement::encode).collect::<Vec<_>>().join(";")
    }

    /// Parses a canonical string against a declared element schema, consuming exactly as
    /// many `;`-delimited segments as the schema's total arity requires.
    pub fn parse(kinds: &[KeyElementKind], s: &str) -> Result<Key, KeyError> {
        let expected: usize = kinds.iter().map(KeyElementKind::segment_count).sum();
        let mut segments: VecDeque<&str> = s.split(';').collect();
        if segments.len() != expected {
            return Err(KeyError::BadFormat(format!(
                "expected {expected} key segments, got {}",
                segments.len()
            )));
        }
        let mut out = Vec::with_capacity(kinds.len());
        for (position, kind) in kinds.iter().enumerate() {
            out.push(parse_element(kind, &mut segments, position)?);
        }
        Ok(Key(out))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn parse_element(
    kind: &KeyElementKind,
    segments: &mut VecDeque<&str>,
    position: usize,
) -> Result<KeyElement, KeyError> {
    let invalid = |reason: &str| KeyError::InvalidKeyElement {
        position,
        reason: reason.to_owned(),
    };
    match kind {
        KeyElementKind::Key(sub_kinds) => {
            let mut sub = Vec::with_capacity(sub_kinds.len());
            for (sub_position, sub_kind) in sub_kinds.iter().enumerate() {
                sub.push(parse_element(sub_kind, segments, sub_position)?);
            }
            Ok(KeyElement::Key(Box::new(Key(sub))))
        }
        _ => {
            let raw = segments.pop_front().ok_or_else(|| invalid("missing segment"))?;
            match kind {
                KeyElementKind::Str => Ok(KeyElement::Str(raw.to_owned())),
                KeyElementKind::Bool => raw
                    .parse::<bool>()
                    .map(KeyElement::Bool)
                    .map_err(|_| KeyError::BadFormat(raw.to_owned())),
                KeyElementKind::I32 => raw
                    .parse::<i32>()
                    .map(KeyElement::I32)
                    .map_err(|_| KeyError::BadFormat(raw.to_owned())),
                KeyElementKind::I64 => raw
                    .parse::<i64>()
                    .map(KeyElement::I64)
                    .map_err(|_| KeyError::BadFormat(raw.to_owned())),
                KeyElementKind::LocalDate => raw
                    .parse::<i32>()
                    .map_err(|_| KeyError::BadFormat(raw.to_owned()))
                    .and_then(LocalDate::from_iso_int)
                    .map(KeyElement::LocalDate),
                KeyElementKind::LocalTime => raw
                    .parse::<i32>()
                    .map_err(|_| KeyError::BadFormat(raw.to_owned()))
                    .and_then(LocalTime::from_iso_int)
                    .map(KeyElement::LocalTime),
                KeyElementKind::LocalMinute => raw
                    .parse::<i32>()
                    .map_err(|_| KeyError::BadFormat(raw.to_owned()))
                    .and_then(LocalMinute::from_iso_int)
                    .map(KeyElement::LocalMinute),
                KeyElementKind::LocalDateTime => raw
                    .parse::<i64>()
                    .map_err(|_| KeyError::BadFormat(raw.to_owned()))
                    .and_then(LocalDateTime::from_iso_int)
                    .map(KeyElement::LocalDateTime),
                KeyElementKind::Instant => raw
                    .parse::<i64>()
                    .map_err(|_| KeyError::BadFormat(raw.to_owned()))
                    .map(|millis| KeyElement::Instant(DateTime::from_timestamp_millis(millis).unwrap_or_default())),
                KeyElementKind::Enum => Ok(KeyElement::Enum(raw.to_owned())),
                KeyElementKind::Key(_) => unreachable!("handled above"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scalar_key(s: &str, i: i32) -> Key {
        Key::new(vec![KeyElement::Str(s.to_owned()), KeyElement::I32(i)])
    }

    #[test]
    fn encode_then_parse_round_trips_for_scalar_elements() {
        let k = scalar_key("widget", 7);
        let kinds = [KeyElementKind::Str, KeyElementKind::I32];
        let parsed = Key::parse(&kinds, &k.encode()).unwrap();
        assert_eq!(parsed, k);
    }

    #[test]
    fn empty_string_element_is_allowed() {
        let k = Key::new(vec![KeyElement::Str(String::new())]);
        assert_eq!(k.encode(), "");
        let parsed = Key::parse(&[KeyElementKind::Str], &k.encode()).unwrap();
        assert_eq!(parsed, k);
    }

    #[test]
    fn unset_element_is_invalid() {
        let err = Key::from_options(vec![Some(KeyElement::I32(1)), None]).unwrap_err();
        assert!(matches!(err, KeyError::InvalidKeyElement { position: 1, .. }));
    }

    #[test]
    fn arity_mismatch_is_bad_format() {
        let kinds = [KeyElementKind::Str, KeyElementKind::I32];
        assert!(Key::parse(&kinds, "only-one").is_err());
    }

    #[test]
    fn nested_key_round_trips_via_schema_arity() {
        let inner = Key::new(vec![KeyElement::Str("a".into()), KeyElement::I32(1)]);
        let outer = Key::new(vec![KeyElement::Key(Box::new(inner)), KeyElement::Str("tail".into())]);
        let kinds = [
            KeyElementKind::Key(vec![KeyElementKind::Str, KeyElementKind::I32]),
            KeyElementKind::Str,
        ];
        let parsed = Key::parse(&kinds, &outer.encode()).unwrap();
        assert_eq!(parsed, outer);
    }

    proptest::proptest! {
        #[test]
        fn str_element_round_trips_when_free_of_the_separator(s in "[^;]{0,40}") {
            let k = Key::new(vec![KeyElement::Str(s.clone())]);
            let parsed = Key::parse(&[KeyElementKind::Str], &k.encode()).unwrap();
            proptest::prop_assert_eq!(parsed.elements()[0].clone(), KeyElement::Str(s));
        }

        #[test]
        fn i32_element_round_trips(v in proptest::prelude::any::<i32>()) {
            let k = Key::new(vec![KeyElement::I32(v)]);
            let parsed = Key::parse(&[KeyElementKind::I32], &k.encode()).unwrap();
            proptest::prop_assert_eq!(parsed.elements()[0].clone(), KeyElement::I32(v));
        }
    }
}
