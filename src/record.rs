use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ProductivityError;

/// Record identifier. Assigned from the wall clock in milliseconds.
pub type RecordId = i64;

/// A record shape that can live in a [`crate::Collection`].
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Field set supplied to `add`, without an id.
    type Draft;
    /// Per-field optional overrides supplied to `update`.
    type Patch;

    /// Storage key of the collection holding this record type.
    const KEY: &'static str;
    /// Human-readable kind, used in messages.
    const KIND: &'static str;

    fn id(&self) -> RecordId;

    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;

    /// Shallow merge: fields present in `patch` win, absent ones are retained.
    fn apply_patch(&mut self, patch: Self::Patch);
}

/// Source of fresh record ids.
pub trait IdSource {
    fn next_id(&mut self) -> RecordId;
}

/// Wall-clock milliseconds. Two calls within the same millisecond collide.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampIds;

impl IdSource for TimestampIds {
    fn next_id(&mut self) -> RecordId {
        Utc::now().timestamp_millis()
    }
}

/// Deterministic counter, mostly for tests and scripted imports.
#[derive(Debug, Clone, Copy)]
pub struct SequentialIds {
    next: RecordId,
}

impl SequentialIds {
    pub fn starting_at(first: RecordId) -> Self {
        Self { next: first }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> RecordId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Presence check used by drafts and patches.
pub fn require(field: &'static str, value: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        Err(ProductivityError::MissingField(field))
    } else {
        Ok(())
    }
}

/// `value` when it is present and non-empty, `fallback` otherwise.
pub fn or_placeholder<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

/// Trims an optional form value, mapping blank input to `None`.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn require_if_present(field: &'static str, value: Option<&str>) -> crate::Result<()> {
    match value {
        Some(v) => require(field, v),
        None => Ok(()),
    }
}

/// Ids written either as JSON numbers or as numeric strings.
///
/// Older front ends stored foreign references as the string value of a form
/// field, so both spellings have to resolve to the same id.
pub(crate) mod lenient_id {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};

    use super::RecordId;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<RecordId>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer id, a numeric string, or null")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(IdVisitor)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            RecordId::try_from(v)
                .map(Some)
                .map_err(|_| E::custom(format!("id {} out of range", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                Ok(Some(v as RecordId))
            } else {
                Err(E::custom(format!("id {} is not an integer", v)))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<RecordId>()
                .map(Some)
                .map_err(|_| E::custom(format!("'{}' is not a numeric id", v)))
        }
    }

    /// Required id. A null or empty id reads as `0`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<RecordId, D::Error> {
        Ok(d.deserialize_any(IdVisitor)?.unwrap_or_default())
    }

    /// Nullable reference to a record in another collection.
    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<RecordId>, D::Error> {
            d.deserialize_any(IdVisitor)
        }
    }
}

/// Text fields as older data wrote them: `null`, a bare number or a boolean all
/// read as text instead of failing the whole record.
pub(crate) mod lenient_text {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Required text. `null` reads as `""`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(text(Value::deserialize(d)?).unwrap_or_default())
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
            Ok(text(Value::deserialize(d)?))
        }
    }
}

/// Nested lists where `null` means empty.
pub(crate) mod lenient_list {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
    }
}
