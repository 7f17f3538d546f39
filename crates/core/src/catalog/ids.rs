//! Lenient identifier decoding.
//!
//! The catalog backend serializes ids as JSON numbers while other producers
//! use strings. Everything is normalized to `String`.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Object { id: Box<RawId> },
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Integer(n) => n.to_string(),
            RawId::Object { id } => id.into_string(),
        }
    }
}

pub(super) fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(RawId::into_string)
}

pub(super) fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_string))
}

/// Accepts a list of ids or a list of objects carrying an `id` field.
pub(super) fn optional_id_set<'de, D>(deserializer: D) -> Result<Option<BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RawId>>::deserialize(deserializer)?
        .map(|ids| ids.into_iter().map(RawId::into_string).collect()))
}

/// Backend counters may be `null`.
pub(super) fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
