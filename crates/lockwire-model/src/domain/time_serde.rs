//! `SystemTime` as whole seconds since the Unix epoch, via `time::serde::timestamp`.

use std::time::SystemTime;

use serde::{Deserializer, Serializer};
use time::{OffsetDateTime, serde::timestamp};

pub fn serialize<S>(at: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    timestamp::serialize(&OffsetDateTime::from(*at), serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
where
    D: Deserializer<'de>,
{
    timestamp::deserialize(deserializer).map(SystemTime::from)
}
