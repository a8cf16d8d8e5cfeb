use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How ready tasks are handed to the executor.
///
/// - `Sequential`: one task in flight at a time, in declared order.
/// - `Parallel`: every ready task is dispatched at once, bounded by the
///   engine's `max_concurrency` (default behaviour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPolicy {
    Sequential,
    Parallel,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        DispatchPolicy::Parallel
    }
}

impl FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(DispatchPolicy::Sequential),
            "parallel" => Ok(DispatchPolicy::Parallel),
            other => Err(format!(
                "invalid dispatch policy: {other} (expected \"sequential\" or \"parallel\")"
            )),
        }
    }
}

/// Serde helpers for durations carried as integer milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => s.serialize_some(&(d.as_millis() as u64)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
            Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
        }
    }
}
