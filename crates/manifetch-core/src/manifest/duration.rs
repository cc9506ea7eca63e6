//! Serde helpers for durations written as `30s`, `1m30s` or bare seconds.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;
use std::time::Duration;

/// Longest accepted duration: `i64::MAX` nanoseconds, about 292 years.
pub const MAX_DURATION: Duration = Duration::from_nanos(i64::MAX as u64);

fn bounded<E: de::Error>(d: Duration, raw: &dyn fmt::Display) -> Result<Duration, E> {
    if d > MAX_DURATION {
        return Err(E::custom(format!(
            "duration too large: {} (limit is {})",
            raw,
            humantime::format_duration(MAX_DURATION)
        )));
    }
    Ok(d)
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration such as \"30s\" or a number of seconds")
    }

    fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Duration, E> {
        bounded(Duration::from_secs(secs), &secs)
    }

    fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Duration, E> {
        let secs = u64::try_from(secs)
            .map_err(|_| E::custom(format!("negative duration: {}", secs)))?;
        self.visit_u64(secs)
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Duration, E> {
        let d = humantime::parse_duration(s.trim())
            .map_err(|e| E::custom(format!("invalid duration {:?}: {}", s, e)))?;
        bounded(d, &s.trim())
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

/// Same as the parent module for `Option<Duration>`; `null` maps to `None`.
pub mod option {
    use super::DurationVisitor;
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;
    use std::time::Duration;

    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<Duration>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional duration")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(DurationVisitor).map(Some)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(OptionVisitor)
    }
}
