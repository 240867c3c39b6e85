//! Deserialización tolerante de timestamps del payload.
//!
//! GitHub mezcla formatos: los repositorios de algunos eventos traen
//! `created_at`/`pushed_at` como segundos Unix y el resto como RFC 3339.
//! Ambos (y `null`) se aceptan.
use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer, Visitor};
use std::fmt;

pub fn flexible<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where D: Deserializer<'de>
{
    deserializer.deserialize_any(TimestampVisitor)
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Option<DateTime<Utc>>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an RFC 3339 string, unix seconds or null")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(TimestampVisitor)
    }

    fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Self::Value, E> {
        Utc.timestamp_opt(secs, 0)
           .single()
           .map(Some)
           .ok_or_else(|| E::custom(format!("timestamp out of range: {secs}")))
    }

    fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Self::Value, E> {
        let secs = i64::try_from(secs).map_err(|_| E::custom(format!("timestamp out of range: {secs}")))?;
        self.visit_i64(secs)
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
        DateTime::parse_from_rfc3339(s).map(|dt| Some(dt.with_timezone(&Utc)))
                                       .map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(default, deserialize_with = "super::flexible")]
        at: Option<DateTime<Utc>>,
    }

    fn parse(json: &str) -> Option<DateTime<Utc>> {
        serde_json::from_str::<Stamped>(json).unwrap().at
    }

    #[test]
    fn accepts_rfc3339_unix_seconds_and_null() {
        let iso = parse(r#"{"at":"2019-05-15T15:20:33Z"}"#).unwrap();
        let unix = parse(r#"{"at":1557933633}"#).unwrap();
        assert_eq!(iso, unix);
        assert_eq!(parse(r#"{"at":null}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }
}
