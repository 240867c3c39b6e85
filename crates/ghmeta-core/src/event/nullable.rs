//! `null` explícito como valor cero.
//!
//! `#[serde(default)]` sólo cubre campos ausentes; GitHub además manda `null`
//! en campos que normalmente traen texto o números (p. ej. `commit_id` de una
//! review cuyo commit ya no existe).
use serde::{Deserialize, Deserializer};

pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where D: Deserializer<'de>,
          T: Deserialize<'de> + Default
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
