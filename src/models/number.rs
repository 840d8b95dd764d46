// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lenient number decoding for stored distances.
//!
//! Documents written by older clients may hold distances as strings, nulls,
//! or garbage. Anything that is not a finite number decodes as `0.0`.

use serde::de::{self, Deserializer, Visitor};
use std::fmt;

struct LenientKm;

impl<'de> Visitor<'de> for LenientKm {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a distance in kilometres")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(finite_or_zero(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        Ok(v.trim().parse::<f64>().map(finite_or_zero).unwrap_or(0.0))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(LenientKm)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<f64, A::Error> {
        while seq.next_element::<de::IgnoredAny>()?.is_some() {}
        Ok(0.0)
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<f64, A::Error> {
        while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
        Ok(0.0)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Deserialize a distance, coercing anything non-numeric to `0.0`.
pub(crate) fn lenient_km<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientKm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient_km")]
        km: f64,
    }

    fn km(json: &str) -> f64 {
        serde_json::from_str::<Holder>(json).unwrap().km
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(km(r#"{"km": 4.5}"#), 4.5);
        assert_eq!(km(r#"{"km": 12}"#), 12.0);
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        assert_eq!(km(r#"{"km": " 7.25 "}"#), 7.25);
    }

    #[test]
    fn test_garbage_coerces_to_zero() {
        assert_eq!(km(r#"{"km": "abc"}"#), 0.0);
        assert_eq!(km(r#"{"km": null}"#), 0.0);
        assert_eq!(km(r#"{"km": true}"#), 0.0);
        assert_eq!(km(r#"{"km": [1, 2]}"#), 0.0);
        assert_eq!(km(r#"{"km": {"a": 1}}"#), 0.0);
        assert_eq!(km(r#"{}"#), 0.0);
    }
}
