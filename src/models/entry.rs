// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Logged distance entries and their validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::number::lenient_km;
use crate::error::{AppError, Result};
use crate::time_utils::{format_date_iso, parse_date_iso};

/// One logged activity record, stored inside its member's document.
///
/// Entries are immutable once created; they are only ever removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Entry {
    /// Opaque identifier, stable for the entry's lifetime
    #[serde(default)]
    pub id: String,
    /// Distance in kilometres (`km` in older documents)
    #[serde(
        rename = "distanceKm",
        alias = "km",
        default,
        deserialize_with = "lenient_km"
    )]
    pub distance_km: f64,
    /// Calendar date (`YYYY-MM-DD`)
    #[serde(rename = "dateISO", default)]
    pub date_iso: String,
    /// Optional free-text annotation, never an empty string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Raw distance as typed by a user: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DistanceInput {
    Number(f64),
    Text(String),
}

impl DistanceInput {
    /// Numeric value, if the input is a finite number.
    fn as_km(&self) -> Option<f64> {
        let value = match self {
            DistanceInput::Number(n) => *n,
            DistanceInput::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for DistanceInput {
    fn from(value: f64) -> Self {
        DistanceInput::Number(value)
    }
}

/// Validate raw input and build a new entry.
///
/// `date` defaults to `today` when absent or blank. `note` is trimmed and an
/// empty note is stored as absent.
pub fn create_entry(
    distance: Option<&DistanceInput>,
    date: Option<&str>,
    note: Option<&str>,
    today: NaiveDate,
) -> Result<Entry> {
    let distance_km = match distance.map(DistanceInput::as_km) {
        None => return Err(AppError::InvalidDistance("distance is required".to_string())),
        Some(None) => {
            return Err(AppError::InvalidDistance(
                "distance must be a number".to_string(),
            ))
        }
        Some(Some(km)) if km <= 0.0 => {
            return Err(AppError::InvalidDistance(
                "distance must be greater than 0".to_string(),
            ))
        }
        Some(Some(km)) => km,
    };

    let date_iso = match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => {
            let parsed = parse_date_iso(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid date '{}': expected YYYY-MM-DD", raw))
            })?;
            format_date_iso(parsed)
        }
        None => format_date_iso(today),
    };

    let note = note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(Entry {
        id: super::new_id(),
        distance_km,
        date_iso,
        note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_create_entry_basic() {
        let entry = create_entry(
            Some(&DistanceInput::Number(5.5)),
            Some("2024-01-01"),
            Some("  evening walk "),
            today(),
        )
        .unwrap();

        assert_eq!(entry.distance_km, 5.5);
        assert_eq!(entry.date_iso, "2024-01-01");
        assert_eq!(entry.note.as_deref(), Some("evening walk"));
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        for km in [0.0, -2.0] {
            let err = create_entry(Some(&km.into()), None, None, today()).unwrap_err();
            assert!(matches!(err, AppError::InvalidDistance(_)));
        }
    }

    #[test]
    fn test_missing_and_non_numeric_rejected() {
        let err = create_entry(None, None, None, today()).unwrap_err();
        assert!(matches!(err, AppError::InvalidDistance(_)));

        let text = DistanceInput::Text("far".to_string());
        let err = create_entry(Some(&text), None, None, today()).unwrap_err();
        assert!(matches!(err, AppError::InvalidDistance(_)));

        let nan = DistanceInput::Number(f64::NAN);
        let err = create_entry(Some(&nan), None, None, today()).unwrap_err();
        assert!(matches!(err, AppError::InvalidDistance(_)));
    }

    #[test]
    fn test_numeric_text_accepted() {
        let text = DistanceInput::Text("3.2".to_string());
        let entry = create_entry(Some(&text), None, None, today()).unwrap();
        assert_eq!(entry.distance_km, 3.2);
    }

    #[test]
    fn test_blank_date_defaults_to_today() {
        let entry = create_entry(Some(&1.0.into()), Some("  "), None, today()).unwrap();
        assert_eq!(entry.date_iso, "2024-03-09");

        let entry = create_entry(Some(&1.0.into()), None, None, today()).unwrap();
        assert_eq!(entry.date_iso, "2024-03-09");
    }

    #[test]
    fn test_malformed_date_rejected() {
        let err = create_entry(Some(&1.0.into()), Some("yesterday"), None, today()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_empty_note_is_absent() {
        let entry = create_entry(Some(&1.0.into()), None, Some("   "), today()).unwrap();
        assert_eq!(entry.note, None);

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = create_entry(Some(&1.0.into()), None, None, today()).unwrap();
        let b = create_entry(Some(&1.0.into()), None, None, today()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_document_shape() {
        let entry: Entry = serde_json::from_str(
            r#"{"id":"a1","distanceKm":2.5,"dateISO":"2024-01-05","note":"hill"}"#,
        )
        .unwrap();
        assert_eq!(entry.distance_km, 2.5);
        assert_eq!(entry.date_iso, "2024-01-05");

        let legacy: Entry =
            serde_json::from_str(r#"{"id":"b2","km":"4","dateISO":"2024-01-06"}"#).unwrap();
        assert_eq!(legacy.distance_km, 4.0);
        assert_eq!(legacy.note, None);
    }
}
