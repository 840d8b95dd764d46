// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{NaiveDate, Utc};

/// Calendar date format used for entry dates (`YYYY-MM-DD`).
pub const DATE_ISO_FORMAT: &str = "%Y-%m-%d";

/// Current UTC time as epoch milliseconds (document `updatedAt`).
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's UTC calendar date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date_iso(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_ISO_FORMAT).ok()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date_iso(date: NaiveDate) -> String {
    date.format(DATE_ISO_FORMAT).to_string()
}
