//! Due-date parsing and wire encoding.
//!
//! # Responsibility
//! - Parse user-entered due dates (`datetime-local` style or RFC 3339).
//! - Encode/decode the persisted `date` field as an ISO-8601 string or `null`.
//!
//! # Invariants
//! - Encoding always emits UTC with a `Z` suffix through `WIRE_FORMAT`, and
//!   decoding accepts `WIRE_FORMAT` for every year chrono can represent.
//! - Zone-less inputs are wall-clock times in the caller's zone (the local
//!   zone unless one is passed explicitly).
//! - An ambiguous zone-less time resolves to its earlier instant; one skipped
//!   by a DST jump is read with the offset in force around the jump.

use crate::model::task::TaskValidationError;
use chrono::{DateTime, Local, NaiveDateTime, Offset, TimeZone, Utc};

/// Point in time a task is due.
pub type DueAt = DateTime<Utc>;

/// Layout of a stored `date`. `%Y` signs years outside 0000..=9999 in both
/// directions, which plain RFC 3339 cannot express.
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Zone-less layouts produced by `datetime-local` inputs and older stores.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a raw due-date input, reading zone-less values as local time.
///
/// Blank input means "no due date" and yields `Ok(None)`.
///
/// # Errors
/// - `TaskValidationError::InvalidDueDate` when the input is not blank and
///   matches no supported layout.
pub fn parse_due_input(input: &str) -> Result<Option<DueAt>, TaskValidationError> {
    parse_due_input_in(input, &Local)
}

/// Same as [`parse_due_input`], reading zone-less values in `zone`.
pub fn parse_due_input_in<Tz: TimeZone>(
    input: &str,
    zone: &Tz,
) -> Result<Option<DueAt>, TaskValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    parse_due_at_in(trimmed, zone)
        .map(Some)
        .ok_or_else(|| TaskValidationError::InvalidDueDate {
            input: trimmed.to_string(),
        })
}

/// Parses one timestamp in any supported layout; zone-less values are local.
pub fn parse_due_at(value: &str) -> Option<DueAt> {
    parse_due_at_in(value, &Local)
}

/// Parses one timestamp, reading zone-less values in `zone`.
pub fn parse_due_at_in<Tz: TimeZone>(value: &str, zone: &Tz) -> Option<DueAt> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, WIRE_FORMAT) {
        return Some(naive.and_utc());
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;
    match zone.from_local_datetime(&naive).earliest() {
        Some(resolved) => Some(resolved.with_timezone(&Utc)),
        None => {
            let offset = zone.offset_from_utc_datetime(&naive).fix();
            offset
                .from_local_datetime(&naive)
                .single()
                .map(|resolved| resolved.with_timezone(&Utc))
        }
    }
}

/// Formats a due date for storage and display.
pub fn format_due_at(due_at: &DueAt) -> String {
    due_at.format(WIRE_FORMAT).to_string()
}

/// Serde adapter for the persisted `date` field.
pub(crate) mod wire {
    use super::{format_due_at, parse_due_at, DueAt};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DueAt>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(due_at) => serializer.serialize_some(&format_due_at(due_at)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DueAt>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        parse_due_at(trimmed)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid due date `{trimmed}`")))
    }
}
