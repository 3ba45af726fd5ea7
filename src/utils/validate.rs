//! Input checks that run before any storage access.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::AppError;
use crate::model::attendance::QR_MARKER;

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_roll_number(value: &str) -> bool {
    is_digits(value, 7)
}

pub fn is_parent_contact(value: &str) -> bool {
    is_digits(value, 10)
}

/// Blank is reported as missing; anything else must be exactly seven ASCII
/// digits as sent, surrounding whitespace included.
pub fn roll_number<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, AppError> {
    let roll = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::invalid(field, "Student roll number is required"))?;

    if !is_roll_number(roll) {
        return Err(AppError::invalid(
            field,
            "Roll number must be exactly 7 digits (e.g., 2023001)",
        ));
    }
    Ok(roll)
}

/// `YYYY-MM-DD`, and a real calendar day.
pub fn date(value: &str) -> Result<NaiveDate, AppError> {
    let shaped = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });

    shaped
        .then(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .flatten()
        .ok_or_else(|| AppError::invalid("date", "Invalid date format. Use YYYY-MM-DD format."))
}

/// A check-in QR must carry the ClassFlow marker and name a class and a room.
pub fn qr_payload(value: &Value) -> Result<(), AppError> {
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    if text("type") != Some(QR_MARKER) {
        return Err(AppError::invalid(
            "qrData",
            "Invalid QR code. Please scan a valid ClassFlow attendance QR code.",
        ));
    }
    if text("class").is_none() || text("room").is_none() {
        return Err(AppError::invalid(
            "qrData",
            "QR data must be valid ClassFlow attendance data with class and room",
        ));
    }
    Ok(())
}
