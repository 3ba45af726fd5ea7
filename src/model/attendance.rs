use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Value of the `type` field that identifies a ClassFlow check-in QR code.
pub const QR_MARKER: &str = "CLASSFLOW_ATTENDANCE";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    /// Minute-granular lateness check: 09:15:59 is still on time for a 09:15 cutoff.
    pub fn for_time(time: NaiveTime, cutoff: NaiveTime) -> Self {
        let (hour, minute) = (time.hour(), time.minute());
        if (hour, minute) > (cutoff.hour(), cutoff.minute()) {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[schema(example = "2023001")]
    pub student_roll: String,

    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,

    /// `HH:MM`, 24-hour clock
    #[schema(example = "09:05")]
    pub time: String,

    pub status: AttendanceStatus,

    #[schema(value_type = Object, nullable = true)]
    pub qr_data: Option<serde_json::Value>,

    #[schema(example = "2026-01-01T09:05:12", format = "date-time", value_type = String)]
    pub marked_at: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn new(
        student_roll: &str,
        marked_at: NaiveDateTime,
        status: AttendanceStatus,
        qr_data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            student_roll: student_roll.to_string(),
            date: marked_at.date(),
            time: marked_at.format("%H:%M").to_string(),
            status,
            qr_data,
            marked_at,
        }
    }
}

/// Shape of the QR codes shown in class. Only `type`, `class` and `room` are
/// checked; the whole payload is stored as received.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[schema(example = json!({
    "type": "CLASSFLOW_ATTENDANCE",
    "class": "CS-A Morning",
    "room": "101",
    "faculty": "Dr. Sharma",
    "subject": "Data Structures",
    "timestamp": "2026-01-01T09:00:00.000Z"
}))]
pub struct QrPayload {
    #[serde(rename = "type")]
    pub marker: String,
    pub class: String,
    pub room: String,
    pub faculty: Option<String>,
    pub subject: Option<String>,
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn cutoff_minute_is_still_present() {
        let cutoff = at(9, 15, 0);
        assert_eq!(AttendanceStatus::for_time(at(8, 59, 0), cutoff), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::for_time(at(9, 15, 0), cutoff), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::for_time(at(9, 15, 59), cutoff), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::for_time(at(9, 16, 0), cutoff), AttendanceStatus::Late);
        assert_eq!(AttendanceStatus::for_time(at(14, 0, 0), cutoff), AttendanceStatus::Late);
    }

    #[test]
    fn status_uses_lowercase_strings() {
        assert_eq!(AttendanceStatus::Late.as_ref(), "late");
        assert_eq!(AttendanceStatus::from_str("present").unwrap(), AttendanceStatus::Present);
        assert!(AttendanceStatus::from_str("excused").is_err());
        assert_eq!(serde_json::to_value(AttendanceStatus::Absent).unwrap(), "absent");
    }

    #[test]
    fn record_derives_date_and_time_from_marked_at() {
        let marked_at = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 7, 42)
            .unwrap();
        let record = AttendanceRecord::new("2023001", marked_at, AttendanceStatus::Present, None);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(record.time, "09:07");
    }
}
