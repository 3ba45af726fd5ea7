use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::attendance::{AttendanceRecord, AttendanceStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    #[schema(example = 10)]
    pub total_students: u64,
    #[schema(example = 6)]
    pub present_count: u64,
    #[schema(example = 1)]
    pub late_count: u64,
    #[schema(example = 7)]
    pub total_marked: u64,
    #[schema(example = 3)]
    pub absent_count: u64,
    /// Percentage of the roster marked present or late, rounded.
    #[schema(example = 70)]
    pub attendance_rate: u32,
    /// Attendance records across all dates.
    #[schema(example = 120)]
    pub total_records: u64,
}

impl DailyStats {
    pub fn compute(total_students: u64, present_count: u64, late_count: u64, total_records: u64) -> Self {
        let total_marked = present_count + late_count;
        Self {
            total_students,
            present_count,
            late_count,
            total_marked,
            absent_count: total_students.saturating_sub(total_marked),
            attendance_rate: percentage(total_marked, total_students),
            total_records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    /// Dates on which any attendance was recorded.
    #[schema(example = 32)]
    pub total_classes: u64,
    #[schema(example = 25)]
    pub present_days: u64,
    #[schema(example = 3)]
    pub late_days: u64,
    #[schema(example = 78)]
    pub attendance_percentage: u32,
    /// Consecutive class dates attended, counting back from the latest one.
    #[schema(example = 7)]
    pub streak_days: u64,
}

impl StudentStats {
    pub fn compute(class_dates: &[NaiveDate], records: &[AttendanceRecord]) -> Self {
        let classes: BTreeSet<NaiveDate> = class_dates.iter().copied().collect();
        let attended: BTreeSet<NaiveDate> = records
            .iter()
            .filter(|r| r.status.is_marked())
            .map(|r| r.date)
            .collect();
        let late_days = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Late)
            .count() as u64;
        let streak_days = classes
            .iter()
            .rev()
            .take_while(|date| attended.contains(date))
            .count() as u64;

        Self {
            total_classes: classes.len() as u64,
            present_days: attended.len() as u64,
            late_days,
            attendance_percentage: percentage(attended.len() as u64, classes.len() as u64),
            streak_days,
        }
    }
}

fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}
