use chrono::{NaiveDate, NaiveDateTime};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use utoipa::ToSchema;

use crate::db::AttendanceFilter;
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::stats::{DailyStats, StudentStats};
use crate::state::AppState;
use crate::utils::validate;

const UNKNOWN_NAME: &str = "Unknown Student";
const UNKNOWN_CLASS: &str = "Unknown";

/// One attendance record joined with the student's display fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDetail {
    #[schema(example = "2023001")]
    pub roll_number: String,
    #[schema(example = "Rahul Sharma")]
    pub name: String,
    #[serde(rename = "class")]
    #[schema(example = "CS-A")]
    pub class_name: String,
    #[schema(example = "09:05")]
    pub time: String,
    pub status: AttendanceStatus,
    #[schema(value_type = Object, nullable = true)]
    pub qr_data: Option<Value>,
    #[schema(example = "2026-01-01T09:05:12", format = "date-time", value_type = String)]
    pub marked_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub connected: bool,
    #[schema(example = "mysql")]
    pub backend: String,
    pub students: u64,
    pub total_attendance_records: u64,
    pub today_attendance: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    /// Seconds since startup.
    pub uptime: u64,
    #[schema(example = "development")]
    pub environment: String,
    #[schema(example = "0.1.0")]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    #[schema(example = "2026-01-01T09:05:12", format = "date-time", value_type = String)]
    pub timestamp: NaiveDateTime,
    pub database: DatabaseStatus,
    pub server: ServerStatus,
}

impl AppState {
    /// Records of one day ordered by time, each joined with its student.
    /// A row whose student cannot be found is still listed, with placeholder
    /// name and class.
    pub async fn attendance_for_date(&self, date: &str) -> Result<Vec<AttendanceDetail>, AppError> {
        let date = validate::date(date)?;
        let records = self
            .store
            .attendance_for_date(date)
            .await
            .map_err(|e| self.storage_error("Server error while fetching attendance", e))?;

        Ok(join_all(records.into_iter().map(|r| self.attendance_detail(r))).await)
    }

    async fn attendance_detail(&self, record: AttendanceRecord) -> AttendanceDetail {
        let student = match self.students.lookup(self.store.as_ref(), &record.student_roll).await {
            Ok(student) => student,
            Err(e) => {
                warn!(error = %e, roll = %record.student_roll, "Student lookup failed, using placeholder");
                None
            }
        };
        let (name, class_name) = match student {
            Some(s) => (s.name, s.class_name),
            None => (UNKNOWN_NAME.to_string(), UNKNOWN_CLASS.to_string()),
        };

        AttendanceDetail {
            roll_number: record.student_roll,
            name,
            class_name,
            time: record.time,
            status: record.status,
            qr_data: record.qr_data,
            marked_at: record.marked_at,
        }
    }

    /// Aggregate counts for `date`, or for the day of `now` when none is given.
    pub async fn daily_stats(
        &self,
        date: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<(NaiveDate, DailyStats), AppError> {
        let date = match date {
            Some(raw) => validate::date(raw)?,
            None => now.date(),
        };

        let store = self.store.as_ref();
        let day = AttendanceFilter::on(date);
        let (total_students, present, late, total_records) = futures::try_join!(
            store.count_students(),
            store.count_attendance(day.with_status(AttendanceStatus::Present)),
            store.count_attendance(day.with_status(AttendanceStatus::Late)),
            store.count_attendance(AttendanceFilter::default()),
        )
        .map_err(|e| self.storage_error("Error fetching statistics", e))?;

        Ok((date, DailyStats::compute(total_students, present, late, total_records)))
    }

    pub async fn student_stats(&self, roll_number: &str) -> Result<StudentStats, AppError> {
        let roll = validate::roll_number("rollNumber", Some(roll_number))?;
        const FAILED: &str = "Error fetching student statistics";

        self.students
            .lookup(self.store.as_ref(), roll)
            .await
            .map_err(|e| self.storage_error(FAILED, e))?
            .ok_or_else(|| AppError::NotFound(format!("Student with roll number {roll} is not registered")))?;

        let store = self.store.as_ref();
        let (class_dates, records) = futures::try_join!(store.class_dates(), store.attendance_for_student(roll))
            .map_err(|e| self.storage_error(FAILED, e))?;

        Ok(StudentStats::compute(&class_dates, &records))
    }

    /// Liveness check. An unreachable store is reported, not raised.
    pub async fn system_status(&self, now: NaiveDateTime) -> Result<SystemStatus, AppError> {
        let store = self.store.as_ref();
        let connected = match store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, backend = store.backend_tag(), "Store ping failed");
                false
            }
        };

        let (students, total_attendance_records, today_attendance) = if connected {
            futures::try_join!(
                store.count_students(),
                store.count_attendance(AttendanceFilter::default()),
                store.count_attendance(AttendanceFilter::on(now.date())),
            )
            .map_err(|e| self.storage_error("Error fetching system status", e))?
        } else {
            (0, 0, 0)
        };

        Ok(SystemStatus {
            timestamp: now,
            database: DatabaseStatus {
                connected,
                backend: store.backend_tag().to_string(),
                students,
                total_attendance_records,
                today_attendance,
            },
            server: ServerStatus {
                uptime: self.uptime().as_secs(),
                environment: self.config.environment.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }
}
