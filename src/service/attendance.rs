use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::db::StoreError;
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::student::Student;
use crate::state::AppState;
use crate::utils::validate;

const MARK_FAILED: &str = "Server error while marking attendance";

/// Outcome of a check-in, whether it created the record or found one.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkedAttendance {
    #[schema(example = "2023001")]
    pub roll_number: String,
    #[schema(example = "Rahul Sharma")]
    pub student: String,
    #[serde(rename = "class")]
    #[schema(example = "CS-A")]
    pub class_name: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:05")]
    pub time: String,
    pub status: AttendanceStatus,
    #[schema(value_type = Object, nullable = true)]
    pub qr_data: Option<Value>,
    pub previously_marked: bool,
    /// Time of the first check-in, set when it was already recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "09:05", nullable = true)]
    pub original_time: Option<String>,
}

impl MarkedAttendance {
    fn new(student: &Student, record: AttendanceRecord, previously_marked: bool) -> Self {
        Self {
            roll_number: record.student_roll,
            student: student.name.clone(),
            class_name: student.class_name.clone(),
            date: record.date,
            original_time: previously_marked.then(|| record.time.clone()),
            time: record.time,
            status: record.status,
            qr_data: record.qr_data,
            previously_marked,
        }
    }

    pub fn message(&self) -> String {
        if self.previously_marked {
            format!(
                "Welcome back, {}! You've already marked attendance today.",
                self.student
            )
        } else if self.status == AttendanceStatus::Late {
            format!(
                "Attendance marked as LATE for {}. Please arrive on time next time.",
                self.student
            )
        } else {
            format!("Attendance marked successfully for {}!", self.student)
        }
    }
}

impl AppState {
    /// Records a check-in for `student_roll` on the day of `now`.
    ///
    /// Checking in twice on the same day is not an error: the second call
    /// reports the first record with `previously_marked` set. This also
    /// covers two requests racing past the lookup, where the store's
    /// uniqueness constraint rejects the later insert.
    pub async fn mark_attendance(
        &self,
        student_roll: Option<&str>,
        qr_data: Option<&Value>,
        now: NaiveDateTime,
    ) -> Result<MarkedAttendance, AppError> {
        let roll = validate::roll_number("studentRoll", student_roll)?;
        let date = now.date();

        let student = self
            .students
            .lookup(self.store.as_ref(), roll)
            .await
            .map_err(|e| self.storage_error(MARK_FAILED, e))?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Student with roll number {roll} is not registered. Please check the roll number or contact admin."
                ))
            })?;

        let existing = self
            .store
            .find_attendance(roll, date)
            .await
            .map_err(|e| self.storage_error(MARK_FAILED, e))?;
        if let Some(record) = existing {
            info!(roll, %date, time = %record.time, "Attendance already marked");
            return Ok(MarkedAttendance::new(&student, record, true));
        }

        if let Some(qr) = qr_data {
            validate::qr_payload(qr)?;
        }

        let status = AttendanceStatus::for_time(now.time(), self.config.late_cutoff);
        let record = AttendanceRecord::new(roll, now, status, qr_data.cloned());

        match self.store.insert_attendance(&record).await {
            Ok(()) => {
                info!(roll, student = %student.name, %status, time = %record.time, "Attendance marked");
                Ok(MarkedAttendance::new(&student, record, false))
            }
            Err(StoreError::Duplicate) => {
                let stored = self
                    .store
                    .find_attendance(roll, date)
                    .await
                    .map_err(|e| self.storage_error(MARK_FAILED, e))?
                    .ok_or_else(|| {
                        self.storage_error(
                            MARK_FAILED,
                            StoreError::Backend("record missing after duplicate key".to_string()),
                        )
                    })?;
                warn!(roll, %date, time = %stored.time, "Concurrent check-in resolved to the stored record");
                Ok(MarkedAttendance::new(&student, stored, true))
            }
            Err(e) => Err(self.storage_error(MARK_FAILED, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::db::{AttendanceFilter, AttendanceStore, MemoryStore};
    use crate::model::attendance::QR_MARKER;
    use crate::model::student::sample_students;
    use crate::utils::clock::FixedClock;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    async fn seeded_state(store: MemoryStore) -> AppState {
        store.insert_students(&sample_students()).await.unwrap();
        AppState::new(
            Config::default(),
            Arc::new(store),
            Arc::new(FixedClock::new(at(9, 0))),
        )
    }

    fn qr() -> Value {
        json!({"type": QR_MARKER, "class": "CS-A Morning", "room": "101", "faculty": "Dr. Sharma"})
    }

    #[actix_web::test]
    async fn first_mark_creates_present_record() {
        let state = seeded_state(MemoryStore::new()).await;
        let marked = state
            .mark_attendance(Some("2023001"), Some(&qr()), at(9, 2))
            .await
            .unwrap();

        assert_eq!(marked.student, "Rahul Sharma");
        assert_eq!(marked.class_name, "CS-A");
        assert_eq!(marked.time, "09:02");
        assert_eq!(marked.status, AttendanceStatus::Present);
        assert!(!marked.previously_marked);
        assert_eq!(marked.original_time, None);
        assert_eq!(marked.qr_data, Some(qr()));
        assert_eq!(marked.message(), "Attendance marked successfully for Rahul Sharma!");
    }

    #[actix_web::test]
    async fn lateness_boundary_is_the_cutoff_minute() {
        let state = seeded_state(MemoryStore::new()).await;
        let on_time = state.mark_attendance(Some("2023001"), None, at(9, 15)).await.unwrap();
        let late = state.mark_attendance(Some("2023002"), None, at(9, 16)).await.unwrap();

        assert_eq!(on_time.status, AttendanceStatus::Present);
        assert_eq!(late.status, AttendanceStatus::Late);
        assert!(late.message().contains("LATE"));
    }

    #[actix_web::test]
    async fn configured_cutoff_is_used() {
        let store = MemoryStore::new();
        store.insert_students(&sample_students()).await.unwrap();
        let config = Config {
            late_cutoff: chrono::NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            ..Config::default()
        };
        let state = AppState::new(config, Arc::new(store), Arc::new(FixedClock::new(at(8, 0))));

        let marked = state.mark_attendance(Some("2023003"), None, at(8, 31)).await.unwrap();
        assert_eq!(marked.status, AttendanceStatus::Late);
    }

    #[actix_web::test]
    async fn second_mark_reports_original_time() {
        let state = seeded_state(MemoryStore::new()).await;
        let first = state.mark_attendance(Some("2023001"), None, at(9, 1)).await.unwrap();
        let second = state
            .mark_attendance(Some("2023001"), None, at(9, 1) + Duration::hours(3))
            .await
            .unwrap();

        assert!(second.previously_marked);
        assert_eq!(second.time, first.time);
        assert_eq!(second.original_time.as_deref(), Some("09:01"));
        assert_eq!(second.status, AttendanceStatus::Present);
        assert!(second.message().starts_with("Welcome back, Rahul Sharma!"));
        assert_eq!(
            state.store.count_attendance(AttendanceFilter::default()).await.unwrap(),
            1
        );
    }

    #[actix_web::test]
    async fn next_day_is_a_new_record() {
        let state = seeded_state(MemoryStore::new()).await;
        state.mark_attendance(Some("2023001"), None, at(9, 1)).await.unwrap();
        let tomorrow = state
            .mark_attendance(Some("2023001"), None, at(9, 1) + Duration::days(1))
            .await
            .unwrap();
        assert!(!tomorrow.previously_marked);
        assert_eq!(
            state.store.count_attendance(AttendanceFilter::default()).await.unwrap(),
            2
        );
    }

    #[actix_web::test]
    async fn malformed_roll_never_reaches_storage() {
        let store = MemoryStore::new();
        let state = AppState::new(
            Config::default(),
            Arc::new(store),
            Arc::new(FixedClock::new(at(9, 0))),
        );
        // a closed store fails every call, so only validation can answer
        state.store.close().await;

        for bad in [None, Some(""), Some("12345"), Some("abcdefg"), Some("20230011")] {
            let err = state.mark_attendance(bad, None, at(9, 0)).await.unwrap_err();
            assert!(
                matches!(err, AppError::InvalidInput { field: "studentRoll", .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[actix_web::test]
    async fn unknown_student_is_not_found() {
        let state = seeded_state(MemoryStore::new()).await;
        let err = state.mark_attendance(Some("1999999"), None, at(9, 0)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_web::test]
    async fn foreign_qr_is_rejected_without_writing() {
        let state = seeded_state(MemoryStore::new()).await;
        let foreign = json!({"type": "WIFI", "ssid": "campus"});
        let err = state
            .mark_attendance(Some("2023001"), Some(&foreign), at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: "qrData", .. }));
        assert_eq!(
            state.store.count_attendance(AttendanceFilter::default()).await.unwrap(),
            0
        );
    }

    #[actix_web::test]
    async fn racing_marks_store_one_record_and_both_succeed() {
        // both lookups miss, so the second insert hits the unique key
        let state = seeded_state(MemoryStore::with_stale_reads(2)).await;

        let (a, b) = futures::join!(
            state.mark_attendance(Some("2023004"), None, at(9, 10)),
            state.mark_attendance(Some("2023004"), None, at(9, 20)),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.previously_marked, b.previously_marked);
        let (winner, loser) = if a.previously_marked { (b, a) } else { (a, b) };
        assert_eq!(loser.time, winner.time);
        assert_eq!(loser.status, winner.status);
        assert_eq!(loser.student, "Sneha Patel");
        assert_eq!(
            state.store.count_attendance(AttendanceFilter::default()).await.unwrap(),
            1
        );
    }

    #[actix_web::test]
    async fn storage_failure_is_internal() {
        let state = seeded_state(MemoryStore::new()).await;
        // warm the cache so the failure happens at the attendance lookup
        state.students.warmup(state.store.as_ref(), 100).await.unwrap();
        state.store.close().await;

        let err = state.mark_attendance(Some("2023001"), None, at(9, 0)).await.unwrap_err();
        match err {
            AppError::Internal { message, detail } => {
                assert_eq!(message, MARK_FAILED);
                assert!(detail.unwrap().contains("store closed"));
            }
            other => panic!("expected internal error, got {other:?}"),
        }
    }
}
