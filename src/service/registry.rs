use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::db::StoreError;
use crate::error::AppError;
use crate::model::student::{Student, sample_students};
use crate::state::AppState;
use crate::utils::validate;

/// Registration request. Fields are optional so a missing one gets the
/// same field-level 400 as a malformed one.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[schema(example = "2024001")]
    pub roll_number: Option<String>,
    #[schema(example = "Meera Iyer")]
    pub name: Option<String>,
    #[schema(example = "CS-B")]
    pub class_name: Option<String>,
    #[schema(example = "9876500000", nullable = true)]
    pub parent_contact: Option<String>,
}

impl NewStudent {
    fn validate(self) -> Result<Student, AppError> {
        let required = |field: &'static str, value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::invalid(field, "Roll number, name, and class are required"))
        };

        // the roll is the lookup key, so it is stored exactly as sent
        let roll_number = self
            .roll_number
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::invalid("rollNumber", "Roll number, name, and class are required"))?;
        let name = required("name", self.name)?;
        let class_name = required("className", self.class_name)?;

        if !validate::is_roll_number(&roll_number) {
            return Err(AppError::invalid("rollNumber", "Roll number must be exactly 7 digits"));
        }

        let parent_contact = self
            .parent_contact
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if parent_contact.as_deref().is_some_and(|c| !validate::is_parent_contact(c)) {
            return Err(AppError::invalid("parentContact", "Parent contact must be 10 digits"));
        }

        Ok(Student {
            roll_number,
            name,
            class_name,
            parent_contact,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SeedOutcome {
    /// `true` only when this call inserted the sample roster.
    pub inserted: bool,
    pub note: Option<&'static str>,
    pub students: Vec<Student>,
}

impl SeedOutcome {
    pub fn message(&self) -> &'static str {
        if self.inserted {
            "Sample students added successfully!"
        } else {
            "Students already exist in database"
        }
    }
}

impl AppState {
    pub async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        self.store
            .list_students()
            .await
            .map_err(|e| self.storage_error("Error fetching students", e))
    }

    /// Inserts the demo roster into an empty registry; otherwise does nothing.
    pub async fn seed_sample_students(&self) -> Result<SeedOutcome, AppError> {
        const FAILED: &str = "Error adding students";

        let existing = self
            .store
            .count_students()
            .await
            .map_err(|e| self.storage_error(FAILED, e))?;
        if existing > 0 {
            return Ok(SeedOutcome {
                inserted: false,
                note: Some("Database already seeded"),
                students: self.list_students().await?,
            });
        }

        let sample = sample_students();
        match self.store.insert_students(&sample).await {
            Ok(()) => {
                for student in &sample {
                    self.students.remember(student).await;
                }
                info!(count = sample.len(), "Sample students seeded");
                Ok(SeedOutcome {
                    inserted: true,
                    note: None,
                    students: sample,
                })
            }
            // another seed won the race
            Err(StoreError::Duplicate) => Ok(SeedOutcome {
                inserted: false,
                note: Some("Some duplicates skipped"),
                students: self.list_students().await?,
            }),
            Err(e) => Err(self.storage_error(FAILED, e)),
        }
    }

    pub async fn add_student(&self, request: NewStudent) -> Result<Student, AppError> {
        let student = request.validate()?;

        match self.store.insert_student(&student).await {
            Ok(()) => {
                self.students.remember(&student).await;
                info!(roll = %student.roll_number, name = %student.name, "Student added");
                Ok(student)
            }
            Err(StoreError::Duplicate) => Err(AppError::Conflict(
                "Student with this roll number already exists".to_string(),
            )),
            Err(e) => Err(self.storage_error("Error adding student", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::config::Config;
    use crate::db::{AttendanceStore, MemoryStore};
    use crate::utils::clock::FixedClock;

    fn state() -> AppState {
        let now = NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        AppState::new(Config::default(), Arc::new(MemoryStore::new()), Arc::new(FixedClock::new(now)))
    }

    fn request(roll: &str, contact: Option<&str>) -> NewStudent {
        NewStudent {
            roll_number: Some(roll.to_string()),
            name: Some("Meera Iyer".to_string()),
            class_name: Some("CS-B".to_string()),
            parent_contact: contact.map(str::to_string),
        }
    }

    #[actix_web::test]
    async fn seeding_twice_keeps_the_sample_count() {
        let state = state();
        let first = state.seed_sample_students().await.unwrap();
        assert!(first.inserted);
        assert_eq!(first.students.len(), 10);
        assert_eq!(first.message(), "Sample students added successfully!");

        let second = state.seed_sample_students().await.unwrap();
        assert!(!second.inserted);
        assert_eq!(second.note, Some("Database already seeded"));
        assert_eq!(second.students.len(), 10);
        assert_eq!(state.store.count_students().await.unwrap(), 10);
    }

    #[actix_web::test]
    async fn seeding_is_skipped_when_any_student_exists() {
        let state = state();
        state.add_student(request("2024001", None)).await.unwrap();

        let outcome = state.seed_sample_students().await.unwrap();
        assert!(!outcome.inserted);
        assert_eq!(state.store.count_students().await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn students_are_listed_by_roll() {
        let state = state();
        state.add_student(request("2024009", None)).await.unwrap();
        state.add_student(request("2024001", Some("9876500000"))).await.unwrap();

        let rolls: Vec<_> = state
            .list_students()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.roll_number)
            .collect();
        assert_eq!(rolls, ["2024001", "2024009"]);
    }

    #[actix_web::test]
    async fn duplicate_registration_conflicts() {
        let state = state();
        state.add_student(request("2024001", None)).await.unwrap();
        let err = state.add_student(request("2024001", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_web::test]
    async fn registration_is_validated() {
        let state = state();

        let missing_name = NewStudent {
            name: None,
            ..request("2024001", None)
        };
        let err = state.add_student(missing_name).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: "name", .. }));

        for roll in ["24001", " 2024001", "2024001\n"] {
            let err = state.add_student(request(roll, None)).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput { field: "rollNumber", .. }), "{roll:?}");
        }
        assert_eq!(state.store.count_students().await.unwrap(), 0);

        let err = state.add_student(request("2024001", Some("12345"))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { field: "parentContact", .. }));

        // blank contact counts as none
        let student = state.add_student(request("2024001", Some(""))).await.unwrap();
        assert_eq!(student.parent_contact, None);
    }

    #[actix_web::test]
    async fn added_student_can_check_in() {
        let state = state();
        state.add_student(request("2024001", None)).await.unwrap();
        let now = state.clock.now();
        let marked = state.mark_attendance(Some("2024001"), None, now).await.unwrap();
        assert_eq!(marked.class_name, "CS-B");
    }
}
