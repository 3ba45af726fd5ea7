use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceFilter, AttendanceStore, StoreError};
use crate::model::attendance::AttendanceRecord;
use crate::model::student::Student;

#[derive(Default)]
struct Tables {
    students: BTreeMap<String, Student>,
    attendance: BTreeMap<(String, NaiveDate), AttendanceRecord>,
}

/// Process-local store used when no database is configured and in tests.
/// Uniqueness is checked under the same lock as the write, so it holds the
/// same guarantees as the database constraint.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    stale_reads: AtomicUsize,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` attendance lookups report nothing, as if a concurrent
    /// check-in had not landed yet when they ran.
    pub fn with_stale_reads(n: usize) -> Self {
        Self {
            stale_reads: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("store closed".to_string()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn take_stale_read(&self) -> bool {
        self.stale_reads
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.tables().map(|_| ())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    async fn count_students(&self) -> Result<u64, StoreError> {
        Ok(self.tables()?.students.len() as u64)
    }

    async fn find_student(&self, roll_number: &str) -> Result<Option<Student>, StoreError> {
        Ok(self.tables()?.students.get(roll_number).cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self.tables()?.students.values().cloned().collect())
    }

    async fn insert_student(&self, student: &Student) -> Result<(), StoreError> {
        self.insert_students(std::slice::from_ref(student)).await
    }

    async fn insert_students(&self, students: &[Student]) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let mut batch = BTreeSet::new();
        for student in students {
            if tables.students.contains_key(&student.roll_number) || !batch.insert(&student.roll_number) {
                return Err(StoreError::Duplicate);
            }
        }
        for student in students {
            tables
                .students
                .insert(student.roll_number.clone(), student.clone());
        }
        Ok(())
    }

    async fn find_attendance(
        &self,
        student_roll: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let tables = self.tables()?;
        if self.take_stale_read() {
            return Ok(None);
        }
        Ok(tables
            .attendance
            .get(&(student_roll.to_string(), date))
            .cloned())
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let key = (record.student_roll.clone(), record.date);
        if tables.attendance.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }
        tables.attendance.insert(key, record.clone());
        Ok(())
    }

    async fn attendance_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut records: Vec<_> = self
            .tables()?
            .attendance
            .values()
            .filter(|r| r.date == date)
            .cloned()
            .collect();
        records.sort_by(|a, b| (&a.time, a.marked_at).cmp(&(&b.time, b.marked_at)));
        Ok(records)
    }

    async fn attendance_for_student(&self, student_roll: &str) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut records: Vec<_> = self
            .tables()?
            .attendance
            .values()
            .filter(|r| r.student_roll == student_roll)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    async fn count_attendance(&self, filter: AttendanceFilter) -> Result<u64, StoreError> {
        Ok(self
            .tables()?
            .attendance
            .values()
            .filter(|r| filter.matches(r))
            .count() as u64)
    }

    async fn class_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let dates: BTreeSet<NaiveDate> = self
            .tables()?
            .attendance
            .values()
            .map(|r| r.date)
            .collect();
        Ok(dates.into_iter().collect())
    }
}
