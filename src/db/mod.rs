//! Storage boundary. Everything above this module talks to an
//! [`AttendanceStore`]; the uniqueness of (student roll, date) is enforced
//! here and nowhere else.

mod memory;
mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::Config;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::student::Student;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[display(fmt = "duplicate key")]
    Duplicate,
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
    #[display(fmt = "store error: {}", _0)]
    Backend(String),
}

impl std::error::Error for StoreError {}

#[derive(Debug, Default, Clone, Copy)]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceFilter {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            status: None,
        }
    }

    pub fn with_status(mut self, status: AttendanceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.date.is_none_or(|d| d == record.date) && self.status.is_none_or(|s| s == record.status)
    }
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Releases the underlying connections. Later calls fail with
    /// [`StoreError::Unavailable`].
    async fn close(&self);

    async fn count_students(&self) -> Result<u64, StoreError>;

    async fn find_student(&self, roll_number: &str) -> Result<Option<Student>, StoreError>;

    /// Ordered by roll number.
    async fn list_students(&self) -> Result<Vec<Student>, StoreError>;

    async fn insert_student(&self, student: &Student) -> Result<(), StoreError>;

    /// All or nothing: a single duplicate roll rejects the whole batch.
    async fn insert_students(&self, students: &[Student]) -> Result<(), StoreError>;

    async fn find_attendance(
        &self,
        student_roll: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when a record for the same
    /// (roll, date) already exists.
    async fn insert_attendance(&self, record: &AttendanceRecord) -> Result<(), StoreError>;

    /// Ordered by time of day.
    async fn attendance_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Ordered by date.
    async fn attendance_for_student(&self, student_roll: &str) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn count_attendance(&self, filter: AttendanceFilter) -> Result<u64, StoreError>;

    /// Distinct dates with at least one record, ascending.
    async fn class_dates(&self) -> Result<Vec<NaiveDate>, StoreError>;
}

impl fmt::Debug for dyn AttendanceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttendanceStore")
            .field("backend", &self.backend_tag())
            .finish()
    }
}

/// Opens the MySQL store when a database URL is configured, otherwise an
/// in-memory one.
pub async fn open_store(config: &Config) -> Result<Arc<dyn AttendanceStore>, StoreError> {
    match &config.database_url {
        Some(url) => {
            let store = MySqlStore::open(url).await?;
            info!(backend = store.backend_tag(), "Attendance store opened");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, attendance data is kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
