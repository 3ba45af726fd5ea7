use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{AttendanceFilter, AttendanceStore, StoreError};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::student::Student;

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS students (
        roll_number    CHAR(7)      NOT NULL PRIMARY KEY,
        name           VARCHAR(255) NOT NULL,
        class_name     VARCHAR(64)  NOT NULL,
        parent_contact CHAR(10)     NULL,
        created_at     TIMESTAMP    NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id           BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        student_roll CHAR(7)     NOT NULL,
        date         DATE        NOT NULL,
        time         CHAR(5)     NOT NULL,
        status       VARCHAR(16) NOT NULL,
        qr_data      TEXT        NULL,
        marked_at    DATETIME    NOT NULL,
        UNIQUE KEY uq_attendance_student_date (student_roll, date),
        KEY idx_attendance_date (date)
    )
    "#,
];

const ATTENDANCE_COLUMNS: &str = "student_roll, date, time, status, qr_data, marked_at";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    student_roll: String,
    date: NaiveDate,
    time: String,
    status: String,
    qr_data: Option<String>,
    marked_at: NaiveDateTime,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status)
            .map_err(|_| StoreError::Backend(format!("unknown attendance status '{}'", row.status)))?;
        let qr_data = row
            .qr_data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| StoreError::Backend(format!("corrupt qr_data: {e}")))?;

        Ok(AttendanceRecord {
            student_roll: row.student_roll,
            date: row.date,
            time: row.time,
            status,
            qr_data,
            marked_at: row.marked_at,
        })
    }
}

fn into_records(rows: Vec<AttendanceRow>) -> Result<Vec<AttendanceRecord>, StoreError> {
    rows.into_iter().map(AttendanceRecord::try_from).collect()
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    fn backend_tag(&self) -> &'static str {
        "mysql"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn count_students(&self) -> Result<u64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn find_student(&self, roll_number: &str) -> Result<Option<Student>, StoreError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT roll_number, name, class_name, parent_contact
            FROM students
            WHERE roll_number = ?
            "#,
        )
        .bind(roll_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT roll_number, name, class_name, parent_contact
            FROM students
            ORDER BY roll_number ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    async fn insert_student(&self, student: &Student) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO students (roll_number, name, class_name, parent_contact)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&student.roll_number)
        .bind(&student.name)
        .bind(&student.class_name)
        .bind(&student.parent_contact)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_students(&self, students: &[Student]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for student in students {
            sqlx::query(
                r#"
                INSERT INTO students (roll_number, name, class_name, parent_contact)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&student.roll_number)
            .bind(&student.name)
            .bind(&student.class_name)
            .bind(&student.parent_contact)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_attendance(
        &self,
        student_roll: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE student_roll = ? AND date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(student_roll)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn insert_attendance(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let qr_data = record.qr_data.as_ref().map(|v| v.to_string());
        sqlx::query(
            r#"
            INSERT INTO attendance (student_roll, date, time, status, qr_data, marked_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.student_roll)
        .bind(record.date)
        .bind(&record.time)
        .bind(record.status.as_ref())
        .bind(qr_data)
        .bind(record.marked_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn attendance_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE date = ? ORDER BY time ASC, marked_at ASC");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn attendance_for_student(&self, student_roll: &str) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE student_roll = ? ORDER BY date ASC");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(student_roll)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn count_attendance(&self, filter: AttendanceFilter) -> Result<u64, StoreError> {
        let mut conditions = Vec::new();
        if filter.date.is_some() {
            conditions.push("date = ?");
        }
        if filter.status.is_some() {
            conditions.push("status = ?");
        }

        let where_clause = if conditions.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!("SELECT COUNT(*) FROM attendance {}", where_clause);
        debug!(sql = %sql, ?filter, "Counting attendance");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(date) = filter.date {
            query = query.bind(date);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.to_string());
        }

        let total = query.fetch_one(&self.pool).await?;
        Ok(total as u64)
    }

    async fn class_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let dates = sqlx::query_scalar::<_, NaiveDate>("SELECT DISTINCT date FROM attendance ORDER BY date ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(dates)
    }
}
