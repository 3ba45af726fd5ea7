use crate::api::attendance::{AttendanceListResponse, MarkAttendanceRequest, MarkAttendanceResponse};
use crate::api::stats::{DailyStatsResponse, StudentStatsResponse};
use crate::api::status::StatusResponse;
use crate::api::student::{SeedResponse, StudentListResponse, StudentResponse};
use crate::error::ErrorBody;
use crate::model::attendance::{AttendanceStatus, QrPayload};
use crate::model::stats::{DailyStats, StudentStats};
use crate::model::student::Student;
use crate::service::attendance::MarkedAttendance;
use crate::service::query::{AttendanceDetail, DatabaseStatus, ServerStatus, SystemStatus};
use crate::service::registry::NewStudent;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ClassFlow Attendance API",
        version = "1.0.0",
        description = r#"
## ClassFlow

QR-code based classroom attendance. Students scan the code shown in class and
the scanner posts a check-in; faculty and student dashboards read the
aggregate views.

### Key Features
- **Attendance**
  - One check-in per student per day; scanning again reports the first check-in
  - Check-ins after the late cutoff (09:15 by default) are marked `late`
- **Statistics**
  - Daily counts and attendance rate, per-student history summary
- **Students**
  - Registry listing, registration and a demo seed roster

### Errors
Every failure uses the same envelope:
`{"success": false, "message": "...", "field": "...", "error": "..."}`.
`field` names the offending input on 400 responses; `error` carries
diagnostics on 500 responses.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::attendance_today,
        crate::api::attendance::attendance_for_date,

        crate::api::stats::stats_today,
        crate::api::stats::stats_for_date,
        crate::api::stats::student_stats,

        crate::api::student::list_students,
        crate::api::student::add_student,
        crate::api::student::seed_students,

        crate::api::status::system_status
    ),
    components(
        schemas(
            MarkAttendanceRequest,
            MarkAttendanceResponse,
            MarkedAttendance,
            AttendanceListResponse,
            AttendanceDetail,
            AttendanceStatus,
            QrPayload,
            DailyStatsResponse,
            DailyStats,
            StudentStatsResponse,
            StudentStats,
            StudentListResponse,
            StudentResponse,
            SeedResponse,
            Student,
            NewStudent,
            StatusResponse,
            SystemStatus,
            DatabaseStatus,
            ServerStatus,
            ErrorBody
        )
    ),
    tags(
        (name = "Attendance", description = "Check-in and daily attendance APIs"),
        (name = "Statistics", description = "Aggregate attendance APIs"),
        (name = "Students", description = "Student registry APIs"),
        (name = "Status", description = "Service diagnostics"),
    )
)]
pub struct ApiDoc;
