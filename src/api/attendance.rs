use actix_web::{HttpResponse, http::header, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::model::attendance::QrPayload;
use crate::service::attendance::MarkedAttendance;
use crate::service::query::AttendanceDetail;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    #[schema(example = "2023001")]
    pub student_roll: Option<String>,
    /// Decoded QR code content, stored as received.
    #[schema(value_type = Option<QrPayload>)]
    pub qr_data: Option<Value>,
}

#[derive(Serialize, ToSchema)]
pub struct MarkAttendanceResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Attendance marked successfully for Rahul Sharma!")]
    pub message: String,
    pub data: MarkedAttendance,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "2026-01-01")]
    pub date: String,
    #[schema(example = 1)]
    pub count: usize,
    pub attendance: Vec<AttendanceDetail>,
}

/// Mark attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendanceRequest,
    responses(
        (status = 200, description = "Attendance marked, or already marked today (`previouslyMarked`)", body = MarkAttendanceResponse),
        (status = 400, description = "Malformed roll number, QR payload or body", body = ErrorBody, example = json!({
            "success": false,
            "message": "Roll number must be exactly 7 digits (e.g., 2023001)",
            "field": "studentRoll"
        })),
        (status = 404, description = "Student not registered", body = ErrorBody),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    state: web::Data<AppState>,
    payload: web::Json<MarkAttendanceRequest>,
) -> Result<HttpResponse, AppError> {
    let now = state.clock.now();
    let marked = state
        .mark_attendance(payload.student_roll.as_deref(), payload.qr_data.as_ref(), now)
        .await?;

    Ok(HttpResponse::Ok().json(MarkAttendanceResponse {
        success: true,
        message: marked.message(),
        data: marked,
    }))
}

/// Attendance for a date
#[utoipa::path(
    get,
    path = "/api/attendance/{date}",
    params(
        ("date" = String, Path, description = "Day in YYYY-MM-DD format", example = "2026-01-01")
    ),
    responses(
        (status = 200, description = "Records of the day ordered by time", body = AttendanceListResponse),
        (status = 400, description = "Invalid date format", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Attendance"
)]
pub async fn attendance_for_date(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let date = path.into_inner();
    let attendance = state.attendance_for_date(&date).await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        success: true,
        date,
        count: attendance.len(),
        attendance,
    }))
}

/// Today's attendance
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 302, description = "Redirects to /api/attendance/{today}")
    ),
    tag = "Attendance"
)]
pub async fn attendance_today(state: web::Data<AppState>) -> HttpResponse {
    let today = state.clock.now().format("%Y-%m-%d");
    HttpResponse::Found()
        .insert_header((
            header::LOCATION,
            format!("{}/attendance/{}", state.config.api_prefix, today),
        ))
        .finish()
}
