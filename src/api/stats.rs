use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::model::stats::{DailyStats, StudentStats};
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct DailyStatsResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: chrono::NaiveDate,
    pub stats: DailyStats,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentStatsResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "2023001")]
    pub roll_number: String,
    #[serde(flatten)]
    pub stats: StudentStats,
}

async fn daily_stats(state: &AppState, date: Option<&str>) -> Result<HttpResponse, AppError> {
    let (date, stats) = state.daily_stats(date, state.clock.now()).await?;
    Ok(HttpResponse::Ok().json(DailyStatsResponse {
        success: true,
        date,
        stats,
    }))
}

/// Today's statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Counts for the current day", body = DailyStatsResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Statistics"
)]
pub async fn stats_today(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    daily_stats(&state, None).await
}

/// Statistics for a date
#[utoipa::path(
    get,
    path = "/api/stats/{date}",
    params(
        ("date" = String, Path, description = "Day in YYYY-MM-DD format", example = "2026-01-01")
    ),
    responses(
        (status = 200, description = "Counts for the day", body = DailyStatsResponse),
        (status = 400, description = "Invalid date format", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Statistics"
)]
pub async fn stats_for_date(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    daily_stats(&state, Some(path.as_str())).await
}

/// Statistics for one student
#[utoipa::path(
    get,
    path = "/api/student-stats/{roll}",
    params(
        ("roll" = String, Path, description = "7-digit roll number", example = "2023001")
    ),
    responses(
        (status = 200, description = "Attendance history summary", body = StudentStatsResponse),
        (status = 400, description = "Malformed roll number", body = ErrorBody),
        (status = 404, description = "Student not registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Statistics"
)]
pub async fn student_stats(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let roll_number = path.into_inner();
    let stats = state.student_stats(&roll_number).await?;

    Ok(HttpResponse::Ok().json(StudentStatsResponse {
        success: true,
        roll_number,
        stats,
    }))
}
