use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::model::student::Student;
use crate::service::registry::NewStudent;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct StudentListResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = 10)]
    pub count: usize,
    pub students: Vec<Student>,
}

#[derive(Serialize, ToSchema)]
pub struct StudentResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Student added successfully")]
    pub message: String,
    pub student: Student,
}

#[derive(Serialize, ToSchema)]
pub struct SeedResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "Sample students added successfully!")]
    pub message: String,
    #[schema(example = 10)]
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Database already seeded", nullable = true)]
    pub note: Option<String>,
    pub students: Vec<Student>,
}

/// List students
#[utoipa::path(
    get,
    path = "/api/students",
    responses(
        (status = 200, description = "Registered students ordered by roll number", body = StudentListResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Students"
)]
pub async fn list_students(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let students = state.list_students().await?;

    Ok(HttpResponse::Ok().json(StudentListResponse {
        success: true,
        count: students.len(),
        students,
    }))
}

/// Register a student
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = NewStudent,
    responses(
        (status = 200, description = "Student added", body = StudentResponse),
        (status = 400, description = "Missing or malformed field", body = ErrorBody, example = json!({
            "success": false,
            "message": "Roll number, name, and class are required",
            "field": "name"
        })),
        (status = 409, description = "Roll number already registered", body = ErrorBody, example = json!({
            "success": false,
            "message": "Student with this roll number already exists"
        })),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Students"
)]
pub async fn add_student(
    state: web::Data<AppState>,
    payload: web::Json<NewStudent>,
) -> Result<HttpResponse, AppError> {
    let student = state.add_student(payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(StudentResponse {
        success: true,
        message: "Student added successfully".to_string(),
        student,
    }))
}

/// Seed sample students
#[utoipa::path(
    get,
    path = "/api/students/seed",
    responses(
        (status = 200, description = "Sample roster inserted, or registry already populated", body = SeedResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Students"
)]
pub async fn seed_students(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let outcome = state.seed_sample_students().await?;

    Ok(HttpResponse::Ok().json(SeedResponse {
        success: true,
        message: outcome.message().to_string(),
        count: outcome.students.len(),
        note: outcome.note.map(str::to_string),
        students: outcome.students,
    }))
}
