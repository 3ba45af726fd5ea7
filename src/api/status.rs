use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::service::query::SystemStatus;
use crate::state::AppState;

/// Routes listed in the 404 body.
pub const AVAILABLE_ROUTES: [&str; 11] = [
    "GET /",
    "GET /api/students/seed",
    "GET /api/students",
    "POST /api/students",
    "POST /api/attendance",
    "GET /api/attendance/:date",
    "GET /api/attendance/today",
    "GET /api/stats/:date?",
    "GET /api/student-stats/:roll",
    "GET /api/status",
    "GET /swagger-ui/",
];

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = true)]
    pub success: bool,
    #[serde(flatten)]
    pub status: SystemStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotFoundBody {
    success: bool,
    message: String,
    available_routes: &'static [&'static str],
}

#[get("/")]
pub async fn index() -> impl Responder {
    concat!("ClassFlow attendance service v", env!("CARGO_PKG_VERSION"))
}

/// System status
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Store connectivity, record counts and uptime", body = StatusResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "Status"
)]
pub async fn system_status(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let status = state.system_status(state.clock.now()).await?;
    Ok(HttpResponse::Ok().json(StatusResponse {
        success: true,
        status,
    }))
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(NotFoundBody {
        success: false,
        message: format!("Route {} not found", req.uri()),
        available_routes: &AVAILABLE_ROUTES,
    })
}
