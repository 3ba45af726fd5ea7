use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Display)]
pub enum AppError {
    /// Malformed roll number, date, QR payload or request body.
    #[display(fmt = "{}", message)]
    InvalidInput { field: &'static str, message: String },

    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// Only raised for duplicate student registration.
    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// `detail` carries the underlying error text and is only filled in
    /// outside production.
    #[display(fmt = "{}", message)]
    Internal { message: String, detail: Option<String> },
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>, detail: Option<String>) -> Self {
        AppError::Internal {
            message: message.into(),
            detail,
        }
    }
}

/// Body of every non-2xx response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = "Roll number must be exactly 7 digits (e.g., 2023001)")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "studentRoll", nullable = true)]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Internal server error", nullable = true)]
    pub error: Option<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (field, error) = match self {
            AppError::InvalidInput { field, .. } => (Some(field.to_string()), None),
            AppError::Internal { detail, .. } => (
                None,
                Some(detail.clone().unwrap_or_else(|| "Internal server error".to_string())),
            ),
            _ => (None, None),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            message: self.to_string(),
            field,
            error,
        })
    }
}
