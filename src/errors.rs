//! errors.rs
//! Errores de dominio que los handlers convierten en códigos HTTP.
//! Los servicios siguen devolviendo `anyhow::Result`; estos viajan dentro.

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{http::StatusCode, HttpRequest, HttpResponse};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
        }
    }
}

/// Respuesta de error para los endpoints. Si el error trae un `AppError`
/// se respeta su código; cualquier otro es un 500 genérico.
pub fn error_response(e: &anyhow::Error, summary: &str) -> HttpResponse {
    if let Some(app_err) = e.downcast_ref::<AppError>() {
        return HttpResponse::build(app_err.status_code()).json(json!({
            "error": summary,
            "details": app_err.to_string()
        }));
    }

    log::error!("{}: {:?}", summary, e);
    HttpResponse::InternalServerError().json(json!({
        "error": summary,
        "details": "An internal server error occurred."
    }))
}

/// Body JSON que no encaja con el modelo: 422 con el mismo formato que `AppError::Validation`.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let details = AppError::Validation(err.to_string());
    let response = error_response(&anyhow::Error::new(details), "Invalid request body");
    InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let details = AppError::Validation(err.to_string());
    let response = error_response(&anyhow::Error::new(details), "Invalid query string");
    InternalError::from_response(err, response).into()
}

/// true si el error de sqlx es una violación de UNIQUE.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
