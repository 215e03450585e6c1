//! handlers/root_handler.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::db::{ping, DbPool};

/// GET /
pub async fn liveness_endpoint() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Astro Engine is online."
    }))
}

/// GET /health
pub async fn health_endpoint(db_pool: web::Data<DbPool>) -> HttpResponse {
    match ping(&db_pool).await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "database": true
        })),
        Err(e) => {
            log::error!("Health check: la DB no responde: {:?}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "database": false
            }))
        }
    }
}
