//! handlers/promotion_handler.rs
use actix_web::{web, HttpResponse};

use crate::errors::error_response;
use crate::models::promotion_model::PromotionCreate;
use crate::services::promotion_service::PromotionService;

/// POST /businesses/{business_id}/promotions
pub async fn create_promotion_endpoint(
    promotion_service: web::Data<PromotionService>,
    path: web::Path<String>,
    body: web::Json<PromotionCreate>,
) -> HttpResponse {
    let business_id = path.into_inner();

    match promotion_service
        .create_promotion(&business_id, body.into_inner())
        .await
    {
        Ok(promotion) => HttpResponse::Created().json(promotion),
        Err(e) => error_response(&e, "Failed to create promotion"),
    }
}
