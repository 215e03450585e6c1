//! handlers/business_handler.rs
use actix_web::{web, HttpResponse};

use crate::errors::error_response;
use crate::models::business_model::BusinessCreate;
use crate::services::business_service::BusinessService;

/// POST /businesses  (alias: POST /tenants)
pub async fn create_business_endpoint(
    business_service: web::Data<BusinessService>,
    body: web::Json<BusinessCreate>,
) -> HttpResponse {
    match business_service.create_business(body.into_inner()).await {
        Ok(business) => HttpResponse::Created().json(business),
        Err(e) => error_response(&e, "Failed to create business"),
    }
}

/// GET /businesses/{id}
pub async fn get_business_endpoint(
    business_service: web::Data<BusinessService>,
    path: web::Path<String>,
) -> HttpResponse {
    let business_id = path.into_inner();

    match business_service.get_business(&business_id).await {
        Ok(business) => HttpResponse::Ok().json(business),
        Err(e) => error_response(&e, "Business not found"),
    }
}
