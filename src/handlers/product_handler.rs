//! handlers/product_handler.rs
use actix_web::{web, HttpResponse};

use crate::errors::error_response;
use crate::models::product_model::{MenuIngestRequest, ProductCreate};
use crate::services::menu_ingestion_service::MenuIngestionService;
use crate::services::product_service::ProductService;

/// POST /tenants/{tenant_id}/products
pub async fn create_product_endpoint(
    product_service: web::Data<ProductService>,
    path: web::Path<String>,
    body: web::Json<ProductCreate>,
) -> HttpResponse {
    let tenant_id = path.into_inner();

    match product_service.create_product(&tenant_id, body.into_inner()).await {
        Ok(product) => HttpResponse::Created().json(product),
        Err(e) => error_response(&e, "Failed to create product"),
    }
}

/// POST /tenants/{tenant_id}/products/batch-from-text
/// Responde 202 con el resumen; los productos que fallan no cortan el lote.
pub async fn batch_from_text_endpoint(
    menu_service: web::Data<MenuIngestionService>,
    path: web::Path<String>,
    body: web::Json<MenuIngestRequest>,
) -> HttpResponse {
    let tenant_id = path.into_inner();

    match menu_service
        .ingest_menu_from_text(&tenant_id, &body.menu_text)
        .await
    {
        Ok(summary) => HttpResponse::Accepted().json(summary),
        Err(e) => error_response(&e, "Failed to ingest menu"),
    }
}
