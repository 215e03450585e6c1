//! handlers/tag_handler.rs
use actix_web::{web, HttpResponse};

use crate::errors::error_response;
use crate::models::tag_model::TagCreate;
use crate::services::tag_service::TagService;

/// POST /tenants/{tenant_id}/tags
pub async fn create_tag_endpoint(
    tag_service: web::Data<TagService>,
    path: web::Path<String>,
    body: web::Json<TagCreate>,
) -> HttpResponse {
    let tenant_id = path.into_inner();

    match tag_service.create_tag(&tenant_id, &body.tag_name).await {
        Ok(tag) => HttpResponse::Created().json(tag),
        Err(e) => error_response(&e, "Failed to create tag"),
    }
}

/// GET /tenants/{tenant_id}/tags
pub async fn list_tags_endpoint(
    tag_service: web::Data<TagService>,
    path: web::Path<String>,
) -> HttpResponse {
    match tag_service.list_tags(&path.into_inner()).await {
        Ok(tags) => HttpResponse::Ok().json(tags),
        Err(e) => error_response(&e, "Failed to list tags"),
    }
}
