//! handlers/knowledge_handler.rs
use actix_web::{web, HttpResponse};

use crate::errors::error_response;
use crate::models::knowledge_model::{KnowledgeIngestRequest, KnowledgeIngestResponse};
use crate::services::knowledge_service::KnowledgeService;

/// POST /businesses/{business_id}/knowledge/text
pub async fn ingest_text_endpoint(
    knowledge_service: web::Data<KnowledgeService>,
    path: web::Path<String>,
    body: web::Json<KnowledgeIngestRequest>,
) -> HttpResponse {
    let business_id = path.into_inner();
    let req = body.into_inner();

    match knowledge_service
        .ingest_text_knowledge(&business_id, &req.text_content, req.source_name.as_deref())
        .await
    {
        Ok(chunks_created) => HttpResponse::Created().json(KnowledgeIngestResponse {
            message: "Knowledge ingested successfully.".to_string(),
            chunks_created,
        }),
        Err(e) => error_response(&e, "Failed to ingest knowledge"),
    }
}
