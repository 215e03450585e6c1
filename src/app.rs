//! app.rs
use actix_web::web;

use crate::config::app_config::AppConfig;
use crate::db::DbPool;
use crate::errors::{json_error_handler, query_error_handler};
use crate::handlers::{
    business_handler, knowledge_handler, product_handler, promotion_handler, root_handler,
    tag_handler, webhook_handler,
};
use crate::services::Services;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root_handler::liveness_endpoint))
        .route("/health", web::get().to(root_handler::health_endpoint))
        .service(
            web::scope("/businesses")
                .route("", web::post().to(business_handler::create_business_endpoint))
                .route("/{id}", web::get().to(business_handler::get_business_endpoint))
                .route(
                    "/{business_id}/knowledge/text",
                    web::post().to(knowledge_handler::ingest_text_endpoint),
                )
                .route(
                    "/{business_id}/promotions",
                    web::post().to(promotion_handler::create_promotion_endpoint),
                ),
        )
        .service(
            web::scope("/tenants")
                .route("", web::post().to(business_handler::create_business_endpoint))
                .route("/{tenant_id}/tags", web::post().to(tag_handler::create_tag_endpoint))
                .route("/{tenant_id}/tags", web::get().to(tag_handler::list_tags_endpoint))
                .route(
                    "/{tenant_id}/products",
                    web::post().to(product_handler::create_product_endpoint),
                )
                .route(
                    "/{tenant_id}/products/batch-from-text",
                    web::post().to(product_handler::batch_from_text_endpoint),
                ),
        )
        .service(
            web::scope("/webhooks")
                .route(
                    "/whatsapp",
                    web::get().to(webhook_handler::verify_webhook_endpoint),
                )
                .route(
                    "/whatsapp",
                    web::post().to(webhook_handler::receive_webhook_endpoint),
                ),
        );
}

/// Registra los servicios como `web::Data` para que los handlers los extraigan.
pub fn register_state(
    services: Services,
    config: AppConfig,
    db_pool: DbPool,
) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(services.business.clone()))
            .app_data(web::Data::new(services.tags.clone()))
            .app_data(web::Data::new(services.products.clone()))
            .app_data(web::Data::new(services.menu_ingestion.clone()))
            .app_data(web::Data::new(services.knowledge.clone()))
            .app_data(web::Data::new(services.promotions.clone()))
            .app_data(web::Data::new(services.queue.clone()));
    }
}
