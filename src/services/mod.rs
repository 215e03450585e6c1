//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod business_service;
pub mod dispatcher_service;
pub mod gemini_service;
pub mod knowledge_service;
pub mod llm_service;
pub mod menu_ingestion_service;
pub mod openai_service;
pub mod outbound_service;
pub mod product_service;
pub mod profiling_service;
pub mod promotion_service;
pub mod query_service;
pub mod queue_service;
pub mod realtime_service;
pub mod tag_service;
pub mod tagging_service;

use std::sync::Arc;

use crate::config::app_config::AppConfig;
use crate::db::DbPool;

use business_service::BusinessService;
use dispatcher_service::DispatcherService;
use gemini_service::GeminiService;
use knowledge_service::KnowledgeService;
use llm_service::AiClients;
use menu_ingestion_service::MenuIngestionService;
use openai_service::OpenAiService;
use outbound_service::OutboundService;
use product_service::ProductService;
use profiling_service::ProfilingService;
use promotion_service::PromotionService;
use query_service::QueryService;
use queue_service::QueueService;
use realtime_service::RealtimeService;
use tag_service::TagService;
use tagging_service::TaggingService;

/// Todos los servicios ya cableados. La API y el worker usan el mismo grafo.
#[derive(Clone)]
pub struct Services {
    pub business: BusinessService,
    pub tags: TagService,
    pub tagging: TaggingService,
    pub products: ProductService,
    pub menu_ingestion: MenuIngestionService,
    pub knowledge: KnowledgeService,
    pub promotions: PromotionService,
    pub queue: QueueService,
    pub dispatcher: DispatcherService,
    pub realtime: RealtimeService,
    pub outbound: OutboundService,
    pub profiling: ProfilingService,
}

impl Services {
    pub fn build(db_pool: DbPool, config: &AppConfig, ai: AiClients) -> Self {
        let business = BusinessService::new(db_pool.clone());
        let tags = TagService::new(db_pool.clone(), business.clone(), ai.clone());
        let tagging = TaggingService::new(tags.clone(), ai.clone());
        let products = ProductService::new(
            db_pool.clone(),
            business.clone(),
            tagging.clone(),
            ai.clone(),
        );
        let menu_ingestion = MenuIngestionService::new(products.clone(), business.clone(), ai.clone());
        let knowledge = KnowledgeService::new(db_pool.clone(), business.clone(), ai.clone());
        let promotions = PromotionService::new(db_pool.clone(), business.clone());
        let queue = QueueService::new(db_pool.clone());
        let dispatcher = DispatcherService::new(queue.clone());
        let realtime = RealtimeService::new(
            business.clone(),
            knowledge.clone(),
            QueryService::new(ai.clone()),
            queue.clone(),
            ai.clone(),
            config.query_expansion,
        );
        let outbound = OutboundService::new(business.clone(), &config.whatsapp_api_url, config.dev_mode);
        let profiling = ProfilingService::new(db_pool, tags.clone(), ai);

        Services {
            business,
            tags,
            tagging,
            products,
            menu_ingestion,
            knowledge,
            promotions,
            queue,
            dispatcher,
            realtime,
            outbound,
            profiling,
        }
    }
}

/// Clientes reales: Gemini para texto, OpenAI para embeddings.
pub fn build_ai_clients(config: &AppConfig) -> AiClients {
    AiClients::new(
        Arc::new(GeminiService::new(
            config.gemini_api_key.clone(),
            &config.gemini_api_url,
        )),
        Arc::new(OpenAiService::new(
            config.openai_api_key.clone(),
            &config.openai_api_url,
        )),
    )
}
