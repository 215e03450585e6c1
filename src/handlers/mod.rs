//! handlers/mod.rs
//! Endpoints HTTP. Cada handler delega en un servicio y traduce el resultado.
pub mod business_handler;
pub mod knowledge_handler;
pub mod product_handler;
pub mod promotion_handler;
pub mod root_handler;
pub mod tag_handler;
pub mod webhook_handler;
