//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod action_plan_model;
pub mod business_model;
pub mod knowledge_model;
pub mod product_model;
pub mod promotion_model;
pub mod queue_model;
pub mod tag_model;
pub mod whatsapp_model;
