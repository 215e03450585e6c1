//! config/mod.rs
//! Configuración global de la app (variables de entorno, prompts fijos).

pub mod app_config;
pub mod prompts;
