//! Astro Engine: asistente conversacional de WhatsApp para negocios.
//! Dos procesos comparten esta librería: la API (`astro_api`) y el worker (`astro_worker`).

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod models;
pub mod services;
pub mod utils;
pub mod worker;

#[cfg(test)]
mod tests;
