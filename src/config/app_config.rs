//! config/app_config.rs
//! Configuración de los dos procesos (API y worker), leída del entorno.
//! El `.env` se carga con `dotenv` en cada `main` antes de llamar a `from_env`.

use anyhow::{anyhow, Context, Result};
use std::env;

pub const DEFAULT_PORT: u16 = 8015;
pub const DEFAULT_HTTP_WORKERS: usize = 4;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/astro.db";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_WHATSAPP_API_URL: &str = "https://graph.facebook.com/v22.0";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub http_workers: usize,

    // Servicios de IA
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,

    // WhatsApp
    pub verify_token: Option<String>,
    pub whatsapp_app_secret: Option<String>,
    pub whatsapp_api_url: String,

    // Worker
    pub poll_interval_secs: u64,
    pub enable_profiling_worker: bool,
    pub query_expansion: bool,

    /// Por defecto en false: en producción los mensajes salen de verdad.
    pub dev_mode: bool,
}

impl AppConfig {
    /// Lee la configuración de las variables de entorno del proceso.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero con una fuente de variables inyectable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Variables vacías cuentan como no definidas
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| anyhow!("OPENAI_API_KEY must be set in the environment."))?;

        let port = match get("PORT") {
            Some(v) => v.parse::<u16>().context("PORT inválido")?,
            None => DEFAULT_PORT,
        };
        let http_workers = match get("HTTP_WORKERS") {
            Some(v) => v.parse::<usize>().context("HTTP_WORKERS inválido")?,
            None => DEFAULT_HTTP_WORKERS,
        };
        if http_workers == 0 {
            return Err(anyhow!("HTTP_WORKERS debe ser mayor que 0"));
        }
        let poll_interval_secs = match get("WORKER_POLL_INTERVAL_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("WORKER_POLL_INTERVAL_SECS inválido")?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };
        if poll_interval_secs == 0 {
            return Err(anyhow!("WORKER_POLL_INTERVAL_SECS debe ser mayor que 0"));
        }

        Ok(AppConfig {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            port,
            http_workers,
            openai_api_key,
            openai_api_url: get("OPENAI_API_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_api_url: get("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            verify_token: get("VERIFY_TOKEN"),
            whatsapp_app_secret: get("WHATSAPP_APP_SECRET"),
            whatsapp_api_url: get("WHATSAPP_API_URL")
                .unwrap_or_else(|| DEFAULT_WHATSAPP_API_URL.to_string()),
            poll_interval_secs,
            enable_profiling_worker: get("ENABLE_PROFILING_WORKER")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            query_expansion: get("QUERY_EXPANSION")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            dev_mode: get("DEV_MODE").map(|v| parse_flag(&v)).unwrap_or(false),
        })
    }
}

/// "true", "1" o "t" (sin importar mayúsculas) se consideran activados.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "t")
}
