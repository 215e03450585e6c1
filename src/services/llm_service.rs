//! services/llm_service.rs
//! Contratos de los clientes de IA. Los servicios de negocio dependen de
//! estos traits; Gemini y OpenAI son las implementaciones reales.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::utils::json_parser::safe_json_from_llm;

/// Fast: sin presupuesto de "thinking". Thinking: el default del modelo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Fast,
    Thinking,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Texto libre. `None` si el modelo no está disponible o falla.
    async fn generate_text(&self, prompt: &str, mode: GenerationMode) -> Option<String>;

    /// Salida JSON (modo thinking), opcionalmente restringida por un esquema.
    async fn generate_json(&self, prompt: &str, response_schema: Option<&Value>) -> Option<String>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Un embedding por texto, en el mismo orden.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Clientes de IA compartidos por los servicios
#[derive(Clone)]
pub struct AiClients {
    pub text: Arc<dyn TextGenerator>,
    pub embedder: Arc<dyn Embedder>,
}

impl AiClients {
    pub fn new(text: Arc<dyn TextGenerator>, embedder: Arc<dyn Embedder>) -> Self {
        Self { text, embedder }
    }

    /// Genera JSON y lo convierte a `T`; cualquier fallo se reporta como `None`.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        response_schema: Option<&Value>,
    ) -> Option<T> {
        let raw = self.text.generate_json(prompt, response_schema).await?;
        safe_json_from_llm::<T>(&raw)
    }
}
