//! services/openai_service.rs
//! Embeddings con la API de OpenAI.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::services::llm_service::Embedder;

pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Clone)]
pub struct OpenAiService {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiService {
    pub fn new(api_key: String, base_url: &str) -> Self {
        log::info!("OpenAI client initialized successfully.");
        Self {
            http_client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: EMBEDDING_MODEL.to_string(),
        }
    }

    async fn create_embeddings(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = inputs.len();
        let url = format!("{}/embeddings", self.base_url);

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "input": inputs, "model": self.model }))
            .send()
            .await
            .context("Fallo al hacer POST a OpenAI embeddings")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI respondió {}: {}", status, body_txt));
        }

        let mut parsed = resp
            .json::<EmbeddingResponse>()
            .await
            .context("Respuesta de embeddings inválida")?;
        parsed.data.sort_by_key(|d| d.index);

        if parsed.data.len() != expected {
            return Err(anyhow!(
                "OpenAI devolvió {} embeddings para {} textos",
                parsed.data.len(),
                expected
            ));
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Los saltos de línea empeoran los embeddings
fn clean_input(text: &str) -> String {
    text.replace('\n', " ")
}

#[async_trait]
impl Embedder for OpenAiService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let cleaned = clean_input(text);
        let preview: String = cleaned.chars().take(50).collect();
        let mut result = self
            .create_embeddings(vec![cleaned])
            .await
            .map_err(|e| {
                log::error!("OpenAI embedding failed for text: '{}...'. Error: {:?}", preview, e);
                e
            })?;
        result
            .pop()
            .ok_or_else(|| anyhow!("OpenAI no devolvió embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let cleaned = texts.iter().map(|t| clean_input(t)).collect();
        self.create_embeddings(cleaned).await.map_err(|e| {
            log::error!("OpenAI batch embedding failed. Error: {:?}", e);
            e
        })
    }
}
