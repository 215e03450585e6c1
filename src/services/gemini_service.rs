//! services/gemini_service.rs
//! Generación de texto con la API REST de Google Gemini.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::services::llm_service::{GenerationMode, TextGenerator};

pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone)]
pub struct GeminiService {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiService {
    pub fn new(api_key: Option<String>, base_url: &str) -> Self {
        if api_key.is_some() {
            log::info!("Successfully configured Google Gemini client.");
        } else {
            log::warn!("GEMINI_API_KEY no definida: la generación de texto quedará deshabilitada.");
        }
        Self {
            http_client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: GEMINI_MODEL.to_string(),
        }
    }

    fn build_body(prompt: &str, mode: GenerationMode, json_schema: Option<Option<&Value>>) -> Value {
        let mut generation_config = serde_json::Map::new();
        if mode == GenerationMode::Fast {
            generation_config.insert(
                "thinkingConfig".to_string(),
                json!({ "thinkingBudget": 0 }),
            );
        }
        if let Some(schema) = json_schema {
            generation_config.insert(
                "responseMimeType".to_string(),
                json!("application/json"),
            );
            if let Some(schema) = schema {
                generation_config.insert("responseSchema".to_string(), schema.clone());
            }
        }

        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": Value::Object(generation_config)
        })
    }

    /// Concatena las partes de texto del primer candidato (sin las de "thought").
    pub fn extract_text(response: &Value) -> Option<String> {
        let parts = response
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;

        let text: String = parts
            .iter()
            .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    async fn call(&self, body: Value) -> Result<Option<String>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("Gemini model is not available."))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Fallo al hacer POST a Gemini")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini respondió {}: {}", status, body_txt));
        }

        let json_val = resp.json::<Value>().await?;
        Ok(Self::extract_text(&json_val))
    }

    async fn generate(&self, body: Value) -> Option<String> {
        match self.call(body).await {
            Ok(Some(text)) => Some(text),
            Ok(None) => {
                log::warn!("Gemini response is empty.");
                None
            }
            Err(e) => {
                log::error!("Error generating Gemini response: {:?}", e);
                None
            }
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiService {
    async fn generate_text(&self, prompt: &str, mode: GenerationMode) -> Option<String> {
        self.generate(Self::build_body(prompt, mode, None)).await
    }

    async fn generate_json(&self, prompt: &str, response_schema: Option<&Value>) -> Option<String> {
        self.generate(Self::build_body(
            prompt,
            GenerationMode::Thinking,
            Some(response_schema),
        ))
        .await
    }
}
