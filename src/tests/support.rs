//! tests/support.rs
//! Helpers compartidos: DB en memoria, LLM con respuestas guionadas y embeddings deterministas.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;

use crate::config::app_config::AppConfig;
use crate::db::{run_migrations, DbPool};
use crate::models::business_model::{BusinessCreate, BusinessRead};
use crate::services::llm_service::{AiClients, Embedder, GenerationMode, TextGenerator};
use crate::services::Services;

pub const TEST_PHONE_NUMBER_ID: &str = "PHONE_ID_1";
pub const TEST_ACCESS_TOKEN: &str = "EAAG-test-token";
pub const TEST_VERIFY_TOKEN: &str = "verify-me";
pub const EMBEDDING_DIM: usize = 32;

/// Responde según un fragmento del prompt; sin regla que coincida devuelve `None`.
#[derive(Default)]
pub struct MockTextGenerator {
    rules: Mutex<Vec<(String, String)>>,
    prompts: Mutex<Vec<(GenerationMode, String)>>,
}

impl MockTextGenerator {
    pub fn respond_to(&self, needle: &str, response: &str) {
        self.rules
            .lock()
            .unwrap()
            .push((needle.to_string(), response.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn prompt_containing(&self, needle: &str) -> Option<(GenerationMode, String)> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|(_, p)| p.contains(needle))
            .cloned()
    }

    fn answer(&self, prompt: &str, mode: GenerationMode) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((mode, prompt.to_string()));
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate_text(&self, prompt: &str, mode: GenerationMode) -> Option<String> {
        self.answer(prompt, mode)
    }

    async fn generate_json(&self, prompt: &str, _response_schema: Option<&Value>) -> Option<String> {
        self.answer(prompt, GenerationMode::Thinking)
    }
}

/// Vectores ±1 derivados de un hash del texto, salvo los fijados a mano.
#[derive(Default)]
pub struct MockEmbedder {
    fixed: Mutex<HashMap<String, Vec<f32>>>,
    failing: Mutex<bool>,
    batch_limit: Mutex<Option<usize>>,
}

impl MockEmbedder {
    pub fn set(&self, text: &str, embedding: Vec<f32>) {
        self.fixed
            .lock()
            .unwrap()
            .insert(text.to_string(), embedding);
    }

    pub fn fail_all(&self) {
        *self.failing.lock().unwrap() = true;
    }

    /// `embed_batch` devuelve como mucho `n` vectores
    pub fn truncate_batches_to(&self, n: usize) {
        *self.batch_limit.lock().unwrap() = Some(n);
    }

    pub fn embedding_for(&self, text: &str) -> Vec<f32> {
        if let Some(fixed) = self.fixed.lock().unwrap().get(text) {
            return fixed.clone();
        }
        hashed_embedding(text)
    }
}

/// FNV-1a; cada bit elige el signo de una dimensión.
pub fn hashed_embedding(text: &str) -> Vec<f32> {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in text.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    (0..EMBEDDING_DIM)
        .map(|i| if (hash >> i) & 1 == 1 { 1.0 } else { -1.0 })
        .collect()
}

/// Vector unitario en la dimensión `i`
pub fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; EMBEDDING_DIM];
    v[i % EMBEDDING_DIM] = 1.0;
    v
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if *self.failing.lock().unwrap() {
            return Err(anyhow!("embedding service unavailable"));
        }
        Ok(self.embedding_for(&text.replace('\n', " ")))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.embed(t).await?);
        }
        if let Some(n) = *self.batch_limit.lock().unwrap() {
            out.truncate(n);
        }
        Ok(out)
    }
}

pub fn config_from(vars: &[(&str, &str)]) -> AppConfig {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|key| map.get(key).cloned()).expect("test config")
}

pub fn test_config() -> AppConfig {
    config_from(&[
        ("OPENAI_API_KEY", "sk-test"),
        ("VERIFY_TOKEN", TEST_VERIFY_TOKEN),
        ("DEV_MODE", "true"),
    ])
}

/// Una sola conexión que nunca expira: cada test tiene su propia DB en memoria.
pub async fn memory_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool).await.expect("migrations");
    pool
}

pub struct TestContext {
    pub pool: DbPool,
    pub config: AppConfig,
    pub services: Services,
    pub text: Arc<MockTextGenerator>,
    pub embedder: Arc<MockEmbedder>,
}

pub async fn test_context() -> TestContext {
    test_context_with(test_config()).await
}

pub async fn test_context_with(config: AppConfig) -> TestContext {
    let pool = memory_pool().await;
    let text = Arc::new(MockTextGenerator::default());
    let embedder = Arc::new(MockEmbedder::default());
    let ai = AiClients::new(text.clone(), embedder.clone());
    let services = Services::build(pool.clone(), &config, ai);
    TestContext {
        pool,
        config,
        services,
        text,
        embedder,
    }
}

pub fn business_request(phone_number_id: &str) -> BusinessCreate {
    serde_json::from_value(json!({
        "business_name": "Kahawa House",
        "whatsapp_number": "+254700000000",
        "whatsapp_phone_number_id": phone_number_id,
        "business_bio": "Specialty coffee shop in Nairobi.",
        "whatsapp_access_token": TEST_ACCESS_TOKEN
    }))
    .expect("business request")
}

pub async fn sample_business(ctx: &TestContext) -> BusinessRead {
    ctx.services
        .business
        .create_business(business_request(TEST_PHONE_NUMBER_ID))
        .await
        .expect("create business")
}

/// Webhook de Meta con un mensaje de texto
pub fn inbound_text_payload(phone_number_id: &str, wa_id: &str, name: &str, body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {
                        "display_phone_number": "254700000000",
                        "phone_number_id": phone_number_id
                    },
                    "contacts": [{ "profile": { "name": name }, "wa_id": wa_id }],
                    "messages": [{
                        "from": wa_id,
                        "id": "wamid.TEST",
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": { "body": body }
                    }]
                }
            }]
        }]
    })
}

/// Webhook de actualización de estado (entregado/leído), sin mensajes
pub fn status_update_payload(phone_number_id: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "phone_number_id": phone_number_id },
                    "statuses": [{ "id": "wamid.TEST", "status": "delivered" }]
                }
            }]
        }]
    })
}
