//! services/knowledge_service.rs
//! Base de conocimiento del negocio: chunking con IA, embeddings y búsqueda (RAG).

use anyhow::{anyhow, Context, Result};

use crate::db::{new_id, now, DbPool};
use crate::errors::AppError;
use crate::models::knowledge_model::KnowledgeChunks;
use crate::services::business_service::BusinessService;
use crate::services::llm_service::{AiClients, GenerationMode};
use crate::utils::json_parser::safe_json_from_llm;
use crate::utils::vector::{decode_embedding, encode_embedding, top_matches};

#[derive(sqlx::FromRow)]
struct KnowledgeRow {
    content: String,
    embedding: String,
}

#[derive(Clone)]
pub struct KnowledgeService {
    db_pool: DbPool,
    business_service: BusinessService,
    ai: AiClients,
}

impl KnowledgeService {
    pub fn new(db_pool: DbPool, business_service: BusinessService, ai: AiClients) -> Self {
        Self {
            db_pool,
            business_service,
            ai,
        }
    }

    /// Devuelve cuántos chunks se guardaron. 0 si la IA no produjo ninguno.
    pub async fn ingest_text_knowledge(
        &self,
        business_id: &str,
        text_content: &str,
        source_name: Option<&str>,
    ) -> Result<usize> {
        if text_content.trim().is_empty() {
            return Err(AppError::Validation("text_content must not be empty".to_string()).into());
        }
        self.business_service.ensure_exists(business_id).await?;

        log::info!(
            "KNOWLEDGE: Starting AI-powered ingestion for source '{}'.",
            source_name.unwrap_or("-")
        );

        let chunks = self.get_ai_semantic_chunks(text_content).await;
        if chunks.is_empty() {
            log::error!("KNOWLEDGE: AI failed to generate any chunks. Aborting ingestion.");
            return Ok(0);
        }
        log::info!("KNOWLEDGE: AI generated {} semantic chunks.", chunks.len());

        log::info!("KNOWLEDGE: Generating batch embeddings for all chunks...");
        let embeddings = self
            .ai
            .embedder
            .embed_batch(&chunks)
            .await
            .context("Embedding generation failed.")?;
        if embeddings.len() != chunks.len() {
            return Err(anyhow!(
                "Embedding count mismatch: {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            ));
        }

        let mut tx = self.db_pool.begin().await?;
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            sqlx::query(
                r#"
                INSERT INTO knowledge (id, business_id, content, embedding, source_document_name, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(new_id())
            .bind(business_id)
            .bind(chunk)
            .bind(encode_embedding(embedding)?)
            .bind(source_name)
            .bind(now())
            .execute(&mut *tx)
            .await
            .context("KNOWLEDGE: Database insert failed.")?;
        }
        tx.commit().await?;

        log::info!("KNOWLEDGE: Successfully inserted {} documents.", chunks.len());
        Ok(chunks.len())
    }

    async fn get_ai_semantic_chunks(&self, raw_text: &str) -> Vec<String> {
        let prompt = format!(
            r#"You are an expert data pre-processor. Your task is to read the following document and break it down into a series of self-contained, topically-focused chunks of information. Each chunk should represent a single, complete thought or answer to a potential question.

    **Document Text:**
    {}

    **Instructions:**
    1.  Identify distinct topics or questions a user might ask (e.g., Opening Hours, Delivery Policy, Company History).
    2.  For each topic, create a concise paragraph that fully answers a potential question about it.
    3.  Return the result as a JSON object with one key: "knowledge_chunks", which is a list of these text strings.

    **JSON Response:**
    "#,
            raw_text
        );

        let Some(response) = self.ai.text.generate_text(&prompt, GenerationMode::Fast).await else {
            return Vec::new();
        };

        match safe_json_from_llm::<KnowledgeChunks>(&response) {
            Some(parsed) => parsed
                .knowledge_chunks
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            None => {
                log::error!(
                    "KNOWLEDGE: AI chunker failed to return valid JSON with 'knowledge_chunks' key. Raw response: {}",
                    response
                );
                Vec::new()
            }
        }
    }

    /// Chunks más parecidos a la consulta (similitud >= threshold), de mayor a menor.
    pub async fn match_knowledge(
        &self,
        business_id: &str,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query_as::<_, KnowledgeRow>(
            "SELECT content, embedding FROM knowledge WHERE business_id = ?1",
        )
        .bind(business_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al leer knowledge")?;

        let candidates = rows
            .into_iter()
            .filter_map(|r| decode_embedding(&r.embedding).map(|emb| (r.content, emb)))
            .collect();

        Ok(top_matches(query_embedding, candidates, threshold, limit)
            .into_iter()
            .map(|(content, _)| content)
            .collect())
    }
}
