//! services/profiling_service.rs
//! Perfil de intereses del cliente a partir de lo que contó en la conversación.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::db::{now, DbPool};
use crate::models::business_model::ConversationTurn;
use crate::services::llm_service::{AiClients, GenerationMode};
use crate::services::tag_service::TagService;
use crate::utils::json_parser::safe_json_from_llm;

/// Payload de `run_profiling_analysis`
#[derive(Debug, Clone, Deserialize)]
pub struct ProfilingTaskPayload {
    pub customer_id: String,
    pub business_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub full_conversation: Vec<ConversationTurn>,
}

#[derive(Debug, Deserialize)]
struct InferredTags {
    #[serde(default)]
    inferred_tags: Vec<String>,
}

#[derive(Clone)]
pub struct ProfilingService {
    db_pool: DbPool,
    tag_service: TagService,
    ai: AiClients,
}

impl ProfilingService {
    pub fn new(db_pool: DbPool, tag_service: TagService, ai: AiClients) -> Self {
        Self {
            db_pool,
            tag_service,
            ai,
        }
    }

    /// Devuelve los nombres de tag cuyo puntaje se incrementó.
    pub async fn run_profiling(&self, payload: &serde_json::Value) -> Result<Vec<String>> {
        log::info!("--- Starting Profile Analysis Workflow ---");
        let task: ProfilingTaskPayload = serde_json::from_value(payload.clone())
            .context("Could not parse required fields from profiling payload")?;

        let inferred = self.get_inferred_tags(&task).await?;
        if inferred.is_empty() {
            log::info!("PROFILING: No tags inferred. Ending profiling workflow.");
            return Ok(Vec::new());
        }

        let updated = self
            .update_customer_interest_scores(&task.business_id, &task.customer_id, &inferred)
            .await?;
        log::info!("--- Profile Analysis Workflow COMPLETED ---");
        Ok(updated)
    }

    async fn get_inferred_tags(&self, task: &ProfilingTaskPayload) -> Result<Vec<String>> {
        log::info!("PROFILING: Inferring tags with LLM...");
        let available: Vec<String> = self
            .tag_service
            .list_tags(&task.business_id)
            .await?
            .into_iter()
            .map(|t| t.tag_name)
            .collect();
        if available.is_empty() {
            log::info!("PROFILING: Business {} has no tags yet.", task.business_id);
            return Ok(Vec::new());
        }

        let prompt = format!(
            r#"You are a customer analyst. Based on what the customer has shared, decide which of the business's product tags match the customer's interests.

    **Available Tags:** {tags}
    **Summary of New Information:** "{summary}"
    **Conversation:** {conversation}

    **Instructions:**
    1.  Only use tags from the Available Tags list.
    2.  Return a JSON object with one key: "inferred_tags", a list of lowercase tag names. Return an empty list if nothing applies.

    **JSON Response:**
    "#,
            tags = serde_json::to_string(&available).unwrap_or_default(),
            summary = task.summary.as_deref().unwrap_or(""),
            conversation = serde_json::to_string(&task.full_conversation).unwrap_or_default(),
        );

        let Some(response) = self.ai.text.generate_text(&prompt, GenerationMode::Fast).await else {
            return Ok(Vec::new());
        };
        let inferred = safe_json_from_llm::<InferredTags>(&response)
            .map(|t| t.inferred_tags)
            .unwrap_or_default();
        log::info!("PROFILING: LLM inferred tags: {:?}", inferred);
        Ok(inferred)
    }

    /// +1.0 por cada tag conocido del negocio; los nombres desconocidos se ignoran.
    pub async fn update_customer_interest_scores(
        &self,
        business_id: &str,
        customer_id: &str,
        tag_names: &[String],
    ) -> Result<Vec<String>> {
        log::info!(
            "PROFILING: Updating interest scores for customer {} with tags: {:?}",
            customer_id,
            tag_names
        );
        let tag_map = self.tag_service.tag_name_map(business_id).await?;

        let mut updated = Vec::new();
        let mut tx = self.db_pool.begin().await?;
        for name in tag_names {
            let name_lower = name.trim().to_lowercase();
            let Some(tag_id) = tag_map.get(&name_lower) else {
                log::warn!("PROFILING: Unknown tag '{}' ignored.", name_lower);
                continue;
            };
            if updated.contains(&name_lower) {
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO customer_interests (customer_id, tag_id, score, updated_at)
                VALUES (?1, ?2, 1.0, ?3)
                ON CONFLICT (customer_id, tag_id)
                DO UPDATE SET score = score + 1.0, updated_at = excluded.updated_at
                "#,
            )
            .bind(customer_id)
            .bind(tag_id)
            .bind(now())
            .execute(&mut *tx)
            .await
            .context("Fallo al actualizar customer_interests")?;
            updated.push(name_lower);
        }
        tx.commit().await?;

        log::info!("PROFILING: Successfully updated {} interest scores.", updated.len());
        Ok(updated)
    }

    pub async fn interest_score(&self, customer_id: &str, tag_id: &str) -> Result<Option<f64>> {
        sqlx::query_scalar::<_, f64>(
            "SELECT score FROM customer_interests WHERE customer_id = ?1 AND tag_id = ?2",
        )
        .bind(customer_id)
        .bind(tag_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al leer customer_interests")
    }
}
