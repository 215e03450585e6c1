//! services/tagging_service.rs
//! Tagging inteligente en tres fases: candidatos por vector, revisión del LLM
//! y reconciliación con los tags existentes.

use std::collections::HashSet;

use anyhow::Result;
use serde::Deserialize;

use crate::models::tag_model::TagMatch;
use crate::services::llm_service::{AiClients, GenerationMode};
use crate::services::tag_service::TagService;
use crate::utils::json_parser::safe_json_from_llm;

pub const TAG_MATCH_THRESHOLD: f32 = 0.30;
pub const TAG_MATCH_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
struct RefinedTags {
    #[serde(default)]
    final_tags: Vec<String>,
}

#[derive(Clone)]
pub struct TaggingService {
    tag_service: TagService,
    ai: AiClients,
}

impl TaggingService {
    pub fn new(tag_service: TagService, ai: AiClients) -> Self {
        Self { tag_service, ai }
    }

    /// Devuelve los ids (sin repetidos) de los tags finales del producto.
    pub async fn suggest_and_reconcile_tags(
        &self,
        tenant_id: &str,
        product_name: &str,
        product_description: &str,
        product_embedding: &[f32],
    ) -> Result<Vec<String>> {
        // Fase 1
        log::info!("Tagging Phase 1: vector search over stored tag embeddings.");
        let candidates = self
            .tag_service
            .match_tags(tenant_id, product_embedding, TAG_MATCH_THRESHOLD, TAG_MATCH_LIMIT)
            .await?;
        if candidates.is_empty() {
            log::warn!("Tagging Phase 1: vector search returned no results.");
        } else {
            log::info!("Tagging Phase 1: {} candidates.", candidates.len());
        }

        // Fase 2
        let refined = self
            .get_ai_refined_tags(product_name, product_description, &candidates)
            .await;
        if refined.is_empty() {
            return Ok(Vec::new());
        }

        // Fase 3
        self.reconcile_tags(tenant_id, &refined).await
    }

    async fn get_ai_refined_tags(
        &self,
        product_name: &str,
        product_description: &str,
        candidates: &[TagMatch],
    ) -> Vec<String> {
        log::info!("Tagging Phase 2: Asking AI to review and refine tags.");
        let candidate_names: Vec<&str> = candidates.iter().map(|t| t.tag_name.as_str()).collect();

        let prompt = format!(
            r#"You are an expert retail product classifier. Your goal is to select the most relevant and concise set of tags for a new product.

    **Product Name:** '{product_name}'
    **Product Description:** '{product_description}'
    **Initial Suggestions (from a vector embedding search):** {candidates}

    **Instructions:**
    1.  Review the initial suggestions. Keep the good ones and discard the irrelevant ones.
    2.  Based on the product's name and description, add any other critical tags that are missing. Aim for a final list of 5-7 total tags.
    3.  Return your final selection as a JSON object with one key: "final_tags", which is a list of lowercase strings.

    **JSON Response:**
    "#,
            candidates = serde_json::to_string(&candidate_names).unwrap_or_default()
        );

        let Some(response) = self
            .ai
            .text
            .generate_text(&prompt, GenerationMode::Thinking)
            .await
        else {
            return Vec::new();
        };

        match safe_json_from_llm::<RefinedTags>(&response) {
            Some(parsed) => {
                log::info!("Tagging Phase 2: AI refined list to: {:?}", parsed.final_tags);
                parsed.final_tags
            }
            None => {
                log::error!("Tagging Phase 2: Failed to decode JSON: {}", response);
                Vec::new()
            }
        }
    }

    /// Crea los tags que falten (con embedding). Los fallos por tag se loguean y se saltan.
    pub async fn reconcile_tags(&self, tenant_id: &str, refined_names: &[String]) -> Result<Vec<String>> {
        log::info!(
            "Tagging Phase 3: Reconciling {} final tags with DB.",
            refined_names.len()
        );
        let mut existing = self.tag_service.tag_name_map(tenant_id).await?;

        let mut seen = HashSet::new();
        let mut final_ids = Vec::new();

        for name in refined_names {
            let name_lower = name.trim().to_lowercase();
            if name_lower.is_empty() {
                continue;
            }

            if let Some(id) = existing.get(&name_lower) {
                log::info!("Tagging Phase 3: Found existing tag '{}'.", name_lower);
                if seen.insert(id.clone()) {
                    final_ids.push(id.clone());
                }
                continue;
            }

            log::info!(
                "Tagging Phase 3: Tag '{}' is new. Generating embedding and creating.",
                name_lower
            );
            let created = match self.ai.embedder.embed(&name_lower).await {
                Ok(embedding) => {
                    self.tag_service
                        .insert_tag(tenant_id, &name_lower, &embedding)
                        .await
                }
                Err(e) => Err(e),
            };

            match created {
                Ok(tag) => {
                    existing.insert(name_lower, tag.id.clone());
                    if seen.insert(tag.id.clone()) {
                        final_ids.push(tag.id);
                    }
                }
                Err(e) => {
                    log::error!(
                        "Tagging Phase 3: Exception while creating new tag '{}': {:?}",
                        name_lower,
                        e
                    );
                }
            }
        }

        log::info!("Tagging Phase 3: Reconciliation complete.");
        Ok(final_ids)
    }
}
