//! services/tag_service.rs
//! Tags de producto por tenant, con su embedding precalculado.

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::db::{new_id, now, DbPool};
use crate::errors::{is_unique_violation, AppError};
use crate::models::tag_model::{TagMatch, TagRead};
use crate::services::business_service::BusinessService;
use crate::services::llm_service::AiClients;
use crate::utils::vector::{decode_embedding, encode_embedding, top_matches};

#[derive(sqlx::FromRow)]
struct TagEmbeddingRow {
    id: String,
    tag_name: String,
    embedding: Option<String>,
}

#[derive(Clone)]
pub struct TagService {
    db_pool: DbPool,
    business_service: BusinessService,
    ai: AiClients,
}

impl TagService {
    pub fn new(db_pool: DbPool, business_service: BusinessService, ai: AiClients) -> Self {
        Self {
            db_pool,
            business_service,
            ai,
        }
    }

    /// Crea un tag (en minúsculas) y guarda su embedding para búsquedas futuras.
    pub async fn create_tag(&self, tenant_id: &str, tag_name: &str) -> Result<TagRead> {
        let tag_name_lower = tag_name.trim().to_lowercase();
        if tag_name_lower.is_empty() {
            return Err(AppError::Validation("tag_name must not be empty".to_string()).into());
        }
        self.business_service.ensure_exists(tenant_id).await?;

        log::info!(
            "Attempting to create tag '{}' for tenant {}",
            tag_name_lower,
            tenant_id
        );

        let embedding = self.ai.embedder.embed(&tag_name_lower).await?;
        let tag = self.insert_tag(tenant_id, &tag_name_lower, &embedding).await?;

        log::info!(
            "Successfully created tag '{}' with ID: {}",
            tag.tag_name,
            tag.id
        );
        Ok(tag)
    }

    /// INSERT directo; `Conflict` si el nombre ya existe para el tenant.
    pub async fn insert_tag(&self, tenant_id: &str, tag_name: &str, embedding: &[f32]) -> Result<TagRead> {
        let id = new_id();
        let result = sqlx::query(
            r#"
            INSERT INTO product_tags (id, tenant_id, tag_name, embedding, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(tenant_id)
        .bind(tag_name)
        .bind(encode_embedding(embedding)?)
        .bind(now())
        .execute(&self.db_pool)
        .await;

        match result {
            Ok(_) => Ok(TagRead {
                id,
                tenant_id: tenant_id.to_string(),
                tag_name: tag_name.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(format!(
                "Tag '{}' already exists for this tenant.",
                tag_name
            ))
            .into()),
            Err(e) => Err(anyhow::Error::new(e).context("Error creando product_tag")),
        }
    }

    pub async fn list_tags(&self, tenant_id: &str) -> Result<Vec<TagRead>> {
        sqlx::query_as::<_, TagRead>(
            r#"
            SELECT id, tenant_id, tag_name
            FROM product_tags
            WHERE tenant_id = ?1
            ORDER BY tag_name
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar tags")
    }

    /// nombre -> id, para reconciliar sin consultar la DB en cada vuelta
    pub async fn tag_name_map(&self, tenant_id: &str) -> Result<HashMap<String, String>> {
        Ok(self
            .list_tags(tenant_id)
            .await?
            .into_iter()
            .map(|t| (t.tag_name, t.id))
            .collect())
    }

    /// Búsqueda vectorial sobre los embeddings de tags del tenant.
    pub async fn match_tags(
        &self,
        tenant_id: &str,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<TagMatch>> {
        let rows = sqlx::query_as::<_, TagEmbeddingRow>(
            r#"
            SELECT id, tag_name, embedding
            FROM product_tags
            WHERE tenant_id = ?1 AND embedding IS NOT NULL
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al leer embeddings de tags")?;

        let candidates = rows
            .into_iter()
            .filter_map(|r| {
                let emb = r.embedding.as_deref().and_then(decode_embedding)?;
                Some(((r.id, r.tag_name), emb))
            })
            .collect();

        Ok(top_matches(query_embedding, candidates, threshold, limit)
            .into_iter()
            .map(|((id, tag_name), similarity)| TagMatch {
                id,
                tag_name,
                similarity,
            })
            .collect())
    }
}
