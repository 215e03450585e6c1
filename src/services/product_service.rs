//! services/product_service.rs
//! Alta de productos con descripción sintética, embedding y tagging.

use anyhow::{Context, Result};

use crate::db::{new_id, now, DbPool};
use crate::errors::AppError;
use crate::models::product_model::{ProductCreate, ProductRead};
use crate::services::business_service::BusinessService;
use crate::services::llm_service::{AiClients, GenerationMode};
use crate::services::tagging_service::TaggingService;
use crate::utils::vector::encode_embedding;

#[derive(Clone)]
pub struct ProductService {
    db_pool: DbPool,
    business_service: BusinessService,
    tagging_service: TaggingService,
    ai: AiClients,
}

impl ProductService {
    pub fn new(
        db_pool: DbPool,
        business_service: BusinessService,
        tagging_service: TaggingService,
        ai: AiClients,
    ) -> Self {
        Self {
            db_pool,
            business_service,
            tagging_service,
            ai,
        }
    }

    /// Descripción rica para el sistema de recomendaciones.
    /// Si el LLM falla se usa "nombre. descripción".
    pub async fn generate_synthetic_description(
        &self,
        product_name: &str,
        user_description: Option<&str>,
    ) -> String {
        let prompt = format!(
            r#"You are a creative copywriter for a retail store.
    Given the following product information, write a rich, one-paragraph descriptive text that would be useful for a recommendation system.
    Include key attributes, potential use cases, and associated concepts. Do not use markdown.

    Product Name: '{}'
    User's Provided Description: '{}'

    Rich Description:
    "#,
            product_name,
            user_description.unwrap_or("None provided")
        );

        match self.ai.text.generate_text(&prompt, GenerationMode::Fast).await {
            Some(text) if !text.trim().is_empty() => {
                log::info!("Generated synthetic description for '{}'", product_name);
                text.trim().to_string()
            }
            _ => {
                log::warn!(
                    "Gemini failed to generate a synthetic description for '{}'. Falling back to original description.",
                    product_name
                );
                fallback_description(product_name, user_description)
            }
        }
    }

    /// Flujo completo de creación de un producto (5 pasos).
    pub async fn create_product(&self, tenant_id: &str, product: ProductCreate) -> Result<ProductRead> {
        product.validate().map_err(AppError::Validation)?;
        self.business_service.ensure_exists(tenant_id).await?;

        log::info!(
            "--- PRODUCT CREATION WORKFLOW STARTED for '{}' ---",
            product.product_name
        );

        log::info!("[STEP 1/5] Generating synthetic description...");
        let synthetic_desc = self
            .generate_synthetic_description(&product.product_name, product.description.as_deref())
            .await;
        let preview: String = synthetic_desc.chars().take(100).collect();
        log::info!("[STEP 1/5] Synthetic description generated: '{}...'", preview);

        log::info!("[STEP 2/5] Generating product embedding...");
        let embedding = self
            .ai
            .embedder
            .embed(&synthetic_desc)
            .await
            .context("Fallo al generar embedding del producto")?;

        log::info!("[STEP 3/5] Inserting product into database...");
        let record = self
            .insert_product(tenant_id, &product, &synthetic_desc, &embedding)
            .await?;
        log::info!("[STEP 3/5] Product '{}' created successfully in DB.", record.id);

        log::info!("[STEP 4/5] Suggesting and reconciling tags...");
        let tag_ids = self
            .tagging_service
            .suggest_and_reconcile_tags(tenant_id, &record.product_name, &synthetic_desc, &embedding)
            .await?;

        if !tag_ids.is_empty() {
            self.associate_tags(&record.id, &tag_ids).await?;
            log::info!(
                "[STEP 5/5] Associated {} tags with product '{}'.",
                tag_ids.len(),
                record.id
            );
        }

        Ok(record)
    }

    async fn insert_product(
        &self,
        tenant_id: &str,
        product: &ProductCreate,
        synthetic_desc: &str,
        embedding: &[f32],
    ) -> Result<ProductRead> {
        let record = ProductRead {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            product_name: product.product_name.clone(),
            description: product.description.clone(),
            list_price: product.list_price,
            floor_price: product.floor_price,
            image_url: product.image_url.clone(),
            is_active: product.is_active,
            generated_description: Some(synthetic_desc.to_string()),
            created_at: now(),
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, product_name, description, list_price, floor_price,
                image_url, is_active, generated_description, description_embedding, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&record.id)
        .bind(&record.tenant_id)
        .bind(&record.product_name)
        .bind(&record.description)
        .bind(record.list_price)
        .bind(record.floor_price)
        .bind(&record.image_url)
        .bind(record.is_active)
        .bind(&record.generated_description)
        .bind(encode_embedding(embedding)?)
        .bind(&record.created_at)
        .execute(&self.db_pool)
        .await
        .context("DB Error: Failed to create product.")?;

        Ok(record)
    }

    async fn associate_tags(&self, product_id: &str, tag_ids: &[String]) -> Result<()> {
        let mut tx = self.db_pool.begin().await?;
        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO product_tag_associations (product_id, tag_id)
                VALUES (?1, ?2)
                "#,
            )
            .bind(product_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Fallo al asociar tag")?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_tag_ids_for_product(&self, product_id: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT tag_id FROM product_tag_associations WHERE product_id = ?1 ORDER BY tag_id",
        )
        .bind(product_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al leer tags del producto")
    }
}

pub fn fallback_description(product_name: &str, user_description: Option<&str>) -> String {
    format!("{}. {}", product_name, user_description.unwrap_or(""))
        .trim()
        .to_string()
}
