//! services/promotion_service.rs

use anyhow::{Context, Result};

use crate::db::{new_id, now, DbPool};
use crate::errors::AppError;
use crate::models::promotion_model::{PromotionCreate, PromotionRead};
use crate::services::business_service::BusinessService;

#[derive(Clone, Debug)]
pub struct PromotionService {
    db_pool: DbPool,
    business_service: BusinessService,
}

impl PromotionService {
    pub fn new(db_pool: DbPool, business_service: BusinessService) -> Self {
        Self {
            db_pool,
            business_service,
        }
    }

    pub async fn create_promotion(&self, business_id: &str, req: PromotionCreate) -> Result<PromotionRead> {
        req.validate().map_err(AppError::Validation)?;
        self.business_service.ensure_exists(business_id).await?;

        if let Some(product_id) = &req.product_id {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM products WHERE id = ?1 AND tenant_id = ?2",
            )
            .bind(product_id)
            .bind(business_id)
            .fetch_one(&self.db_pool)
            .await?;
            if exists == 0 {
                return Err(AppError::NotFound(format!("Product '{}'", product_id)).into());
            }
        }

        let record = PromotionRead {
            id: new_id(),
            business_id: business_id.to_string(),
            promo_description: req.promo_description,
            product_id: req.product_id,
            discount_percentage: req.discount_percentage,
            discount_amount: req.discount_amount,
            start_date: req.start_date.map(|d| d.to_rfc3339()),
            end_date: req.end_date.map(|d| d.to_rfc3339()),
            is_active: req.is_active,
            created_at: now(),
        };

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, business_id, promo_description, product_id, discount_percentage,
                discount_amount, start_date, end_date, is_active, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&record.id)
        .bind(&record.business_id)
        .bind(&record.promo_description)
        .bind(&record.product_id)
        .bind(record.discount_percentage)
        .bind(record.discount_amount)
        .bind(&record.start_date)
        .bind(&record.end_date)
        .bind(record.is_active)
        .bind(&record.created_at)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar promoción")?;

        log::info!("Promotion '{}' created for business {}", record.id, business_id);
        Ok(record)
    }
}
