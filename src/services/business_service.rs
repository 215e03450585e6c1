//! services/business_service.rs
//! Negocios (tenants), sus clientes y el historial de conversación.

use anyhow::{Context, Result};

use crate::db::{new_id, now, DbPool};
use crate::errors::{is_unique_violation, AppError};
use crate::models::business_model::{
    BusinessCreate, BusinessRead, ConversationTurn, CustomerRecord, MemoryFact,
    WhatsAppCredentials,
};

#[derive(Clone, Debug)]
pub struct BusinessService {
    db_pool: DbPool,
}

impl BusinessService {
    pub fn new(db_pool: DbPool) -> Self {
        BusinessService { db_pool }
    }

    /// Registra un negocio nuevo. El phone_number_id es único.
    pub async fn create_business(&self, req: BusinessCreate) -> Result<BusinessRead> {
        req.validate().map_err(AppError::Validation)?;
        log::info!("Attempting to create business: {}", req.business_name);

        let id = new_id();
        let created_at = now();

        let result = sqlx::query(
            r#"
            INSERT INTO businesses (
                id, business_name, whatsapp_number, whatsapp_phone_number_id,
                whatsapp_access_token, system_prompt, business_bio, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(&req.business_name)
        .bind(&req.whatsapp_number)
        .bind(&req.whatsapp_phone_number_id)
        .bind(&req.whatsapp_access_token)
        .bind(&req.system_prompt)
        .bind(&req.business_bio)
        .bind(&created_at)
        .execute(&self.db_pool)
        .await;

        if let Err(e) = result {
            if is_unique_violation(&e) {
                return Err(AppError::Conflict(format!(
                    "A business with whatsapp_phone_number_id '{}' already exists.",
                    req.whatsapp_phone_number_id
                ))
                .into());
            }
            return Err(anyhow::Error::new(e).context("Fallo al insertar business"));
        }

        log::info!("Successfully created business with ID: {}", id);
        Ok(BusinessRead {
            id,
            business_name: req.business_name,
            whatsapp_number: req.whatsapp_number,
            whatsapp_phone_number_id: req.whatsapp_phone_number_id,
            system_prompt: req.system_prompt,
            business_bio: req.business_bio,
            created_at,
        })
    }

    pub async fn get_business(&self, business_id: &str) -> Result<BusinessRead> {
        sqlx::query_as::<_, BusinessRead>(
            r#"
            SELECT id, business_name, whatsapp_number, whatsapp_phone_number_id,
                   system_prompt, business_bio, created_at
            FROM businesses
            WHERE id = ?1
            "#,
        )
        .bind(business_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al consultar business")?
        .ok_or_else(|| AppError::NotFound(format!("Business '{}'", business_id)).into())
    }

    /// Error `NotFound` si el tenant no existe.
    pub async fn ensure_exists(&self, business_id: &str) -> Result<()> {
        self.get_business(business_id).await.map(|_| ())
    }

    pub async fn find_by_phone_number_id(&self, phone_number_id: &str) -> Result<Option<BusinessRead>> {
        sqlx::query_as::<_, BusinessRead>(
            r#"
            SELECT id, business_name, whatsapp_number, whatsapp_phone_number_id,
                   system_prompt, business_bio, created_at
            FROM businesses
            WHERE whatsapp_phone_number_id = ?1
            "#,
        )
        .bind(phone_number_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al buscar business por phone_number_id")
    }

    pub async fn get_credentials(&self, business_id: &str) -> Result<Option<WhatsAppCredentials>> {
        sqlx::query_as::<_, WhatsAppCredentials>(
            r#"
            SELECT whatsapp_phone_number_id, whatsapp_access_token
            FROM businesses
            WHERE id = ?1
            "#,
        )
        .bind(business_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al leer credenciales de WhatsApp")
    }

    // ----------------------------------------------------------------
    // Clientes
    // ----------------------------------------------------------------

    pub async fn find_customer(
        &self,
        business_id: &str,
        phone_number: &str,
    ) -> Result<Option<CustomerRecord>> {
        sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, business_id, phone_number, customer_name
            FROM customers
            WHERE business_id = ?1 AND phone_number = ?2
            LIMIT 1
            "#,
        )
        .bind(business_id)
        .bind(phone_number)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al buscar customer")
    }

    /// Busca el cliente por (negocio, teléfono) y lo crea si no existe.
    pub async fn find_or_create_customer(
        &self,
        business_id: &str,
        phone_number: &str,
        customer_name: &str,
    ) -> Result<CustomerRecord> {
        if let Some(existing) = self.find_customer(business_id, phone_number).await? {
            log::info!("Found existing customer ID: {}", existing.id);
            return Ok(existing);
        }

        log::info!("New customer detected. Creating record for '{}'.", customer_name);
        // INSERT OR IGNORE: si otro proceso lo creó en paralelo, releemos abajo
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO customers (id, business_id, phone_number, customer_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(new_id())
        .bind(business_id)
        .bind(phone_number)
        .bind(customer_name)
        .bind(now())
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar customer")?;

        self.find_customer(business_id, phone_number)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Customer no encontrado después de crearlo"))
    }

    // ----------------------------------------------------------------
    // Conversación y memoria
    // ----------------------------------------------------------------

    /// Últimos `limit` turnos, en orden cronológico.
    pub async fn recent_history(&self, customer_id: &str, limit: i64) -> Result<Vec<ConversationTurn>> {
        let mut rows = sqlx::query_as::<_, ConversationTurn>(
            r#"
            SELECT role, content
            FROM conversations
            WHERE customer_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al leer historial")?;

        rows.reverse();
        Ok(rows)
    }

    pub async fn memory_facts(&self, customer_id: &str, limit: i64) -> Result<Vec<MemoryFact>> {
        sqlx::query_as::<_, MemoryFact>(
            r#"
            SELECT fact_key, fact_value
            FROM customer_memory
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al leer customer_memory")
    }

    pub async fn append_conversation(&self, customer_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        let mut tx = self.db_pool.begin().await?;
        for turn in turns {
            sqlx::query(
                r#"
                INSERT INTO conversations (id, customer_id, role, content, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(new_id())
            .bind(customer_id)
            .bind(&turn.role)
            .bind(&turn.content)
            .bind(now())
            .execute(&mut *tx)
            .await
            .context("Fallo al guardar conversación")?;
        }
        tx.commit().await?;
        Ok(())
    }
}
