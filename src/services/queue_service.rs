//! services/queue_service.rs
//! Colas en DB (dispatcher, realtime, profiling): encolar, reclamar y cerrar.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::db::{new_id, now, DbPool};
use crate::models::queue_model::{QueueItem, QueueKind, QueueRecord, QueueStatus};

#[derive(sqlx::FromRow)]
struct ClaimedRow {
    id: String,
    event_type: String,
    payload: String,
}

#[derive(Clone, Debug)]
pub struct QueueService {
    db_pool: DbPool,
}

impl QueueService {
    pub fn new(db_pool: DbPool) -> Self {
        QueueService { db_pool }
    }

    /// Inserta una unidad de trabajo en estado "pending" y devuelve su id.
    pub async fn enqueue(&self, kind: QueueKind, event_type: &str, payload: &Value) -> Result<String> {
        let id = new_id();
        let ts = now();

        let sql = format!(
            r#"
            INSERT INTO {} (id, event_type, payload, status, last_error, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'pending', NULL, ?4, ?4)
            "#,
            kind.table()
        );

        sqlx::query(&sql)
            .bind(&id)
            .bind(event_type)
            .bind(payload.to_string())
            .bind(&ts)
            .execute(&self.db_pool)
            .await
            .with_context(|| format!("Error encolando en {}", kind.table()))?;

        Ok(id)
    }

    /// Reclama el item pendiente más antiguo y lo pasa a "processing".
    /// El UPDATE es atómico: dos workers nunca reclaman la misma fila.
    pub async fn claim_next(&self, kind: QueueKind) -> Result<Option<QueueItem>> {
        let sql = format!(
            r#"
            UPDATE {table}
            SET status = 'processing', updated_at = ?1
            WHERE id = (
                SELECT id FROM {table}
                WHERE status = 'pending'
                ORDER BY created_at ASC, rowid ASC
                LIMIT 1
            )
            RETURNING id, event_type, payload
            "#,
            table = kind.table()
        );

        let row = sqlx::query_as::<_, ClaimedRow>(&sql)
            .bind(now())
            .fetch_optional(&self.db_pool)
            .await
            .with_context(|| format!("Error reclamando de {}", kind.table()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload = match serde_json::from_str::<Value>(&row.payload) {
            Ok(v) => v,
            Err(e) => {
                // Payload ilegible: la fila queda "failed" para no reclamarla en bucle
                let msg = format!("Payload JSON inválido: {}", e);
                self.mark(kind, &row.id, QueueStatus::Failed, Some(&msg)).await?;
                return Err(anyhow!("{} ({} {})", msg, kind.table(), row.id));
            }
        };

        Ok(Some(QueueItem {
            id: row.id,
            event_type: row.event_type,
            payload,
        }))
    }

    pub async fn mark(
        &self,
        kind: QueueKind,
        id: &str,
        status: QueueStatus,
        last_error: Option<&str>,
    ) -> Result<()> {
        let sql = format!(
            r#"
            UPDATE {}
            SET status = ?1,
                last_error = ?2,
                updated_at = ?3
            WHERE id = ?4
            "#,
            kind.table()
        );

        sqlx::query(&sql)
            .bind(status.as_str())
            .bind(last_error)
            .bind(now())
            .bind(id)
            .execute(&self.db_pool)
            .await
            .with_context(|| format!("Error actualizando {}", kind.table()))?;

        Ok(())
    }

    pub async fn get(&self, kind: QueueKind, id: &str) -> Result<QueueRecord> {
        let sql = format!(
            r#"
            SELECT id, event_type, payload, status, last_error, created_at, updated_at
            FROM {}
            WHERE id = ?1
            "#,
            kind.table()
        );

        sqlx::query_as::<_, QueueRecord>(&sql)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .with_context(|| format!("No se encontró {} con id {}", kind.table(), id))
    }

    /// Todas las filas de la cola, de la más vieja a la más nueva.
    pub async fn list(&self, kind: QueueKind) -> Result<Vec<QueueRecord>> {
        let sql = format!(
            r#"
            SELECT id, event_type, payload, status, last_error, created_at, updated_at
            FROM {}
            ORDER BY created_at ASC, rowid ASC
            "#,
            kind.table()
        );

        sqlx::query_as::<_, QueueRecord>(&sql)
            .fetch_all(&self.db_pool)
            .await
            .with_context(|| format!("Error listando {}", kind.table()))
    }
}
