//! models/business_model.rs
//! Negocios (tenants) y sus clientes.

use serde::{Deserialize, Serialize};

use crate::config::prompts::DEFAULT_SYSTEM_PROMPT;

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

/// Request para registrar un negocio
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessCreate {
    pub business_name: String,
    pub whatsapp_number: String,
    /// ID del número en Meta for Developers
    pub whatsapp_phone_number_id: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    pub business_bio: Option<String>,
    /// Solo se escribe; nunca se devuelve en las respuestas.
    pub whatsapp_access_token: Option<String>,
}

impl BusinessCreate {
    pub fn validate(&self) -> Result<(), String> {
        if self.business_name.trim().is_empty() {
            return Err("business_name must not be empty".to_string());
        }
        if self.whatsapp_number.trim().is_empty() {
            return Err("whatsapp_number must not be empty".to_string());
        }
        if self.whatsapp_phone_number_id.trim().is_empty() {
            return Err("whatsapp_phone_number_id must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessRead {
    pub id: String,
    pub business_name: String,
    pub whatsapp_number: String,
    pub whatsapp_phone_number_id: String,
    pub system_prompt: String,
    pub business_bio: Option<String>,
    pub created_at: String,
}

/// Credenciales para enviar mensajes en nombre del negocio
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WhatsAppCredentials {
    pub whatsapp_phone_number_id: String,
    pub whatsapp_access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomerRecord {
    pub id: String,
    pub business_id: String,
    pub phone_number: String,
    pub customer_name: String,
}

/// Un turno de la conversación, tal como se le pasa al LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemoryFact {
    pub fact_key: String,
    pub fact_value: String,
}
