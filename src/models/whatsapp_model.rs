//! models/whatsapp_model.rs
//! Payloads de la Cloud API de WhatsApp (entrada por webhook y salida).

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const WHATSAPP_OBJECT: &str = "whatsapp_business_account";
pub const CHANNEL_WHATSAPP: &str = "whatsapp";

/// Datos que nos importan de un mensaje entrante
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub business_phone_number_id: String,
    pub user_phone: String,
    /// Solo hace falta al crear un customer nuevo
    pub user_name: Option<String>,
    pub text: String,
}

fn first_change_value(payload: &Value) -> Option<&Value> {
    payload
        .get("entry")?
        .get(0)?
        .get("changes")?
        .get(0)?
        .get("value")
}

/// true solo si es un evento de la cuenta business y el primer mensaje es de texto.
/// Actualizaciones de estado y otros eventos devuelven false.
pub fn is_inbound_text_message(payload: &Value) -> bool {
    if payload.get("object").and_then(Value::as_str) != Some(WHATSAPP_OBJECT) {
        return false;
    }
    first_change_value(payload)
        .and_then(|v| v.get("messages"))
        .and_then(|m| m.get(0))
        .and_then(|m| m.get("type"))
        .and_then(Value::as_str)
        == Some("text")
}

impl InboundMessage {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let value = first_change_value(payload)
            .ok_or_else(|| anyhow!("Payload sin entry[0].changes[0].value"))?;

        let field = |v: Option<&Value>, name: &str| -> Result<String> {
            v.and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("Falta el campo '{}' en el payload", name))
        };

        let contact = value.get("contacts").and_then(|c| c.get(0));
        let message = value.get("messages").and_then(|m| m.get(0));

        Ok(InboundMessage {
            business_phone_number_id: field(
                value.get("metadata").and_then(|m| m.get("phone_number_id")),
                "metadata.phone_number_id",
            )?,
            user_phone: field(contact.and_then(|c| c.get("wa_id")), "contacts[0].wa_id")?,
            user_name: contact
                .and_then(|c| c.get("profile"))
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            text: field(
                message.and_then(|m| m.get("text")).and_then(|t| t.get("body")),
                "messages[0].text.body",
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBody {
    pub body: String,
}

/// Mensaje de texto listo para la Graph API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundTextMessage {
    pub messaging_product: String,
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: TextBody,
}

impl OutboundTextMessage {
    pub fn new(to: &str, body: &str) -> Self {
        Self {
            messaging_product: CHANNEL_WHATSAPP.to_string(),
            to: to.to_string(),
            message_type: "text".to_string(),
            text: TextBody {
                body: body.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundConfig {
    pub channel: Option<String>,
    pub business_id: Option<String>,
}

/// Payload de `send_outbound_message` / `execute_whatsapp_send`.
/// `data` se manda tal cual como body JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub data: Option<Value>,
    #[serde(default)]
    pub config: Option<OutboundConfig>,
}
