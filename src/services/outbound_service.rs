//! services/outbound_service.rs
//! Entrega de mensajes salientes. Solo entrega; el contenido ya viene armado.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;

use crate::models::whatsapp_model::{OutboundEnvelope, CHANNEL_WHATSAPP};
use crate::services::business_service::BusinessService;

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Delivered,
    /// DEV_MODE: solo se logueó
    Simulated,
    UnsupportedChannel(String),
}

#[derive(Clone)]
pub struct OutboundService {
    business_service: BusinessService,
    http_client: Client,
    api_base_url: String,
    dev_mode: bool,
}

impl OutboundService {
    pub fn new(business_service: BusinessService, api_base_url: &str, dev_mode: bool) -> Self {
        Self {
            business_service,
            http_client: Client::new(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            dev_mode,
        }
    }

    /// Ejecuta una tarea `execute_whatsapp_send`: `{config: {business_id, channel}, data}`.
    pub async fn execute_send(&self, payload: &Value) -> Result<DeliveryOutcome> {
        let envelope: OutboundEnvelope = serde_json::from_value(payload.clone())
            .context("Payload de envío inválido")?;

        let config = envelope.config.unwrap_or_default();

        let (Some(business_id), Some(channel), Some(data)) =
            (config.business_id, config.channel, envelope.data)
        else {
            return Err(anyhow!(
                "Missing business_id, channel, or data payload for sending message."
            ));
        };

        if channel != CHANNEL_WHATSAPP {
            log::warn!("REALTIME: Outbound channel '{}' not supported yet.", channel);
            return Ok(DeliveryOutcome::UnsupportedChannel(channel));
        }

        self.send_whatsapp_message(&business_id, &data).await
    }

    /// Manda `message_payload` tal cual a la Graph API en nombre del negocio.
    pub async fn send_whatsapp_message(&self, business_id: &str, message_payload: &Value) -> Result<DeliveryOutcome> {
        let to_number = message_payload
            .get("to")
            .and_then(Value::as_str)
            .unwrap_or("-");
        log::info!(
            "OUTBOUND: Preparing to deliver payload for business {} to {}.",
            business_id,
            to_number
        );

        // 1) Credenciales
        let credentials = self
            .business_service
            .get_credentials(business_id)
            .await
            .with_context(|| format!("OUTBOUND: Failed to fetch credentials for business {}", business_id))?
            .ok_or_else(|| anyhow!("OUTBOUND: Business {} not found.", business_id))?;

        let access_token = credentials
            .whatsapp_access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("OUTBOUND: Missing credentials for business {}.", business_id))?;
        let phone_number_id = credentials.whatsapp_phone_number_id;

        // 2) DEV MODE
        if self.dev_mode {
            log::info!("--- DEV MODE: SIMULATED WHATSAPP PAYLOAD SEND ---");
            log::info!("  Business ID: {}", business_id);
            log::info!("     Phone ID: {}", phone_number_id);
            log::info!("      PAYLOAD: {}", message_payload);
            log::info!("---------------------------------------------");
            return Ok(DeliveryOutcome::Simulated);
        }

        // 3) Envío real
        let url = format!("{}/{}/messages", self.api_base_url, phone_number_id);
        log::info!("OUTBOUND: Delivering production payload to {}...", to_number);

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(&access_token)
            .json(message_payload)
            .send()
            .await
            .context("OUTBOUND: Fallo al hacer POST a la Graph API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_txt = resp.text().await.unwrap_or_default();
            log::error!(
                "OUTBOUND: HTTP Error delivering payload for business {}: {} - {}",
                business_id,
                status,
                body_txt
            );
            return Err(anyhow!("WhatsApp API respondió {}: {}", status, body_txt));
        }

        log::info!("OUTBOUND: Payload delivered successfully for business {}.", business_id);
        Ok(DeliveryOutcome::Delivered)
    }
}
