//! handlers/webhook_handler.rs
//! Webhook de la Cloud API de WhatsApp. El POST solo encola; el trabajo lo hace el worker.

use actix_web::{web, HttpRequest, HttpResponse};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::app_config::AppConfig;
use crate::errors::{error_response, AppError};
use crate::models::queue_model::{QueueKind, EVENT_NEW_INBOUND_MESSAGE};
use crate::models::whatsapp_model::is_inbound_text_message;
use crate::services::queue_service::QueueService;
use crate::utils::security::{verify_whatsapp_signature, SIGNATURE_HEADER};

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// GET /webhooks/whatsapp
pub async fn verify_webhook_endpoint(
    config: web::Data<AppConfig>,
    query: web::Query<VerifyQuery>,
) -> HttpResponse {
    let mode_ok = query.mode.as_deref().map_or(true, |m| m == "subscribe");
    let token_ok = match (&config.verify_token, &query.verify_token) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    };

    if mode_ok && token_ok {
        log::info!("WEBHOOK: Verification successful.");
        HttpResponse::Ok()
            .content_type("text/plain")
            .body(query.challenge.clone().unwrap_or_default())
    } else {
        log::warn!("WEBHOOK: Verification failed. Invalid verify token.");
        error_response(
            &AppError::Unauthorized("Invalid verify token.".to_string()).into(),
            "Verification failed",
        )
    }
}

/// POST /webhooks/whatsapp
/// Siempre 202 salvo firma inválida (403). Lo que no es un mensaje de texto se ignora.
pub async fn receive_webhook_endpoint(
    req: HttpRequest,
    body: Bytes,
    config: web::Data<AppConfig>,
    queue_service: web::Data<QueueService>,
) -> HttpResponse {
    if let Some(secret) = &config.whatsapp_app_secret {
        let header = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");
        if !verify_whatsapp_signature(&body, header, secret) {
            log::warn!("WEBHOOK: Invalid or missing {} header.", SIGNATURE_HEADER);
            return error_response(
                &AppError::Unauthorized("Request signature could not be verified.".to_string())
                    .into(),
                "Invalid signature",
            );
        }
    }

    let accepted = HttpResponse::Accepted().json(json!({ "status": "event received" }));

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("WEBHOOK: Ignoring unparseable payload: {}", e);
            return accepted;
        }
    };

    if !is_inbound_text_message(&payload) {
        log::info!("WEBHOOK: Received a non-message event (e.g., status update). Ignoring.");
        return accepted;
    }

    match queue_service
        .enqueue(QueueKind::Dispatcher, EVENT_NEW_INBOUND_MESSAGE, &payload)
        .await
    {
        Ok(event_id) => log::info!("WEBHOOK: Queued inbound message as event {}.", event_id),
        Err(e) => log::error!("WEBHOOK: Failed to queue inbound message: {:?}", e),
    }

    accepted
}
