//! services/dispatcher_service.rs
//! Enruta los eventos del dispatcher hacia las colas especializadas.

use anyhow::Result;

use crate::models::queue_model::{
    QueueItem, QueueKind, QueueStatus, EVENT_NEW_INBOUND_MESSAGE, EVENT_SEND_OUTBOUND_MESSAGE,
    TASK_EXECUTE_WHATSAPP_SEND, TASK_HANDLE_USER_MESSAGE,
};
use crate::services::queue_service::QueueService;

/// Resultado de procesar un evento
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Se creó la tarea realtime con este id
    Routed { task_id: String },
    /// Tipo sin ruta: el evento quedó "failed"
    Unroutable,
}

/// Tabla de ruteo: tipo de evento -> tipo de tarea realtime.
pub fn route_for(event_type: &str) -> Option<&'static str> {
    match event_type {
        EVENT_NEW_INBOUND_MESSAGE => Some(TASK_HANDLE_USER_MESSAGE),
        // Los salientes también son prioritarios: van a la cola realtime
        EVENT_SEND_OUTBOUND_MESSAGE => Some(TASK_EXECUTE_WHATSAPP_SEND),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct DispatcherService {
    queue_service: QueueService,
}

impl DispatcherService {
    pub fn new(queue_service: QueueService) -> Self {
        Self { queue_service }
    }

    /// Reclama y enruta un evento. `None` si la cola estaba vacía.
    pub async fn dispatch_next(&self) -> Result<Option<DispatchOutcome>> {
        let Some(event) = self.queue_service.claim_next(QueueKind::Dispatcher).await? else {
            return Ok(None);
        };
        self.dispatch(event).await.map(Some)
    }

    pub async fn dispatch(&self, event: QueueItem) -> Result<DispatchOutcome> {
        log::info!(
            "DISPATCHER: Processing event {} of type '{}'",
            event.id,
            event.event_type
        );

        let Some(task_type) = route_for(&event.event_type) else {
            log::warn!(
                "DISPATCHER: No route found for event type '{}'. Marking as failed.",
                event.event_type
            );
            self.queue_service
                .mark(
                    QueueKind::Dispatcher,
                    &event.id,
                    QueueStatus::Failed,
                    Some(&format!("No route for event type '{}'", event.event_type)),
                )
                .await?;
            return Ok(DispatchOutcome::Unroutable);
        };

        let routed = self
            .queue_service
            .enqueue(QueueKind::Realtime, task_type, &event.payload)
            .await;

        match routed {
            Ok(task_id) => {
                self.queue_service
                    .mark(QueueKind::Dispatcher, &event.id, QueueStatus::Dispatched, None)
                    .await?;
                log::info!(
                    "DISPATCHER: Event {} dispatched to 'realtime_tasks' as '{}'.",
                    event.id,
                    task_type
                );
                Ok(DispatchOutcome::Routed { task_id })
            }
            Err(e) => {
                self.queue_service
                    .mark(
                        QueueKind::Dispatcher,
                        &event.id,
                        QueueStatus::Failed,
                        Some(&format!("{:?}", e)),
                    )
                    .await?;
                Err(e)
            }
        }
    }
}
