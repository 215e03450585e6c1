//! models/queue_model.rs
//! Colas en DB que conectan la API con el worker.

use serde::{Deserialize, Serialize};

// Tipos de evento del dispatcher
pub const EVENT_NEW_INBOUND_MESSAGE: &str = "new_inbound_message";
pub const EVENT_SEND_OUTBOUND_MESSAGE: &str = "send_outbound_message";

// Tipos de tarea realtime
pub const TASK_HANDLE_USER_MESSAGE: &str = "handle_user_message";
pub const TASK_EXECUTE_WHATSAPP_SEND: &str = "execute_whatsapp_send";

// Tipos de tarea de perfilado
pub const TASK_RUN_PROFILING_ANALYSIS: &str = "run_profiling_analysis";

/// Las tres colas. Cada una es una tabla con el mismo esquema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Dispatcher,
    Realtime,
    Profiling,
}

impl QueueKind {
    pub fn table(&self) -> &'static str {
        match self {
            QueueKind::Dispatcher => "event_dispatcher",
            QueueKind::Realtime => "realtime_tasks",
            QueueKind::Profiling => "profiling_tasks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Dispatched,
    Complete,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Dispatched => "dispatched",
            QueueStatus::Complete => "complete",
            QueueStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(QueueStatus::Pending),
            "processing" => Some(QueueStatus::Processing),
            "dispatched" => Some(QueueStatus::Dispatched),
            "complete" => Some(QueueStatus::Complete),
            "failed" => Some(QueueStatus::Failed),
            _ => None,
        }
    }
}

/// Unidad de trabajo reclamada de una cola
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// Fila completa, para consultas de estado
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueRecord {
    pub id: String,
    pub event_type: String,
    pub payload: String,
    pub status: String,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
