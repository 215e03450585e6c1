//! worker.rs
//! Bucles de fondo del proceso worker: dispatcher, realtime y profiling.
//! Cada bucle es secuencial y duerme `poll_interval` entre vueltas; un error
//! en un item se loguea y el bucle sigue.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::queue_model::{
    QueueItem, QueueKind, QueueStatus, TASK_EXECUTE_WHATSAPP_SEND, TASK_HANDLE_USER_MESSAGE,
    TASK_RUN_PROFILING_ANALYSIS,
};
use crate::services::Services;

#[derive(Clone)]
pub struct Worker {
    services: Services,
    poll_interval: Duration,
    enable_profiling: bool,
}

impl Worker {
    pub fn new(services: Services, poll_interval: Duration, enable_profiling: bool) -> Self {
        Self {
            services,
            poll_interval,
            enable_profiling,
        }
    }

    /// Una vuelta del dispatcher. true si había un evento.
    pub async fn process_dispatcher_once(&self) -> Result<bool> {
        Ok(self.services.dispatcher.dispatch_next().await?.is_some())
    }

    /// Una vuelta de la cola realtime. true si había una tarea.
    pub async fn process_realtime_once(&self) -> Result<bool> {
        let Some(task) = self.services.queue.claim_next(QueueKind::Realtime).await? else {
            return Ok(false);
        };
        log::info!(
            "REALTIME: Processing task {} of type '{}'",
            task.id,
            task.event_type
        );

        let result = self.execute_realtime_task(&task).await;
        self.finish(QueueKind::Realtime, &task, result).await?;
        Ok(true)
    }

    async fn execute_realtime_task(&self, task: &QueueItem) -> Result<()> {
        match task.event_type.as_str() {
            TASK_HANDLE_USER_MESSAGE => {
                self.services.realtime.handle_user_message(&task.payload).await?;
                Ok(())
            }
            TASK_EXECUTE_WHATSAPP_SEND => {
                self.services.outbound.execute_send(&task.payload).await?;
                Ok(())
            }
            other => Err(anyhow!("Unknown event_type in realtime_tasks: {}", other)),
        }
    }

    /// Una vuelta de la cola de profiling. true si había una tarea.
    pub async fn process_profiling_once(&self) -> Result<bool> {
        let Some(task) = self.services.queue.claim_next(QueueKind::Profiling).await? else {
            return Ok(false);
        };
        log::info!(
            "PROFILING: Processing task {} of type '{}'",
            task.id,
            task.event_type
        );

        let result = match task.event_type.as_str() {
            TASK_RUN_PROFILING_ANALYSIS => self
                .services
                .profiling
                .run_profiling(&task.payload)
                .await
                .map(|_| ()),
            other => Err(anyhow!("Unknown event_type in profiling_tasks: {}", other)),
        };
        self.finish(QueueKind::Profiling, &task, result).await?;
        Ok(true)
    }

    async fn finish(&self, kind: QueueKind, task: &QueueItem, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.services
                    .queue
                    .mark(kind, &task.id, QueueStatus::Complete, None)
                    .await?;
                log::info!("{}: Task {} completed successfully.", kind.table(), task.id);
            }
            Err(e) => {
                log::error!("{}: Error processing task {}: {:?}", kind.table(), task.id, e);
                self.services
                    .queue
                    .mark(kind, &task.id, QueueStatus::Failed, Some(&format!("{:#}", e)))
                    .await?;
            }
        }
        Ok(())
    }

    /// Lanza los bucles. Terminan cuando `shutdown` pasa a true.
    pub fn spawn(&self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let w = self.clone();
        handles.push(tokio::spawn(run_loop(
            "Dispatcher",
            self.poll_interval,
            shutdown.clone(),
            move || {
                let w = w.clone();
                async move { w.process_dispatcher_once().await }
            },
        )));

        let w = self.clone();
        handles.push(tokio::spawn(run_loop(
            "Realtime",
            self.poll_interval,
            shutdown.clone(),
            move || {
                let w = w.clone();
                async move { w.process_realtime_once().await }
            },
        )));

        if self.enable_profiling {
            let w = self.clone();
            handles.push(tokio::spawn(run_loop(
                "Profiling",
                self.poll_interval,
                shutdown,
                move || {
                    let w = w.clone();
                    async move { w.process_profiling_once().await }
                },
            )));
        } else {
            log::info!("Profiling worker deshabilitado (ENABLE_PROFILING_WORKER=false).");
        }

        handles
    }
}

/// Bucle genérico de polling con apagado ordenado.
pub async fn run_loop<F, Fut>(
    name: &'static str,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut step: F,
) where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<bool>>,
{
    log::info!("{} worker started...", name);
    loop {
        if *shutdown.borrow() {
            break;
        }

        if let Err(e) = step().await {
            log::error!("Error in {} worker loop: {:?}", name, e);
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            changed = shutdown.changed() => {
                // Sender caído: nadie puede volver a avisar
                if changed.is_err() {
                    log::warn!("{} worker: shutdown channel closed.", name);
                    break;
                }
            }
        }
    }
    log::info!("{} worker stopped.", name);
}
