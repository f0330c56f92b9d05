//! Bounded audit queue and its background worker
//!
//! Appending never blocks: when the queue is full the event is rejected with
//! [`AuditError::QueueFull`] and the caller logs it. The worker owns the
//! receiving half, persists events in batches, and is started and stopped
//! explicitly. On stop it drains whatever is still queued before exiting.

use std::sync::Arc;
use std::time::Duration;

use tenantlink_core::AuditLogger;
use tenantlink_domain::{AuditConfig, AuditError, AuditEvent, Result, TenantLinkError};
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::database::SqliteAuditSink;

/// Largest batch handed to the sink in one transaction.
const MAX_BATCH: usize = 64;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// `AuditLogger` that enqueues onto a bounded channel.
#[derive(Clone)]
pub struct ChannelAuditLogger {
    tx: Sender<AuditEvent>,
}

impl AuditLogger for ChannelAuditLogger {
    fn append(&self, event: AuditEvent) -> std::result::Result<(), AuditError> {
        self.tx.try_send(event).map_err(|err| match err {
            TrySendError::Full(_) => AuditError::QueueFull,
            TrySendError::Closed(_) => AuditError::Closed,
        })
    }
}

/// Background audit worker with explicit lifecycle.
pub struct AuditWorker {
    sink: Arc<SqliteAuditSink>,
    rx: Option<Receiver<AuditEvent>>,
    task_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl AuditWorker {
    /// Create a worker and the logger that feeds it.
    ///
    /// Events appended before [`start`](Self::start) wait in the queue.
    pub fn new(sink: Arc<SqliteAuditSink>, config: &AuditConfig) -> (Self, ChannelAuditLogger) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let worker = Self {
            sink,
            rx: Some(rx),
            task_handle: None,
            cancellation: CancellationToken::new(),
        };
        (worker, ChannelAuditLogger { tx })
    }

    /// Spawn the drain task.
    ///
    /// A worker can be started once; its receiver moves into the task.
    pub fn start(&mut self) -> Result<()> {
        if self.task_handle.is_some() {
            return Err(TenantLinkError::Internal("Audit worker already running".to_string()));
        }
        let rx = self
            .rx
            .take()
            .ok_or_else(|| TenantLinkError::Internal("Audit worker already stopped".to_string()))?;

        info!("Starting audit worker");
        let sink = self.sink.clone();
        let cancel = self.cancellation.clone();
        self.task_handle = Some(tokio::spawn(async move {
            audit_worker(sink, rx, cancel).await;
        }));
        Ok(())
    }

    /// Stop the worker after flushing queued events.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            tokio::time::timeout(SHUTDOWN_TIMEOUT, handle)
                .await
                .map_err(|_| TenantLinkError::Internal("Audit worker shutdown timeout".to_string()))?
                .map_err(|e| TenantLinkError::Internal(format!("Task join failed: {e}")))?;
        }

        info!("Audit worker stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some() && !self.cancellation.is_cancelled()
    }
}

async fn audit_worker(
    sink: Arc<SqliteAuditSink>,
    mut rx: Receiver<AuditEvent>,
    cancel: CancellationToken,
) {
    let mut batch = Vec::with_capacity(MAX_BATCH);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                rx.close();
                while let Ok(event) = rx.try_recv() {
                    batch.push(event);
                }
                flush(&sink, &mut batch).await;
                info!("Audit worker shutting down");
                break;
            }
            received = rx.recv_many(&mut batch, MAX_BATCH) => {
                if received == 0 {
                    debug!("Audit queue closed");
                    break;
                }
                flush(&sink, &mut batch).await;
            }
        }
    }
}

async fn flush(sink: &SqliteAuditSink, batch: &mut Vec<AuditEvent>) {
    if batch.is_empty() {
        return;
    }
    let events = std::mem::take(batch);
    let count = events.len();
    match sink.persist(events).await {
        Ok(written) => debug!(written, "audit batch persisted"),
        Err(err) => warn!(dropped = count, error = %err, "audit batch could not be persisted"),
    }
}
