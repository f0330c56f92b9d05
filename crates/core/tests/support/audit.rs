use std::sync::Mutex;

use tenantlink_core::AuditLogger;
use tenantlink_domain::{AuditAction, AuditError, AuditEvent};

/// Audit logger that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAuditLogger {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditLogger {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.events.lock().unwrap().iter().map(|event| event.action).collect()
    }
}

impl AuditLogger for RecordingAuditLogger {
    fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Audit logger whose queue is always full.
#[derive(Default)]
pub struct FailingAuditLogger;

impl AuditLogger for FailingAuditLogger {
    fn append(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::QueueFull)
    }
}
