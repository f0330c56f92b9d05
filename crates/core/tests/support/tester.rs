use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tenantlink_core::{ConnectionTester, ProbeFailure, ProbeResponse};

/// `ConnectionTester` returning a fixed answer, optionally after a delay.
pub struct ScriptedTester {
    answer: Mutex<Result<ProbeResponse, ProbeFailure>>,
    delay: Mutex<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTester {
    pub fn responding(status_code: u16) -> Self {
        Self {
            answer: Mutex::new(Ok(ProbeResponse { status_code, reason: None })),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_with(&self, status_code: u16, reason: Option<&str>) {
        *self.answer.lock().unwrap() =
            Ok(ProbeResponse { status_code, reason: reason.map(str::to_string) });
    }

    pub fn fail_with(&self, failure: ProbeFailure) {
        *self.answer.lock().unwrap() = Err(failure);
    }

    pub fn delay_by(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// URLs posted to, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionTester for ScriptedTester {
    async fn post(&self, url: &str, _timeout: Duration) -> Result<ProbeResponse, ProbeFailure> {
        self.calls.lock().unwrap().push(url.to_string());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.answer.lock().unwrap().clone()
    }
}
