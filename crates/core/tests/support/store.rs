use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tenantlink_core::TenantConfigStore;
use tenantlink_domain::{StoreError, TenantIntegrationConfig, VersionedConfig};

type Interference = Box<dyn FnMut(&mut TenantIntegrationConfig) + Send>;

/// In-memory `TenantConfigStore` honouring version tokens.
///
/// Can simulate a concurrent writer (`interfere`), broken reads or writes,
/// and counts every call so tests can assert that no write happened.
#[derive(Default)]
pub struct InMemoryTenantConfigStore {
    documents: Mutex<HashMap<String, (TenantIntegrationConfig, u64)>>,
    interference: Mutex<Vec<Interference>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryTenantConfigStore {
    pub fn with_tenant(tenant_id: &str, record_id: Option<&str>) -> Self {
        let store = Self::default();
        store.seed(TenantIntegrationConfig::new(tenant_id, record_id.map(str::to_string)));
        store
    }

    pub fn seed(&self, config: TenantIntegrationConfig) {
        self.documents.lock().unwrap().insert(config.tenant_id.clone(), (config, 1));
    }

    /// Current document, bypassing the port.
    pub fn snapshot(&self, tenant_id: &str) -> TenantIntegrationConfig {
        self.documents.lock().unwrap()[tenant_id].0.clone()
    }

    pub fn version(&self, tenant_id: &str) -> u64 {
        self.documents.lock().unwrap()[tenant_id].1
    }

    /// Before each of the next writes, let another "writer" change the
    /// document first (one closure per write).
    pub fn interfere(&self, change: impl FnMut(&mut TenantIntegrationConfig) + Send + 'static) {
        self.interference.lock().unwrap().push(Box::new(change));
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Write attempts, successful or not.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantConfigStore for InMemoryTenantConfigStore {
    async fn read(&self, tenant_id: &str) -> Result<VersionedConfig, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend("store unavailable"));
        }

        let documents = self.documents.lock().unwrap();
        let (config, version) = documents
            .get(tenant_id)
            .ok_or_else(|| StoreError::NotFound { tenant_id: tenant_id.to_string() })?;
        Ok(VersionedConfig { config: config.clone(), version: *version })
    }

    async fn write(
        &self,
        tenant_id: &str,
        config: &TenantIntegrationConfig,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("write rejected"));
        }

        let pending = {
            let mut queue = self.interference.lock().unwrap();
            if queue.is_empty() { None } else { Some(queue.remove(0)) }
        };

        let mut documents = self.documents.lock().unwrap();
        let entry = documents
            .get_mut(tenant_id)
            .ok_or_else(|| StoreError::NotFound { tenant_id: tenant_id.to_string() })?;

        if let Some(mut change) = pending {
            change(&mut entry.0);
            entry.1 += 1;
        }

        if entry.1 != expected_version {
            return Err(StoreError::Conflict {
                tenant_id: tenant_id.to_string(),
                expected: expected_version,
                actual: entry.1,
            });
        }

        entry.0 = config.clone();
        entry.1 += 1;
        Ok(entry.1)
    }
}
