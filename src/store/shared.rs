use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::models::{
    KpiSnapshot, Resolution, Settings, SettingsUpdate, Student, Term, VerificationRequest,
};

use super::DemoStore;

/// Cloneable handle for serving one store to concurrent callers.
///
/// Every write, and every read that recomputes, runs under the write guard,
/// so a request lookup and the mutation that follows it are one critical
/// section.
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<DemoStore>>,
}

impl SharedStore {
    pub fn new(store: DemoStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&DemoStore) -> R) -> R {
        let store = self.inner.read().await;
        f(&*store)
    }

    pub async fn write<R>(&self, f: impl FnOnce(&mut DemoStore) -> R) -> R {
        let mut store = self.inner.write().await;
        f(&mut *store)
    }

    pub async fn list_terms(&self) -> Vec<Term> {
        self.read(|store| store.list_terms()).await
    }

    pub async fn get_settings(&self) -> Settings {
        self.read(|store| store.get_settings()).await
    }

    pub async fn list_verification_requests(&self, term_id: &str) -> Vec<VerificationRequest> {
        self.read(|store| store.list_verification_requests(term_id, None))
            .await
    }

    pub async fn list_students(&self, term_id: &str) -> Vec<Student> {
        self.write(|store| store.list_students(term_id)).await
    }

    /// Known terms are served from the cached snapshot under the read guard.
    pub async fn get_kpis(&self, term_id: &str) -> KpiSnapshot {
        if let Some(kpis) = self.read(|store| store.cached_kpis(term_id)).await {
            return kpis;
        }
        self.write(|store| store.get_kpis(term_id)).await
    }

    pub async fn confirm(&self, request_id: &str) -> StoreResult<Resolution> {
        self.write(|store| store.confirm(request_id)).await
    }

    pub async fn reject(&self, request_id: &str, reason: &str) -> StoreResult<Resolution> {
        self.write(|store| store.reject(request_id, reason)).await
    }

    pub async fn flag(&self, request_id: &str, reason: &str) -> StoreResult<Resolution> {
        self.write(|store| store.flag(request_id, reason)).await
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Settings {
        self.write(|store| store.update_settings(update)).await
    }
}
