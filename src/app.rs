//! Wiring of the session store, guard and services for one client instance.

use std::sync::Arc;

use tracing::info;

use crate::backend::{Backend, MemoryBackend};
use crate::config::{AppConfig, BackendKind};
use crate::error::{ClinicError, Result};
use crate::guard::{GuardVerdict, RouteGuard};
use crate::local_state::{LocalState, Workflow};
use crate::notify::Notifier;
use crate::records::{FormController, RecordSubmitter};
use crate::services::{
    DashboardService, ExamService, InventoryService, PatientService, StaffService, TimeClockService,
};
use crate::session::SessionStore;

pub struct ClinicApp {
    backend: Arc<dyn Backend>,
    notifier: Notifier,
    sessions: Arc<SessionStore>,
    guard: RouteGuard,
}

impl ClinicApp {
    /// Build the backend and local state named by the configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let backend: Arc<dyn Backend> = match config.backend.kind {
            #[cfg(feature = "rest")]
            BackendKind::Rest => Arc::new(crate::backend::RestBackend::new(
                &config.backend.url,
                &config.backend.anon_key,
            )?),
            #[cfg(not(feature = "rest"))]
            BackendKind::Rest => {
                return Err(ClinicError::Validation(
                    "backend.kind: built without the rest feature".to_string(),
                ))
            }
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        let local = Arc::new(LocalState::open(&config.local_state.path).await?);
        info!(
            backend = ?config.backend.kind,
            policy = ?config.auth_timeout_policy(),
            "client configured"
        );
        Ok(Self::with_backend(config, backend, local))
    }

    pub fn with_backend(config: &AppConfig, backend: Arc<dyn Backend>, local: Arc<LocalState>) -> Self {
        let notifier = Notifier::new();
        let sessions = Arc::new(SessionStore::new(Arc::clone(&backend), local));
        let guard = RouteGuard::new(
            Arc::clone(&sessions),
            notifier.clone(),
            config.session_timeout(),
            config.auth_timeout_policy(),
        );
        Self {
            backend,
            notifier,
            sessions,
            guard,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn navigate(&self, path: &str) -> GuardVerdict {
        self.guard.check(path).await
    }

    pub async fn select_flow(&self, flow: Workflow) -> Result<()> {
        if self.sessions.current().await.is_none() {
            return Err(ClinicError::NotAuthenticated);
        }
        self.sessions.local_state().select_flow(flow).await
    }

    pub fn record_form(&self) -> FormController {
        FormController::new(self.notifier.clone())
    }

    pub fn record_submitter(&self) -> RecordSubmitter {
        RecordSubmitter::new(Arc::clone(&self.backend))
    }

    pub fn patients(&self) -> PatientService {
        PatientService::new(Arc::clone(&self.backend))
    }

    pub fn staff(&self) -> StaffService {
        StaffService::new(Arc::clone(&self.backend))
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(Arc::clone(&self.backend))
    }

    pub fn time_clock(&self) -> TimeClockService {
        TimeClockService::new(Arc::clone(&self.backend))
    }

    pub fn exams(&self) -> ExamService {
        ExamService::new(Arc::clone(&self.backend))
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(Arc::clone(&self.backend))
    }
}
