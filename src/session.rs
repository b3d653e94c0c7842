//! Session store
//!
//! Holds the signed-in identity, role and permission set. It is written on
//! sign-in, on an explicit permission refresh and on sign-out; everything
//! else only reads it.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::backend::{collections, select_as, Backend, Credentials, Filter};
use crate::error::{ClinicError, Result};
use crate::local_state::LocalState;
use crate::models::{Session, UserProfile};

pub struct SessionStore {
    backend: Arc<dyn Backend>,
    local: Arc<LocalState>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>, local: Arc<LocalState>) -> Self {
        Self {
            backend,
            local,
            current: RwLock::new(None),
        }
    }

    pub fn local_state(&self) -> &LocalState {
        &self.local
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let auth = self.backend.sign_in(credentials).await?;
        let profile = self.load_profile(&auth.user.id).await?;
        let session = Session::from_profile(auth.user.email, profile);

        self.local.set_authenticated(true).await?;
        *self.current.write().await = Some(session.clone());
        info!(user_id = %session.user_id, role = session.role.as_str(), "signed in");
        Ok(session)
    }

    /// Ends the session locally even when the backend call fails.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.backend.sign_out().await;
        *self.current.write().await = None;
        self.local.clear().await?;
        if let Err(e) = &result {
            warn!("backend sign-out failed: {}", e);
        }
        result.map_err(ClinicError::from)
    }

    /// Reload role and permitted routes for the current user.
    #[instrument(skip(self))]
    pub async fn refresh_permissions(&self) -> Result<Session> {
        let (user_id, email) = match self.current.read().await.as_ref() {
            Some(s) => (s.user_id.clone(), s.email.clone()),
            None => return Err(ClinicError::NotAuthenticated),
        };
        let profile = self.load_profile(&user_id).await?;
        let session = Session::from_profile(email, profile);
        *self.current.write().await = Some(session.clone());
        Ok(session)
    }

    /// Snapshot of the stored session without asking the backend.
    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Confirm with the backend that the token is still live and return the session.
    ///
    /// An expired token clears the stored session.
    #[instrument(skip(self))]
    pub async fn fetch_session(&self) -> Result<Option<Session>> {
        if self.current.read().await.is_none() {
            return Ok(None);
        }
        match self.backend.current_user().await? {
            Some(user) => {
                let session = self.current.read().await.clone();
                Ok(session.filter(|s| s.user_id == user.id))
            }
            None => {
                warn!("backend reports no live session, clearing local session");
                *self.current.write().await = None;
                self.local.set_authenticated(false).await?;
                Ok(None)
            }
        }
    }

    async fn load_profile(&self, user_id: &str) -> Result<UserProfile> {
        let filter = Filter::new().where_eq("user_id", user_id);
        select_as::<UserProfile>(self.backend.as_ref(), collections::USER_PROFILES, &filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClinicError::Validation(format!("no profile for user {}", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthSession, AuthUser, MemoryBackend, MockBackend};
    use crate::models::Role;

    fn store(backend: MemoryBackend) -> SessionStore {
        SessionStore::new(Arc::new(backend), Arc::new(LocalState::ephemeral()))
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::new().with_user(
            "reception@clinic.test",
            "pw",
            UserProfile {
                user_id: "u1".into(),
                role: Role::Receptionist,
                is_super_admin: false,
                permitted_routes: vec![],
            },
        )
    }

    fn creds() -> Credentials {
        Credentials {
            email: "reception@clinic.test".into(),
            password: "pw".into(),
        }
    }

    #[tokio::test]
    async fn sign_in_populates_session_and_flag() {
        let store = store(backend());
        let session = store.sign_in(&creds()).await.unwrap();
        assert_eq!(session.role, Role::Receptionist);
        assert!(session.permits("staff"));
        assert!(store.local_state().is_authenticated().await);
        assert_eq!(store.fetch_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn sign_out_clears_session_and_flag() {
        let store = store(backend());
        store.sign_in(&creds()).await.unwrap();
        store.sign_out().await.unwrap();
        assert!(store.current().await.is_none());
        assert!(!store.local_state().is_authenticated().await);
        assert!(store.fetch_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_requires_a_session() {
        let store = store(backend());
        assert!(matches!(
            store.refresh_permissions().await,
            Err(ClinicError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn unwritable_local_state_fails_sign_in_without_storing_session() {
        let dir = std::env::temp_dir().join(format!("clinic-desk-session-{}", uuid::Uuid::new_v4()));
        let local = LocalState::open(dir.join("state").join("local.json")).await.unwrap();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("state"), b"not a directory").unwrap();

        let store = SessionStore::new(Arc::new(backend()), Arc::new(local));
        assert!(matches!(
            store.sign_in(&creds()).await,
            Err(ClinicError::LocalState(_))
        ));
        assert!(store.current().await.is_none());
        assert!(!store.local_state().is_authenticated().await);
    }

    #[tokio::test]
    async fn missing_profile_fails_sign_in_without_storing_session() {
        let mut mock = MockBackend::new();
        mock.expect_sign_in().times(1).returning(|c| {
            Ok(AuthSession {
                access_token: "t".into(),
                user: AuthUser {
                    id: "ghost".into(),
                    email: c.email.clone(),
                },
            })
        });
        mock.expect_select().times(1).returning(|_, _| Ok(vec![]));

        let store = SessionStore::new(Arc::new(mock), Arc::new(LocalState::ephemeral()));
        assert!(matches!(
            store.sign_in(&creds()).await,
            Err(ClinicError::Validation(_))
        ));
        assert!(store.current().await.is_none());
        assert!(!store.local_state().is_authenticated().await);
    }
}
