//! In-process backend used for development runs and tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{collections, AuthSession, AuthUser, Backend, Credentials, Filter};
use crate::error::BackendError;
use crate::models::UserProfile;

struct MemoryUser {
    id: String,
    password: String,
}

#[derive(Default)]
pub struct MemoryBackend {
    collections: DashMap<String, Vec<Value>>,
    blobs: DashMap<(String, String), Vec<u8>>,
    users: DashMap<String, MemoryUser>,
    signed_in: RwLock<Option<AuthUser>>,
    session_delay_ms: AtomicU64,
    fail_next_write: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user and their profile row.
    pub fn with_user(self, email: &str, password: &str, profile: UserProfile) -> Self {
        self.users.insert(
            email.to_string(),
            MemoryUser {
                id: profile.user_id.clone(),
                password: password.to_string(),
            },
        );
        let mut row = serde_json::to_value(&profile).unwrap_or(Value::Null);
        if let Value::Object(fields) = &mut row {
            fields.insert("id".to_string(), Value::String(profile.user_id.clone()));
        }
        self.collections
            .entry(collections::USER_PROFILES.to_string())
            .or_default()
            .push(row);
        self
    }

    pub fn with_rows(self, collection: &str, rows: Vec<Value>) -> Self {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Delay every `current_user` call.
    pub fn with_session_delay(self, delay: Duration) -> Self {
        self.set_session_delay(delay);
        self
    }

    pub fn set_session_delay(&self, delay: Duration) {
        self.session_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make the next insert or update fail with a network error.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Number of successful inserts and updates so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.collections
            .get(collection)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    pub fn blob(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.blobs
            .get(&(bucket.to_string(), key.to_string()))
            .map(|b| b.clone())
    }

    fn take_write_failure(&self) -> Result<(), BackendError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(BackendError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, BackendError> {
        let id = match self.users.get(&credentials.email) {
            Some(user) if user.password == credentials.password => user.id.clone(),
            _ => return Err(BackendError::Auth("invalid login credentials".to_string())),
        };
        let user = AuthUser {
            id,
            email: credentials.email.clone(),
        };
        *self.signed_in.write().await = Some(user.clone());
        Ok(AuthSession {
            access_token: Uuid::new_v4().to_string(),
            user,
        })
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        *self.signed_in.write().await = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        let delay = self.session_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(self.signed_in.read().await.clone())
    }

    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, BackendError> {
        let mut rows: Vec<Value> = self
            .collections
            .get(collection)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        filter.sort(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, collection: &str, row: Value) -> Result<Value, BackendError> {
        self.take_write_failure()?;

        let mut row = match row {
            Value::Object(map) => map,
            other => {
                return Err(BackendError::Status {
                    status: 400,
                    message: format!("row must be an object, got {}", other),
                })
            }
        };
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        let row = Value::Object(row);

        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(row.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!("memory insert into {}", collection);
        Ok(row)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, BackendError> {
        self.take_write_failure()?;

        let mut rows = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| BackendError::NotFound(format!("{}/{}", collection, id)))?;
        let row = rows
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| BackendError::NotFound(format!("{}/{}", collection, id)))?;

        if let (Value::Object(target), Value::Object(changes)) = (&mut *row, patch) {
            for (key, value) in changes {
                target.insert(key, value);
            }
        }
        let updated = row.clone();
        drop(rows);

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(updated)
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), BackendError> {
        self.blobs
            .insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError> {
        self.blob(bucket, key)
            .ok_or_else(|| BackendError::NotFound(format!("{}/{}", bucket, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use serde_json::json;

    fn nurse() -> UserProfile {
        UserProfile {
            user_id: "u-nurse".to_string(),
            role: Role::Nurse,
            is_super_admin: false,
            permitted_routes: vec![],
        }
    }

    #[tokio::test]
    async fn sign_in_rejects_wrong_password() {
        let backend = MemoryBackend::new().with_user("n@clinic.test", "secret", nurse());
        let err = backend
            .sign_in(&Credentials {
                email: "n@clinic.test".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Auth(_)));
        assert!(backend.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_generates_id_and_counts_writes() {
        let backend = MemoryBackend::new();
        let stored = backend
            .insert("patients", json!({ "full_name": "Ana" }))
            .await
            .unwrap();
        assert!(stored["id"].is_string());
        assert!(stored["created_at"].is_string());
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn failed_write_is_one_shot() {
        let backend = MemoryBackend::new();
        backend.fail_next_write();
        assert!(backend.insert("patients", json!({})).await.is_err());
        assert!(backend.insert("patients", json!({})).await.is_ok());
        assert_eq!(backend.rows("patients").len(), 1);
    }

    #[tokio::test]
    async fn update_merges_patch() {
        let backend = MemoryBackend::new().with_rows("inventory", vec![json!({ "id": "i1", "quantity": 4 })]);
        let updated = backend
            .update("inventory", "i1", json!({ "quantity": 2 }))
            .await
            .unwrap();
        assert_eq!(updated["quantity"], 2);
        assert!(matches!(
            backend.update("inventory", "i9", json!({})).await,
            Err(BackendError::NotFound(_))
        ));
    }
}
