//! Backend collaborator module
//!
//! Everything that touches the hosted backend goes through the [`Backend`]
//! trait: credentials, row reads and writes on named collections, and blob
//! storage by bucket and key.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BackendError, ClinicError};

pub mod memory;
#[cfg(feature = "rest")]
pub mod rest;

pub use memory::MemoryBackend;
#[cfg(feature = "rest")]
pub use rest::RestBackend;

/// Stable collection names on the backend.
pub mod collections {
    pub const USER_PROFILES: &str = "user_profiles";
    pub const PATIENTS: &str = "patients";
    pub const STAFF: &str = "staff";
    pub const INVENTORY: &str = "inventory";
    pub const TIME_CLOCK: &str = "time_clock";
    pub const CLINICAL_RECORDS: &str = "clinical_records";
    pub const MEDICAL_EXAMS: &str = "medical_exams";
    pub const FINANCIAL_ENTRIES: &str = "financial_entries";
}

/// Blob storage buckets.
pub mod buckets {
    pub const EXAMS: &str = "exams";
    pub const AVATARS: &str = "avatars";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Equality filter plus optional ordering for a collection select.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub eq: Vec<(String, String)>,
    pub order: Option<(String, Direction)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl ToString) -> Self {
        self.eq.push((field.to_string(), value.to_string()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    /// True when `row` satisfies every equality clause.
    pub fn matches(&self, row: &Value) -> bool {
        self.eq.iter().all(|(field, expected)| match row.get(field) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        })
    }

    pub fn sort(&self, rows: &mut [Value]) {
        if let Some((field, direction)) = &self.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None, None) | (Some(Value::Null), Some(Value::Null)) => Ordering::Equal,
        (None, _) | (Some(Value::Null), _) => Ordering::Less,
        (_, None) | (_, Some(Value::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Client for the hosted backend-as-a-service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchange credentials for a session token.
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Fetch the user behind the current token, `None` when signed out or expired.
    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError>;

    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, BackendError>;

    /// Insert one row and return it as stored (with generated fields).
    async fn insert(&self, collection: &str, row: Value) -> Result<Value, BackendError>;

    /// Merge `patch` into the row with the given id.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, BackendError>;

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError>;

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError>;
}

pub async fn select_as<T: DeserializeOwned>(
    backend: &dyn Backend,
    collection: &str,
    filter: &Filter,
) -> Result<Vec<T>, ClinicError> {
    let rows = backend.select(collection, filter).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ClinicError::from))
        .collect()
}

pub async fn insert_as<T, R>(backend: &dyn Backend, collection: &str, row: &R) -> Result<T, ClinicError>
where
    T: DeserializeOwned,
    R: Serialize + ?Sized,
{
    let stored = backend.insert(collection, serde_json::to_value(row)?).await?;
    Ok(serde_json::from_value(stored)?)
}

pub async fn update_as<T: DeserializeOwned>(
    backend: &dyn Backend,
    collection: &str,
    id: &str,
    patch: Value,
) -> Result<T, ClinicError> {
    let stored = backend.update(collection, id, patch).await?;
    Ok(serde_json::from_value(stored)?)
}
