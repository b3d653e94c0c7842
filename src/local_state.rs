//! Persisted client flags.
//!
//! Two fixed keys survive restarts: whether the user is signed in and which
//! workflow they picked on the flow-selection screen. Logout clears both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::Result;

pub const AUTHENTICATED_KEY: &str = "clinic.authenticated";
pub const SELECTED_FLOW_KEY: &str = "clinic.selected_flow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Clinical,
    Administrative,
}

pub struct LocalState {
    path: Option<PathBuf>,
    values: RwLock<BTreeMap<String, Value>>,
}

impl LocalState {
    /// Load the state file, starting empty when it does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(values) => values,
                Err(e) => {
                    warn!("discarding unreadable local state {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    /// State that lives only as long as the process.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            values: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.values
            .read()
            .await
            .get(AUTHENTICATED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub async fn set_authenticated(&self, authenticated: bool) -> Result<()> {
        self.set(AUTHENTICATED_KEY, Value::Bool(authenticated)).await
    }

    pub async fn selected_flow(&self) -> Option<Workflow> {
        self.values
            .read()
            .await
            .get(SELECTED_FLOW_KEY)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub async fn select_flow(&self, flow: Workflow) -> Result<()> {
        self.set(SELECTED_FLOW_KEY, serde_json::to_value(flow)?).await
    }

    pub async fn clear(&self) -> Result<()> {
        let mut values = self.values.write().await;
        values.remove(AUTHENTICATED_KEY);
        values.remove(SELECTED_FLOW_KEY);
        self.persist(&values).await
    }

    /// The in-memory value only changes once the file write succeeded.
    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.write().await;
        let mut next = values.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *values = next;
        Ok(())
    }

    async fn persist(&self, values: &BTreeMap<String, Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, serde_json::to_vec_pretty(values)?).await?;
        debug!("local state written to {}", path.display());
        Ok(())
    }
}
