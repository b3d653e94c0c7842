//! REST client for the hosted backend.
//!
//! Auth lives under `/auth/v1`, rows under `/rest/v1/<collection>` and blobs
//! under `/storage/v1/object/<bucket>/<key>`. Every request carries the
//! project's anon key; requests made after sign-in also carry the user token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{AuthSession, AuthUser, Backend, Credentials, Direction, Filter};
use crate::error::BackendError;

pub struct RestBackend {
    client: Client,
    base: String,
    anon_key: String,
    token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

impl RestBackend {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, BackendError> {
        let base = Url::parse(base_url)
            .map_err(|e| BackendError::Network(format!("invalid backend url {}: {}", base_url, e)))?;
        Ok(Self {
            client: Client::new(),
            base: base.as_str().trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            token: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());
        builder.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Auth(message),
            StatusCode::NOT_FOUND => BackendError::NotFound(message),
            _ => BackendError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    fn query_pairs(filter: &Filter) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        for (field, value) in &filter.eq {
            pairs.push((field.clone(), format!("eq.{}", value)));
        }
        if let Some((field, direction)) = &filter.order {
            let dir = match direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            pairs.push(("order".to_string(), format!("{}.{}", field, dir)));
        }
        pairs
    }

    fn first_row(rows: Vec<Value>, what: &str) -> Result<Value, BackendError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(what.to_string()))
    }
}

#[async_trait]
impl Backend for RestBackend {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, BackendError> {
        let response = self
            .client
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": credentials.email, "password": credentials.password }))
            .send()
            .await?;
        let token: TokenResponse = Self::check(response).await?.json().await?;

        *self.token.write().await = Some(token.access_token.clone());
        debug!("signed in as {}", token.user.id);
        Ok(AuthSession {
            access_token: token.access_token,
            user: token.user,
        })
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), BackendError> {
        let request = self
            .authorized(self.client.post(self.endpoint("auth/v1/logout")))
            .await;
        let result = request.send().await;
        // The local token is dropped even if the server call fails.
        *self.token.write().await = None;
        Self::check(result?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        if self.token.read().await.is_none() {
            return Ok(None);
        }
        let response = self
            .authorized(self.client.get(self.endpoint("auth/v1/user")))
            .await
            .send()
            .await?;
        match Self::check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(BackendError::Auth(message)) => {
                warn!("session token rejected: {}", message);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, filter))]
    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, BackendError> {
        let response = self
            .authorized(
                self.client
                    .get(self.endpoint(&format!("rest/v1/{}", collection)))
                    .query(&Self::query_pairs(filter)),
            )
            .await
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    #[instrument(skip(self, row))]
    async fn insert(&self, collection: &str, row: Value) -> Result<Value, BackendError> {
        let response = self
            .authorized(
                self.client
                    .post(self.endpoint(&format!("rest/v1/{}", collection)))
                    .header("Prefer", "return=representation")
                    .json(&row),
            )
            .await
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response).await?.json().await?;
        Self::first_row(rows, collection)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, BackendError> {
        let response = self
            .authorized(
                self.client
                    .patch(self.endpoint(&format!("rest/v1/{}", collection)))
                    .query(&[("id", format!("eq.{}", id))])
                    .header("Prefer", "return=representation")
                    .json(&patch),
            )
            .await
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response).await?.json().await?;
        Self::first_row(rows, &format!("{}/{}", collection, id))
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .authorized(
                self.client
                    .post(self.endpoint(&format!("storage/v1/object/{}/{}", bucket, key)))
                    .header("Content-Type", content_type)
                    .header("x-upsert", "true")
                    .body(bytes),
            )
            .await
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .authorized(
                self.client
                    .get(self.endpoint(&format!("storage/v1/object/{}/{}", bucket, key))),
            )
            .await
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
