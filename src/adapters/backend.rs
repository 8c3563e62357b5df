use crate::adapters::auth::AuthSession;
use crate::domain::ports::BackendSettings;
use crate::utils::error::{BackendService, MarketError, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Thin client for the hosted backend: REST tables under `/rest/v1`, object
/// storage under `/storage/v1` and auth under `/auth/v1`.
///
/// The signed-in user travels with the client value (`with_session`); there
/// is no process-wide "current user".
#[derive(Debug, Clone)]
pub struct BackendClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) anon_key: String,
    pub(crate) bucket: String,
    pub(crate) cache_control_seconds: u64,
    pub(crate) session: Option<AuthSession>,
}

impl BackendClient {
    pub fn new<C: BackendSettings + ?Sized>(settings: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.backend_url().trim_end_matches('/').to_string(),
            anon_key: settings.anon_key().to_string(),
            bucket: settings.storage_bucket().to_string(),
            cache_control_seconds: settings.cache_control_seconds(),
            session: None,
        })
    }

    pub fn with_session(mut self, session: AuthSession) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub(crate) fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Attach the project key and the bearer token (session token when signed
    /// in, the anon key otherwise).
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(self.anon_key.as_str());

        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    /// Send and turn every failure mode into a `MarketError`.
    pub(crate) async fn send(&self, service: BackendService, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| MarketError::from_transport(service, e))?;

        let status = response.status();
        tracing::debug!("Backend response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(MarketError::Backend {
            status: status.as_u16(),
            message: extract_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string()),
        })
    }

    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.rest_url(table);
        tracing::debug!("Selecting from {} with {:?}", url, params);

        let response = self
            .send(BackendService::Database, self.client.get(&url).query(params))
            .await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>> {
        let url = self.rest_url(table);
        tracing::debug!("Inserting into {}", url);

        let request = self
            .client
            .post(&url)
            .query(params)
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.send(BackendService::Database, request).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>> {
        let url = self.rest_url(table);
        tracing::debug!("Updating {} with {:?}", url, params);

        let request = self
            .client
            .patch(&url)
            .query(params)
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.send(BackendService::Database, request).await?;
        Ok(response.json().await?)
    }
}

/// Pull a human-readable message out of a backend error body. The REST,
/// storage and auth services each use a different key.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

/// First row of a single-row response, or `NotFound`.
pub(crate) fn single_row<T>(rows: Vec<T>, resource: &str, id: impl std::fmt::Display) -> Result<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| MarketError::not_found(resource, id))
}
