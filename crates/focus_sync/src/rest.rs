//! PostgREST remote client.
//!
//! Speaks the URL scheme of a hosted Postgres REST backend:
//!
//! - `GET  {base}/auth/v1/user` for the signed-in user
//! - `GET  {base}/rest/v1/{table}?select=*&{column}=eq.{value}` for selects
//! - `POST {base}/rest/v1/{table}?on_conflict={column}` for upserts
//!
//! The HTTP library is abstracted by [`HttpClient`] so hosts can plug in
//! reqwest, a loopback server, or a test double.

use crate::error::{SyncError, SyncResult};
use crate::remote::{RemoteClient, RemoteUser};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;

/// A header name and value.
pub type Header = (String, String);

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP client abstraction.
///
/// Errors are transport failures (DNS, connection reset, timeouts); any
/// response that arrives, whatever its status, is returned as `Ok`.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request.
    fn get(&self, url: &str, headers: &[Header]) -> Result<HttpResponse, String>;

    /// Sends a POST request with a JSON body.
    fn post(&self, url: &str, headers: &[Header], body: Vec<u8>) -> Result<HttpResponse, String>;
}

/// Connection settings for [`RestRemote`].
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub base_url: String,
    /// Public API key sent as `apikey`.
    pub api_key: String,
    /// Access token of the signed-in user.
    pub access_token: Option<String>,
}

impl RestConfig {
    /// Creates a configuration without an access token.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Sets the access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

#[derive(Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// [`RemoteClient`] backed by a PostgREST endpoint.
pub struct RestRemote<C: HttpClient> {
    config: RestConfig,
    token: RwLock<Option<String>>,
    client: C,
}

impl<C: HttpClient> RestRemote<C> {
    /// Creates a client.
    pub fn new(config: RestConfig, client: C) -> Self {
        let token = RwLock::new(config.access_token.clone());
        Self {
            config,
            token,
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Replaces the access token, e.g. after a refresh or sign-out.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn headers(&self) -> Vec<Header> {
        let bearer = self
            .token
            .read()
            .clone()
            .unwrap_or_else(|| self.config.api_key.clone());
        vec![
            ("apikey".into(), self.config.api_key.clone()),
            ("Authorization".into(), format!("Bearer {bearer}")),
        ]
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url,
            urlencoding::encode(table)
        )
    }

    fn expect_success(table: &str, response: &HttpResponse) -> SyncResult<()> {
        if response.is_success() {
            Ok(())
        } else {
            Err(SyncError::remote(table, response.status, response.text()))
        }
    }
}

impl<C: HttpClient> RemoteClient for RestRemote<C> {
    fn current_user(&self) -> SyncResult<Option<RemoteUser>> {
        if self.token.read().is_none() {
            return Ok(None);
        }
        let url = format!("{}/auth/v1/user", self.config.base_url);
        let response = self
            .client
            .get(&url, &self.headers())
            .map_err(SyncError::transport_retryable)?;
        if matches!(response.status, 401 | 403) {
            tracing::debug!(status = response.status, "access token rejected");
            return Ok(None);
        }
        Self::expect_success("auth/user", &response)?;
        let user: UserBody = serde_json::from_slice(&response.body)?;
        Ok(Some(RemoteUser {
            id: user.id,
            email: user.email,
        }))
    }

    fn select_by_user(
        &self,
        table: &str,
        user_column: &str,
        user_id: &str,
    ) -> SyncResult<Vec<Value>> {
        let url = format!(
            "{}?select=*&{}=eq.{}",
            self.table_url(table),
            urlencoding::encode(user_column),
            urlencoding::encode(user_id)
        );
        let response = self
            .client
            .get(&url, &self.headers())
            .map_err(SyncError::transport_retryable)?;
        Self::expect_success(table, &response)?;
        let rows: Vec<Value> = serde_json::from_slice(&response.body)?;
        Ok(rows)
    }

    fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> SyncResult<()> {
        let url = format!(
            "{}?on_conflict={}",
            self.table_url(table),
            urlencoding::encode(on_conflict)
        );
        let mut headers = self.headers();
        headers.push(("Content-Type".into(), "application/json".into()));
        headers.push((
            "Prefer".into(),
            "resolution=merge-duplicates,return=minimal".into(),
        ));
        let body = serde_json::to_vec(rows)?;
        let response = self
            .client
            .post(&url, &headers, body)
            .map_err(SyncError::transport_retryable)?;
        Self::expect_success(table, &response)
    }
}

impl<C: HttpClient> std::fmt::Debug for RestRemote<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRemote")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.token.read().is_some())
            .finish()
    }
}
