//! reqwest-backed client for the Sysora REST backend

use super::{ApiEnvelope, AuthBackend, Credentials, WorkspaceInfo};
use crate::session::{AuthData, KeyValueStore, SessionProvider};
use crate::workflow::{ServiceDomain, TransitionRecord};
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use sysora_core::{
    log_operation_error, retry_async, ApiConfig, ErrorContext, RetryConfig, SysoraError,
    SysoraResult,
};
use tracing::{debug, info};
use url::Url;

const LOGIN_PATH: &str = "/api/auth/login";
const WORKSPACE_LOGIN_PATH: &str = "/api/auth/workspace-login";
const LOGOUT_PATH: &str = "/api/auth/logout";
const CHECK_WORKSPACE_PATH: &str = "/api/auth/check-workspace/";

#[derive(Debug, Deserialize)]
struct WorkspaceCheck {
    #[serde(default)]
    exists: bool,
    #[serde(default)]
    workspace: Option<WorkspaceInfo>,
}

/// Client for the authentication and service-status endpoints
#[derive(Debug, Clone)]
pub struct SysoraApiClient {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryConfig,
}

impl SysoraApiClient {
    /// Build a client from API settings
    pub fn new(config: &ApiConfig) -> SysoraResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| SysoraError::Config {
            message: format!("Invalid API base URL '{}': {}", config.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client").with_operation("create_client"),
        })?;

        Ok(Self {
            client: create_http_client(config)?,
            base_url,
            retry: RetryConfig::default(),
        })
    }

    /// Override the retry policy applied to login requests
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> SysoraResult<Url> {
        self.base_url.join(path).map_err(|e| SysoraError::Config {
            message: format!("Invalid endpoint path '{}': {}", path, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client").with_operation("endpoint"),
        })
    }

    /// Send one request and return the status with the (possibly empty) JSON body
    async fn send(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> SysoraResult<(StatusCode, Value)> {
        let url = self.endpoint(path)?;
        debug!(method = %method, url = %url, "Sending API request");

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| SysoraError::Network {
            message: format!("Request to {} failed: {}", path, e),
            status: e.status().map(|s| s.as_u16()),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client").with_metadata("path", path),
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| SysoraError::Network {
            message: format!("Failed to read response from {}: {}", path, e),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client").with_metadata("path", path),
        })?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            let message = failure_text(&body).unwrap_or_else(|| status.to_string());
            return Err(SysoraError::Network {
                message,
                status: Some(status.as_u16()),
                source: None,
                context: ErrorContext::new("api_client").with_metadata("path", path),
            });
        }

        Ok((status, body))
    }

    async fn post_login(&self, credentials: Credentials) -> SysoraResult<(StatusCode, ApiEnvelope)> {
        let path = if credentials.subdomain.is_some() {
            WORKSPACE_LOGIN_PATH
        } else {
            LOGIN_PATH
        };
        let body = serde_json::to_value(&credentials)?;
        let (status, body) = self
            .send(Method::POST, path, HeaderMap::new(), Some(&body))
            .await?;
        let envelope = serde_json::from_value(body).unwrap_or_default();
        Ok((status, envelope))
    }

    /// POST `/api/auth/login`
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<AuthData> {
        self.authenticate(&Credentials::new(email, password)).await
    }

    /// POST `/api/auth/workspace-login`
    pub async fn workspace_login(
        &self,
        subdomain: &str,
        email: &str,
        password: &str,
    ) -> SessionResult<AuthData> {
        self.authenticate(&Credentials::for_workspace(subdomain, email, password))
            .await
    }

    /// GET `/api/auth/check-workspace/{subdomain}`; `None` when no such workspace
    pub async fn check_workspace(&self, subdomain: &str) -> SessionResult<Option<WorkspaceInfo>> {
        let path = format!(
            "{}{}",
            CHECK_WORKSPACE_PATH,
            urlencoding::encode(subdomain)
        );
        let (status, body) = self
            .send(Method::GET, &path, HeaderMap::new(), None)
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(rejected(&body, status));
        }

        workspace_from_check(body)
    }

    /// PATCH the item's status after checking the move against its workflow
    pub async fn update_status<S: KeyValueStore>(
        &self,
        session: &SessionProvider<S>,
        domain: ServiceDomain,
        item_id: &str,
        from: &str,
        to: &str,
    ) -> SessionResult<TransitionRecord> {
        let record = domain.workflow().transition(from, to)?;
        let path = domain.status_path(item_id);
        self.patch_record(session, &path, &record).await?;

        info!(domain = %domain, item = item_id, from, to, "Status updated");
        Ok(record)
    }

    /// PATCH the item's assignee; only housekeeping and maintenance assign
    pub async fn assign<S: KeyValueStore>(
        &self,
        session: &SessionProvider<S>,
        domain: ServiceDomain,
        item_id: &str,
        from: &str,
        assignee_id: &str,
    ) -> SessionResult<TransitionRecord> {
        let record = domain.workflow().assign(from, assignee_id)?;
        let path = domain
            .assign_path(item_id)
            .ok_or_else(|| SessionError::invalid_input(format!("{} has no assignment", domain)))?;
        self.patch_record(session, &path, &record).await?;

        info!(domain = %domain, item = item_id, assignee = assignee_id, "Item assigned");
        Ok(record)
    }

    async fn patch_record<S: KeyValueStore>(
        &self,
        session: &SessionProvider<S>,
        path: &str,
        record: &TransitionRecord,
    ) -> SessionResult<()> {
        let auth = session.auth_headers();
        if auth.is_empty() {
            return Err(SessionError::not_authenticated(record.action));
        }

        let body = record.request_body();
        let (status, reply) = self
            .send(Method::PATCH, path, header_map(&auth)?, Some(&body))
            .await?;
        if !status.is_success() {
            let err = rejected(&reply, status);
            log_operation_error!(record.action, err);
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for SysoraApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> SessionResult<AuthData> {
        let operation = if credentials.subdomain.is_some() {
            "workspace_login"
        } else {
            "login"
        };

        let result = retry_async(
            || {
                let client = self.clone();
                let credentials = credentials.clone();
                async move { client.post_login(credentials).await }.boxed()
            },
            self.retry.clone(),
            operation,
        )
        .await;

        let (status, envelope) = match result {
            Ok(reply) => reply,
            Err(e) => {
                e.log();
                return Err(e.into());
            }
        };

        let data = envelope.into_auth_data(Some(status.as_u16()))?;
        info!(
            subdomain = %data.tenant.subdomain,
            role = %data.user.role,
            "Login accepted"
        );
        Ok(data)
    }

    async fn end_session(&self, headers: &BTreeMap<String, String>) -> SessionResult<()> {
        let (status, body) = self
            .send(Method::POST, LOGOUT_PATH, header_map(headers)?, None)
            .await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(rejected(&body, status))
        }
    }
}

/// Create a reqwest client carrying the configured user agent and timeout
pub(crate) fn create_http_client(config: &ApiConfig) -> SysoraResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).map_err(|e| SysoraError::Config {
            message: format!("Invalid user agent: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .map_err(|e| SysoraError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            status: None,
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

/// Convert session headers for reqwest
fn header_map(headers: &BTreeMap<String, String>) -> SessionResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SessionError::invalid_input(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            SessionError::invalid_field("token contains characters not allowed in a header", "token")
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// `{ exists, workspace }` reply of the workspace lookup
fn workspace_from_check(body: Value) -> SessionResult<Option<WorkspaceInfo>> {
    let check: WorkspaceCheck = serde_json::from_value(body)?;
    Ok(if check.exists { check.workspace } else { None })
}

fn failure_text(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn rejected(body: &Value, status: StatusCode) -> SessionError {
    let message = failure_text(body).unwrap_or_else(|| status.to_string());
    SessionError::api(message, Some(status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, TenantRecord, UserRecord};
    use crate::session::{MemoryStore, SessionManager};
    use crate::workflow::WorkflowError;
    use serde_json::json;

    // Nothing listens here; tests below must fail before any request is sent.
    fn offline_client() -> SysoraApiClient {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ApiConfig::default()
        };
        SysoraApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            SysoraApiClient::new(&config),
            Err(SysoraError::Config { .. })
        ));
    }

    #[test]
    fn test_endpoint_joins_base() {
        let client = offline_client();
        let url = client.endpoint("/api/auth/check-workspace/acme").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9/api/auth/check-workspace/acme");
    }

    #[test]
    fn test_failure_text_prefers_error() {
        let body = json!({ "error": "All fields are required", "message": "other" });
        assert_eq!(failure_text(&body).as_deref(), Some("All fields are required"));
        assert_eq!(failure_text(&json!({ "message": "Hotel not found" })).as_deref(), Some("Hotel not found"));
        assert_eq!(failure_text(&Value::Null), None);

        match rejected(&Value::Null, StatusCode::UNAUTHORIZED) {
            SessionError::Api { status, .. } => assert_eq!(status, Some(401)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_workspace_check_reply_shapes() {
        let found = workspace_from_check(json!({
            "exists": true,
            "workspace": { "id": "h1", "name": "Acme Hotel", "subdomain": "acme" }
        }))
        .unwrap();
        assert_eq!(
            found,
            Some(WorkspaceInfo {
                id: Some("h1".to_string()),
                name: "Acme Hotel".to_string(),
                subdomain: "acme".to_string(),
            })
        );

        let missing = workspace_from_check(json!({
            "exists": false,
            "message": "Workspace not found"
        }))
        .unwrap();
        assert_eq!(missing, None);

        assert!(matches!(
            workspace_from_check(json!({ "exists": true, "workspace": { "id": "h1" } })),
            Err(SessionError::Serialization(_))
        ));
    }

    #[test]
    fn test_header_map_rejects_control_characters() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer bad\ntoken".to_string());
        assert!(matches!(
            header_map(&headers),
            Err(SessionError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_status_requires_session() {
        let client = offline_client();
        let session = SessionProvider::new(SessionManager::new(MemoryStore::new()));

        let result = client
            .update_status(&session, ServiceDomain::Housekeeping, "t1", "assigned", "in_progress")
            .await;
        assert!(matches!(result, Err(SessionError::NotAuthenticated { .. })));
    }

    #[tokio::test]
    async fn test_illegal_transition_checked_before_request() {
        let client = offline_client();
        let session = SessionProvider::new(SessionManager::new(MemoryStore::new()));
        session
            .login(AuthData::new(
                "t1",
                UserRecord::new(Role::Manager),
                TenantRecord::new("acme"),
            ))
            .unwrap();

        let result = client
            .update_status(&session, ServiceDomain::Laundry, "o1", "pickup_scheduled", "delivered")
            .await;
        assert!(matches!(
            result,
            Err(SessionError::Workflow(WorkflowError::IllegalTransition { .. }))
        ));

        let result = client
            .assign(&session, ServiceDomain::Laundry, "o1", "pickup_scheduled", "s1")
            .await;
        assert!(matches!(result, Err(SessionError::Workflow(_))));
    }
}
