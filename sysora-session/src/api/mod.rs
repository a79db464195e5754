//! REST backend access
//!
//! The session manager never talks to the network. This module is the thin
//! consumer side: it calls the authentication endpoints, shape-checks the
//! reply, and hands the result to [`SessionProvider`].

pub mod client;

pub use client::SysoraApiClient;

use crate::session::{AuthData, KeyValueStore, SessionProvider};
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Login credentials; `subdomain` selects the workspace login endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            subdomain: None,
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn for_workspace(
        subdomain: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            subdomain: Some(subdomain.into()),
            ..Self::new(email, password)
        }
    }
}

/// `{ success, data | error }` reply of the backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiEnvelope {
    /// Backend-provided failure text, if any
    pub fn failure_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }

    /// Extract and shape-check the login payload
    pub fn into_auth_data(self, status: Option<u16>) -> SessionResult<AuthData> {
        if !self.success {
            let message = self
                .failure_message()
                .unwrap_or("login rejected")
                .to_string();
            return Err(SessionError::api(message, status));
        }

        let data = self
            .data
            .ok_or_else(|| SessionError::invalid_input("login response carries no data"))?;
        AuthData::from_value(data)
    }
}

/// Workspace lookup result
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub subdomain: String,
}

/// Authentication endpoints, abstracted for testing and alternate transports
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a login payload
    async fn authenticate(&self, credentials: &Credentials) -> SessionResult<AuthData>;

    /// Tell the backend the session ended
    async fn end_session(&self, headers: &BTreeMap<String, String>) -> SessionResult<()>;
}

/// Authenticate against `backend` and store the result in `provider`
pub async fn login_and_store<B, S>(
    backend: &B,
    provider: &SessionProvider<S>,
    credentials: &Credentials,
) -> SessionResult<()>
where
    B: AuthBackend + ?Sized,
    S: KeyValueStore,
{
    let data = backend.authenticate(credentials).await?;
    provider.login(data)
}

/// Notify the backend, then clear the local session whatever it answered
pub async fn logout_and_clear<B, S>(backend: &B, provider: &SessionProvider<S>) -> SessionResult<()>
where
    B: AuthBackend + ?Sized,
    S: KeyValueStore,
{
    let headers = provider.auth_headers();
    if !headers.is_empty() {
        if let Err(e) = backend.end_session(&headers).await {
            warn!(error = %e, "Backend logout failed; clearing local session anyway");
        }
    }
    provider.logout()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, SessionManager};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedBackend {
        reply: Value,
        fail_logout: bool,
        logouts: AtomicUsize,
    }

    impl ScriptedBackend {
        fn replying(reply: Value) -> Self {
            Self {
                reply,
                fail_logout: false,
                logouts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AuthBackend for ScriptedBackend {
        async fn authenticate(&self, _credentials: &Credentials) -> SessionResult<AuthData> {
            let envelope: ApiEnvelope = serde_json::from_value(self.reply.clone())?;
            envelope.into_auth_data(Some(200))
        }

        async fn end_session(&self, headers: &BTreeMap<String, String>) -> SessionResult<()> {
            assert!(headers.contains_key("Authorization"));
            self.logouts.fetch_add(1, Ordering::SeqCst);
            if self.fail_logout {
                Err(SessionError::api("backend down", Some(503)))
            } else {
                Ok(())
            }
        }
    }

    fn provider() -> SessionProvider<MemoryStore> {
        SessionProvider::new(SessionManager::new(MemoryStore::new()))
    }

    #[test]
    fn test_envelope_failure_message() {
        let envelope: ApiEnvelope = serde_json::from_value(json!({
            "error": "Invalid credentials"
        }))
        .unwrap();

        match envelope.into_auth_data(Some(401)) {
            Err(SessionError::Api { message, status }) => {
                assert_eq!(message, "Invalid credentials");
                assert_eq!(status, Some(401));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_and_store_uses_hotel_payload() {
        let backend = ScriptedBackend::replying(json!({
            "success": true,
            "message": "Login successful",
            "data": {
                "hotel": { "id": "h1", "name": "Acme", "subdomain": "acme" },
                "user": { "id": "u1", "fullName": "Amina", "email": "a@acme.test", "role": "owner" },
                "token": "jwt-1"
            }
        }));
        let provider = provider();

        login_and_store(&backend, &provider, &Credentials::new("a@acme.test", "pw"))
            .await
            .unwrap();

        let session = provider.snapshot().unwrap();
        assert_eq!(session.token(), "jwt-1");
        assert_eq!(session.tenant().name.as_deref(), Some("Acme"));
        assert!(provider.has_permission("manage_rooms"));
    }

    #[tokio::test]
    async fn test_malformed_payload_leaves_session_untouched() {
        let backend = ScriptedBackend::replying(json!({
            "success": true,
            "data": { "token": "jwt-1", "user": { "role": "owner" } }
        }));
        let provider = provider();

        let result =
            login_and_store(&backend, &provider, &Credentials::new("a@acme.test", "pw")).await;

        assert!(matches!(result, Err(SessionError::InvalidInput { .. })));
        assert!(!provider.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let mut backend = ScriptedBackend::replying(json!({
            "success": true,
            "data": {
                "token": "jwt-1",
                "user": { "role": "staff" },
                "hotel": { "subdomain": "acme" }
            }
        }));
        backend.fail_logout = true;
        let provider = provider();

        login_and_store(&backend, &provider, &Credentials::new("s@acme.test", "pw"))
            .await
            .unwrap();
        logout_and_clear(&backend, &provider).await.unwrap();

        assert!(!provider.is_authenticated());
        assert_eq!(backend.logouts.load(Ordering::SeqCst), 1);

        // Already logged out: no backend call, still succeeds
        logout_and_clear(&backend, &provider).await.unwrap();
        assert_eq!(backend.logouts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_workspace_credentials_serialize_subdomain() {
        let body = serde_json::to_value(Credentials::for_workspace("acme", "a@b.c", "pw")).unwrap();
        assert_eq!(body["subdomain"], json!("acme"));

        let body = serde_json::to_value(Credentials::new("a@b.c", "pw")).unwrap();
        assert!(body.get("subdomain").is_none());
    }
}
