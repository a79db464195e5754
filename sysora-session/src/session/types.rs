//! Session Types
//!
//! The authenticated triple, the two-state session machine, the login
//! payload, and the persisted key layout.

use crate::auth::{TenantRecord, UserRecord};
use crate::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A logged-in identity: token, user and tenant, always together
#[derive(Clone, PartialEq)]
pub struct Session {
    token: String,
    user: UserRecord,
    tenant: TenantRecord,
}

impl Session {
    pub(crate) fn new(token: String, user: UserRecord, tenant: TenantRecord) -> Self {
        Self {
            token,
            user,
            tenant,
        }
    }

    /// Opaque bearer credential
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    pub fn tenant(&self) -> &TenantRecord {
        &self.tenant
    }

    pub(crate) fn with_user(&self, user: UserRecord) -> Self {
        Self {
            user,
            ..self.clone()
        }
    }

    pub(crate) fn with_tenant(&self, tenant: TenantRecord) -> Self {
        Self {
            tenant,
            ..self.clone()
        }
    }
}

// Keep the bearer token out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// Session state machine
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unauthenticated => None,
        }
    }
}

/// Successful login payload (`data` of the auth endpoints)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthData {
    pub token: String,
    pub user: UserRecord,
    #[serde(alias = "hotel")]
    pub tenant: TenantRecord,
}

impl AuthData {
    pub fn new(token: impl Into<String>, user: UserRecord, tenant: TenantRecord) -> Self {
        Self {
            token: token.into(),
            user,
            tenant,
        }
    }

    /// Shape-check an untyped payload. Missing or mistyped fields are
    /// rejected as invalid input.
    pub fn from_value(value: Value) -> SessionResult<Self> {
        let data: AuthData = serde_json::from_value(value)
            .map_err(|e| SessionError::invalid_input(format!("malformed auth data: {}", e)))?;
        data.validate()?;
        Ok(data)
    }

    /// Reject empty token, role or subdomain
    pub fn validate(&self) -> SessionResult<()> {
        if self.token.trim().is_empty() {
            return Err(SessionError::invalid_field("token is empty", "token"));
        }
        self.user.validate()?;
        self.tenant.validate()
    }

    pub(crate) fn into_session(self) -> Session {
        Session::new(self.token, self.user, self.tenant)
    }
}

/// Storage key names, derived from a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub token: String,
    pub user: String,
    pub tenant: String,
    /// Transient placeholder set during signup; only ever cleared here
    pub temp_password: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            token: format!("{}_token", prefix),
            user: format!("{}_user", prefix),
            tenant: format!("{}_hotel", prefix),
            temp_password: format!("{}_temp_password", prefix),
        }
    }

    /// The three keys that make up a session
    pub fn session_keys(&self) -> [&str; 3] {
        [self.token.as_str(), self.user.as_str(), self.tenant.as_str()]
    }

    /// Everything `logout` removes
    pub fn all(&self) -> [&str; 4] {
        [
            self.token.as_str(),
            self.user.as_str(),
            self.tenant.as_str(),
            self.temp_password.as_str(),
        ]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("sysora")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_data_accepts_hotel_alias() {
        let data = AuthData::from_value(json!({
            "token": "t1",
            "user": { "role": "manager", "permissions": ["view_reports"] },
            "hotel": { "subdomain": "acme", "name": "Acme" }
        }))
        .unwrap();

        assert_eq!(data.tenant.subdomain, "acme");
        assert!(data.user.permissions.contains("view_reports"));
    }

    #[test]
    fn test_auth_data_rejects_missing_fields() {
        let missing_tenant = AuthData::from_value(json!({
            "token": "t1",
            "user": { "role": "owner" }
        }));
        assert!(matches!(
            missing_tenant,
            Err(SessionError::InvalidInput { .. })
        ));

        let empty_token = AuthData::from_value(json!({
            "token": "",
            "user": { "role": "owner" },
            "tenant": { "subdomain": "acme" }
        }));
        match empty_token {
            Err(SessionError::InvalidInput { field, .. }) => {
                assert_eq!(field.as_deref(), Some("token"))
            }
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new(
            "secret-token".to_string(),
            UserRecord::new("owner"),
            TenantRecord::new("acme"),
        );
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("acme"));
    }

    #[test]
    fn test_default_keys_match_legacy_layout() {
        let keys = StorageKeys::default();
        assert_eq!(
            keys.all(),
            [
                "sysora_token",
                "sysora_user",
                "sysora_hotel",
                "sysora_temp_password"
            ]
        );
    }
}
