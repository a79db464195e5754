//! User and tenant records
//!
//! Shapes of the `user` and `hotel` objects returned by the authentication
//! endpoints and persisted alongside the token.

use crate::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Staff role within a hotel workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Workspace owner; implicitly holds every permission
    Owner,
    Admin,
    Manager,
    Staff,
    Receptionist,
    CleaningStaff,
    MaintenanceStaff,
    /// Role string this client does not know about
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::Receptionist => "receptionist",
            Role::CleaningStaff => "cleaning_staff",
            Role::MaintenanceStaff => "maintenance_staff",
            Role::Other(name) => name,
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "owner" => Role::Owner,
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "staff" => Role::Staff,
            "receptionist" => Role::Receptionist,
            "cleaning_staff" => Role::CleaningStaff,
            "maintenance_staff" => Role::MaintenanceStaff,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    /// Missing in some login responses; treated as empty
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Fields this client does not interpret, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn new(role: impl Into<Role>) -> Self {
        Self {
            id: None,
            full_name: None,
            email: None,
            role: role.into(),
            permissions: BTreeSet::new(),
            extra: Map::new(),
        }
    }

    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub(crate) fn validate(&self) -> SessionResult<()> {
        if self.role.as_str().trim().is_empty() {
            return Err(SessionError::invalid_field("user role is empty", "user.role"));
        }
        Ok(())
    }
}

/// Hotel workspace the session is scoped to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub subdomain: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TenantRecord {
    pub fn new(subdomain: impl Into<String>) -> Self {
        Self {
            id: None,
            name: None,
            subdomain: subdomain.into(),
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn validate(&self) -> SessionResult<()> {
        let subdomain = self.subdomain.trim();
        if subdomain.is_empty() {
            return Err(SessionError::invalid_field(
                "tenant subdomain is empty",
                "tenant.subdomain",
            ));
        }
        if !subdomain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(SessionError::invalid_field(
                format!("tenant subdomain '{}' is not a valid DNS label", subdomain),
                "tenant.subdomain",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_round_trips_unknown_names() {
        let role: Role = serde_json::from_value(json!("night_auditor")).unwrap();
        assert_eq!(role, Role::Other("night_auditor".to_string()));
        assert_eq!(serde_json::to_value(&role).unwrap(), json!("night_auditor"));

        let role: Role = serde_json::from_value(json!("cleaning_staff")).unwrap();
        assert_eq!(role, Role::CleaningStaff);
    }

    #[test]
    fn test_user_from_login_response_without_permissions() {
        let user: UserRecord = serde_json::from_value(json!({
            "id": "u1",
            "fullName": "Amina Benali",
            "email": "amina@acme.test",
            "role": "owner"
        }))
        .unwrap();

        assert!(user.role.is_owner());
        assert!(user.permissions.is_empty());
        assert_eq!(user.full_name.as_deref(), Some("Amina Benali"));
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let original = json!({
            "subdomain": "acme",
            "name": "Acme Hotel",
            "workspaceUrl": "https://acme.sysora.app",
            "plan": { "tier": "pro" }
        });
        let tenant: TenantRecord = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(tenant.extra.get("plan"), Some(&json!({ "tier": "pro" })));
        assert_eq!(serde_json::to_value(&tenant).unwrap(), original);
    }

    #[test]
    fn test_tenant_validation() {
        assert!(TenantRecord::new("acme-hotel").validate().is_ok());
        assert!(TenantRecord::new("  ").validate().is_err());
        assert!(TenantRecord::new("acme/evil").validate().is_err());
    }
}
