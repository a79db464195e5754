//! Session Manager - single owner of the persisted identity
//!
//! Every mutation persists the full session triple in one storage batch
//! before the in-memory state changes. A failed write leaves both the store
//! and memory exactly as they were.

use super::storage::{FileStore, KeyValueStore, StorageError, StorageOp};
use super::types::{AuthData, Session, SessionState, StorageKeys};
use crate::auth::{self, Role, TenantRecord, UserRecord};
use crate::{SessionError, SessionResult};
use std::collections::BTreeMap;
use sysora_core::{storage_error, SysoraConfig, WorkspaceConfig};
use tracing::{debug, error, info, warn};

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Why persisted data could not be rehydrated
#[derive(Debug)]
enum Corruption {
    Partial { missing: Vec<String> },
    Unparsable { key: String, error: serde_json::Error },
    Invalid(SessionError),
    Unreadable(StorageError),
}

impl std::fmt::Display for Corruption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Corruption::Partial { missing } => {
                write!(f, "partial session, missing {}", missing.join(", "))
            }
            Corruption::Unparsable { key, error } => write!(f, "cannot parse {}: {}", key, error),
            Corruption::Invalid(e) => write!(f, "{}", e),
            Corruption::Unreadable(e) => write!(f, "{}", e),
        }
    }
}

/// Client session manager
pub struct SessionManager<S: KeyValueStore> {
    store: S,
    keys: StorageKeys,
    workspace: WorkspaceConfig,
    state: SessionState,
}

impl<S: KeyValueStore> SessionManager<S> {
    /// Create an unauthenticated manager over `store` with default keys.
    ///
    /// Call [`initialize`](Self::initialize) to rehydrate a persisted session.
    pub fn new(store: S) -> Self {
        Self {
            store,
            keys: StorageKeys::default(),
            workspace: WorkspaceConfig::default(),
            state: SessionState::Unauthenticated,
        }
    }

    /// Create a manager using the key prefix and workspace settings of `config`
    pub fn from_config(store: S, config: &SysoraConfig) -> Self {
        Self::new(store)
            .with_keys(StorageKeys::with_prefix(&config.session.key_prefix))
            .with_workspace(config.workspace.clone())
    }

    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_workspace(mut self, workspace: WorkspaceConfig) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Rehydrate from storage.
    ///
    /// A complete, parsable triple becomes the active session. Anything else
    /// resolves to unauthenticated, and partial remnants are removed.
    pub fn initialize(&mut self) -> &SessionState {
        match self.load_persisted() {
            Ok(Some(session)) => {
                info!(
                    tenant = %session.tenant().subdomain,
                    role = %session.user().role,
                    "Restored persisted session"
                );
                self.state = SessionState::Authenticated(session);
            }
            Ok(None) => {
                debug!("No persisted session found");
                self.state = SessionState::Unauthenticated;
            }
            Err(corruption) => {
                warn!(reason = %corruption, "Discarding corrupt persisted session");
                self.state = SessionState::Unauthenticated;
                if let Err(e) = self.store.apply(self.present_clear_ops()) {
                    warn!(error = %e, "Failed to remove corrupt session remnants");
                }
            }
        }

        &self.state
    }

    fn load_persisted(&self) -> Result<Option<Session>, Corruption> {
        let token = self.read_key(&self.keys.token)?;
        let user = self.read_key(&self.keys.user)?;
        let tenant = self.read_key(&self.keys.tenant)?;

        let (token, user, tenant) = match (token, user, tenant) {
            (None, None, None) => return Ok(None),
            (Some(token), Some(user), Some(tenant)) => (token, user, tenant),
            (token, user, tenant) => {
                let missing = [
                    (token.is_none(), &self.keys.token),
                    (user.is_none(), &self.keys.user),
                    (tenant.is_none(), &self.keys.tenant),
                ]
                .into_iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, key)| key.clone())
                .collect();
                return Err(Corruption::Partial { missing });
            }
        };

        let user: UserRecord =
            serde_json::from_str(&user).map_err(|error| Corruption::Unparsable {
                key: self.keys.user.clone(),
                error,
            })?;
        let tenant: TenantRecord =
            serde_json::from_str(&tenant).map_err(|error| Corruption::Unparsable {
                key: self.keys.tenant.clone(),
                error,
            })?;

        let data = AuthData::new(token, user, tenant);
        data.validate().map_err(Corruption::Invalid)?;
        Ok(Some(data.into_session()))
    }

    fn read_key(&self, key: &str) -> Result<Option<String>, Corruption> {
        self.store.get(key).map_err(Corruption::Unreadable)
    }

    /// Removes for the keys still held; a key that cannot be read is removed too
    fn present_clear_ops(&self) -> Vec<StorageOp> {
        self.keys
            .all()
            .into_iter()
            .filter(|key| !matches!(self.store.get(key), Ok(None)))
            .map(StorageOp::remove)
            .collect()
    }

    fn persist(&mut self, session: &Session) -> SessionResult<()> {
        let ops = vec![
            StorageOp::set(&self.keys.token, session.token()),
            StorageOp::set(&self.keys.user, serde_json::to_string(session.user())?),
            StorageOp::set(&self.keys.tenant, serde_json::to_string(session.tenant())?),
        ];

        self.store.apply(ops).map_err(|e| {
            error!(error = %e, "Failed to persist session");
            SessionError::StorageWrite(e)
        })
    }

    /// Replace the session with `data`.
    ///
    /// On any error the previous session, persisted and in memory, is kept.
    pub fn login(&mut self, data: AuthData) -> SessionResult<()> {
        data.validate()?;

        let session = data.into_session();
        self.persist(&session)?;

        info!(
            tenant = %session.tenant().subdomain,
            role = %session.user().role,
            "Session established"
        );
        self.state = SessionState::Authenticated(session);
        Ok(())
    }

    /// Clear every persisted identity key and the in-memory session.
    ///
    /// Idempotent: logging out while logged out succeeds.
    pub fn logout(&mut self) -> SessionResult<()> {
        let ops = self.present_clear_ops();
        if !ops.is_empty() {
            self.store.apply(ops).map_err(|e| {
                error!(error = %e, "Failed to clear persisted session");
                SessionError::StorageWrite(e)
            })?;
        }

        if self.state.is_authenticated() {
            info!("Session cleared");
        }
        self.state = SessionState::Unauthenticated;
        Ok(())
    }

    /// Replace the user of the active session
    pub fn update_user(&mut self, user: UserRecord) -> SessionResult<()> {
        user.validate()?;
        let current = self
            .session()
            .ok_or_else(|| SessionError::not_authenticated("update_user"))?;

        let updated = current.with_user(user);
        self.persist(&updated)?;

        debug!(role = %updated.user().role, "Session user updated");
        self.state = SessionState::Authenticated(updated);
        Ok(())
    }

    /// Replace the tenant of the active session
    pub fn update_tenant(&mut self, tenant: TenantRecord) -> SessionResult<()> {
        tenant.validate()?;
        let current = self
            .session()
            .ok_or_else(|| SessionError::not_authenticated("update_tenant"))?;

        let updated = current.with_tenant(tenant);
        self.persist(&updated)?;

        debug!(tenant = %updated.tenant().subdomain, "Session tenant updated");
        self.state = SessionState::Authenticated(updated);
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.state.session()
    }

    /// Owned copy of the current session
    pub fn snapshot(&self) -> Option<Session> {
        self.session().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Headers for an authenticated JSON request; empty when logged out
    pub fn auth_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Some(session) = self.session() {
            headers.insert(
                AUTHORIZATION_HEADER.to_string(),
                format!("Bearer {}", session.token()),
            );
            headers.insert(
                CONTENT_TYPE_HEADER.to_string(),
                JSON_CONTENT_TYPE.to_string(),
            );
        }
        headers
    }

    pub fn role(&self) -> Option<&Role> {
        self.session().map(|s| &s.user().role)
    }

    /// Exact role match
    pub fn is_role(&self, role: &str) -> bool {
        self.role().is_some_and(|r| r.as_str() == role)
    }

    pub fn is_owner(&self) -> bool {
        self.role() == Some(&Role::Owner)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(&Role::Admin)
    }

    pub fn is_manager(&self) -> bool {
        self.role() == Some(&Role::Manager)
    }

    pub fn has_permission(&self, permission: impl AsRef<str>) -> bool {
        self.session()
            .is_some_and(|s| auth::grants(s.user(), permission.as_ref()))
    }

    /// Explicit permission entries of the current user
    pub fn permissions(&self) -> Vec<String> {
        self.session()
            .map(|s| s.user().permissions.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// `<scheme>://<subdomain>.<domain>` for the active tenant
    pub fn workspace_url(&self) -> Option<String> {
        let session = self.session()?;
        Some(format!(
            "{}://{}.{}",
            self.workspace.scheme,
            session.tenant().subdomain,
            self.workspace.domain
        ))
    }

    /// Post-login landing path carrying the tenant subdomain
    pub fn dashboard_path(&self) -> Option<String> {
        let session = self.session()?;
        Some(format!(
            "{}?subdomain={}",
            self.workspace.dashboard_path,
            urlencoding::encode(&session.tenant().subdomain)
        ))
    }
}

impl SessionManager<FileStore> {
    /// Open the file-backed session under `config.session.storage_dir` and
    /// rehydrate it.
    pub fn open(config: &SysoraConfig) -> SessionResult<Self> {
        let store = FileStore::open(&config.session.storage_dir).map_err(|e| {
            storage_error!("Failed to open session store", "session_manager", e)
        })?;

        let mut manager = Self::from_config(store, config);
        manager.initialize();
        Ok(manager)
    }
}
