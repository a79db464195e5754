//! Shared session handle
//!
//! One [`SessionManager`] behind a lock, handed to every consumer by clone
//! instead of each consumer reading storage on its own.

use super::manager::SessionManager;
use super::storage::{FileStore, KeyValueStore};
use super::types::{AuthData, Session};
use crate::auth::{TenantRecord, UserRecord};
use crate::SessionResult;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use sysora_core::SysoraConfig;

pub struct SessionProvider<S: KeyValueStore> {
    inner: Arc<RwLock<SessionManager<S>>>,
}

impl<S: KeyValueStore> Clone for SessionProvider<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> SessionProvider<S> {
    pub fn new(manager: SessionManager<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(manager)),
        }
    }

    /// Wrap `manager` and rehydrate it from storage in one step
    pub fn initialized(mut manager: SessionManager<S>) -> Self {
        manager.initialize();
        Self::new(manager)
    }

    // Mutations only replace state after a successful write, so a poisoned
    // lock still guards a consistent manager.
    fn read(&self) -> RwLockReadGuard<'_, SessionManager<S>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionManager<S>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the manager under the read lock
    pub fn with_manager<R>(&self, f: impl FnOnce(&SessionManager<S>) -> R) -> R {
        f(&self.read())
    }

    /// Re-read storage; returns whether a session was restored
    pub fn initialize(&self) -> bool {
        self.write().initialize().is_authenticated()
    }

    pub fn login(&self, data: AuthData) -> SessionResult<()> {
        self.write().login(data)
    }

    pub fn logout(&self) -> SessionResult<()> {
        self.write().logout()
    }

    pub fn update_user(&self, user: UserRecord) -> SessionResult<()> {
        self.write().update_user(user)
    }

    pub fn update_tenant(&self, tenant: TenantRecord) -> SessionResult<()> {
        self.write().update_tenant(tenant)
    }

    pub fn snapshot(&self) -> Option<Session> {
        self.read().snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn auth_headers(&self) -> BTreeMap<String, String> {
        self.read().auth_headers()
    }

    pub fn is_role(&self, role: &str) -> bool {
        self.read().is_role(role)
    }

    pub fn has_permission(&self, permission: impl AsRef<str>) -> bool {
        self.read().has_permission(permission)
    }

    pub fn workspace_url(&self) -> Option<String> {
        self.read().workspace_url()
    }

    pub fn dashboard_path(&self) -> Option<String> {
        self.read().dashboard_path()
    }
}

impl SessionProvider<FileStore> {
    /// File-backed provider configured from `SYSORA_CONFIG`, or defaults
    pub fn from_env() -> SessionResult<Self> {
        let config = SysoraConfig::from_env_or_default()?;
        Ok(Self::new(SessionManager::open(&config)?))
    }
}
