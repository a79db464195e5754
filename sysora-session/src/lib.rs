//! Sysora Session - client-side identity for Sysora hotel workspaces
//!
//! This crate owns "who is logged in, to which hotel, with what token" for a
//! Sysora client. It provides:
//!
//! - A session manager persisting token, user and tenant as one unit
//! - Authorization predicates derived from the current session
//! - A shared provider handle so every consumer reads the same session
//! - Status workflows for the hotel service panels (housekeeping, laundry,
//!   maintenance, guest service requests)
//! - A thin REST client for the authentication and status endpoints
//!
//! ## Architecture
//!
//! - **Session** (this crate, `session`): sole owner of the persisted keys
//! - **Consumers** (UI panels, `api`): read headers and predicates, issue
//!   their own requests, report login/logout outcomes back

pub mod api;
pub mod auth;
pub mod session;
pub mod workflow;

pub use api::{login_and_store, logout_and_clear, AuthBackend, Credentials, SysoraApiClient, WorkspaceInfo};
pub use auth::{KnownPermission, Role, TenantRecord, UserRecord, PERMISSION_WILDCARD};
pub use session::{
    AuthData, FileStore, KeyValueStore, MemoryStore, Session, SessionManager, SessionProvider,
    SessionState, StorageError, StorageKeys, StorageOp,
};
pub use workflow::{ServiceDomain, StatusSummary, StatusWorkflow, TransitionRecord, WorkflowError};

/// Session-level error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid auth data: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
    },

    #[error("Session storage write failed: {0}")]
    StorageWrite(#[source] StorageError),

    #[error("Not authenticated: {operation} requires an active session")]
    NotAuthenticated { operation: String },

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Core error: {0}")]
    Core(#[from] sysora_core::SysoraError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Create an invalid input error for a named field
    pub fn invalid_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid input error without a field
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create a not-authenticated error for an operation
    pub fn not_authenticated<S: Into<String>>(operation: S) -> Self {
        Self::NotAuthenticated {
            operation: operation.into(),
        }
    }

    /// Create an API error
    pub fn api<S: Into<String>>(message: S, status: Option<u16>) -> Self {
        Self::Api {
            message: message.into(),
            status,
        }
    }
}
