//! Session Management Module
//!
//! Persisted authentication state for a single client: the token, user and
//! tenant triple, the stores that hold it, and the shared handle consumers
//! read it through.

pub mod manager;
pub mod provider;
pub mod storage;
pub mod types;

pub use manager::{SessionManager, AUTHORIZATION_HEADER, CONTENT_TYPE_HEADER};
pub use provider::SessionProvider;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageOp, StorageResult};
pub use types::{AuthData, Session, SessionState, StorageKeys};
