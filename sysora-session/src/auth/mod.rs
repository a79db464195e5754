//! Identity records and authorization rules

pub mod identity;
pub mod permissions;

pub use identity::{Role, TenantRecord, UserRecord};
pub use permissions::{grants, KnownPermission, PERMISSION_WILDCARD};
