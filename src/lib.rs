//! Prefixed article/order number sequences and the permission registry
//! consulted by authorization checks.

pub mod authorization;
pub mod config;
pub mod declarations;
pub mod error;
pub mod ids;
pub mod keys;
pub mod locks;
pub mod permission;
pub mod registry;
pub mod sequence;
pub mod service;
pub mod timestamp;

pub use authorization::{AuthorizationService, Authorizer};
pub use config::Config;
pub use error::{AuthorizationError, RegistryError, SequenceError};
pub use permission::{Permission, PermissionGroup};
pub use registry::{AppMode, PermissionRegistry};
pub use sequence::{Purpose, SequenceNumber};
pub use service::SequenceService;
