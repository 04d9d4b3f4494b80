//! Topology validation errors

use crate::network::SubnetTier;
use thiserror::Error;

/// Validation failures detected before any declaration is emitted.
///
/// These are never recovered locally: a failed build aborts with no partial
/// graph. Provider-side failures (auth, quota, API errors) are owned by the
/// provisioning engine and have no taxonomy here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no subnets available in the {0} tier")]
    EmptySubnetTier(SubnetTier),

    #[error("allocated storage {allocated_gib} GiB exceeds maximum allocated storage {max_allocated_gib} GiB")]
    InvalidStorageBounds {
        allocated_gib: u32,
        max_allocated_gib: u32,
    },

    #[error("invalid port: {0}")]
    InvalidPort(u16),

    #[error("declaration references an entity not yet declared: {0}")]
    DanglingReference(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
