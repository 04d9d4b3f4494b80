//! Provisioning-engine error types

use thiserror::Error;

/// Errors raised while declaring a topology through an engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A declaration references a security group the engine has not minted
    /// a ref for yet. The builder never produces such a graph; this guards
    /// hand-assembled ones.
    #[error("declaration references an undeclared entity: {0}")]
    UnresolvedReference(String),

    #[error("failed to declare {resource}: {message}")]
    DeclareFailed { resource: String, message: String },

    /// Opaque provider-side failure surfaced by an engine implementation.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
