//! Render backend seam
//!
//! Everything the scene layer knows about rendering lives behind the
//! [`RenderServer`] trait: an opaque, handle-based service that owns the
//! actual instance table. This module defines the handle types, the trait,
//! the error surface, and a slotmap-backed reference implementation
//! ([`HandleTableServer`]) used by tests and headless tooling.

mod handle_table;
mod material;
mod server;

pub use handle_table::HandleTableServer;
pub use material::Material;
pub use server::{
    InstanceFlag, InstanceHandle, MaterialHandle, RenderServer, ResourceHandle, ShadowCasting,
    SharedServer,
};

use thiserror::Error;

/// Errors raised by a rendering backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The backend cannot allocate another instance handle
    ///
    /// Fatal for the node being constructed; there is no retry policy at
    /// this layer.
    #[error("Instance table exhausted: {0}")]
    InstanceExhausted(String),

    /// A handle did not resolve to a live backend resource
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Backend-specific error occurred
    ///
    /// Wraps backend-specific failures in a generic form for consistent
    /// handling across different render servers.
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for backend operations
pub type RenderResult<T> = Result<T, RenderError>;
