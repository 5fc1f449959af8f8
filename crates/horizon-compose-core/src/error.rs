//! Error types for Horizon Compose core systems.

use crate::gateway::ContextId;
use crate::host::ElementId;

/// Errors raised while marshaling work onto a UI context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// No context with this ID is registered with the gateway.
    #[error("Unknown UI context {0:?}")]
    UnknownContext(ContextId),
    /// The context's thread has shut down and can no longer accept work.
    #[error("UI context {0:?} has stopped")]
    ContextStopped(ContextId),
    /// The marshaled closure panicked on the target context.
    #[error("Task panicked on UI context {0:?}")]
    TaskPanicked(ContextId),
    /// The context thread could not be started.
    #[error("Failed to start UI context: {0}")]
    SpawnFailed(String),
}

/// Errors raised by the host element tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The element ID is invalid or the element has been removed.
    #[error("Invalid or removed element {0:?}")]
    InvalidElement(ElementId),
    /// Attaching would make an element its own ancestor.
    #[error("Cannot attach element {0:?} beneath itself or one of its descendants")]
    CircularParentage(ElementId),
    /// The operation requires a window-like root.
    #[error("Element {0:?} is not a root container")]
    NotARoot(ElementId),
}

/// Result type for host tree operations.
pub type HostResult<T> = std::result::Result<T, HostError>;
