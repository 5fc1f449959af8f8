//! Error types for the lifecycle manager.

use std::fmt;

use horizon_compose_core::{GatewayError, HostError};

use crate::view::ViewKind;

/// Error type returned by view-model hooks and view constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for manager operations.
pub type Result<T> = std::result::Result<T, ComposeError>;

/// A lifecycle hook of a view-model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// `ViewModel::initialize`, run once per model.
    Initialize,
    /// `ViewModel::on_load`, run on each attachment.
    Load,
    /// `ViewModel::on_unload`, run on each detachment.
    Unload,
    /// `ViewModel::clean_up`, run on final release.
    CleanUp,
    /// `Disposable::dispose` on the view or the model.
    Dispose,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialize => "initialize",
            Self::Load => "on_load",
            Self::Unload => "on_unload",
            Self::CleanUp => "clean_up",
            Self::Dispose => "dispose",
        };
        f.write_str(name)
    }
}

/// Why a view kind could not be resolved for a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// No type with the candidate name is known.
    NoCandidate(ViewKind),
    /// The candidate type exists but does not implement the view contract.
    NotAView(ViewKind),
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidate(kind) => write!(f, "no view type named '{kind}' is registered"),
            Self::NotAView(kind) => write!(f, "'{kind}' exists but is not a view"),
        }
    }
}

/// Errors produced by the lifecycle manager.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// The model already has a live view.
    #[error("view-model {model} already has a registered view")]
    DuplicateRegistration {
        /// Label of the offending model.
        model: String,
    },

    /// No live view is bound to the model.
    #[error(
        "no live view is bound to view-model {model}; likely causes: the view was never shown, \
         it has already been closed, the instance differs from the one that was shown, or its \
         resolved view type does not implement the view contract"
    )]
    UnboundModel {
        /// Label of the offending model.
        model: String,
    },

    /// The alias has not been registered.
    #[error("no view kind is registered for alias '{0}'")]
    UnresolvedAlias(String),

    /// No usable view type could be found for the model.
    #[error("cannot resolve a view for view-model {model}: {reason}")]
    UnresolvableViewType {
        /// Label of the offending model.
        model: String,
        /// What went wrong.
        reason: ResolveFailure,
    },

    /// The view factory failed.
    #[error("failed to construct view '{kind}'")]
    ViewConstructionFailed {
        /// The kind that was being constructed.
        kind: ViewKind,
        /// The constructor's error.
        #[source]
        source: BoxError,
    },

    /// The view has no root that could be closed, minimized or activated.
    #[error("the view of view-model {model} has no closable root container")]
    NonClosableRoot {
        /// Label of the offending model.
        model: String,
    },

    /// The model is not being shown modally.
    #[error("view-model {model} is not being shown modally")]
    InvalidModalTransition {
        /// Label of the offending model.
        model: String,
    },

    /// The pair is already initializing or loading.
    #[error("view-model {model} is already being activated")]
    ActivationInProgress {
        /// Label of the offending model.
        model: String,
    },

    /// The modal presenter failed.
    #[error("modal presenter failed")]
    Presenter(#[source] BoxError),

    /// A view kind is already mapped for the model type.
    #[error("a view kind is already mapped for model type {0}")]
    DuplicateMapping(String),

    /// The alias is already registered.
    #[error("alias '{0}' is already registered")]
    DuplicateAlias(String),

    /// A view-model hook failed.
    #[error("{phase} of view-model {model} failed")]
    Hook {
        /// The failing hook.
        phase: LifecyclePhase,
        /// Label of the model.
        model: String,
        /// The hook's error.
        #[source]
        source: BoxError,
    },

    /// Marshaling onto a UI context failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The host tree rejected an operation.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ComposeError {
    /// The hook phase, if this is a hook failure.
    pub fn phase(&self) -> Option<LifecyclePhase> {
        match self {
            Self::Hook { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

static_assertions::assert_impl_all!(ComposeError: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_model_lists_causes() {
        let err = ComposeError::UnboundModel {
            model: "app::Settings".into(),
        };
        let message = err.to_string();
        assert!(message.contains("app::Settings"));
        assert!(message.contains("already been closed"));
    }

    #[test]
    fn test_hook_error_has_source() {
        let err = ComposeError::Hook {
            phase: LifecyclePhase::Load,
            model: "m".into(),
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "on_load of view-model m failed");
        assert_eq!(err.phase(), Some(LifecyclePhase::Load));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));
    }

    #[test]
    fn test_resolve_failure_display() {
        let reason = ResolveFailure::NotAView(ViewKind::new("app::views::Helper"));
        assert_eq!(reason.to_string(), "'app::views::Helper' exists but is not a view");
    }
}
