//! Manager configuration.
//!
//! [`ManagerConfig`] controls the naming convention used to resolve views,
//! the primary UI context and a few diagnostics switches. It can be built in
//! code or loaded from TOML:
//!
//! ```toml
//! view_suffix = "Page"
//! window_suffixes = ["Window", "Dialog"]
//!
//! [[namespace_replacements]]
//! from = "viewmodels"
//! to = "pages"
//! ```
//!
//! Missing keys keep their defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ComposeError, Result};

/// Rewrites one namespace segment when deriving a view name from a model name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamespaceReplacement {
    /// Segment to replace.
    pub from: String,
    /// Replacement segment.
    pub to: String,
}

impl NamespaceReplacement {
    /// Create a replacement.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Configuration for a [`LifecycleManager`](crate::LifecycleManager).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Suffix appended to a derived view name.
    pub view_suffix: String,
    /// Suffix stripped from a model name.
    pub model_suffix: String,
    /// Names ending in one of these are used without appending `view_suffix`.
    pub window_suffixes: Vec<String>,
    /// Namespace segment rewrites, applied to every segment.
    pub namespace_replacements: Vec<NamespaceReplacement>,
    /// Cross-check the registry indices after each mutation in debug builds.
    pub verify_registry: bool,
    /// Thread name of the primary UI context.
    pub context_thread_name: String,
    /// Debug name of the shell root.
    pub shell_name: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            view_suffix: "View".to_string(),
            model_suffix: "ViewModel".to_string(),
            window_suffixes: vec!["Window".to_string()],
            namespace_replacements: vec![
                NamespaceReplacement::new("ViewModels", "Views"),
                NamespaceReplacement::new("ViewModel", "View"),
                NamespaceReplacement::new("view_models", "views"),
                NamespaceReplacement::new("view_model", "view"),
            ],
            verify_registry: true,
            context_thread_name: "horizon-ui".to_string(),
            shell_name: "shell".to_string(),
        }
    }
}

impl ManagerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ComposeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ComposeError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check the values for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.view_suffix.is_empty() {
            return Err(ComposeError::Config("view_suffix must not be empty".into()));
        }
        if self.context_thread_name.is_empty() {
            return Err(ComposeError::Config("context_thread_name must not be empty".into()));
        }
        if let Some(r) = self.namespace_replacements.iter().find(|r| r.from.is_empty()) {
            return Err(ComposeError::Config(format!(
                "namespace replacement to '{}' has an empty source segment",
                r.to
            )));
        }
        Ok(())
    }

    /// Set the view suffix.
    pub fn with_view_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.view_suffix = suffix.into();
        self
    }

    /// Set the model suffix.
    pub fn with_model_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.model_suffix = suffix.into();
        self
    }

    /// Add a window-like suffix.
    pub fn with_window_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.window_suffixes.push(suffix.into());
        self
    }

    /// Add a namespace segment rewrite.
    pub fn with_namespace_replacement(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.namespace_replacements.push(NamespaceReplacement::new(from, to));
        self
    }

    /// Enable or disable registry verification.
    pub fn with_verify_registry(mut self, verify: bool) -> Self {
        self.verify_registry = verify;
        self
    }

    /// Set the primary context's thread name.
    pub fn with_context_thread_name(mut self, name: impl Into<String>) -> Self {
        self.context_thread_name = name.into();
        self
    }

    /// Set the shell root's name.
    pub fn with_shell_name(mut self, name: impl Into<String>) -> Self {
        self.shell_name = name.into();
        self
    }
}
