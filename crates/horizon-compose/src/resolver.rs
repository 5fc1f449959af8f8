//! View resolution.
//!
//! Maps a view-model to the kind of view that presents it. Lookups go, in
//! order, through
//!
//! 1. the alias table, when the caller names an alias,
//! 2. the type-mapping table, keyed by the model's exact runtime type,
//! 3. the naming convention.
//!
//! Whatever kind comes out must exist in the [`ViewCatalog`] as a view.
//!
//! # Naming convention
//!
//! With the default [`ManagerConfig`]:
//!
//! | model | view |
//! |---|---|
//! | `app::view_models::DeleteRequestViewModel` | `app::views::DeleteRequestView` |
//! | `app::ViewModels::SettingsViewModel` | `app::Views::SettingsView` |
//! | `app::view_models::MainWindowViewModel` | `app::views::MainWindow` |
//!
//! Both tables are append-only; registering a key twice is an error.

use std::any::TypeId;
use std::collections::HashMap;

use horizon_compose_core::logging::targets;
use parking_lot::RwLock;

use crate::config::{ManagerConfig, NamespaceReplacement};
use crate::error::{ComposeError, ResolveFailure, Result};
use crate::factory::{Conformance, ViewCatalog};
use crate::model::{ModelRef, ModelType, TypeDescriptor, model_label};
use crate::view::ViewKind;

/// The string transform from model names to view names.
#[derive(Debug, Clone)]
pub struct NamingConvention {
    view_suffix: String,
    model_suffix: String,
    window_suffixes: Vec<String>,
    namespace_replacements: Vec<NamespaceReplacement>,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::from_config(&ManagerConfig::default())
    }
}

impl NamingConvention {
    /// Take the convention settings from a manager configuration.
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self {
            view_suffix: config.view_suffix.clone(),
            model_suffix: config.model_suffix.clone(),
            window_suffixes: config.window_suffixes.clone(),
            namespace_replacements: config.namespace_replacements.clone(),
        }
    }

    /// Derive the view descriptor for a model descriptor.
    pub fn apply(&self, model: &TypeDescriptor) -> TypeDescriptor {
        let namespace = model.namespace().iter().map(|segment| {
            self.namespace_replacements
                .iter()
                .find(|r| r.from == *segment)
                .map_or_else(|| segment.clone(), |r| r.to.clone())
        });

        let mut name = model.name();
        if !self.model_suffix.is_empty() {
            if let Some(stripped) = name.strip_suffix(self.model_suffix.as_str()) {
                if !stripped.is_empty() {
                    name = stripped;
                }
            }
        }

        let is_window = self
            .window_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && name.ends_with(suffix.as_str()));
        let name = if is_window {
            name.to_string()
        } else {
            format!("{name}{}", self.view_suffix)
        };

        TypeDescriptor::new(namespace, name)
    }
}

/// Alias and type-mapping tables plus the naming convention.
#[derive(Debug, Default)]
pub struct ViewResolver {
    aliases: RwLock<HashMap<String, ViewKind>>,
    mappings: RwLock<HashMap<TypeId, (TypeDescriptor, ViewKind)>>,
    convention: NamingConvention,
}

impl ViewResolver {
    /// Create a resolver with empty tables.
    pub fn new(convention: NamingConvention) -> Self {
        Self {
            aliases: RwLock::new(HashMap::new()),
            mappings: RwLock::new(HashMap::new()),
            convention,
        }
    }

    /// The naming convention in use.
    pub fn convention(&self) -> &NamingConvention {
        &self.convention
    }

    /// Register an alias for a view kind.
    pub fn register_alias(&self, alias: impl Into<String>, kind: ViewKind) -> Result<()> {
        let alias = alias.into();
        let mut aliases = self.aliases.write();
        if aliases.contains_key(&alias) {
            return Err(ComposeError::DuplicateAlias(alias));
        }
        tracing::debug!(target: targets::RESOLVER, %alias, %kind, "alias registered");
        aliases.insert(alias, kind);
        Ok(())
    }

    /// Map a model type to a view kind, bypassing the naming convention.
    pub fn register_mapping(&self, model_type: ModelType, kind: ViewKind) -> Result<()> {
        let mut mappings = self.mappings.write();
        if mappings.contains_key(&model_type.type_id()) {
            return Err(ComposeError::DuplicateMapping(model_type.descriptor().to_string()));
        }
        tracing::debug!(target: targets::RESOLVER, model = %model_type.descriptor(), %kind, "mapping registered");
        mappings.insert(model_type.type_id(), (model_type.descriptor().clone(), kind));
        Ok(())
    }

    /// Resolve the view kind for a model.
    pub fn resolve(&self, model: &ModelRef, alias: Option<&str>, catalog: &ViewCatalog) -> Result<ViewKind> {
        let model_type = model.model_type();

        let kind = if let Some(alias) = alias {
            self.aliases
                .read()
                .get(alias)
                .cloned()
                .ok_or_else(|| ComposeError::UnresolvedAlias(alias.to_string()))?
        } else if let Some((_, kind)) = self.mappings.read().get(&model_type.type_id()) {
            kind.clone()
        } else {
            ViewKind::from(&self.convention.apply(model_type.descriptor()))
        };

        match catalog.lookup(&kind) {
            Some(Conformance::View) => {
                tracing::trace!(target: targets::RESOLVER, model = %model_type.descriptor(), %kind, "resolved view kind");
                Ok(kind)
            }
            Some(Conformance::NotAView) => Err(ComposeError::UnresolvableViewType {
                model: model_label(model),
                reason: ResolveFailure::NotAView(kind),
            }),
            None => Err(ComposeError::UnresolvableViewType {
                model: model_label(model),
                reason: ResolveFailure::NoCandidate(kind),
            }),
        }
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<(String, ViewKind)> {
        let mut aliases: Vec<_> = self
            .aliases
            .read()
            .iter()
            .map(|(alias, kind)| (alias.clone(), kind.clone()))
            .collect();
        aliases.sort();
        aliases
    }

    /// Registered type mappings as `(model, view)` pairs.
    pub fn mappings(&self) -> Vec<(TypeDescriptor, ViewKind)> {
        self.mappings.read().values().cloned().collect()
    }
}

static_assertions::assert_impl_all!(ViewResolver: Send, Sync);
