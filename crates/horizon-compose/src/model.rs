//! View-model contract and type descriptors.
//!
//! A view-model is any `Send + Sync` type implementing [`ViewModel`]. Every
//! hook has a no-op default, so the smallest view-model is an empty impl:
//!
//! ```
//! use horizon_compose::ViewModel;
//!
//! struct AboutViewModel;
//! impl ViewModel for AboutViewModel {}
//! ```
//!
//! Models are shared as [`ModelRef`] (`Arc<dyn ViewModel>`); their identity is
//! the allocation, see [`ModelId`].

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// A type name split into namespace segments and a simple name.
///
/// Generic arguments are not part of the descriptor:
/// `app::view_models::ListViewModel<u32>` describes as namespace
/// `["app", "view_models"]`, name `ListViewModel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    namespace: Vec<String>,
    name: String,
}

impl TypeDescriptor {
    /// Create a descriptor from its parts.
    pub fn new<I, S>(namespace: I, name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    /// Describe a Rust type.
    pub fn of<T: ?Sized>() -> Self {
        Self::parse(std::any::type_name::<T>())
    }

    /// Parse a `::`-separated path.
    pub fn parse(path: &str) -> Self {
        let path = path.split('<').next().unwrap_or(path).trim();
        let mut segments: Vec<String> = path
            .split("::")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let name = segments.pop().unwrap_or_default();
        Self {
            namespace: segments,
            name,
        }
    }

    /// Namespace segments, outermost first.
    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    /// The simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `::`-joined path.
    pub fn qualified(&self) -> String {
        let mut path = self.namespace.join("::");
        if !path.is_empty() {
            path.push_str("::");
        }
        path.push_str(&self.name);
        path
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// Runtime type of a view-model: its exact type plus a descriptor for naming.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelType {
    type_id: TypeId,
    descriptor: TypeDescriptor,
}

impl ModelType {
    /// The model type of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            descriptor: TypeDescriptor::of::<T>(),
        }
    }

    /// A model type with a custom descriptor.
    ///
    /// Useful when the Rust path does not follow the naming convention.
    pub fn with_descriptor<T: ?Sized + 'static>(descriptor: TypeDescriptor) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            descriptor,
        }
    }

    /// The exact runtime type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The descriptor used by the naming convention.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}

/// Explicit disposal, invoked after `clean_up` when a pair is released.
pub trait Disposable {
    /// Release resources.
    fn dispose(&self);
}

/// The behavior/data side of a view/view-model pair.
///
/// Hooks run on the UI context that owns the view:
///
/// 1. `initialize` once per model, on its first attachment
/// 2. `on_load` on every attachment
/// 3. `on_unload` on every detachment
/// 4. `clean_up` (then `dispose`) on final release, unless [`keep_alive`](Self::keep_alive)
///
/// An error from `initialize` or `on_load` is reported to whoever triggered
/// the show. Errors and panics during teardown are logged and suppressed.
#[async_trait]
pub trait ViewModel: Send + Sync + 'static {
    /// The model's runtime type, used for view resolution.
    fn model_type(&self) -> ModelType {
        ModelType::of::<Self>()
    }

    /// One-time initialization.
    async fn initialize(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called each time the view becomes live.
    async fn on_load(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called each time the view is detached or closed.
    async fn on_unload(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Final cleanup before the pair is released.
    fn clean_up(&self) {}

    /// Keep the pair around after unload so a re-attachment can reuse it.
    fn keep_alive(&self) -> bool {
        false
    }

    /// The disposal contract, if the model implements it.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

/// Shared handle to a view-model.
pub type ModelRef = Arc<dyn ViewModel>;

/// Identity of a view-model instance.
///
/// Two handles have the same ID exactly when they point at the same
/// allocation. An ID may be reused once the model is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(usize);

impl ModelId {
    /// Identity of a model handle.
    pub fn of(model: &ModelRef) -> Self {
        Self(Arc::as_ptr(model) as *const () as usize)
    }
}

/// Whether two handles refer to the same model.
pub fn same_model(a: &ModelRef, b: &ModelRef) -> bool {
    ModelId::of(a) == ModelId::of(b)
}

/// A short human-readable label for a model: type plus identity.
pub fn model_label(model: &ModelRef) -> String {
    format!("{}#{:x}", model.model_type().descriptor(), ModelId::of(model).0)
}
