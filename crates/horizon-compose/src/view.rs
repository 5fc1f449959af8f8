//! View contract.
//!
//! A view is the presentation side of a pair. The manager only needs two
//! things from it: the host element it renders into and a data-context slot
//! holding its view-model. [`ViewBase`] provides both for views that do not
//! need anything fancier:
//!
//! ```
//! use horizon_compose::{BoxError, ConstructView, View, ViewBase, ViewBuildContext, ModelRef};
//! use horizon_compose_core::ElementId;
//!
//! struct SettingsView {
//!     base: ViewBase,
//! }
//!
//! impl View for SettingsView {
//!     fn actual_element(&self) -> ElementId {
//!         self.base.element_id()
//!     }
//!     fn data_context(&self) -> Option<ModelRef> {
//!         self.base.data_context()
//!     }
//!     fn set_data_context(&self, model: Option<ModelRef>) {
//!         self.base.set_data_context(model);
//!     }
//! }
//!
//! impl ConstructView for SettingsView {
//!     fn construct(cx: &ViewBuildContext<'_>) -> Result<Self, BoxError> {
//!         Ok(Self { base: ViewBase::element(cx, "settings") })
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use horizon_compose_core::{ContextId, ElementId, HostTree};
use parking_lot::Mutex;

use crate::error::BoxError;
use crate::model::{Disposable, ModelRef, TypeDescriptor};

/// Fully-qualified name of a view type, e.g. `app::views::SettingsView`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKind(Arc<str>);

impl ViewKind {
    /// Create a kind from a qualified name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The kind of a Rust view type.
    pub fn of<V: ?Sized>() -> Self {
        Self::from(&TypeDescriptor::of::<V>())
    }

    /// The qualified name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&TypeDescriptor> for ViewKind {
    fn from(descriptor: &TypeDescriptor) -> Self {
        Self::new(descriptor.qualified())
    }
}

impl From<&str> for ViewKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewKind({})", self.0)
    }
}

/// The presentation side of a view/view-model pair.
pub trait View: Send + Sync + 'static {
    /// The host element this view renders into.
    fn actual_element(&self) -> ElementId;

    /// The bound view-model.
    fn data_context(&self) -> Option<ModelRef>;

    /// Bind or unbind the view-model.
    fn set_data_context(&self, model: Option<ModelRef>);

    /// The disposal contract, if the view implements it.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

/// Shared handle to a view.
pub type ViewRef = Arc<dyn View>;

/// Everything a view constructor gets to work with.
#[derive(Clone, Copy)]
pub struct ViewBuildContext<'a> {
    /// The host tree to create elements in.
    pub host: &'a HostTree,
    /// The UI context that will own the view.
    pub context: ContextId,
    /// The kind being constructed.
    pub kind: &'a ViewKind,
}

impl<'a> ViewBuildContext<'a> {
    /// Create a build context.
    pub fn new(host: &'a HostTree, context: ContextId, kind: &'a ViewKind) -> Self {
        Self { host, context, kind }
    }
}

/// Views that can be built from a [`ViewBuildContext`] alone.
pub trait ConstructView: View + Sized {
    /// Build a new, unbound view.
    fn construct(cx: &ViewBuildContext<'_>) -> Result<Self, BoxError>;
}

/// Element handle plus data-context slot, for embedding in view types.
pub struct ViewBase {
    element: ElementId,
    data_context: Mutex<Option<ModelRef>>,
}

impl ViewBase {
    /// Wrap an existing element.
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            data_context: Mutex::new(None),
        }
    }

    /// Create a plain element for the view.
    pub fn element(cx: &ViewBuildContext<'_>, name: impl Into<String>) -> Self {
        Self::new(cx.host.create_element(cx.context, name))
    }

    /// Create a window-like root for the view.
    pub fn root(cx: &ViewBuildContext<'_>, name: impl Into<String>) -> Self {
        Self::new(cx.host.create_root(cx.context, name))
    }

    /// The element handle.
    pub fn element_id(&self) -> ElementId {
        self.element
    }

    /// The bound model.
    pub fn data_context(&self) -> Option<ModelRef> {
        self.data_context.lock().clone()
    }

    /// Replace the bound model.
    pub fn set_data_context(&self, model: Option<ModelRef>) {
        *self.data_context.lock() = model;
    }
}

impl fmt::Debug for ViewBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBase")
            .field("element", &self.element)
            .field("bound", &self.data_context.lock().is_some())
            .finish()
    }
}

/// A view with no behavior of its own.
///
/// Handy for hosting a model whose content is rendered elsewhere and in tests.
#[derive(Debug)]
pub struct ContentView {
    base: ViewBase,
}

impl ContentView {
    /// Wrap an existing element.
    pub fn new(element: ElementId) -> Self {
        Self {
            base: ViewBase::new(element),
        }
    }
}

impl View for ContentView {
    fn actual_element(&self) -> ElementId {
        self.base.element_id()
    }

    fn data_context(&self) -> Option<ModelRef> {
        self.base.data_context()
    }

    fn set_data_context(&self, model: Option<ModelRef>) {
        self.base.set_data_context(model);
    }
}

impl ConstructView for ContentView {
    fn construct(cx: &ViewBuildContext<'_>) -> Result<Self, BoxError> {
        Ok(Self {
            base: ViewBase::element(cx, cx.kind.as_str()),
        })
    }
}

static_assertions::assert_impl_all!(ViewBase: Send, Sync);
static_assertions::assert_impl_all!(ViewKind: Send, Sync);
