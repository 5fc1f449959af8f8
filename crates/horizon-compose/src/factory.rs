//! View construction.
//!
//! [`ViewCatalog`] is the set of view types the application knows about. It
//! answers two questions:
//!
//! - for the resolver, whether a candidate kind exists and implements the view
//!   contract ([`ViewCatalog::lookup`]);
//! - for the manager, how to build one ([`ViewFactory::create`]).
//!
//! The catalog is the default factory. A different construction strategy
//! (a DI container, a designer preview) can be plugged in by implementing
//! [`ViewFactory`] and passing it to the manager builder.

use std::collections::HashMap;
use std::sync::Arc;

use horizon_compose_core::logging::targets;
use parking_lot::RwLock;

use crate::error::BoxError;
use crate::view::{ConstructView, ViewBuildContext, ViewKind, ViewRef};

/// Builds views for resolved kinds.
pub trait ViewFactory: Send + Sync {
    /// Construct a new, unbound view of the given kind.
    fn create(&self, kind: &ViewKind, cx: &ViewBuildContext<'_>) -> Result<ViewRef, BoxError>;
}

type Constructor = Arc<dyn Fn(&ViewBuildContext<'_>) -> Result<ViewRef, BoxError> + Send + Sync>;

enum CatalogEntry {
    View(Constructor),
    Plain,
}

/// What the catalog knows about a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conformance {
    /// The kind is a constructible view.
    View,
    /// The kind names a known type that is not a view.
    NotAView,
}

/// Registry of known view types and their constructors.
#[derive(Default)]
pub struct ViewCatalog {
    entries: RwLock<HashMap<ViewKind, CatalogEntry>>,
}

impl ViewCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view type under its own kind name.
    pub fn register<V: ConstructView>(&self) -> ViewKind {
        let kind = ViewKind::of::<V>();
        self.register_with(kind.clone(), |cx| {
            let view: ViewRef = Arc::new(V::construct(cx)?);
            Ok(view)
        });
        kind
    }

    /// Register a constructor under an explicit kind.
    ///
    /// Returns `false` and keeps the existing entry if the kind is already
    /// registered.
    pub fn register_with<F>(&self, kind: ViewKind, constructor: F) -> bool
    where
        F: Fn(&ViewBuildContext<'_>) -> Result<ViewRef, BoxError> + Send + Sync + 'static,
    {
        self.insert(kind, CatalogEntry::View(Arc::new(constructor)))
    }

    /// Record a type that exists under `kind` but is not a view.
    ///
    /// Resolving a model to such a kind fails instead of reporting that no
    /// candidate exists.
    pub fn register_plain_type(&self, kind: ViewKind) -> bool {
        self.insert(kind, CatalogEntry::Plain)
    }

    fn insert(&self, kind: ViewKind, entry: CatalogEntry) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&kind) {
            tracing::debug!(target: targets::RESOLVER, %kind, "catalog entry already present, keeping it");
            return false;
        }
        tracing::trace!(target: targets::RESOLVER, %kind, "catalog entry added");
        entries.insert(kind, entry);
        true
    }

    /// Look up a kind.
    pub fn lookup(&self, kind: &ViewKind) -> Option<Conformance> {
        self.entries.read().get(kind).map(|entry| match entry {
            CatalogEntry::View(_) => Conformance::View,
            CatalogEntry::Plain => Conformance::NotAView,
        })
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ViewFactory for ViewCatalog {
    fn create(&self, kind: &ViewKind, cx: &ViewBuildContext<'_>) -> Result<ViewRef, BoxError> {
        // Clone the constructor so user code never runs under the catalog lock.
        let constructor = match self.entries.read().get(kind) {
            Some(CatalogEntry::View(constructor)) => constructor.clone(),
            Some(CatalogEntry::Plain) => return Err(format!("'{kind}' is not a view").into()),
            None => return Err(format!("no constructor registered for '{kind}'").into()),
        };
        constructor(cx)
    }
}

impl std::fmt::Debug for ViewCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.entries.read().keys().cloned().collect();
        kinds.sort();
        f.debug_struct("ViewCatalog").field("kinds", &kinds).finish()
    }
}

static_assertions::assert_impl_all!(ViewCatalog: Send, Sync);
