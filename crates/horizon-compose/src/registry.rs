//! The view registry.
//!
//! [`ViewRegistry`] is the authoritative set of live pairs. It keeps an
//! explicit bidirectional index, model identity to pair and host element to
//! model identity, so lookups in either direction never scan.
//!
//! Both indices are updated together under one lock. In debug builds the
//! registry can cross-check them after every mutation (see
//! [`ViewRegistry::verify_consistency`]).

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

use horizon_compose_core::{ElementId, HostTree};
use horizon_compose_core::logging::targets;
use parking_lot::Mutex;

use crate::error::{ComposeError, Result};
use crate::lifecycle::BoundPair;
use crate::model::{ModelId, ModelRef, model_label, same_model};

#[derive(Default)]
struct RegistryData {
    by_model: HashMap<ModelId, (u64, BoundPair)>,
    by_element: HashMap<ElementId, ModelId>,
    next_seq: u64,
}

/// The set of live (view, model) pairs.
pub struct ViewRegistry {
    inner: Mutex<RegistryData>,
    verify: bool,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ViewRegistry {
    /// Create an empty registry.
    ///
    /// With `verify` set, debug builds check index consistency after each
    /// mutation.
    pub fn new(verify: bool) -> Self {
        Self {
            inner: Mutex::new(RegistryData::default()),
            verify,
        }
    }

    /// Add a pair.
    ///
    /// Fails with [`ComposeError::DuplicateRegistration`] if the model already
    /// has a view, or the view is already bound to another model.
    pub fn register(&self, pair: BoundPair) -> Result<()> {
        let model = pair.model_id();
        let element = pair.element();
        {
            let mut data = self.inner.lock();
            if data.by_model.contains_key(&model) || data.by_element.contains_key(&element) {
                return Err(ComposeError::DuplicateRegistration {
                    model: model_label(pair.model()),
                });
            }
            let seq = data.next_seq;
            data.next_seq += 1;
            data.by_element.insert(element, model);
            data.by_model.insert(model, (seq, pair));
        }
        tracing::trace!(target: targets::REGISTRY, ?model, ?element, "pair registered");
        self.check();
        Ok(())
    }

    /// Remove the pair whose view renders into `element`. Idempotent.
    pub fn unregister(&self, element: ElementId) -> Option<BoundPair> {
        let removed = {
            let mut data = self.inner.lock();
            let model = data.by_element.remove(&element)?;
            data.by_model.remove(&model).map(|(_, pair)| pair)
        };
        tracing::trace!(target: targets::REGISTRY, ?element, "pair unregistered");
        self.check();
        removed
    }

    /// Remove the pair of a model. Idempotent.
    pub fn unregister_model(&self, model: ModelId) -> Option<BoundPair> {
        let removed = {
            let mut data = self.inner.lock();
            let (_, pair) = data.by_model.remove(&model)?;
            data.by_element.remove(&pair.element());
            pair
        };
        tracing::trace!(target: targets::REGISTRY, ?model, "pair unregistered");
        self.check();
        Some(removed)
    }

    /// The pair of a model, if it has a live view.
    pub fn get(&self, model: ModelId) -> Option<BoundPair> {
        self.inner.lock().by_model.get(&model).map(|(_, pair)| pair.clone())
    }

    /// Look up the pair of a model.
    ///
    /// With `ensure` set, a missing pair is an [`ComposeError::UnboundModel`]
    /// error instead of `None`.
    pub fn find_by_model(&self, model: &ModelRef, ensure: bool) -> Result<Option<BoundPair>> {
        match self.get(ModelId::of(model)) {
            Some(pair) => Ok(Some(pair)),
            None if ensure => Err(ComposeError::UnboundModel {
                model: model_label(model),
            }),
            None => Ok(None),
        }
    }

    /// The pair whose view renders into `element`.
    pub fn find_by_element(&self, element: ElementId) -> Option<BoundPair> {
        let data = self.inner.lock();
        let model = data.by_element.get(&element)?;
        data.by_model.get(model).map(|(_, pair)| pair.clone())
    }

    /// Whether a view renders into `element`.
    pub fn contains_element(&self, element: ElementId) -> bool {
        self.inner.lock().by_element.contains_key(&element)
    }

    /// Pairs whose owning root, as computed by `owner_of`, is `root`.
    pub fn query_by_owner(
        &self,
        root: ElementId,
        mut owner_of: impl FnMut(ElementId) -> Option<ElementId>,
    ) -> Vec<BoundPair> {
        self.entries()
            .into_iter()
            .filter(|pair| owner_of(pair.element()) == Some(root))
            .collect()
    }

    /// All pairs, in registration order.
    pub fn entries(&self) -> Vec<BoundPair> {
        let data = self.inner.lock();
        let mut entries: Vec<_> = data.by_model.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, pair)| pair.clone()).collect()
    }

    /// Number of live pairs.
    pub fn len(&self) -> usize {
        self.inner.lock().by_model.len()
    }

    /// Whether no pairs are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().by_model.is_empty()
    }

    /// Cross-check both indices and each view's data context.
    pub fn verify_consistency(&self) -> std::result::Result<(), String> {
        let data = self.inner.lock();
        if data.by_model.len() != data.by_element.len() {
            return Err(format!(
                "index sizes differ: {} models, {} elements",
                data.by_model.len(),
                data.by_element.len()
            ));
        }
        for (model, (_, pair)) in &data.by_model {
            let element = pair.element();
            if data.by_element.get(&element) != Some(model) {
                return Err(format!("element {element:?} does not map back to {model:?}"));
            }
            match pair.view().data_context() {
                Some(bound) if same_model(&bound, pair.model()) => {}
                Some(_) => return Err(format!("view {element:?} is bound to a different model")),
                None => return Err(format!("view {element:?} has no data context")),
            }
        }
        Ok(())
    }

    fn check(&self) {
        if !(cfg!(debug_assertions) && self.verify) {
            return;
        }
        if let Err(problem) = self.verify_consistency() {
            tracing::error!(target: targets::REGISTRY, %problem, "registry inconsistent");
        }
    }
}

impl std::fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRegistry").field("entries", &self.entries()).finish()
    }
}

/// Renders the registry grouped by owning root.
pub struct RegistryDump<'a> {
    registry: &'a ViewRegistry,
    host: &'a HostTree,
}

impl<'a> RegistryDump<'a> {
    /// Create a dump of `registry`, naming elements from `host`.
    pub fn new(registry: &'a ViewRegistry, host: &'a HostTree) -> Self {
        Self { registry, host }
    }

    /// Render with `owner_of` computing each view's owning root.
    pub fn render(&self, mut owner_of: impl FnMut(ElementId) -> Option<ElementId>) -> String {
        let entries = self.registry.entries();
        let mut groups: Vec<(Option<ElementId>, Vec<BoundPair>)> = Vec::new();
        for pair in entries {
            let owner = owner_of(pair.element());
            match groups.iter_mut().find(|(o, _)| *o == owner) {
                Some((_, pairs)) => pairs.push(pair),
                None => groups.push((owner, vec![pair])),
            }
        }

        let mut output = String::new();
        let _ = writeln!(output, "View Registry ({} pairs):", self.registry.len());
        if groups.is_empty() {
            let _ = writeln!(output, "  (empty)");
        }
        for (owner, pairs) in groups {
            match owner {
                Some(root) => {
                    let name = self.host.name(root).unwrap_or_else(|_| "(removed)".to_string());
                    let _ = writeln!(output, "{name} [{root:?}]");
                }
                None => {
                    let _ = writeln!(output, "(rootless)");
                }
            }
            for pair in pairs {
                let state = pair.lifecycle_state();
                let _ = writeln!(
                    output,
                    "  {} -> {:?} ({:?}/{:?}{})",
                    model_label(pair.model()),
                    pair.element(),
                    state.init,
                    state.load,
                    if state.is_transient() { ", busy" } else { "" }
                );
            }
        }
        output
    }
}

static_assertions::assert_impl_all!(ViewRegistry: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleCoordinator;
    use crate::model::ViewModel;
    use crate::view::{ContentView, View, ViewRef};
    use horizon_compose_core::{ContextConfig, ContextId, UiContext};
    use std::sync::Arc;

    struct Model;
    impl ViewModel for Model {}

    struct Fixture {
        _ctx: UiContext,
        context: ContextId,
        host: HostTree,
        coordinator: LifecycleCoordinator,
        registry: ViewRegistry,
    }

    fn setup() -> Fixture {
        let ctx = UiContext::start(ContextConfig::default().with_thread_name("registry-test")).unwrap();
        Fixture {
            context: ctx.id(),
            _ctx: ctx,
            host: HostTree::new(),
            coordinator: LifecycleCoordinator::new(),
            registry: ViewRegistry::new(true),
        }
    }

    fn bind(fx: &Fixture, model: &ModelRef) -> BoundPair {
        let view: ViewRef = Arc::new(ContentView::new(fx.host.create_element(fx.context, "view")));
        view.set_data_context(Some(model.clone()));
        BoundPair::new(view, model.clone(), fx.context, fx.coordinator.new_pair_state(model))
    }

    #[test]
    fn test_register_and_find() {
        let fx = setup();
        let model: ModelRef = Arc::new(Model);
        let pair = bind(&fx, &model);
        let element = pair.element();

        fx.registry.register(pair).unwrap();
        let found = fx.registry.find_by_model(&model, true).unwrap().unwrap();
        assert_eq!(found.element(), element);
        assert!(fx.registry.contains_element(element));
        assert_eq!(fx.registry.find_by_element(element).unwrap().model_id(), ModelId::of(&model));
        assert!(fx.registry.verify_consistency().is_ok());
    }

    #[test]
    fn test_duplicate_registration() {
        let fx = setup();
        let model: ModelRef = Arc::new(Model);
        fx.registry.register(bind(&fx, &model)).unwrap();

        let err = fx.registry.register(bind(&fx, &model)).unwrap_err();
        assert!(matches!(err, ComposeError::DuplicateRegistration { .. }));
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let fx = setup();
        let model: ModelRef = Arc::new(Model);
        let pair = bind(&fx, &model);
        let element = pair.element();
        fx.registry.register(pair).unwrap();

        assert!(fx.registry.unregister(element).is_some());
        assert!(fx.registry.unregister(element).is_none());
        assert!(fx.registry.unregister_model(ModelId::of(&model)).is_none());
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn test_find_unbound() {
        let fx = setup();
        let model: ModelRef = Arc::new(Model);
        assert!(fx.registry.find_by_model(&model, false).unwrap().is_none());
        let err = fx.registry.find_by_model(&model, true).unwrap_err();
        assert!(matches!(err, ComposeError::UnboundModel { .. }));
    }

    #[test]
    fn test_query_by_owner() {
        let fx = setup();
        let root = fx.host.create_root(fx.context, "window");
        let a: ModelRef = Arc::new(Model);
        let b: ModelRef = Arc::new(Model);
        let pa = bind(&fx, &a);
        let pb = bind(&fx, &b);
        fx.host.attach(pa.element(), root).unwrap();
        let a_element = pa.element();
        fx.registry.register(pa).unwrap();
        fx.registry.register(pb).unwrap();

        let owned = fx.registry.query_by_owner(root, |e| fx.host.parent(e).ok().flatten());
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].element(), a_element);
    }

    #[test]
    fn test_inconsistent_data_context_detected() {
        let fx = setup();
        let model: ModelRef = Arc::new(Model);
        let pair = bind(&fx, &model);
        let view = pair.view().clone();
        fx.registry.register(pair).unwrap();

        view.set_data_context(None);
        assert!(fx.registry.verify_consistency().is_err());
    }

    #[test]
    fn test_dump_groups_by_owner() {
        let fx = setup();
        let root = fx.host.create_root(fx.context, "main-window");
        let model: ModelRef = Arc::new(Model);
        let pair = bind(&fx, &model);
        fx.host.attach(pair.element(), root).unwrap();
        fx.registry.register(pair).unwrap();
        let other: ModelRef = Arc::new(Model);
        fx.registry.register(bind(&fx, &other)).unwrap();

        let dump = RegistryDump::new(&fx.registry, &fx.host).render(|e| fx.host.parent(e).ok().flatten());
        assert!(dump.starts_with("View Registry (2 pairs):"));
        assert!(dump.contains("main-window"));
        assert!(dump.contains("(rootless)"));
    }
}
