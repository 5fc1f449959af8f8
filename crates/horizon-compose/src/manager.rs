//! The lifecycle manager facade.
//!
//! [`LifecycleManager`] ties the pieces together: it resolves and builds
//! views, keeps the registry, drives lifecycle hooks, tracks ownership for
//! cascade teardown and runs modal dialogs. Every operation is marshaled
//! through the [`Gateway`] onto the UI context that owns the view involved,
//! so the manager can be called from any thread.
//!
//! The manager subscribes to the host tree on construction:
//!
//! | host signal | reaction |
//! |---|---|
//! | `became_live` | activate registered and parked keep-alive pairs in the subtree |
//! | `detached` | unregister and tear down pairs in the subtree |
//! | `closed` | unregister and tear down pairs owned by the root |
//!
//! Reactions are posted to the element's context; [`LifecycleManager::settle`]
//! waits for them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use horizon_compose::{ContentView, LifecycleManager, ModelRef, ModelType, ViewModel};
//!
//! struct AboutViewModel;
//! impl ViewModel for AboutViewModel {}
//!
//! # async fn demo() -> horizon_compose::Result<()> {
//! let manager = LifecycleManager::builder().build()?;
//! let kind = manager.register_view_type::<ContentView>();
//! manager.register_mapping(ModelType::of::<AboutViewModel>(), kind)?;
//!
//! let about: ModelRef = Arc::new(AboutViewModel);
//! let view = manager.show(&about, None).await?;
//! manager.close(&about).await?;
//! # let _ = view;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};

use horizon_compose_core::{
    ConnectionId, ContextConfig, ContextId, ElementId, ElementKind, Gateway, HostError, HostTree, HostTreeDebug,
    PerfSpan, compose_debug, logging::targets,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::config::ManagerConfig;
use crate::error::{ComposeError, Result};
use crate::factory::{ViewCatalog, ViewFactory};
use crate::lifecycle::{BoundPair, LifecycleCoordinator, LifecycleState};
use crate::modal::{DialogPresenter, DialogResult, ModalPresenter, ModalRequest, ModalScope, ModalSlot};
use crate::model::{ModelId, ModelRef, ModelType, model_label};
use crate::ownership::OwnershipTracker;
use crate::registry::{RegistryDump, ViewRegistry};
use crate::resolver::{NamingConvention, ViewResolver};
use crate::view::{ConstructView, ViewBuildContext, ViewKind, ViewRef};

/// Builder for a [`LifecycleManager`].
#[derive(Default)]
pub struct LifecycleManagerBuilder {
    config: ManagerConfig,
    gateway: Option<Arc<Gateway>>,
    host: Option<Arc<HostTree>>,
    catalog: Option<Arc<ViewCatalog>>,
    factory: Option<Arc<dyn ViewFactory>>,
    presenter: Option<Arc<dyn ModalPresenter>>,
    shell: Option<ElementId>,
}

impl LifecycleManagerBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a configuration.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing gateway instead of starting a primary context.
    pub fn with_gateway(mut self, gateway: Arc<Gateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Use an existing host tree.
    pub fn with_host(mut self, host: Arc<HostTree>) -> Self {
        self.host = Some(host);
        self
    }

    /// Use an existing view catalog.
    pub fn with_catalog(mut self, catalog: Arc<ViewCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Build views with a custom factory instead of the catalog.
    pub fn with_factory(mut self, factory: Arc<dyn ViewFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Present modal dialogs with a custom presenter.
    pub fn with_presenter(mut self, presenter: Arc<dyn ModalPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Use an existing root as the shell.
    pub fn with_shell(mut self, shell: ElementId) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Build the manager and connect it to the host tree.
    pub fn build(self) -> Result<LifecycleManager> {
        let config = self.config;
        config.validate()?;

        let gateway = match self.gateway {
            Some(gateway) => gateway,
            None => Arc::new(Gateway::new(
                ContextConfig::default().with_thread_name(config.context_thread_name.clone()),
            )?),
        };
        let host = self.host.unwrap_or_default();
        let catalog = self.catalog.unwrap_or_default();
        let factory: Arc<dyn ViewFactory> = match self.factory {
            Some(factory) => factory,
            None => catalog.clone() as Arc<dyn ViewFactory>,
        };

        let shell = match self.shell {
            Some(shell) => {
                if host.kind(shell)? != ElementKind::Root {
                    return Err(HostError::NotARoot(shell).into());
                }
                shell
            }
            None => {
                let shell = host.create_root(gateway.primary(), config.shell_name.clone());
                host.show_root(shell)?;
                shell
            }
        };

        let inner = Arc::new(ManagerInner {
            resolver: ViewResolver::new(NamingConvention::from_config(&config)),
            registry: ViewRegistry::new(config.verify_registry),
            ownership: OwnershipTracker::new(host.clone()),
            coordinator: LifecycleCoordinator::new(),
            modal: Arc::new(ModalSlot::new()),
            presenter: self.presenter.unwrap_or_else(|| Arc::new(DialogPresenter)),
            pending_dialogs: Mutex::new(HashMap::new()),
            connections: Mutex::new(Vec::new()),
            config,
            gateway,
            host,
            catalog,
            factory,
            shell,
        });
        ManagerInner::connect(&inner);

        compose_debug!(?shell, "lifecycle manager started");
        Ok(LifecycleManager { inner })
    }
}

#[derive(Clone, Copy)]
enum HostSignal {
    BecameLive,
    Detached,
    Closed,
}

struct ManagerInner {
    config: ManagerConfig,
    gateway: Arc<Gateway>,
    host: Arc<HostTree>,
    catalog: Arc<ViewCatalog>,
    factory: Arc<dyn ViewFactory>,
    resolver: ViewResolver,
    registry: ViewRegistry,
    ownership: OwnershipTracker,
    coordinator: LifecycleCoordinator,
    modal: Arc<ModalSlot>,
    presenter: Arc<dyn ModalPresenter>,
    pending_dialogs: Mutex<HashMap<ModelId, oneshot::Sender<DialogResult>>>,
    shell: ElementId,
    connections: Mutex<Vec<(HostSignal, ConnectionId)>>,
}

impl ManagerInner {
    fn connect(this: &Arc<Self>) {
        let weak = Arc::downgrade(this);
        let became_live = this.host.became_live().connect(move |&element| {
            post_notification(&weak, element, "became_live", |inner, element| async move {
                inner.became_live_local(element).await
            });
        });

        let weak = Arc::downgrade(this);
        let detached = this.host.detached().connect(move |&element| {
            post_notification(&weak, element, "detached", |inner, element| async move {
                inner.detached_local(element).await
            });
        });

        let weak = Arc::downgrade(this);
        let closed = this.host.closed().connect(move |&root| {
            post_notification(&weak, root, "closed", |inner, root| async move {
                let roots = [root];
                inner.root_closed_local(&roots).await
            });
        });

        this.connections.lock().extend([
            (HostSignal::BecameLive, became_live),
            (HostSignal::Detached, detached),
            (HostSignal::Closed, closed),
        ]);
    }

    fn assert_on(&self, context: ContextId) {
        if let Ok(ctx) = self.gateway.context(context) {
            ctx.affinity()
                .debug_assert_same_thread_with_msg("view registry mutated outside the UI context that owns the view");
        }
    }

    fn owner_of(&self, element: ElementId) -> Option<ElementId> {
        self.ownership.owning_root(element).ok().flatten()
    }

    fn bound_pair(&self, model: &ModelRef) -> Result<BoundPair> {
        self.registry.get(ModelId::of(model)).ok_or_else(|| ComposeError::UnboundModel {
            model: model_label(model),
        })
    }

    /// The root `close`, `minimize` and `activate` act on.
    fn closable_root(&self, pair: &BoundPair) -> Result<ElementId> {
        match self.ownership.owning_root(pair.element())? {
            Some(root) => Ok(root),
            None => Err(ComposeError::NonClosableRoot {
                model: model_label(pair.model()),
            }),
        }
    }

    /// Owner for a new top-level view: the explicit owner's root, else the
    /// active modal's root, else the shell.
    fn resolve_owner(&self, owner: Option<&ModelRef>) -> Result<ElementId> {
        if let Some(owner) = owner {
            let pair = self.bound_pair(owner)?;
            return Ok(self.owner_of(pair.element()).unwrap_or(self.shell));
        }
        let from_modal = self
            .modal
            .current()
            .and_then(|modal| self.registry.get(ModelId::of(&modal)))
            .and_then(|pair| self.owner_of(pair.element()));
        Ok(from_modal.unwrap_or(self.shell))
    }

    /// Resolve, construct, bind and register a view for `model`.
    fn materialize(&self, model: &ModelRef, alias: Option<&str>, context: ContextId) -> Result<BoundPair> {
        let _perf = PerfSpan::new("materialize");
        self.assert_on(context);
        let id = ModelId::of(model);
        if self.coordinator.discard_dormant_model(id).is_some() {
            tracing::debug!(target: targets::LIFECYCLE, model = %model_label(model), "dropped parked view for a fresh one");
        }

        let kind = self.resolver.resolve(model, alias, &self.catalog)?;
        let view = self
            .factory
            .create(&kind, &ViewBuildContext::new(&self.host, context, &kind))
            .map_err(|source| ComposeError::ViewConstructionFailed {
                kind: kind.clone(),
                source,
            })?;

        let context = self.host.context(view.actual_element()).unwrap_or(context);
        view.set_data_context(Some(model.clone()));
        let pair = BoundPair::new(view, model.clone(), context, self.coordinator.new_pair_state(model));
        if let Err(err) = self.registry.register(pair.clone()) {
            pair.view().set_data_context(None);
            return Err(err);
        }
        tracing::debug!(
            target: targets::REGISTRY,
            model = %model_label(model),
            %kind,
            owner = ?self.owner_of(pair.element()),
            "view materialized"
        );
        Ok(pair)
    }

    /// Put a pair's view into a root owned by `owner`, creating the root if the
    /// view is not one itself.
    fn present_root(&self, pair: &BoundPair, owner: ElementId) -> Result<ElementId> {
        let element = pair.element();
        let root = if self.host.kind(element)? == ElementKind::Root {
            element
        } else {
            let name = format!("{}-root", self.host.name(element)?);
            let root = self.host.create_root(pair.context(), name);
            self.host.attach(element, root)?;
            root
        };
        self.host.set_owner(root, Some(owner))?;
        Ok(root)
    }

    async fn activate(self: &Arc<Self>, pair: BoundPair) -> Result<()> {
        let inner = self.clone();
        self.gateway
            .run_on(pair.context(), move || async move { inner.coordinator.activate(&pair).await })
            .await?
    }

    async fn activate_attached(self: &Arc<Self>, pair: BoundPair) -> Result<()> {
        let inner = self.clone();
        self.gateway
            .run_on(pair.context(), move || async move { inner.coordinator.activate_attached(&pair).await })
            .await?
    }

    /// Tear down pairs that have already left the registry.
    async fn teardown(self: &Arc<Self>, pairs: Vec<BoundPair>) {
        {
            let mut pending = self.pending_dialogs.lock();
            for pair in &pairs {
                pending.remove(&pair.model_id());
            }
        }
        for pair in pairs {
            let inner = self.clone();
            let context = pair.context();
            let result = self
                .gateway
                .run_on(context, move || async move { inner.coordinator.deactivate(&pair).await })
                .await;
            if let Err(err) = result {
                tracing::warn!(target: targets::LIFECYCLE, %err, "teardown could not run on its context");
            }
        }
    }

    /// Unregister everything owned by `roots` before the first await, so a
    /// concurrent pass over the same roots finds nothing left to do.
    fn take_owned_pairs(&self, roots: &[ElementId]) -> Vec<BoundPair> {
        let mut taken = Vec::new();
        for &root in roots {
            for pair in self.registry.query_by_owner(root, |element| self.owner_of(element)) {
                if let Some(pair) = self.registry.unregister_model(pair.model_id()) {
                    taken.push(pair);
                }
            }
        }
        let discarded = self
            .coordinator
            .discard_dormant_where(|element| self.owner_of(element).is_some_and(|owner| roots.contains(&owner)));
        if discarded > 0 {
            tracing::debug!(target: targets::LIFECYCLE, discarded, "dropped parked views of closed roots");
        }
        taken
    }

    async fn became_live_local(self: &Arc<Self>, element: ElementId) -> Result<()> {
        self.assert_on(self.host.context(element)?);
        let mut pairs = Vec::new();
        for id in self.host.subtree(element)? {
            if !self.host.is_live(id) {
                continue;
            }
            if let Some(pair) = self.registry.find_by_element(id) {
                pairs.push(pair);
            } else if let Some(pair) = self.coordinator.take_dormant(id) {
                match self.registry.register(pair.clone()) {
                    Ok(()) => {
                        tracing::debug!(target: targets::LIFECYCLE, model = %model_label(pair.model()), "reusing kept-alive view");
                        pairs.push(pair);
                    }
                    Err(err) => {
                        tracing::warn!(target: targets::LIFECYCLE, %err, "kept-alive view could not be reused");
                        pair.view().set_data_context(None);
                    }
                }
            }
        }

        let mut first_error = None;
        for pair in pairs {
            if let Err(err) = self.activate_attached(pair).await {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn detached_local(self: &Arc<Self>, element: ElementId) -> Result<()> {
        self.assert_on(self.host.context(element)?);
        let mut pairs = Vec::new();
        for id in self.host.subtree(element)? {
            if self.host.is_live(id) {
                continue;
            }
            if let Some(pair) = self.registry.unregister(id) {
                pairs.push(pair);
            }
        }
        self.teardown(pairs).await;
        Ok(())
    }

    async fn root_closed_local(self: &Arc<Self>, roots: &[ElementId]) -> Result<()> {
        let pairs = self.take_owned_pairs(roots);
        tracing::debug!(target: targets::LIFECYCLE, ?roots, count = pairs.len(), "cascade teardown");
        self.teardown(pairs).await;
        Ok(())
    }

    async fn close_root_local(self: &Arc<Self>, root: ElementId) -> Result<()> {
        let closed = self.host.close_root(root)?;
        // Already closed by the host: its notification may still be queued.
        let roots = if closed.is_empty() { vec![root] } else { closed };
        self.root_closed_local(&roots).await
    }

    async fn show_local(self: &Arc<Self>, model: ModelRef, owner: ElementId, context: ContextId) -> Result<ViewRef> {
        let pair = self.materialize(&model, None, context)?;
        let root = match self.present_root(&pair, owner) {
            Ok(root) => root,
            Err(err) => {
                self.discard(&pair).await;
                return Err(err);
            }
        };
        self.host.show_root(root)?;
        self.activate(pair.clone()).await?;
        Ok(pair.view().clone())
    }

    async fn show_modal_local(
        self: &Arc<Self>,
        model: ModelRef,
        owner: ElementId,
        context: ContextId,
    ) -> Result<Option<DialogResult>> {
        let _scope = ModalScope::enter(self.modal.clone(), self.host.clone(), self.shell, model.clone());
        let id = ModelId::of(&model);

        let pair = self.materialize(&model, None, context)?;
        let root = match self.present_root(&pair, owner) {
            Ok(root) => root,
            Err(err) => {
                self.discard(&pair).await;
                return Err(err);
            }
        };

        let (tx, rx) = oneshot::channel();
        self.pending_dialogs.lock().insert(id, tx);

        let shown = match self.host.show_root(root) {
            Ok(()) => self.activate(pair.clone()).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = shown {
            self.finish_dialog(id, root).await;
            return Err(err);
        }

        let request = ModalRequest::new(model.clone(), pair.view().clone(), root, owner, rx);
        let outcome = self.presenter.present(request).await;
        self.finish_dialog(id, root).await;
        outcome.map_err(ComposeError::Presenter)
    }

    async fn finish_dialog(self: &Arc<Self>, id: ModelId, root: ElementId) {
        self.pending_dialogs.lock().remove(&id);
        if let Err(err) = self.close_root_local(root).await {
            tracing::warn!(target: targets::MODAL, %err, "closing dialog root failed");
        }
    }

    async fn discard(self: &Arc<Self>, pair: &BoundPair) {
        if let Some(pair) = self.registry.unregister_model(pair.model_id()) {
            self.teardown(vec![pair]).await;
        }
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        for (signal, id) in self.connections.lock().drain(..) {
            match signal {
                HostSignal::BecameLive => self.host.became_live().disconnect(id),
                HostSignal::Detached => self.host.detached().disconnect(id),
                HostSignal::Closed => self.host.closed().disconnect(id),
            };
        }
    }
}

/// Post a host notification to the context that owns `element`.
fn post_notification<F, Fut>(weak: &Weak<ManagerInner>, element: ElementId, signal: &'static str, handler: F)
where
    F: FnOnce(Arc<ManagerInner>, ElementId) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let context = match inner.host.context(element) {
        Ok(context) => context,
        Err(err) => {
            tracing::warn!(target: targets::LIFECYCLE, signal, %err, "host notification for unknown element");
            return;
        }
    };
    let work = handler(inner.clone(), element);
    let posted = inner.gateway.post(context, async move {
        if let Err(err) = work.await {
            tracing::warn!(target: targets::LIFECYCLE, signal, %err, "host notification failed");
        }
    });
    if let Err(err) = posted {
        tracing::warn!(target: targets::LIFECYCLE, signal, %err, "host notification could not be posted");
    }
}

/// Binds views to view-models and drives their lifecycle.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct LifecycleManager {
    inner: Arc<ManagerInner>,
}

impl LifecycleManager {
    /// Start building a manager.
    pub fn builder() -> LifecycleManagerBuilder {
        LifecycleManagerBuilder::new()
    }

    /// Build a manager with the default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The configuration in use.
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// The gateway owning the UI contexts.
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.inner.gateway
    }

    /// The host tree.
    pub fn host(&self) -> &Arc<HostTree> {
        &self.inner.host
    }

    /// The view catalog used for resolution.
    pub fn catalog(&self) -> &Arc<ViewCatalog> {
        &self.inner.catalog
    }

    /// The view resolver.
    pub fn resolver(&self) -> &ViewResolver {
        &self.inner.resolver
    }

    /// The live pairs.
    pub fn registry(&self) -> &ViewRegistry {
        &self.inner.registry
    }

    /// The shell root, owner of last resort.
    pub fn shell(&self) -> ElementId {
        self.inner.shell
    }

    /// The model of the active modal dialog.
    pub fn modal_model(&self) -> Option<ModelRef> {
        self.inner.modal.current()
    }

    // =========================================================================
    // Resolution tables
    // =========================================================================

    /// Register a view type with the catalog under its own kind.
    pub fn register_view_type<V: ConstructView>(&self) -> ViewKind {
        self.inner.catalog.register::<V>()
    }

    /// Map a model type to a view kind.
    pub fn register_mapping(&self, model_type: ModelType, kind: ViewKind) -> Result<()> {
        self.inner.resolver.register_mapping(model_type, kind)
    }

    /// Register an alias for a view kind.
    pub fn register_alias(&self, alias: impl Into<String>, kind: ViewKind) -> Result<()> {
        self.inner.resolver.register_alias(alias, kind)
    }

    // =========================================================================
    // Showing and registration
    // =========================================================================

    /// Return the live view of `model`, creating and registering one if needed.
    ///
    /// A new view is not attached anywhere; it activates once the host makes
    /// it live. For an existing live view whose activation failed, activation
    /// is retried; one that is still activating is
    /// [`ComposeError::ActivationInProgress`].
    #[tracing::instrument(skip(self, model), target = "horizon_compose::lifecycle", level = "debug")]
    pub async fn resolve_and_register(&self, model: &ModelRef, alias: Option<&str>) -> Result<ViewRef> {
        if let Some(pair) = self.inner.registry.get(ModelId::of(model)) {
            if self.inner.host.is_live(pair.element()) {
                self.inner.activate(pair.clone()).await?;
            }
            return Ok(pair.view().clone());
        }

        let inner = self.inner.clone();
        let model = model.clone();
        let alias = alias.map(str::to_owned);
        let context = inner.gateway.primary();
        self.inner
            .gateway
            .run_on(context, move || async move {
                let pair = inner.materialize(&model, alias.as_deref(), context)?;
                Ok(pair.view().clone())
            })
            .await?
    }

    /// Register an existing view for `model`, activating it if already live.
    #[tracing::instrument(skip(self, view, model), target = "horizon_compose::lifecycle", level = "debug")]
    pub async fn register_view(&self, view: ViewRef, model: &ModelRef) -> Result<()> {
        let element = view.actual_element();
        let context = self.inner.host.context(element)?;
        let inner = self.inner.clone();
        let model = model.clone();
        self.inner
            .gateway
            .run_on(context, move || async move {
                inner.assert_on(context);
                if inner.registry.get(ModelId::of(&model)).is_some() || inner.registry.contains_element(element) {
                    return Err(ComposeError::DuplicateRegistration {
                        model: model_label(&model),
                    });
                }

                let pair = match inner.coordinator.take_dormant(element) {
                    Some(parked) if parked.model_id() == ModelId::of(&model) => parked,
                    parked => {
                        if let Some(parked) = parked {
                            parked.view().set_data_context(None);
                        }
                        inner.coordinator.discard_dormant_model(ModelId::of(&model));
                        view.set_data_context(Some(model.clone()));
                        BoundPair::new(view, model.clone(), context, inner.coordinator.new_pair_state(&model))
                    }
                };
                if let Err(err) = inner.registry.register(pair.clone()) {
                    pair.view().set_data_context(None);
                    return Err(err);
                }

                if inner.host.is_live(element) {
                    inner.coordinator.activate(&pair).await?;
                }
                Ok(())
            })
            .await?
    }

    /// Unregister a view and tear its pair down. Idempotent.
    #[tracing::instrument(skip(self, view), target = "horizon_compose::lifecycle", level = "debug")]
    pub async fn unregister_view(&self, view: &ViewRef) -> Result<()> {
        let element = view.actual_element();
        let context = self.inner.host.context(element)?;
        let inner = self.inner.clone();
        self.inner
            .gateway
            .run_on(context, move || async move {
                inner.assert_on(context);
                if let Some(pair) = inner.registry.unregister(element) {
                    inner.teardown(vec![pair]).await;
                }
            })
            .await?;
        Ok(())
    }

    /// Show `model` in a new root owned by `owner`'s root (or the active
    /// modal's, or the shell).
    ///
    /// Showing a model that already has a live view is a
    /// [`ComposeError::DuplicateRegistration`]; use [`activate`](Self::activate)
    /// to bring it to the front.
    #[tracing::instrument(skip(self, model, owner), target = "horizon_compose::lifecycle", level = "debug")]
    pub async fn show(&self, model: &ModelRef, owner: Option<&ModelRef>) -> Result<ViewRef> {
        if self.inner.registry.get(ModelId::of(model)).is_some() {
            return Err(ComposeError::DuplicateRegistration {
                model: model_label(model),
            });
        }

        let owner = self.inner.resolve_owner(owner)?;
        let context = self.inner.host.context(owner)?;
        let inner = self.inner.clone();
        let model = model.clone();
        self.inner
            .gateway
            .run_on(context, move || async move { inner.show_local(model, owner, context).await })
            .await?
    }

    /// Show `model` as a modal dialog and wait for its result.
    ///
    /// The owner is `owner`'s root, else the active modal's root, else the
    /// shell. Shell input is disabled for the duration and the modal slot
    /// holds `model`; both are restored on every exit path. Resolves to the
    /// value given to [`set_dialog_result`](Self::set_dialog_result), or
    /// `None` if the dialog was closed without one.
    #[tracing::instrument(skip(self, model, owner), target = "horizon_compose::modal", level = "debug")]
    pub async fn push_and_show(&self, model: &ModelRef, owner: Option<&ModelRef>) -> Result<Option<DialogResult>> {
        if self.inner.registry.get(ModelId::of(model)).is_some() {
            return Err(ComposeError::DuplicateRegistration {
                model: model_label(model),
            });
        }
        let owner = self.inner.resolve_owner(owner)?;
        let context = self.inner.host.context(owner)?;
        let inner = self.inner.clone();
        let model = model.clone();
        self.inner
            .gateway
            .run_on(context, move || async move { inner.show_modal_local(model, owner, context).await })
            .await?
    }

    /// Complete the modal show of `model` with `result`.
    pub fn set_dialog_result(&self, model: &ModelRef, result: DialogResult) -> Result<()> {
        let sender = self
            .inner
            .pending_dialogs
            .lock()
            .remove(&ModelId::of(model))
            .ok_or_else(|| ComposeError::InvalidModalTransition {
                model: model_label(model),
            })?;
        tracing::debug!(target: targets::MODAL, model = %model_label(model), ?result, "dialog result set");
        // The presenter may already have given up waiting.
        let _ = sender.send(result);
        Ok(())
    }

    // =========================================================================
    // Window operations
    // =========================================================================

    /// Close the root that owns `model`'s view, tearing down everything it owns.
    ///
    /// Closing a model without a live view does nothing.
    #[tracing::instrument(skip(self, model), target = "horizon_compose::lifecycle", level = "debug")]
    pub async fn close(&self, model: &ModelRef) -> Result<()> {
        let Some(pair) = self.inner.registry.get(ModelId::of(model)) else {
            tracing::trace!(target: targets::LIFECYCLE, model = %model_label(model), "close of unbound model ignored");
            return Ok(());
        };
        let root = self.inner.closable_root(&pair)?;
        let context = self.inner.host.context(root)?;
        let inner = self.inner.clone();
        self.inner
            .gateway
            .run_on(context, move || async move { inner.close_root_local(root).await })
            .await?
    }

    /// Minimize the root that owns `model`'s view.
    pub async fn minimize(&self, model: &ModelRef) -> Result<()> {
        let pair = self.inner.bound_pair(model)?;
        let root = self.inner.closable_root(&pair)?;
        let host = self.inner.host.clone();
        let context = host.context(root)?;
        self.inner.gateway.run_on(context, move || async move { host.minimize(root) }).await??;
        Ok(())
    }

    /// Restore and activate the root that owns `model`'s view.
    pub async fn activate(&self, model: &ModelRef) -> Result<()> {
        let pair = self.inner.bound_pair(model)?;
        let root = self.inner.closable_root(&pair)?;
        let host = self.inner.host.clone();
        let context = host.context(root)?;
        self.inner.gateway.run_on(context, move || async move { host.activate(root) }).await??;
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The live view of `model`.
    ///
    /// With `ensure` set, a missing view is an [`ComposeError::UnboundModel`].
    pub fn find_by_model(&self, model: &ModelRef, ensure: bool) -> Result<Option<ViewRef>> {
        Ok(self
            .inner
            .registry
            .find_by_model(model, ensure)?
            .map(|pair| pair.view().clone()))
    }

    /// The root that owns `model`'s view, if it has a live view with an owner.
    pub fn find_owning_root(&self, model: &ModelRef) -> Result<Option<ElementId>> {
        match self.inner.registry.get(ModelId::of(model)) {
            Some(pair) => Ok(self.inner.ownership.owning_root(pair.element())?),
            None => Ok(None),
        }
    }

    /// Lifecycle state of `model`'s pair.
    pub fn lifecycle_state(&self, model: &ModelRef) -> Option<LifecycleState> {
        self.inner
            .registry
            .get(ModelId::of(model))
            .map(|pair| pair.lifecycle_state())
    }

    /// Render the registry grouped by owning root.
    pub fn dump_registry(&self) -> String {
        RegistryDump::new(&self.inner.registry, &self.inner.host).render(|element| self.inner.owner_of(element))
    }

    /// Render the host element tree.
    pub fn dump_host_tree(&self) -> String {
        HostTreeDebug::new()
            .format_all(&self.inner.host)
            .unwrap_or_else(|err| format!("Error formatting host tree: {err}"))
    }

    // =========================================================================
    // Host notifications
    // =========================================================================

    /// React to `element`'s subtree becoming live.
    ///
    /// Connected to the host tree automatically; call it directly when
    /// driving the manager from another host.
    pub async fn handle_became_live(&self, element: ElementId) -> Result<()> {
        let context = self.inner.host.context(element)?;
        let inner = self.inner.clone();
        self.inner
            .gateway
            .run_on(context, move || async move { inner.became_live_local(element).await })
            .await?
    }

    /// React to `element`'s subtree leaving the live tree.
    pub async fn handle_detached(&self, element: ElementId) -> Result<()> {
        let context = self.inner.host.context(element)?;
        let inner = self.inner.clone();
        self.inner
            .gateway
            .run_on(context, move || async move { inner.detached_local(element).await })
            .await?
    }

    /// React to `root` having closed.
    pub async fn handle_root_closed(&self, root: ElementId) -> Result<()> {
        let context = self.inner.host.context(root)?;
        let inner = self.inner.clone();
        self.inner
            .gateway
            .run_on(context, move || async move {
                let roots = [root];
                inner.root_closed_local(&roots).await
            })
            .await?
    }

    /// Wait until all posted host notifications have been handled.
    pub async fn settle(&self) {
        self.inner.gateway.settle().await;
    }

    /// Stop all UI contexts.
    pub fn shutdown(&self) {
        self.inner.gateway.shutdown();
    }
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("shell", &self.inner.shell)
            .field("pairs", &self.inner.registry.len())
            .field("gateway", &self.inner.gateway)
            .finish()
    }
}

static_assertions::assert_impl_all!(LifecycleManager: Send, Sync);
