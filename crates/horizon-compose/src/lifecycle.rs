//! Lifecycle coordination for bound pairs.
//!
//! Every pair walks the same sequence:
//!
//! ```text
//! initialize (once per model) -> on_load -> ... -> on_unload -> clean_up + dispose
//!                                   ^                  |
//!                                   +---- keep-alive --+
//! ```
//!
//! Each pair owns an async phase lock. Activation and deactivation both take
//! it, so an in-flight `initialize`/`on_load` always finishes before a queued
//! `on_unload` starts, and no phase ever runs concurrently with itself.
//!
//! Activation is claimed synchronously before the first await. An explicit
//! request for a pair that is already initializing or loading is rejected
//! with [`ComposeError::ActivationInProgress`]; a became-live notification for
//! such a pair is dropped instead of queued. A failed activation is not
//! retried by notifications for the same attachment, only by an explicit
//! request or a later re-attachment.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use horizon_compose_core::{ContextId, ElementId};
use horizon_compose_core::logging::targets;
use parking_lot::Mutex;

use crate::error::{ComposeError, LifecyclePhase, Result};
use crate::model::{ModelId, ModelRef, ViewModel, model_label};
use crate::view::ViewRef;

/// Initialization progress of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitState {
    /// `initialize` has not completed successfully yet.
    #[default]
    Uninitialized,
    /// `initialize` is running.
    Initializing,
    /// `initialize` completed successfully, possibly for an earlier attachment.
    Initialized,
}

/// Load progress of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Not loaded.
    #[default]
    Unloaded,
    /// `on_load` is running.
    Loading,
    /// `on_load` completed successfully.
    Loaded,
    /// `on_unload` is running.
    Unloading,
}

/// Combined lifecycle state of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleState {
    /// Initialization progress.
    pub init: InitState,
    /// Load progress.
    pub load: LoadState,
}

impl LifecycleState {
    /// Whether `on_load` has completed and `on_unload` has not started.
    pub fn is_loaded(&self) -> bool {
        self.load == LoadState::Loaded
    }

    /// Whether a phase is currently running.
    pub fn is_transient(&self) -> bool {
        self.init == InitState::Initializing || matches!(self.load, LoadState::Loading | LoadState::Unloading)
    }
}

#[derive(Debug, Default)]
struct PairStatus {
    state: LifecycleState,
    activation_pending: bool,
    /// The current attachment already failed to activate.
    attachment_failed: bool,
    released: bool,
}

/// Per-pair lifecycle bookkeeping.
#[derive(Debug, Default)]
pub(crate) struct PairState {
    status: Mutex<PairStatus>,
    phase: tokio::sync::Mutex<()>,
}

impl PairState {
    fn state(&self) -> LifecycleState {
        self.status.lock().state
    }

    fn set_init(&self, init: InitState) {
        self.status.lock().state.init = init;
    }

    fn set_load(&self, load: LoadState) {
        self.status.lock().state.load = load;
    }
}

/// A live (view, model) association.
#[derive(Clone)]
pub struct BoundPair {
    view: ViewRef,
    model: ModelRef,
    context: ContextId,
    state: Arc<PairState>,
}

impl BoundPair {
    pub(crate) fn new(view: ViewRef, model: ModelRef, context: ContextId, state: Arc<PairState>) -> Self {
        Self {
            view,
            model,
            context,
            state,
        }
    }

    /// The view.
    pub fn view(&self) -> &ViewRef {
        &self.view
    }

    /// The view-model.
    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Identity of the view-model.
    pub fn model_id(&self) -> ModelId {
        ModelId::of(&self.model)
    }

    /// The view's host element.
    pub fn element(&self) -> ElementId {
        self.view.actual_element()
    }

    /// The UI context that owns the view.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Current lifecycle state.
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state.state()
    }
}

impl std::fmt::Debug for BoundPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundPair")
            .field("model", &model_label(&self.model))
            .field("element", &self.element())
            .field("context", &self.context)
            .field("state", &self.lifecycle_state())
            .finish()
    }
}

/// Runs the lifecycle hooks of bound pairs.
#[derive(Default)]
pub struct LifecycleCoordinator {
    initialized: Mutex<HashMap<ModelId, Weak<dyn ViewModel>>>,
    dormant: Mutex<HashMap<ElementId, BoundPair>>,
}

impl LifecycleCoordinator {
    /// Create a coordinator with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `initialize` has completed successfully for this model.
    pub fn has_initialized(&self, model: &ModelRef) -> bool {
        self.initialized
            .lock()
            .get(&ModelId::of(model))
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    fn mark_initialized(&self, model: &ModelRef) {
        let mut initialized = self.initialized.lock();
        initialized.retain(|_, weak| weak.strong_count() > 0);
        initialized.insert(ModelId::of(model), Arc::downgrade(model));
    }

    /// Fresh state for a new pair, carrying over the model's initialization.
    pub(crate) fn new_pair_state(&self, model: &ModelRef) -> Arc<PairState> {
        let state = PairState::default();
        if self.has_initialized(model) {
            state.set_init(InitState::Initialized);
        }
        Arc::new(state)
    }

    /// Bring a live pair to `Loaded`, initializing it first if needed.
    ///
    /// Returns immediately if the pair is already loaded or has been released.
    /// A pair that is mid-activation is an
    /// [`ActivationInProgress`](ComposeError::ActivationInProgress) error. A
    /// previous failure on the same attachment is retried.
    pub async fn activate(&self, pair: &BoundPair) -> Result<()> {
        {
            let mut status = pair.state.status.lock();
            if status.released || status.state.is_loaded() {
                tracing::trace!(target: targets::LIFECYCLE, model = %model_label(&pair.model), "activation skipped");
                return Ok(());
            }
            if status.activation_pending || status.state.is_transient() {
                return Err(ComposeError::ActivationInProgress {
                    model: model_label(&pair.model),
                });
            }
            status.attachment_failed = false;
            status.activation_pending = true;
        }
        self.run_activation(pair).await
    }

    /// Activate a pair whose element the host just reported live.
    ///
    /// Skips pairs that are loading, loaded or released, and pairs whose
    /// activation already failed on this attachment.
    pub async fn activate_attached(&self, pair: &BoundPair) -> Result<()> {
        {
            let mut status = pair.state.status.lock();
            if status.released
                || status.attachment_failed
                || status.activation_pending
                || status.state.is_transient()
                || status.state.is_loaded()
            {
                tracing::trace!(
                    target: targets::LIFECYCLE,
                    model = %model_label(&pair.model),
                    failed = status.attachment_failed,
                    "attach activation skipped"
                );
                return Ok(());
            }
            status.activation_pending = true;
        }
        self.run_activation(pair).await
    }

    async fn run_activation(&self, pair: &BoundPair) -> Result<()> {
        let _phase = pair.state.phase.lock().await;
        {
            let mut status = pair.state.status.lock();
            status.activation_pending = false;
            if status.released || status.state.is_loaded() {
                return Ok(());
            }
        }

        let result = self.initialize_and_load(pair).await;
        if result.is_err() {
            pair.state.status.lock().attachment_failed = true;
        }
        result
    }

    async fn initialize_and_load(&self, pair: &BoundPair) -> Result<()> {
        let model = &pair.model;
        if self.has_initialized(model) {
            pair.state.set_init(InitState::Initialized);
        } else {
            pair.state.set_init(InitState::Initializing);
            tracing::debug!(target: targets::LIFECYCLE, model = %model_label(model), "initializing");
            if let Err(source) = model.initialize().await {
                pair.state.set_init(InitState::Uninitialized);
                return Err(ComposeError::Hook {
                    phase: LifecyclePhase::Initialize,
                    model: model_label(model),
                    source,
                });
            }
            pair.state.set_init(InitState::Initialized);
            self.mark_initialized(model);
        }

        pair.state.set_load(LoadState::Loading);
        tracing::debug!(target: targets::LIFECYCLE, model = %model_label(model), "loading");
        match model.on_load().await {
            Ok(()) => {
                pair.state.set_load(LoadState::Loaded);
                Ok(())
            }
            Err(source) => {
                pair.state.set_load(LoadState::Unloaded);
                Err(ComposeError::Hook {
                    phase: LifecyclePhase::Load,
                    model: model_label(model),
                    source,
                })
            }
        }
    }

    /// Unload a pair that has left the registry, then clean it up or park it.
    ///
    /// Never fails: hook errors and panics are logged and suppressed.
    pub async fn deactivate(&self, pair: &BoundPair) {
        pair.state.status.lock().released = true;
        let _phase = pair.state.phase.lock().await;
        let model = &pair.model;

        if pair.state.state().is_loaded() {
            pair.state.set_load(LoadState::Unloading);
            tracing::debug!(target: targets::LIFECYCLE, model = %model_label(model), "unloading");
            match AssertUnwindSafe(model.on_unload()).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => suppressed(model, LifecyclePhase::Unload, &err),
                Err(_) => suppressed(model, LifecyclePhase::Unload, &"panicked"),
            }
            pair.state.set_load(LoadState::Unloaded);
        }

        if model.keep_alive() {
            tracing::debug!(target: targets::LIFECYCLE, model = %model_label(model), "kept alive");
            self.dormant.lock().insert(pair.element(), pair.clone());
            return;
        }

        release(pair);
    }

    /// Take the parked keep-alive pair for an element, ready for reuse.
    pub fn take_dormant(&self, element: ElementId) -> Option<BoundPair> {
        let pair = self.dormant.lock().remove(&element)?;
        let mut status = pair.state.status.lock();
        status.released = false;
        status.attachment_failed = false;
        drop(status);
        Some(pair)
    }

    /// Drop the parked pair of a model, if any. No hooks run.
    pub fn discard_dormant_model(&self, model: ModelId) -> Option<BoundPair> {
        let mut dormant = self.dormant.lock();
        let element = dormant
            .iter()
            .find(|(_, pair)| pair.model_id() == model)
            .map(|(element, _)| *element)?;
        let pair = dormant.remove(&element)?;
        pair.view.set_data_context(None);
        Some(pair)
    }

    /// Drop every parked pair whose element matches. No hooks run.
    pub fn discard_dormant_where(&self, mut predicate: impl FnMut(ElementId) -> bool) -> usize {
        let mut dormant = self.dormant.lock();
        let before = dormant.len();
        dormant.retain(|&element, pair| {
            let discard = predicate(element);
            if discard {
                pair.view.set_data_context(None);
            }
            !discard
        });
        before - dormant.len()
    }

    /// Elements with a parked keep-alive pair.
    pub fn dormant_elements(&self) -> Vec<ElementId> {
        self.dormant.lock().keys().copied().collect()
    }
}

fn suppressed(model: &ModelRef, phase: LifecyclePhase, err: &dyn std::fmt::Display) {
    tracing::warn!(target: targets::LIFECYCLE, model = %model_label(model), %phase, error = %err, "teardown error suppressed");
}

/// Final release: `clean_up`, then disposal of model and view, then unbinding.
fn release(pair: &BoundPair) {
    let model = &pair.model;
    tracing::debug!(target: targets::LIFECYCLE, model = %model_label(model), "cleaning up");

    if std::panic::catch_unwind(AssertUnwindSafe(|| model.clean_up())).is_err() {
        suppressed(model, LifecyclePhase::CleanUp, &"panicked");
    }
    if let Some(disposable) = model.as_disposable() {
        if std::panic::catch_unwind(AssertUnwindSafe(|| disposable.dispose())).is_err() {
            suppressed(model, LifecyclePhase::Dispose, &"model dispose panicked");
        }
    }
    if let Some(disposable) = pair.view.as_disposable() {
        if std::panic::catch_unwind(AssertUnwindSafe(|| disposable.dispose())).is_err() {
            suppressed(model, LifecyclePhase::Dispose, &"view dispose panicked");
        }
    }
    pair.view.set_data_context(None);
}

static_assertions::assert_impl_all!(LifecycleCoordinator: Send, Sync);
static_assertions::assert_impl_all!(BoundPair: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::view::ContentView;
    use async_trait::async_trait;
    use horizon_compose_core::{ContextConfig, HostTree, UiContext};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        inits: AtomicUsize,
        loads: AtomicUsize,
        unloads: AtomicUsize,
        cleanups: AtomicUsize,
        fail_init: AtomicBool,
        fail_unload: bool,
        keep: bool,
    }

    #[async_trait]
    impl ViewModel for Recorder {
        async fn initialize(&self) -> std::result::Result<(), BoxError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init.load(Ordering::SeqCst) {
                return Err("init failed".into());
            }
            Ok(())
        }

        async fn on_load(&self) -> std::result::Result<(), BoxError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_unload(&self) -> std::result::Result<(), BoxError> {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            if self.fail_unload {
                return Err("unload failed".into());
            }
            Ok(())
        }

        fn clean_up(&self) {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
        }

        fn keep_alive(&self) -> bool {
            self.keep
        }
    }

    struct Fixture {
        _ctx: UiContext,
        host: HostTree,
        context: ContextId,
        coordinator: LifecycleCoordinator,
    }

    fn setup() -> Fixture {
        let ctx = UiContext::start(ContextConfig::default().with_thread_name("lifecycle-test")).unwrap();
        let context = ctx.id();
        Fixture {
            _ctx: ctx,
            host: HostTree::new(),
            context,
            coordinator: LifecycleCoordinator::new(),
        }
    }

    fn pair(fx: &Fixture, recorder: &Arc<Recorder>) -> BoundPair {
        let model: ModelRef = recorder.clone();
        let view: ViewRef = Arc::new(ContentView::new(fx.host.create_element(fx.context, "view")));
        view.set_data_context(Some(model.clone()));
        let state = fx.coordinator.new_pair_state(&model);
        BoundPair::new(view, model, fx.context, state)
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let fx = setup();
        let recorder = Arc::new(Recorder::default());
        let p = pair(&fx, &recorder);

        fx.coordinator.activate(&p).await.unwrap();
        assert_eq!(p.lifecycle_state(), LifecycleState {
            init: InitState::Initialized,
            load: LoadState::Loaded
        });

        fx.coordinator.activate(&p).await.unwrap();
        assert_eq!(recorder.loads.load(Ordering::SeqCst), 1);

        fx.coordinator.deactivate(&p).await;
        assert_eq!(recorder.unloads.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.cleanups.load(Ordering::SeqCst), 1);
        assert!(p.view().data_context().is_none());
        assert_eq!(p.lifecycle_state().load, LoadState::Unloaded);
    }

    #[tokio::test]
    async fn test_failed_initialize_is_retried() {
        let fx = setup();
        let recorder = Arc::new(Recorder::default());
        recorder.fail_init.store(true, Ordering::SeqCst);
        let p = pair(&fx, &recorder);

        let err = fx.coordinator.activate(&p).await.unwrap_err();
        assert_eq!(err.phase(), Some(LifecyclePhase::Initialize));
        assert_eq!(p.lifecycle_state().init, InitState::Uninitialized);
        assert_eq!(recorder.loads.load(Ordering::SeqCst), 0);

        recorder.fail_init.store(false, Ordering::SeqCst);
        fx.coordinator.activate(&p).await.unwrap();
        assert_eq!(recorder.inits.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attach_skips_failed_attachment() {
        let fx = setup();
        let recorder = Arc::new(Recorder::default());
        recorder.fail_init.store(true, Ordering::SeqCst);
        let p = pair(&fx, &recorder);

        assert!(fx.coordinator.activate(&p).await.is_err());
        recorder.fail_init.store(false, Ordering::SeqCst);
        fx.coordinator.activate_attached(&p).await.unwrap();

        assert_eq!(recorder.inits.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.loads.load(Ordering::SeqCst), 0);
        assert_eq!(p.lifecycle_state().init, InitState::Uninitialized);
    }

    #[tokio::test]
    async fn test_reattach_retries_failed_activation() {
        let fx = setup();
        let recorder = Arc::new(Recorder {
            keep: true,
            ..Default::default()
        });
        recorder.fail_init.store(true, Ordering::SeqCst);
        let p = pair(&fx, &recorder);

        assert!(fx.coordinator.activate(&p).await.is_err());
        fx.coordinator.deactivate(&p).await;
        assert_eq!(recorder.unloads.load(Ordering::SeqCst), 0);

        recorder.fail_init.store(false, Ordering::SeqCst);
        let again = fx.coordinator.take_dormant(p.element()).unwrap();
        fx.coordinator.activate_attached(&again).await.unwrap();

        assert_eq!(recorder.inits.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.loads.load(Ordering::SeqCst), 1);
        assert!(again.lifecycle_state().is_loaded());
    }

    #[tokio::test]
    async fn test_explicit_activation_rejected_while_pending() {
        let fx = setup();
        let recorder = Arc::new(Recorder::default());
        let p = pair(&fx, &recorder);
        p.state.status.lock().activation_pending = true;

        let err = fx.coordinator.activate(&p).await.unwrap_err();
        assert!(matches!(err, ComposeError::ActivationInProgress { .. }));
        fx.coordinator.activate_attached(&p).await.unwrap();
        assert_eq!(recorder.inits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialized_memory_survives_new_pair() {
        let fx = setup();
        let recorder = Arc::new(Recorder::default());

        let first = pair(&fx, &recorder);
        fx.coordinator.activate(&first).await.unwrap();
        fx.coordinator.deactivate(&first).await;

        let model: ModelRef = recorder.clone();
        assert!(fx.coordinator.has_initialized(&model));
        let second = pair(&fx, &recorder);
        assert_eq!(second.lifecycle_state().init, InitState::Initialized);
        fx.coordinator.activate(&second).await.unwrap();

        assert_eq!(recorder.inits.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unload_error_is_suppressed() {
        let fx = setup();
        let recorder = Arc::new(Recorder {
            fail_unload: true,
            ..Default::default()
        });
        let p = pair(&fx, &recorder);

        fx.coordinator.activate(&p).await.unwrap();
        fx.coordinator.deactivate(&p).await;
        assert_eq!(recorder.cleanups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keep_alive_parks_pair() {
        let fx = setup();
        let recorder = Arc::new(Recorder {
            keep: true,
            ..Default::default()
        });
        let p = pair(&fx, &recorder);

        fx.coordinator.activate(&p).await.unwrap();
        fx.coordinator.deactivate(&p).await;
        assert_eq!(recorder.cleanups.load(Ordering::SeqCst), 0);
        assert_eq!(fx.coordinator.dormant_elements(), vec![p.element()]);

        let revived = fx.coordinator.take_dormant(p.element()).unwrap();
        fx.coordinator.activate(&revived).await.unwrap();
        assert_eq!(recorder.inits.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_released_pair_is_not_activated() {
        let fx = setup();
        let recorder = Arc::new(Recorder::default());
        let p = pair(&fx, &recorder);

        fx.coordinator.deactivate(&p).await;
        fx.coordinator.activate(&p).await.unwrap();
        assert_eq!(recorder.inits.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.unloads.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.cleanups.load(Ordering::SeqCst), 1);
    }
}
