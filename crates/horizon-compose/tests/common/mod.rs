//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use horizon_compose::{
    BoxError, Disposable, LifecycleManager, LifecycleManagerBuilder, ManagerConfig, ViewKind,
};
use parking_lot::Mutex;

/// Thread name of the primary UI context in tests.
pub const UI_THREAD: &str = "ui-main";

/// Ordered record of hook calls, shared between models.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Counters and switches behind every recording view-model.
#[derive(Default)]
pub struct Hooks {
    pub init_attempts: AtomicUsize,
    pub initialized: AtomicUsize,
    pub loaded: AtomicUsize,
    pub unloaded: AtomicUsize,
    pub cleaned: AtomicUsize,
    pub disposed: AtomicUsize,
    /// Number of upcoming `initialize` calls that fail.
    pub fail_initialize: AtomicUsize,
    pub fail_load: AtomicBool,
    pub fail_unload: AtomicBool,
    pub keep_alive: AtomicBool,
    pub threads: Mutex<Vec<String>>,
    pub journal: Mutex<Option<Journal>>,
}

impl Hooks {
    fn record(&self, name: &str, hook: &str) {
        let thread = std::thread::current().name().unwrap_or("<unnamed>").to_string();
        self.threads.lock().push(thread);
        if let Some(journal) = self.journal.lock().as_ref() {
            journal.lock().push(format!("{hook}:{name}"));
        }
    }

    pub fn initialize(&self, name: &str) -> Result<(), BoxError> {
        self.init_attempts.fetch_add(1, Ordering::SeqCst);
        self.record(name, "initialize");
        let failing = self
            .fail_initialize
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err("initialize refused".into());
        }
        self.initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn on_load(&self, name: &str) -> Result<(), BoxError> {
        self.record(name, "load");
        if self.fail_load.load(Ordering::SeqCst) {
            return Err("load refused".into());
        }
        self.loaded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn on_unload(&self, name: &str) -> Result<(), BoxError> {
        self.record(name, "unload");
        self.unloaded.fetch_add(1, Ordering::SeqCst);
        if self.fail_unload.load(Ordering::SeqCst) {
            return Err("unload refused".into());
        }
        Ok(())
    }

    pub fn clean_up(&self, name: &str) {
        self.record(name, "clean_up");
        self.cleaned.fetch_add(1, Ordering::SeqCst);
    }

    pub fn threads(&self) -> Vec<String> {
        self.threads.lock().clone()
    }
}

impl Disposable for Hooks {
    fn dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

macro_rules! recording_model {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Default)]
            pub struct $name {
                pub hooks: Hooks,
            }

            impl $name {
                pub fn new() -> Arc<Self> {
                    Arc::new(Self::default())
                }

                pub fn with_journal(journal: &Journal) -> Arc<Self> {
                    let model = Self::default();
                    *model.hooks.journal.lock() = Some(journal.clone());
                    Arc::new(model)
                }

                pub fn as_model(self: &Arc<Self>) -> ModelRef {
                    self.clone()
                }
            }

            #[async_trait::async_trait]
            impl ViewModel for $name {
                async fn initialize(&self) -> Result<(), BoxError> {
                    self.hooks.initialize(stringify!($name))
                }

                async fn on_load(&self) -> Result<(), BoxError> {
                    self.hooks.on_load(stringify!($name))
                }

                async fn on_unload(&self) -> Result<(), BoxError> {
                    self.hooks.on_unload(stringify!($name))
                }

                fn clean_up(&self) {
                    self.hooks.clean_up(stringify!($name));
                }

                fn keep_alive(&self) -> bool {
                    self.hooks.keep_alive.load(std::sync::atomic::Ordering::SeqCst)
                }

                fn as_disposable(&self) -> Option<&dyn Disposable> {
                    Some(&self.hooks)
                }
            }
        )*
    };
}

pub mod view_models {
    use std::sync::Arc;

    use horizon_compose::{BoxError, Disposable, ModelRef, ViewModel};

    use super::{Hooks, Journal};

    recording_model!(
        MainWindowViewModel,
        SettingsViewModel,
        EditorViewModel,
        DeleteRequestViewModel,
        ConfirmViewModel,
        PanelViewModel,
        BrokenViewModel,
        OrphanViewModel,
    );
}

macro_rules! test_view {
    ($($name:ident => $make:ident($label:literal)),* $(,)?) => {
        $(
            pub struct $name {
                base: ViewBase,
            }

            impl View for $name {
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

            impl ConstructView for $name {
                fn construct(cx: &ViewBuildContext<'_>) -> Result<Self, BoxError> {
                    Ok(Self {
                        base: ViewBase::$make(cx, $label),
                    })
                }
            }
        )*
    };
}

pub mod views {
    use horizon_compose::{BoxError, ConstructView, ModelRef, View, ViewBase, ViewBuildContext};
    use horizon_compose_core::ElementId;

    test_view!(
        MainWindow => root("main-window"),
        SettingsView => element("settings"),
        EditorView => element("editor"),
        DeleteRequestView => root("delete-request"),
        ConfirmDialog => root("confirm-dialog"),
        PanelView => element("panel"),
    );

    /// A view whose constructor always fails.
    pub struct BrokenView;

    impl View for BrokenView {
        fn actual_element(&self) -> ElementId {
            ElementId::default()
        }

        fn data_context(&self) -> Option<ModelRef> {
            None
        }

        fn set_data_context(&self, _model: Option<ModelRef>) {}
    }

    impl ConstructView for BrokenView {
        fn construct(_cx: &ViewBuildContext<'_>) -> Result<Self, BoxError> {
            Err("missing template".into())
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Current value of a hook counter.
pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Register every test view with the manager's catalog.
pub fn register_views(manager: &LifecycleManager) {
    manager.register_view_type::<views::MainWindow>();
    manager.register_view_type::<views::SettingsView>();
    manager.register_view_type::<views::EditorView>();
    manager.register_view_type::<views::DeleteRequestView>();
    manager.register_view_type::<views::ConfirmDialog>();
    manager.register_view_type::<views::PanelView>();
    manager.register_view_type::<views::BrokenView>();
}

pub fn builder() -> LifecycleManagerBuilder {
    init_tracing();
    LifecycleManager::builder().with_config(ManagerConfig::default().with_context_thread_name(UI_THREAD))
}

/// A manager with every test view registered.
pub fn setup() -> LifecycleManager {
    setup_with(builder())
}

pub fn setup_with(builder: LifecycleManagerBuilder) -> LifecycleManager {
    let manager = builder.build().expect("manager should build");
    register_views(&manager);
    manager
}

/// The kind of a test view.
pub fn kind_of<V>() -> ViewKind {
    ViewKind::of::<V>()
}

/// Poll `condition` until it holds or a few seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Run `future` with a timeout so a hang fails the test instead of stalling it.
pub async fn timed<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), future)
        .await
        .expect("operation timed out")
}
