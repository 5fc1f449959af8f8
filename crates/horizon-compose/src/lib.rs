//! View/view-model composition for Horizon applications.
//!
//! This crate binds views to the view-models that drive them and manages the
//! lifetime of both:
//!
//! - **Resolution**: find the view kind for a model by alias, explicit mapping
//!   or naming convention (`app::view_models::SettingsViewModel` resolves to
//!   `app::views::SettingsView`)
//! - **Registry**: one live view per model, looked up either way
//! - **Lifecycle**: `initialize` once, `on_load`/`on_unload` on every attach
//!   and detach, clean-up and disposal on release, keep-alive reuse
//! - **Ownership**: closing a window tears down every view it owns, including
//!   nested and owned windows
//! - **Modal dialogs**: async dialogs with a single active-modal slot and
//!   shell input disabled while one is open
//!
//! Work is marshaled onto the UI context that owns each view through the
//! [`Gateway`](horizon_compose_core::Gateway) of `horizon-compose-core`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use horizon_compose::{
//!     BoxError, ConstructView, LifecycleManager, ModelRef, View, ViewBase, ViewBuildContext,
//!     ViewModel,
//! };
//!
//! mod view_models {
//!     use horizon_compose::{BoxError, ViewModel};
//!
//!     pub struct GreeterViewModel;
//!
//!     #[async_trait::async_trait]
//!     impl ViewModel for GreeterViewModel {
//!         async fn on_load(&self) -> Result<(), BoxError> {
//!             println!("hello");
//!             Ok(())
//!         }
//!     }
//! }
//!
//! mod views {
//!     use horizon_compose::{BoxError, ConstructView, ModelRef, View, ViewBase, ViewBuildContext};
//!
//!     pub struct GreeterView {
//!         base: ViewBase,
//!     }
//!
//!     impl View for GreeterView {
//!         fn actual_element(&self) -> horizon_compose_core::ElementId {
//!             self.base.element_id()
//!         }
//!         fn data_context(&self) -> Option<ModelRef> {
//!             self.base.data_context()
//!         }
//!         fn set_data_context(&self, model: Option<ModelRef>) {
//!             self.base.set_data_context(model);
//!         }
//!     }
//!
//!     impl ConstructView for GreeterView {
//!         fn construct(cx: &ViewBuildContext<'_>) -> Result<Self, BoxError> {
//!             Ok(Self { base: ViewBase::root(cx, "greeter") })
//!         }
//!     }
//! }
//!
//! # async fn demo() -> horizon_compose::Result<()> {
//! let manager = LifecycleManager::new()?;
//! manager.register_view_type::<views::GreeterView>();
//!
//! let greeter: ModelRef = Arc::new(view_models::GreeterViewModel);
//! manager.show(&greeter, None).await?;
//! manager.close(&greeter).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod factory;
pub mod lifecycle;
pub mod manager;
pub mod modal;
pub mod model;
pub mod ownership;
pub mod registry;
pub mod resolver;
pub mod view;

pub use config::{ManagerConfig, NamespaceReplacement};
pub use error::{BoxError, ComposeError, LifecyclePhase, ResolveFailure, Result};
pub use factory::{Conformance, ViewCatalog, ViewFactory};
pub use lifecycle::{BoundPair, InitState, LifecycleCoordinator, LifecycleState, LoadState};
pub use manager::{LifecycleManager, LifecycleManagerBuilder};
pub use modal::{DialogPresenter, DialogResult, ModalPresenter, ModalRequest, ModalScope, ModalSlot};
pub use model::{Disposable, ModelId, ModelRef, ModelType, TypeDescriptor, ViewModel, model_label, same_model};
pub use ownership::OwnershipTracker;
pub use registry::{RegistryDump, ViewRegistry};
pub use resolver::{NamingConvention, ViewResolver};
pub use view::{ConstructView, ContentView, View, ViewBase, ViewBuildContext, ViewKind, ViewRef};
