//! Modal dialog management.
//!
//! The modal slot tracks the dialogs that currently own exclusive input as a
//! stack of entries. The most recently entered dialog is on top and is the
//! one [`LifecycleManager::modal_model`] reports. Each
//! [`LifecycleManager::push_and_show`] call holds a [`ModalScope`] that removes
//! its own entry on exit, wherever that entry sits in the stack, so dialogs
//! may finish in any order.
//!
//! While any modal is open the shell root has input disabled. The shell gets
//! back the enabled state it had before the first modal once the stack is
//! empty, whether the last call returned a result, failed, or its future was
//! dropped.
//!
//! [`LifecycleManager::modal_model`]: crate::LifecycleManager::modal_model
//! [`LifecycleManager::push_and_show`]: crate::LifecycleManager::push_and_show

use std::sync::Arc;

use async_trait::async_trait;
use horizon_compose_core::{ElementId, HostTree};
use horizon_compose_core::logging::targets;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::BoxError;
use crate::model::{ModelRef, model_label};
use crate::view::ViewRef;

/// The result a dialog closes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DialogResult {
    /// The dialog was rejected (e.g., Cancel).
    #[default]
    Rejected,
    /// The dialog was accepted (e.g., OK).
    Accepted,
}

impl DialogResult {
    /// Check if the dialog was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, DialogResult::Accepted)
    }

    /// Check if the dialog was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, DialogResult::Rejected)
    }
}

impl From<bool> for DialogResult {
    fn from(accepted: bool) -> Self {
        if accepted {
            DialogResult::Accepted
        } else {
            DialogResult::Rejected
        }
    }
}

struct ModalEntry {
    id: u64,
    model: ModelRef,
}

#[derive(Default)]
struct ModalStack {
    entries: Vec<ModalEntry>,
    next_id: u64,
    /// Shell state saved when the first entry was pushed.
    shell_was_enabled: bool,
}

/// The models of the open modal dialogs, topmost last.
#[derive(Default)]
pub struct ModalSlot {
    stack: Mutex<ModalStack>,
}

impl ModalSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The model of the topmost modal dialog.
    pub fn current(&self) -> Option<ModelRef> {
        self.stack.lock().entries.last().map(|entry| entry.model.clone())
    }

    /// Whether a modal is active.
    pub fn is_active(&self) -> bool {
        !self.stack.lock().entries.is_empty()
    }

    /// Number of open modal dialogs.
    pub fn depth(&self) -> usize {
        self.stack.lock().entries.len()
    }

    /// Push `model`, disabling the shell if this is the first entry.
    ///
    /// The shell is switched under the stack lock so a concurrent exit can
    /// not interleave between saving and changing its state.
    fn push(&self, model: ModelRef, host: &HostTree, shell: ElementId) -> u64 {
        let mut stack = self.stack.lock();
        if stack.entries.is_empty() {
            stack.shell_was_enabled = host.is_enabled(shell).unwrap_or(true);
            if let Err(err) = host.set_enabled(shell, false) {
                tracing::warn!(target: targets::MODAL, %err, "could not disable shell input");
            }
        }
        let id = stack.next_id;
        stack.next_id += 1;
        stack.entries.push(ModalEntry { id, model });
        id
    }

    /// Remove the entry `id`, restoring the shell once the stack is empty.
    fn remove(&self, id: u64, host: &HostTree, shell: ElementId) -> usize {
        let mut stack = self.stack.lock();
        if let Some(pos) = stack.entries.iter().position(|entry| entry.id == id) {
            stack.entries.remove(pos);
        }
        if stack.entries.is_empty() {
            if let Err(err) = host.set_enabled(shell, stack.shell_was_enabled) {
                tracing::warn!(target: targets::MODAL, %err, "could not restore shell input");
            }
        }
        stack.entries.len()
    }
}

impl std::fmt::Debug for ModalSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stack = self.stack.lock();
        let models: Vec<String> = stack.entries.iter().map(|entry| model_label(&entry.model)).collect();
        f.debug_struct("ModalSlot").field("stack", &models).finish()
    }
}

/// One open modal dialog.
///
/// Entering pushes the dialog's model and disables shell input. Dropping
/// removes that entry; the shell is restored when no modal remains.
#[must_use = "the modal scope ends as soon as it is dropped"]
pub struct ModalScope {
    slot: Arc<ModalSlot>,
    id: u64,
    host: Arc<HostTree>,
    shell: ElementId,
}

impl ModalScope {
    /// Enter a modal scope for `model`.
    pub fn enter(slot: Arc<ModalSlot>, host: Arc<HostTree>, shell: ElementId, model: ModelRef) -> Self {
        let label = model_label(&model);
        let id = slot.push(model, &host, shell);
        tracing::debug!(target: targets::MODAL, model = %label, depth = slot.depth(), "modal entered");
        Self { slot, id, host, shell }
    }
}

impl Drop for ModalScope {
    fn drop(&mut self) {
        let depth = self.slot.remove(self.id, &self.host, self.shell);
        tracing::debug!(target: targets::MODAL, depth, "modal exited");
    }
}

/// A dialog ready to be presented.
///
/// The dialog's root is shown and its pair activated before the presenter
/// sees the request.
pub struct ModalRequest {
    /// The dialog's view-model.
    pub model: ModelRef,
    /// The dialog's view.
    pub view: ViewRef,
    /// The dialog's root.
    pub root: ElementId,
    /// The root that owns the dialog.
    pub owner: ElementId,
    result: oneshot::Receiver<DialogResult>,
}

impl ModalRequest {
    pub(crate) fn new(
        model: ModelRef,
        view: ViewRef,
        root: ElementId,
        owner: ElementId,
        result: oneshot::Receiver<DialogResult>,
    ) -> Self {
        Self {
            model,
            view,
            root,
            owner,
            result,
        }
    }

    /// Wait for the dialog to finish.
    ///
    /// Resolves to the value passed to
    /// [`set_dialog_result`](crate::LifecycleManager::set_dialog_result), or
    /// `None` if the dialog was closed without one.
    pub async fn wait(self) -> Option<DialogResult> {
        self.result.await.ok()
    }
}

impl std::fmt::Debug for ModalRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalRequest")
            .field("model", &model_label(&self.model))
            .field("root", &self.root)
            .field("owner", &self.owner)
            .finish()
    }
}

/// The blocking show primitive used by modal calls.
#[async_trait]
pub trait ModalPresenter: Send + Sync {
    /// Present the dialog and resolve when it is done.
    async fn present(&self, request: ModalRequest) -> Result<Option<DialogResult>, BoxError>;
}

/// Presents a dialog by waiting for its result or its root to close.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogPresenter;

#[async_trait]
impl ModalPresenter for DialogPresenter {
    async fn present(&self, request: ModalRequest) -> Result<Option<DialogResult>, BoxError> {
        Ok(request.wait().await)
    }
}

static_assertions::assert_impl_all!(ModalSlot: Send, Sync);
static_assertions::assert_impl_all!(ModalScope: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ViewModel, same_model};
    use horizon_compose_core::{ContextConfig, UiContext};

    struct Dialog;
    impl ViewModel for Dialog {}

    fn setup() -> (UiContext, Arc<HostTree>, ElementId, Arc<ModalSlot>) {
        let ctx = UiContext::start(ContextConfig::default().with_thread_name("modal-test")).unwrap();
        let host = Arc::new(HostTree::new());
        let shell = host.create_root(ctx.id(), "shell");
        (ctx, host, shell, Arc::new(ModalSlot::new()))
    }

    #[test]
    fn test_dialog_result_from_bool() {
        assert!(DialogResult::from(true).is_accepted());
        assert!(DialogResult::from(false).is_rejected());
        assert_eq!(DialogResult::default(), DialogResult::Rejected);
    }

    #[test]
    fn test_scope_disables_and_restores() {
        let (_ctx, host, shell, slot) = setup();
        let model: ModelRef = Arc::new(Dialog);
        {
            let _scope = ModalScope::enter(slot.clone(), host.clone(), shell, model.clone());
            assert!(!host.is_enabled(shell).unwrap());
            assert!(slot.current().is_some_and(|m| same_model(&m, &model)));
        }
        assert!(host.is_enabled(shell).unwrap());
        assert!(!slot.is_active());
    }

    #[test]
    fn test_nested_scopes_hand_back_slot() {
        let (_ctx, host, shell, slot) = setup();
        let outer: ModelRef = Arc::new(Dialog);
        let inner: ModelRef = Arc::new(Dialog);

        let outer_scope = ModalScope::enter(slot.clone(), host.clone(), shell, outer.clone());
        {
            let _inner_scope = ModalScope::enter(slot.clone(), host.clone(), shell, inner.clone());
            assert!(slot.current().is_some_and(|m| same_model(&m, &inner)));
        }
        assert!(slot.current().is_some_and(|m| same_model(&m, &outer)));
        assert!(!host.is_enabled(shell).unwrap());

        drop(outer_scope);
        assert!(!slot.is_active());
        assert!(host.is_enabled(shell).unwrap());
    }

    #[test]
    fn test_outer_scope_exits_first() {
        let (_ctx, host, shell, slot) = setup();
        let outer: ModelRef = Arc::new(Dialog);
        let inner: ModelRef = Arc::new(Dialog);

        let outer_scope = ModalScope::enter(slot.clone(), host.clone(), shell, outer.clone());
        let inner_scope = ModalScope::enter(slot.clone(), host.clone(), shell, inner.clone());
        assert_eq!(slot.depth(), 2);

        drop(outer_scope);
        assert!(slot.current().is_some_and(|m| same_model(&m, &inner)));
        assert!(!host.is_enabled(shell).unwrap());

        drop(inner_scope);
        assert!(!slot.is_active());
        assert!(host.is_enabled(shell).unwrap());
    }

    #[test]
    fn test_disabled_shell_stays_disabled() {
        let (_ctx, host, shell, slot) = setup();
        host.set_enabled(shell, false).unwrap();
        drop(ModalScope::enter(slot.clone(), host.clone(), shell, Arc::new(Dialog)));
        assert!(!host.is_enabled(shell).unwrap());
    }

    #[tokio::test]
    async fn test_dialog_presenter_without_result() {
        let (_ctx, _host, shell, _) = setup();
        let (tx, rx) = oneshot::channel();
        let view: ViewRef = Arc::new(crate::view::ContentView::new(shell));
        let request = ModalRequest::new(Arc::new(Dialog), view, shell, shell, rx);
        drop(tx);
        assert_eq!(DialogPresenter.present(request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dialog_presenter_with_result() {
        let (_ctx, _host, shell, _) = setup();
        let (tx, rx) = oneshot::channel();
        let view: ViewRef = Arc::new(crate::view::ContentView::new(shell));
        let request = ModalRequest::new(Arc::new(Dialog), view, shell, shell, rx);
        tx.send(DialogResult::Accepted).unwrap();
        assert_eq!(
            DialogPresenter.present(request).await.unwrap(),
            Some(DialogResult::Accepted)
        );
    }
}
