//! Headless host element tree.
//!
//! [`HostTree`] is the part of the presentation layer the lifecycle manager
//! needs to see: which elements exist, how they nest, which of them are
//! window-like roots, and when a subtree becomes live or a root closes. A
//! real toolkit backend mirrors its window and control hierarchy into a
//! `HostTree`; tests drive one directly.
//!
//! # Structure
//!
//! Every element has
//!
//! - a structural `parent` and ordered `children` (the visual tree),
//! - an optional logical `host` (the hosting chain, e.g. a content presenter
//!   that displays a view without being its structural parent),
//! - the [`ContextId`] of the UI context that owns it.
//!
//! Roots ([`ElementKind::Root`]) additionally carry window state and may be
//! *owned* by another root (dialogs, tool windows). Closing a root closes the
//! roots it owns and the roots nested inside it first.
//!
//! A [`ElementKind::HostedRoot`] is the top of a tree embedded in a foreign or
//! cross-process host: it can be live, but no owning container can be
//! discovered through it.
//!
//! # Liveness
//!
//! An element is live when the first root reached by walking up its parent
//! (or, lacking a parent, its host) links is shown and not closed.
//!
//! # Signals
//!
//! - [`became_live`](HostTree::became_live) fires once for the top element of
//!   every subtree that transitions to live.
//! - [`detached`](HostTree::detached) fires once for the top element of every
//!   subtree that stops being live because it was moved out of a live tree.
//! - [`closing`](HostTree::closing) and [`closed`](HostTree::closed) fire for
//!   each root closed by [`close_root`](HostTree::close_root).
//!
//! Signals are emitted after the tree lock is released, so slots may query or
//! mutate the tree.

use std::collections::HashSet;

use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};

use crate::error::{HostError, HostResult};
use crate::gateway::ContextId;
use crate::logging::targets;
use crate::signal::Signal;

new_key_type! {
    /// Identifies an element in the host tree.
    ///
    /// This is the opaque platform handle a view exposes as its actual element.
    pub struct ElementId;
}

/// What role an element plays in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// An ordinary element, usually a view's content.
    Plain,
    /// A window-like container that can own other roots and be closed.
    Root,
    /// Top of a tree embedded in a foreign host. Ownership walks stop here.
    HostedRoot,
}

impl ElementKind {
    /// Whether this is a `Root` or a `HostedRoot`.
    pub fn is_any_root(self) -> bool {
        matches!(self, Self::Root | Self::HostedRoot)
    }
}

/// Window state of a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    /// Shown normally.
    #[default]
    Normal,
    /// Minimized.
    Minimized,
}

#[derive(Debug, Clone, Copy)]
struct RootData {
    owner: Option<ElementId>,
    shown: bool,
    enabled: bool,
    window_state: WindowState,
    closed: bool,
}

impl RootData {
    fn new() -> Self {
        Self {
            owner: None,
            shown: false,
            enabled: true,
            window_state: WindowState::Normal,
            closed: false,
        }
    }

    fn is_live(&self) -> bool {
        self.shown && !self.closed
    }
}

struct ElementData {
    name: String,
    kind: ElementKind,
    context: ContextId,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    host: Option<ElementId>,
    hosted: Vec<ElementId>,
    root: Option<RootData>,
}

impl ElementData {
    fn new(kind: ElementKind, context: ContextId, name: String) -> Self {
        Self {
            name,
            kind,
            context,
            parent: None,
            children: Vec::new(),
            host: None,
            hosted: Vec::new(),
            root: kind.is_any_root().then(RootData::new),
        }
    }

    /// The next element up: structural parent first, then host.
    fn up(&self) -> Option<ElementId> {
        self.parent.or(self.host)
    }
}

#[derive(Default)]
struct TreeData {
    elements: SlotMap<ElementId, ElementData>,
    active_root: Option<ElementId>,
}

impl TreeData {
    fn get(&self, id: ElementId) -> HostResult<&ElementData> {
        self.elements.get(id).ok_or(HostError::InvalidElement(id))
    }

    fn get_mut(&mut self, id: ElementId) -> HostResult<&mut ElementData> {
        self.elements.get_mut(id).ok_or(HostError::InvalidElement(id))
    }

    fn root_mut(&mut self, id: ElementId) -> HostResult<&mut RootData> {
        self.get_mut(id)?.root.as_mut().ok_or(HostError::NotARoot(id))
    }

    fn is_live(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            let Some(data) = self.elements.get(current_id) else {
                return false;
            };
            if let Some(root) = &data.root {
                return root.is_live();
            }
            current = data.up();
        }
        false
    }

    /// Pre-order walk over children and hosted elements, including `id`.
    fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(data) = self.elements.get(current) else {
                continue;
            };
            result.push(current);
            for &child in data.hosted.iter().rev().chain(data.children.iter().rev()) {
                stack.push(child);
            }
        }
        result
    }

    fn live_set(&self, elements: &[ElementId]) -> HashSet<ElementId> {
        elements.iter().copied().filter(|&e| self.is_live(e)).collect()
    }

    fn unlink(&mut self, id: ElementId) {
        let (parent, host) = match self.elements.get(id) {
            Some(data) => (data.parent, data.host),
            None => return,
        };
        if let Some(parent_data) = parent.and_then(|p| self.elements.get_mut(p)) {
            parent_data.children.retain(|&child| child != id);
        }
        if let Some(host_data) = host.and_then(|h| self.elements.get_mut(h)) {
            host_data.hosted.retain(|&child| child != id);
        }
        if let Some(data) = self.elements.get_mut(id) {
            data.parent = None;
            data.host = None;
        }
    }

    /// Roots that must close before `root`, deepest first, followed by `root`.
    fn close_order(&self, root: ElementId, order: &mut Vec<ElementId>, seen: &mut HashSet<ElementId>) {
        if !seen.insert(root) {
            return;
        }
        let owned: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|(_, d)| d.root.as_ref().is_some_and(|r| r.owner == Some(root)))
            .map(|(id, _)| id)
            .collect();
        let nested: Vec<ElementId> = self
            .subtree(root)
            .into_iter()
            .skip(1)
            .filter(|&id| self.elements.get(id).is_some_and(|d| d.kind == ElementKind::Root))
            .collect();

        for child in owned.into_iter().chain(nested) {
            self.close_order(child, order, seen);
        }
        if self
            .elements
            .get(root)
            .and_then(|d| d.root.as_ref())
            .is_some_and(|r| !r.closed)
        {
            order.push(root);
        }
    }
}

/// Live-state changes collected while the lock is held.
#[derive(Default)]
struct LiveDiff {
    became_live: Vec<ElementId>,
    detached: Vec<ElementId>,
}

impl LiveDiff {
    /// Record the topmost elements of the subtree whose liveness flipped.
    fn compute(tree: &TreeData, subtree: &[ElementId], before: &HashSet<ElementId>) -> Self {
        let after = tree.live_set(subtree);
        let mut diff = Self::default();
        for &id in subtree {
            let was = before.contains(&id);
            let is = after.contains(&id);
            if was == is {
                continue;
            }
            let parent_flipped = tree
                .elements
                .get(id)
                .and_then(ElementData::up)
                .filter(|up| subtree.contains(up))
                .is_some_and(|up| before.contains(&up) != after.contains(&up) && after.contains(&up) == is);
            if parent_flipped {
                continue;
            }
            if is {
                diff.became_live.push(id);
            } else {
                diff.detached.push(id);
            }
        }
        diff
    }
}

/// The headless element tree shared by a host backend and the lifecycle manager.
pub struct HostTree {
    inner: RwLock<TreeData>,
    became_live: Signal<ElementId>,
    detached: Signal<ElementId>,
    closing: Signal<ElementId>,
    closed: Signal<ElementId>,
}

impl Default for HostTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TreeData::default()),
            became_live: Signal::new(),
            detached: Signal::new(),
            closing: Signal::new(),
            closed: Signal::new(),
        }
    }

    fn create(&self, kind: ElementKind, context: ContextId, name: impl Into<String>) -> ElementId {
        let name = name.into();
        let id = self
            .inner
            .write()
            .elements
            .insert(ElementData::new(kind, context, name.clone()));
        tracing::trace!(target: targets::HOST, ?id, ?kind, %name, "created element");
        id
    }

    /// Create a plain element owned by `context`.
    pub fn create_element(&self, context: ContextId, name: impl Into<String>) -> ElementId {
        self.create(ElementKind::Plain, context, name)
    }

    /// Create a window-like root owned by `context`. Roots start hidden.
    pub fn create_root(&self, context: ContextId, name: impl Into<String>) -> ElementId {
        self.create(ElementKind::Root, context, name)
    }

    /// Create a hosted root owned by `context`. Hosted roots start hidden.
    pub fn create_hosted_root(&self, context: ContextId, name: impl Into<String>) -> ElementId {
        self.create(ElementKind::HostedRoot, context, name)
    }

    /// Signal fired when a subtree becomes live.
    pub fn became_live(&self) -> &Signal<ElementId> {
        &self.became_live
    }

    /// Signal fired when a subtree stops being live without a close.
    pub fn detached(&self) -> &Signal<ElementId> {
        &self.detached
    }

    /// Signal fired before a root closes.
    pub fn closing(&self) -> &Signal<ElementId> {
        &self.closing
    }

    /// Signal fired after a root closed.
    pub fn closed(&self) -> &Signal<ElementId> {
        &self.closed
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Attach `child` beneath `parent`, moving it out of any previous parent or host.
    #[tracing::instrument(skip(self), target = "horizon_compose::host", level = "trace")]
    pub fn attach(&self, child: ElementId, parent: ElementId) -> HostResult<()> {
        let diff = {
            let mut tree = self.inner.write();
            tree.get(child)?;
            tree.get(parent)?;
            let subtree = tree.subtree(child);
            if subtree.contains(&parent) {
                return Err(HostError::CircularParentage(child));
            }
            let before = tree.live_set(&subtree);

            tree.unlink(child);
            tree.get_mut(child)?.parent = Some(parent);
            tree.get_mut(parent)?.children.push(child);

            LiveDiff::compute(&tree, &subtree, &before)
        };
        self.emit_diff(diff);
        Ok(())
    }

    /// Host `element` inside `host` through the logical hosting chain.
    #[tracing::instrument(skip(self), target = "horizon_compose::host", level = "trace")]
    pub fn set_host(&self, element: ElementId, host: ElementId) -> HostResult<()> {
        let diff = {
            let mut tree = self.inner.write();
            tree.get(element)?;
            tree.get(host)?;
            let subtree = tree.subtree(element);
            if subtree.contains(&host) {
                return Err(HostError::CircularParentage(element));
            }
            let before = tree.live_set(&subtree);

            tree.unlink(element);
            tree.get_mut(element)?.host = Some(host);
            tree.get_mut(host)?.hosted.push(element);

            LiveDiff::compute(&tree, &subtree, &before)
        };
        self.emit_diff(diff);
        Ok(())
    }

    /// Detach an element from its parent and host.
    #[tracing::instrument(skip(self), target = "horizon_compose::host", level = "trace")]
    pub fn detach(&self, element: ElementId) -> HostResult<()> {
        let diff = {
            let mut tree = self.inner.write();
            tree.get(element)?;
            let subtree = tree.subtree(element);
            let before = tree.live_set(&subtree);
            tree.unlink(element);
            LiveDiff::compute(&tree, &subtree, &before)
        };
        self.emit_diff(diff);
        Ok(())
    }

    /// Remove an element and everything beneath it from the tree.
    ///
    /// No signals are emitted; close or detach first if observers care.
    pub fn destroy(&self, element: ElementId) -> HostResult<()> {
        let mut tree = self.inner.write();
        tree.get(element)?;
        let subtree = tree.subtree(element);
        tree.unlink(element);
        for id in subtree {
            tree.elements.remove(id);
            if tree.active_root == Some(id) {
                tree.active_root = None;
            }
        }
        tracing::trace!(target: targets::HOST, ?element, "destroyed element tree");
        Ok(())
    }

    fn emit_diff(&self, diff: LiveDiff) {
        for id in diff.detached {
            tracing::trace!(target: targets::HOST, ?id, "subtree detached");
            self.detached.emit(id);
        }
        for id in diff.became_live {
            tracing::trace!(target: targets::HOST, ?id, "subtree became live");
            self.became_live.emit(id);
        }
    }

    // =========================================================================
    // Roots
    // =========================================================================

    /// Show a root (or hosted root), making its tree live.
    #[tracing::instrument(skip(self), target = "horizon_compose::host", level = "debug")]
    pub fn show_root(&self, root: ElementId) -> HostResult<()> {
        let diff = {
            let mut tree = self.inner.write();
            let subtree = tree.subtree(root);
            let before = tree.live_set(&subtree);
            let data = tree.root_mut(root)?;
            if data.closed {
                return Ok(());
            }
            data.shown = true;
            LiveDiff::compute(&tree, &subtree, &before)
        };
        self.emit_diff(diff);
        Ok(())
    }

    /// Close a root together with the roots it owns and nests.
    ///
    /// Returns the roots closed, in closing order (owned and nested roots
    /// before their owner). Closing an already closed root returns an empty
    /// list.
    #[tracing::instrument(skip(self), target = "horizon_compose::host", level = "debug")]
    pub fn close_root(&self, root: ElementId) -> HostResult<Vec<ElementId>> {
        let order = {
            let tree = self.inner.read();
            if tree.get(root)?.kind != ElementKind::Root {
                return Err(HostError::NotARoot(root));
            }
            let mut order = Vec::new();
            tree.close_order(root, &mut order, &mut HashSet::new());
            order
        };

        for &id in &order {
            self.closing.emit(id);
            {
                let mut tree = self.inner.write();
                if let Ok(data) = tree.root_mut(id) {
                    data.closed = true;
                    data.shown = false;
                }
                if tree.active_root == Some(id) {
                    tree.active_root = None;
                }
            }
            tracing::debug!(target: targets::HOST, ?id, "root closed");
            self.closed.emit(id);
        }

        Ok(order)
    }

    /// Make `owner` the owning root of `root`.
    pub fn set_owner(&self, root: ElementId, owner: Option<ElementId>) -> HostResult<()> {
        let mut tree = self.inner.write();
        if let Some(owner) = owner {
            tree.get(owner)?.root.ok_or(HostError::NotARoot(owner))?;
            let mut current = Some(owner);
            while let Some(id) = current {
                if id == root {
                    return Err(HostError::CircularParentage(root));
                }
                current = tree.get(id)?.root.and_then(|r| r.owner);
            }
        }
        tree.root_mut(root)?.owner = owner;
        Ok(())
    }

    /// Enable or disable input on a root.
    pub fn set_enabled(&self, root: ElementId, enabled: bool) -> HostResult<()> {
        self.inner.write().root_mut(root)?.enabled = enabled;
        tracing::trace!(target: targets::HOST, ?root, enabled, "root input state changed");
        Ok(())
    }

    /// Minimize a root.
    pub fn minimize(&self, root: ElementId) -> HostResult<()> {
        let mut tree = self.inner.write();
        tree.root_mut(root)?.window_state = WindowState::Minimized;
        if tree.active_root == Some(root) {
            tree.active_root = None;
        }
        Ok(())
    }

    /// Restore and activate a root.
    pub fn activate(&self, root: ElementId) -> HostResult<()> {
        let mut tree = self.inner.write();
        tree.root_mut(root)?.window_state = WindowState::Normal;
        tree.active_root = Some(root);
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether the element exists.
    pub fn contains(&self, id: ElementId) -> bool {
        self.inner.read().elements.contains_key(id)
    }

    /// Whether the element is part of a shown, open tree.
    pub fn is_live(&self, id: ElementId) -> bool {
        self.inner.read().is_live(id)
    }

    /// The element's kind.
    pub fn kind(&self, id: ElementId) -> HostResult<ElementKind> {
        Ok(self.inner.read().get(id)?.kind)
    }

    /// The element's debug name.
    pub fn name(&self, id: ElementId) -> HostResult<String> {
        Ok(self.inner.read().get(id)?.name.clone())
    }

    /// The context that owns the element.
    pub fn context(&self, id: ElementId) -> HostResult<ContextId> {
        Ok(self.inner.read().get(id)?.context)
    }

    /// Structural parent.
    pub fn parent(&self, id: ElementId) -> HostResult<Option<ElementId>> {
        Ok(self.inner.read().get(id)?.parent)
    }

    /// Logical host.
    pub fn host(&self, id: ElementId) -> HostResult<Option<ElementId>> {
        Ok(self.inner.read().get(id)?.host)
    }

    /// Structural children.
    pub fn children(&self, id: ElementId) -> HostResult<Vec<ElementId>> {
        Ok(self.inner.read().get(id)?.children.clone())
    }

    /// Elements hosted by this one.
    pub fn hosted(&self, id: ElementId) -> HostResult<Vec<ElementId>> {
        Ok(self.inner.read().get(id)?.hosted.clone())
    }

    /// The element and everything beneath it, pre-order.
    pub fn subtree(&self, id: ElementId) -> HostResult<Vec<ElementId>> {
        let tree = self.inner.read();
        tree.get(id)?;
        Ok(tree.subtree(id))
    }

    /// Owner of a root.
    pub fn owner(&self, root: ElementId) -> HostResult<Option<ElementId>> {
        let tree = self.inner.read();
        let data = tree.get(root)?.root.ok_or(HostError::NotARoot(root))?;
        Ok(data.owner)
    }

    /// Roots directly owned by `root`.
    pub fn owned_roots(&self, root: ElementId) -> Vec<ElementId> {
        self.inner
            .read()
            .elements
            .iter()
            .filter(|(_, d)| d.root.as_ref().is_some_and(|r| r.owner == Some(root)))
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether input is enabled on a root.
    pub fn is_enabled(&self, root: ElementId) -> HostResult<bool> {
        let tree = self.inner.read();
        Ok(tree.get(root)?.root.ok_or(HostError::NotARoot(root))?.enabled)
    }

    /// Whether a root has been closed.
    pub fn is_closed(&self, root: ElementId) -> HostResult<bool> {
        let tree = self.inner.read();
        Ok(tree.get(root)?.root.ok_or(HostError::NotARoot(root))?.closed)
    }

    /// Window state of a root.
    pub fn window_state(&self, root: ElementId) -> HostResult<WindowState> {
        let tree = self.inner.read();
        Ok(tree.get(root)?.root.ok_or(HostError::NotARoot(root))?.window_state)
    }

    /// The most recently activated root, if it is still open and not minimized.
    pub fn active_root(&self) -> Option<ElementId> {
        self.inner.read().active_root
    }

    /// Elements with neither parent nor host.
    pub fn top_level(&self) -> Vec<ElementId> {
        self.inner
            .read()
            .elements
            .iter()
            .filter(|(_, d)| d.parent.is_none() && d.host.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of elements in the tree.
    pub fn element_count(&self) -> usize {
        self.inner.read().elements.len()
    }
}

static_assertions::assert_impl_all!(HostTree: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ContextConfig, UiContext};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn context() -> ContextId {
        // Only the ID matters for tree bookkeeping.
        let ctx = UiContext::start(ContextConfig::default().with_thread_name("host-test")).unwrap();
        ctx.id()
    }

    fn record(signal: &Signal<ElementId>) -> Arc<Mutex<Vec<ElementId>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        signal.connect(move |id| log_clone.lock().push(*id));
        log
    }

    #[test]
    fn test_attach_under_hidden_root_is_not_live() {
        let ctx = context();
        let tree = HostTree::new();
        let root = tree.create_root(ctx, "window");
        let child = tree.create_element(ctx, "view");

        tree.attach(child, root).unwrap();
        assert!(!tree.is_live(child));
        assert_eq!(tree.parent(child).unwrap(), Some(root));
        assert_eq!(tree.children(root).unwrap(), vec![child]);
    }

    #[test]
    fn test_show_root_emits_became_live_once() {
        let ctx = context();
        let tree = HostTree::new();
        let live = record(tree.became_live());

        let root = tree.create_root(ctx, "window");
        let child = tree.create_element(ctx, "view");
        let grandchild = tree.create_element(ctx, "inner");
        tree.attach(child, root).unwrap();
        tree.attach(grandchild, child).unwrap();

        tree.show_root(root).unwrap();
        assert!(tree.is_live(grandchild));
        assert_eq!(*live.lock(), vec![root]);
    }

    #[test]
    fn test_attach_into_live_tree_and_detach() {
        let ctx = context();
        let tree = HostTree::new();
        let live = record(tree.became_live());
        let detached = record(tree.detached());

        let root = tree.create_root(ctx, "window");
        tree.show_root(root).unwrap();
        let view = tree.create_element(ctx, "view");
        let inner = tree.create_element(ctx, "inner");
        tree.attach(inner, view).unwrap();

        tree.attach(view, root).unwrap();
        assert_eq!(live.lock().last(), Some(&view));

        tree.detach(view).unwrap();
        assert!(!tree.is_live(inner));
        assert_eq!(*detached.lock(), vec![view]);
    }

    #[test]
    fn test_hosting_chain_liveness() {
        let ctx = context();
        let tree = HostTree::new();
        let root = tree.create_root(ctx, "window");
        let presenter = tree.create_element(ctx, "presenter");
        let view = tree.create_element(ctx, "view");
        tree.attach(presenter, root).unwrap();
        tree.set_host(view, presenter).unwrap();
        tree.show_root(root).unwrap();

        assert!(tree.is_live(view));
        assert_eq!(tree.host(view).unwrap(), Some(presenter));
        assert_eq!(tree.subtree(root).unwrap(), vec![root, presenter, view]);
    }

    #[test]
    fn test_circular_attach_rejected() {
        let ctx = context();
        let tree = HostTree::new();
        let a = tree.create_element(ctx, "a");
        let b = tree.create_element(ctx, "b");
        tree.attach(b, a).unwrap();

        assert_eq!(tree.attach(a, b), Err(HostError::CircularParentage(a)));
        assert_eq!(tree.attach(a, a), Err(HostError::CircularParentage(a)));
    }

    #[test]
    fn test_close_root_closes_owned_and_nested_first() {
        let ctx = context();
        let tree = HostTree::new();
        let closed = record(tree.closed());

        let main = tree.create_root(ctx, "main");
        let dialog = tree.create_root(ctx, "dialog");
        let nested = tree.create_root(ctx, "nested");
        tree.set_owner(dialog, Some(main)).unwrap();
        tree.attach(nested, main).unwrap();
        for root in [main, dialog, nested] {
            tree.show_root(root).unwrap();
        }

        let order = tree.close_root(main).unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order.last(), Some(&main));
        assert_eq!(*closed.lock(), order);
        assert!(tree.is_closed(dialog).unwrap());

        // Second close is a no-op.
        assert!(tree.close_root(main).unwrap().is_empty());
    }

    #[test]
    fn test_close_requires_root() {
        let ctx = context();
        let tree = HostTree::new();
        let plain = tree.create_element(ctx, "plain");
        let hosted = tree.create_hosted_root(ctx, "hosted");

        assert_eq!(tree.close_root(plain), Err(HostError::NotARoot(plain)));
        assert_eq!(tree.close_root(hosted), Err(HostError::NotARoot(hosted)));
    }

    #[test]
    fn test_owner_cycle_rejected() {
        let ctx = context();
        let tree = HostTree::new();
        let a = tree.create_root(ctx, "a");
        let b = tree.create_root(ctx, "b");
        tree.set_owner(b, Some(a)).unwrap();

        assert_eq!(tree.set_owner(a, Some(b)), Err(HostError::CircularParentage(a)));
        assert_eq!(tree.owned_roots(a), vec![b]);
    }

    #[test]
    fn test_window_state() {
        let ctx = context();
        let tree = HostTree::new();
        let root = tree.create_root(ctx, "window");

        tree.activate(root).unwrap();
        assert_eq!(tree.active_root(), Some(root));
        tree.minimize(root).unwrap();
        assert_eq!(tree.window_state(root).unwrap(), WindowState::Minimized);
        assert_eq!(tree.active_root(), None);

        tree.set_enabled(root, false).unwrap();
        assert!(!tree.is_enabled(root).unwrap());
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let ctx = context();
        let tree = HostTree::new();
        let root = tree.create_root(ctx, "window");
        let child = tree.create_element(ctx, "view");
        tree.attach(child, root).unwrap();

        tree.destroy(root).unwrap();
        assert!(!tree.contains(child));
        assert_eq!(tree.element_count(), 0);
    }
}
