//! Ownership resolution.
//!
//! The owner of a view is the nearest window-like root above it. The walk
//! prefers the logical hosting chain over the structural parent chain:
//!
//! 1. the element is itself a root: it owns itself;
//! 2. the element is hosted: the host's owner, if one is found;
//! 3. otherwise the structural parent's owner.
//!
//! Reaching a hosted root ends the walk with no owner: a tree embedded in a
//! foreign host has no container that could close it. Ownership is computed
//! on demand and never cached, so re-parenting is always reflected.

use std::sync::Arc;

use horizon_compose_core::{ElementId, ElementKind, HostResult, HostTree};

/// Outcome of a partial ownership walk.
enum Walk {
    Found(ElementId),
    Hosted,
    NotFound,
}

/// Resolves the owning root of host elements.
#[derive(Clone)]
pub struct OwnershipTracker {
    host: Arc<HostTree>,
}

impl OwnershipTracker {
    /// Create a tracker over a host tree.
    pub fn new(host: Arc<HostTree>) -> Self {
        Self { host }
    }

    /// The nearest owning root of `element`, or `None` if it is rootless.
    pub fn owning_root(&self, element: ElementId) -> HostResult<Option<ElementId>> {
        Ok(match self.walk(element)? {
            Walk::Found(root) => Some(root),
            Walk::Hosted | Walk::NotFound => None,
        })
    }

    fn walk(&self, element: ElementId) -> HostResult<Walk> {
        match self.host.kind(element)? {
            ElementKind::Root => return Ok(Walk::Found(element)),
            ElementKind::HostedRoot => return Ok(Walk::Hosted),
            ElementKind::Plain => {}
        }

        if let Some(host) = self.host.host(element)? {
            match self.walk(host)? {
                Walk::NotFound => {}
                done => return Ok(done),
            }
        }

        match self.host.parent(element)? {
            Some(parent) => self.walk(parent),
            None => Ok(Walk::NotFound),
        }
    }
}

impl std::fmt::Debug for OwnershipTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnershipTracker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_compose_core::{ContextConfig, ContextId, UiContext};

    fn setup() -> (UiContext, ContextId, Arc<HostTree>, OwnershipTracker) {
        let ctx = UiContext::start(ContextConfig::default().with_thread_name("ownership-test")).unwrap();
        let id = ctx.id();
        let host = Arc::new(HostTree::new());
        let tracker = OwnershipTracker::new(host.clone());
        (ctx, id, host, tracker)
    }

    #[test]
    fn test_root_owns_itself() {
        let (_ctx, cx, host, tracker) = setup();
        let root = host.create_root(cx, "window");
        assert_eq!(tracker.owning_root(root).unwrap(), Some(root));
    }

    #[test]
    fn test_parent_chain() {
        let (_ctx, cx, host, tracker) = setup();
        let root = host.create_root(cx, "window");
        let panel = host.create_element(cx, "panel");
        let view = host.create_element(cx, "view");
        host.attach(panel, root).unwrap();
        host.attach(view, panel).unwrap();
        assert_eq!(tracker.owning_root(view).unwrap(), Some(root));
    }

    #[test]
    fn test_hosting_chain() {
        let (_ctx, cx, host, tracker) = setup();
        let inner = host.create_root(cx, "inner");
        let presenter = host.create_element(cx, "presenter");
        let view = host.create_element(cx, "view");
        host.attach(presenter, inner).unwrap();
        host.set_host(view, presenter).unwrap();
        assert_eq!(host.parent(view).unwrap(), None);
        assert_eq!(tracker.owning_root(view).unwrap(), Some(inner));
    }

    #[test]
    fn test_hosted_root_is_rootless() {
        let (_ctx, cx, host, tracker) = setup();
        let hosted = host.create_hosted_root(cx, "foreign");
        let view = host.create_element(cx, "view");
        host.attach(view, hosted).unwrap();
        assert_eq!(tracker.owning_root(view).unwrap(), None);
    }

    #[test]
    fn test_detached_is_rootless() {
        let (_ctx, cx, host, tracker) = setup();
        let view = host.create_element(cx, "view");
        assert_eq!(tracker.owning_root(view).unwrap(), None);
    }
}
