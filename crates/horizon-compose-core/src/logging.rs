//! Logging and debugging facilities for Horizon Compose.
//!
//! This module provides:
//! - Target names for the `tracing` instrumentation used throughout the crates
//! - [`compose_debug!`](crate::compose_debug) for logging under the framework target
//! - [`HostTreeDebug`] for rendering the host element tree
//! - [`PerfSpan`] for timing operations
//!
//! # Tracing Integration
//!
//! Nothing is printed unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_compose::lifecycle=debug")
//!     .init();
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::error::HostResult;
use crate::host::{ElementId, ElementKind, HostTree};

/// Target names for log filtering.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_compose";
    /// UI contexts and the gateway.
    pub const GATEWAY: &str = "horizon_compose::gateway";
    /// Host element tree.
    pub const HOST: &str = "horizon_compose::host";
    /// Signal emission.
    pub const SIGNAL: &str = "horizon_compose::signal";
    /// View registry.
    pub const REGISTRY: &str = "horizon_compose::registry";
    /// View resolution.
    pub const RESOLVER: &str = "horizon_compose::resolver";
    /// Lifecycle coordinator.
    pub const LIFECYCLE: &str = "horizon_compose::lifecycle";
    /// Modal stack.
    pub const MODAL: &str = "horizon_compose::modal";
    /// Performance spans.
    pub const PERF: &str = "horizon_compose::perf";
}

/// Style options for host tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact dashes.
    Compact,
}

/// Configuration for host tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show element IDs.
    pub show_ids: bool,
    /// Whether to show element kinds and root state.
    pub show_kinds: bool,
    /// Whether to show the owning context.
    pub show_context: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            show_context: false,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Options for minimal output: names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            ..Default::default()
        }
    }
}

/// Renders a [`HostTree`] in a human-readable form.
#[derive(Debug, Clone, Default)]
pub struct HostTreeDebug {
    options: TreeFormatOptions,
}

impl HostTreeDebug {
    /// Create a visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every top-level element and its subtree.
    pub fn format_all(&self, tree: &HostTree) -> HostResult<String> {
        let top = tree.top_level();
        let mut output = String::new();
        let _ = writeln!(output, "Host Tree ({} elements):", tree.element_count());
        if top.is_empty() {
            let _ = writeln!(output, "  (empty)");
        }
        for id in top {
            self.format_into(tree, id, 0, "", &mut output)?;
        }
        Ok(output)
    }

    /// Format one subtree.
    pub fn format_subtree(&self, tree: &HostTree, root: ElementId) -> HostResult<String> {
        let mut output = String::new();
        self.format_into(tree, root, 0, "", &mut output)?;
        Ok(output)
    }

    fn format_into(
        &self,
        tree: &HostTree,
        id: ElementId,
        depth: usize,
        link: &str,
        output: &mut String,
    ) -> HostResult<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        output.push_str(&self.prefix(depth));
        output.push_str(link);

        let name = tree.name(id)?;
        output.push_str(if name.is_empty() { "(unnamed)" } else { &name });

        if self.options.show_ids {
            let _ = write!(output, " [{:?}]", id);
        }
        if self.options.show_kinds {
            match tree.kind(id)? {
                ElementKind::Plain => {}
                ElementKind::Root => {
                    let state = if tree.is_closed(id)? {
                        "closed"
                    } else if tree.is_live(id) {
                        "shown"
                    } else {
                        "hidden"
                    };
                    let _ = write!(output, " (root, {state})");
                }
                ElementKind::HostedRoot => output.push_str(" (hosted root)"),
            }
        }
        if self.options.show_context {
            let _ = write!(output, " @{:?}", tree.context(id)?);
        }
        output.push('\n');

        for child in tree.children(id)? {
            self.format_into(tree, child, depth + 1, "", output)?;
        }
        for hosted in tree.hosted(id)? {
            self.format_into(tree, hosted, depth + 1, "hosts ", output)?;
        }
        Ok(())
    }

    fn prefix(&self, depth: usize) -> String {
        if depth == 0 {
            return String::new();
        }
        let (branch, corner) = match self.options.style {
            TreeStyle::Ascii => ("|  ", "+-- "),
            TreeStyle::Unicode => ("\u{2502}  ", "\u{251c}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("  ", "- "),
        };
        let mut prefix = branch.repeat(depth - 1);
        prefix.push_str(corner);
        prefix
    }
}

/// Wraps a tree so it can be used with `{}`.
pub struct DisplayTree<'a>(pub &'a HostTree);

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match HostTreeDebug::new().format_all(self.0) {
            Ok(output) => write!(f, "{output}"),
            Err(e) => write!(f, "Error formatting host tree: {e}"),
        }
    }
}

/// A guard that keeps a tracing span entered until dropped.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self { span: span.entered() }
    }
}

/// Log at debug level under the framework target.
#[macro_export]
macro_rules! compose_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ContextConfig, UiContext};

    fn tree() -> (HostTree, ElementId, ElementId) {
        let ctx = UiContext::start(ContextConfig::default().with_thread_name("log-test")).unwrap();
        let tree = HostTree::new();
        let root = tree.create_root(ctx.id(), "window");
        let view = tree.create_element(ctx.id(), "settings-view");
        tree.attach(view, root).unwrap();
        tree.show_root(root).unwrap();
        (tree, root, view)
    }

    #[test]
    fn test_format_all() {
        let (tree, _, _) = tree();
        let output = HostTreeDebug::new().format_all(&tree).unwrap();
        assert!(output.starts_with("Host Tree (2 elements)"));
        assert!(output.contains("window"));
        assert!(output.contains("(root, shown)"));
        assert!(output.contains("settings-view"));
    }

    #[test]
    fn test_format_minimal() {
        let (tree, root, _) = tree();
        let output = HostTreeDebug::with_options(TreeFormatOptions::minimal())
            .format_subtree(&tree, root)
            .unwrap();
        assert!(!output.contains('['));
        assert!(!output.contains("root,"));
        assert!(output.contains("settings-view"));
    }

    #[test]
    fn test_display_empty_tree() {
        let tree = HostTree::new();
        assert!(DisplayTree(&tree).to_string().contains("(empty)"));
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }

    #[test]
    fn test_targets_nest_under_core() {
        for target in [
            targets::GATEWAY,
            targets::HOST,
            targets::SIGNAL,
            targets::REGISTRY,
            targets::RESOLVER,
            targets::LIFECYCLE,
            targets::MODAL,
            targets::PERF,
        ] {
            assert!(target.starts_with(targets::CORE));
            assert_eq!(&target[targets::CORE.len()..targets::CORE.len() + 2], "::");
        }
        crate::compose_debug!(elements = 0, "logging targets checked");
    }
}
