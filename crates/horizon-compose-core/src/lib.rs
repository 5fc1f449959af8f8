//! Core systems for Horizon Compose.
//!
//! This crate provides the foundation the view/view-model lifecycle manager
//! is built on:
//!
//! - **UI Contexts**: one thread plus cooperative executor per view tree
//! - **Gateway**: marshals work onto the context that owns it
//! - **Host Tree**: headless element tree with roots, hosting chains,
//!   liveness and close notifications
//! - **Signal/Slot System**: notifications for host events
//! - **Thread Checks**: affinity assertions for context-owned state
//!
//! # Example
//!
//! ```no_run
//! use horizon_compose_core::{ContextConfig, Gateway, HostTree};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::new(ContextConfig::default())?;
//! let tree = HostTree::new();
//!
//! let window = tree.create_root(gateway.primary(), "main-window");
//! tree.became_live().connect(|id| println!("{id:?} is live"));
//! tree.show_root(window)?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod gateway;
pub mod host;
pub mod logging;
pub mod signal;
pub mod thread_check;

pub use error::{GatewayError, HostError, HostResult};
pub use gateway::{ContextConfig, ContextId, Gateway, UiContext};
pub use host::{ElementId, ElementKind, HostTree, WindowState};
pub use logging::{HostTreeDebug, PerfSpan, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use thread_check::ThreadAffinity;
