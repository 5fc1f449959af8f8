//! UI contexts and the thread-affinity gateway.
//!
//! A [`UiContext`] is one UI thread: a dedicated, named OS thread driving a
//! Tokio current-thread runtime. Work spawned onto it runs cooperatively, so a
//! task that awaits (a view-model's `on_load`, a modal dialog waiting for its
//! result) lets the context keep processing other queued work.
//!
//! The [`Gateway`] owns the contexts of an application and is the only
//! sanctioned way to run code on one of them:
//!
//! - [`Gateway::run_on`] marshals a closure onto a context and resolves to its
//!   output. Called from the context's own thread it runs inline instead.
//! - [`Gateway::post`] is the fire-and-forget variant used by signal slots.
//!   Posted work is tracked, and [`Gateway::settle`] waits for all of it.
//!
//! # Example
//!
//! ```no_run
//! use horizon_compose_core::gateway::{ContextConfig, Gateway};
//!
//! # async fn demo() -> Result<(), horizon_compose_core::GatewayError> {
//! let gateway = Gateway::new(ContextConfig::default())?;
//! let thread = gateway
//!     .run_on(gateway.primary(), || async { std::thread::current().name().map(str::to_owned) })
//!     .await?;
//! assert_eq!(thread.as_deref(), Some("horizon-ui"));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;

use crate::error::GatewayError;
use crate::logging::targets;
use crate::thread_check::ThreadAffinity;

/// Counter for unique context IDs.
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a UI context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Get the raw u64 value of this context ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Configuration for a UI context thread.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Name given to the context's OS thread.
    pub thread_name: String,
    /// Enable the Tokio time driver (needed for `tokio::time` inside hooks).
    pub enable_time: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            thread_name: "horizon-ui".to_string(),
            enable_time: true,
        }
    }
}

impl ContextConfig {
    /// Set the thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// A single UI thread with a cooperative executor.
pub struct UiContext {
    id: ContextId,
    name: String,
    handle: Handle,
    affinity: ThreadAffinity,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl UiContext {
    /// Start a new context thread.
    pub fn start(config: ContextConfig) -> Result<Self, GatewayError> {
        let id = ContextId::next();
        let enable_time = config.enable_time;

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<Handle, String>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let mut builder = Builder::new_current_thread();
                if enable_time {
                    builder.enable_time();
                }

                let runtime = match builder.build() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(runtime.handle().clone()));

                // Drive spawned work until shutdown is requested.
                runtime.block_on(async {
                    let _ = shutdown_rx.await;
                });
                tracing::debug!(target: targets::GATEWAY, ?id, "context loop exited");
            })
            .map_err(|e| GatewayError::SpawnFailed(e.to_string()))?;

        let handle = ready_rx
            .recv()
            .map_err(|_| GatewayError::SpawnFailed("context thread exited during startup".to_string()))?
            .map_err(GatewayError::SpawnFailed)?;

        let affinity = ThreadAffinity::for_thread(thread.thread().id());
        tracing::debug!(target: targets::GATEWAY, ?id, name = %config.thread_name, "started UI context");

        Ok(Self {
            id,
            name: config.thread_name,
            handle,
            affinity,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            thread: Mutex::new(Some(thread)),
        })
    }

    /// This context's ID.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The context's thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Affinity of the context thread.
    pub fn affinity(&self) -> ThreadAffinity {
        self.affinity
    }

    /// Whether the caller is running on this context's thread.
    pub fn is_current(&self) -> bool {
        self.affinity.is_same_thread()
    }

    /// Spawn a future onto the context.
    pub fn spawn<Fut>(&self, future: Fut) -> tokio::task::JoinHandle<Fut::Output>
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Run `f` on this context and await its output.
    ///
    /// Runs inline when already on the context's thread. A panic in the
    /// spawned case is reported as [`GatewayError::TaskPanicked`].
    pub async fn run<F, Fut, T>(&self, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_current() {
            return Ok(f().await);
        }

        let id = self.id;
        self.spawn(async move { f().await })
            .await
            .map_err(|err| join_error(id, err))
    }

    /// Stop the context thread.
    ///
    /// Work still pending on the context is dropped. Calling this from the
    /// context itself stops the loop without joining the thread.
    pub fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
        let thread = self.thread.lock().take();
        if let Some(thread) = thread {
            if self.is_current() {
                return;
            }
            let _ = thread.join();
            tracing::debug!(target: targets::GATEWAY, id = ?self.id, "UI context stopped");
        }
    }
}

impl Drop for UiContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

fn join_error(id: ContextId, err: tokio::task::JoinError) -> GatewayError {
    if err.is_panic() {
        GatewayError::TaskPanicked(id)
    } else {
        GatewayError::ContextStopped(id)
    }
}

/// Routes work onto the UI context that owns it.
pub struct Gateway {
    primary: ContextId,
    contexts: RwLock<HashMap<ContextId, Arc<UiContext>>>,
    pending: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl Gateway {
    /// Create a gateway with a freshly started primary context.
    pub fn new(config: ContextConfig) -> Result<Self, GatewayError> {
        Ok(Self::with_primary(UiContext::start(config)?))
    }

    /// Create a gateway around an existing primary context.
    pub fn with_primary(context: UiContext) -> Self {
        let primary = context.id();
        let mut contexts = HashMap::new();
        contexts.insert(primary, Arc::new(context));
        Self {
            primary,
            contexts: RwLock::new(contexts),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The primary context, which owns the shell.
    pub fn primary(&self) -> ContextId {
        self.primary
    }

    /// Start an additional context and register it.
    pub fn add_context(&self, config: ContextConfig) -> Result<ContextId, GatewayError> {
        let context = UiContext::start(config)?;
        let id = context.id();
        self.contexts.write().insert(id, Arc::new(context));
        Ok(id)
    }

    /// Look up a context.
    pub fn context(&self, id: ContextId) -> Result<Arc<UiContext>, GatewayError> {
        self.contexts
            .read()
            .get(&id)
            .cloned()
            .ok_or(GatewayError::UnknownContext(id))
    }

    /// All registered context IDs.
    pub fn context_ids(&self) -> Vec<ContextId> {
        let mut ids: Vec<_> = self.contexts.read().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Whether the caller is on the given context's thread.
    pub fn is_on(&self, id: ContextId) -> bool {
        self.contexts
            .read()
            .get(&id)
            .is_some_and(|context| context.is_current())
    }

    /// Run `f` on the given context and await its output.
    #[tracing::instrument(skip(self, f), target = "horizon_compose::gateway", level = "trace")]
    pub async fn run_on<F, Fut, T>(&self, context: ContextId, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let target = self.context(context)?;
        target.run(f).await
    }

    /// Spawn tracked fire-and-forget work on the given context.
    pub fn post<Fut>(&self, context: ContextId, future: Fut) -> Result<(), GatewayError>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let target = self.context(context)?;
        let handle = target.spawn(future);
        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
        Ok(())
    }

    /// Number of posted tasks that have not finished yet.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait until all posted work, including work posted while waiting, has finished.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.pending.lock());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    if err.is_panic() {
                        tracing::warn!(target: targets::GATEWAY, "posted task panicked");
                    }
                }
            }
        }
    }

    /// Stop every context.
    pub fn shutdown(&self) {
        let contexts: Vec<_> = self.contexts.read().values().cloned().collect();
        for context in contexts {
            context.shutdown();
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("primary", &self.primary)
            .field("contexts", &self.context_ids())
            .finish()
    }
}

static_assertions::assert_impl_all!(Gateway: Send, Sync);
