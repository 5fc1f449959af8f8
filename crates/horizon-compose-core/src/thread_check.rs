//! Thread affinity verification for UI contexts.
//!
//! Every [`UiContext`](crate::gateway::UiContext) runs on exactly one thread.
//! State that must only be touched from that thread records a
//! [`ThreadAffinity`] and asserts it before mutating:
//!
//! ```
//! use horizon_compose_core::thread_check::ThreadAffinity;
//!
//! struct Index {
//!     affinity: ThreadAffinity,
//!     entries: std::cell::Cell<usize>,
//! }
//!
//! impl Index {
//!     fn insert(&self) {
//!         self.affinity.debug_assert_same_thread();
//!         self.entries.set(self.entries.get() + 1);
//!     }
//! }
//!
//! let index = Index { affinity: ThreadAffinity::current(), entries: Default::default() };
//! index.insert();
//! ```
//!
//! Checks come in two strengths: [`ThreadAffinity::assert_same_thread`] is
//! always active, [`ThreadAffinity::debug_assert_same_thread`] compiles away in
//! release builds. Both can be silenced at runtime with
//! [`set_thread_checks_enabled`], which tests use when they deliberately poke
//! at state from the test thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::ThreadId;

/// Flag to enable/disable runtime thread checks globally.
static THREAD_CHECKS_ENABLED: AtomicBool = AtomicBool::new(cfg!(debug_assertions));

/// Enable or disable runtime thread checks.
///
/// Checks are enabled by default in debug builds and disabled in release builds.
pub fn set_thread_checks_enabled(enabled: bool) {
    THREAD_CHECKS_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Check if runtime thread checks are currently enabled.
#[inline]
pub fn are_thread_checks_enabled() -> bool {
    THREAD_CHECKS_ENABLED.load(Ordering::Relaxed)
}

/// Records the thread a piece of state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Affinity for the calling thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// Affinity for an explicit thread.
    #[inline]
    pub fn for_thread(thread_id: ThreadId) -> Self {
        Self { thread_id }
    }

    /// The thread this affinity is bound to.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Whether the calling thread matches this affinity.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Assert that we are on the bound thread.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message if called from another thread while
    /// thread checks are enabled.
    #[inline]
    pub fn assert_same_thread(&self) {
        self.assert_same_thread_with_msg("state accessed outside its owning UI context")
    }

    /// Assert that we are on the bound thread, with a custom message.
    ///
    /// # Panics
    ///
    /// Panics if called from another thread while thread checks are enabled.
    pub fn assert_same_thread_with_msg(&self, msg: &str) {
        if are_thread_checks_enabled() && !self.is_same_thread() {
            self.panic_wrong_thread(msg);
        }
    }

    /// Debug-only assertion that we are on the bound thread.
    #[inline]
    pub fn debug_assert_same_thread(&self) {
        #[cfg(debug_assertions)]
        self.assert_same_thread();
    }

    /// Debug-only assertion with a custom message.
    #[inline]
    pub fn debug_assert_same_thread_with_msg(&self, msg: &str) {
        #[cfg(debug_assertions)]
        self.assert_same_thread_with_msg(msg);
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self, msg: &str) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();

        panic!(
            "\n\
            ══════════════════════════════════════════════════════════════════════\n\
            UI CONTEXT AFFINITY VIOLATION\n\
            ══════════════════════════════════════════════════════════════════════\n\
            \n\
            {msg}\n\
            \n\
            Owning thread: {:?}\n\
            Current thread: \"{current_name}\" (ID: {current_id:?})\n\
            \n\
            Registry, lifecycle and modal state may only be mutated on the UI\n\
            context that owns the view tree.\n\
            \n\
            POSSIBLE SOLUTIONS:\n\
            \n\
            1. Marshal the work with Gateway::run_on(context, || async {{ ... }})\n\
            2. Go through LifecycleManager, which marshals for you\n\
            \n\
            ══════════════════════════════════════════════════════════════════════",
            self.thread_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_thread_affinity_same_thread() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_same_thread());
        affinity.assert_same_thread();
    }

    #[test]
    fn test_thread_affinity_different_thread() {
        let affinity = ThreadAffinity::current();
        let result = Arc::new(AtomicBool::new(false));
        let result_clone = result.clone();

        std::thread::spawn(move || {
            result_clone.store(!affinity.is_same_thread(), Ordering::SeqCst);
        })
        .join()
        .unwrap();

        assert!(result.load(Ordering::SeqCst));
    }

    #[test]
    fn test_thread_affinity_panic_on_wrong_thread() {
        let affinity = ThreadAffinity::current();
        set_thread_checks_enabled(true);

        let result = std::thread::spawn(move || {
            affinity.assert_same_thread();
        })
        .join();

        assert!(result.is_err(), "expected affinity violation panic");
    }

    #[test]
    fn test_for_thread() {
        let affinity = ThreadAffinity::for_thread(std::thread::current().id());
        assert_eq!(affinity, ThreadAffinity::current());
    }
}
