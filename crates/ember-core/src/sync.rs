//! Exclusive sections.
//!
//! [`Exclusive<T>`] is the only mutation primitive for shared state in the
//! core: a value behind a non-reentrant mutex that can only be reached by
//! passing a closure to [`Exclusive::run`]. The lock is scoped to the
//! closure, so it is released on every exit path including unwinding.
//!
//! Nesting `run` calls on the same section from one thread would deadlock
//! with a plain mutex. Instead the nested call is detected before blocking
//! and rejected with a panic, which unwinds and frees the outer section.

use std::cell::RefCell;
use std::fmt;

use parking_lot::Mutex;

thread_local! {
    /// Addresses of the sections currently held by this thread.
    static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a section as held by the current thread until dropped.
struct HeldMarker(usize);

impl HeldMarker {
    fn enter(addr: usize) -> Self {
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if held.contains(&addr) {
                // Drop the borrow before panicking so the unwinding markers
                // of the outer section can still clean up.
                drop(held);
                panic!(
                    "exclusive section re-entered on the same thread; \
                     nested run() calls are not supported"
                );
            }
            held.push(addr);
        });
        Self(addr)
    }
}

impl Drop for HeldMarker {
    fn drop(&mut self) {
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|a| *a == self.0) {
                held.remove(pos);
            }
        });
    }
}

/// A value that may only be accessed inside an exclusive section.
pub struct Exclusive<T> {
    inner: Mutex<T>,
}

impl<T> Exclusive<T> {
    /// Wraps `value` in a new section.
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Runs `f` with exclusive access to the value.
    ///
    /// Blocks until the section is free. `f` must not block on network or
    /// file I/O: every other caller waits for it.
    ///
    /// # Panics
    ///
    /// Panics if called from inside another `run` on the same section.
    pub fn run<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _marker = HeldMarker::enter(self as *const Self as usize);
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Consumes the section and returns the value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for Exclusive<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for Exclusive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exclusive")
            .field("locked", &self.inner.is_locked())
            .finish()
    }
}
