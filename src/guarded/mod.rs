//! # Guarded value
//!
//! [`Guarded`] owns a value and the lock protecting it. There's no way to reach the value
//! but through the lock:
//! - callbacks: [`Guarded::with_locked`] (write path) and [`Guarded::with_locked_ref`] (read path)
//! - scoped guards: [`Guarded::locked`] and [`Guarded::locked_ref`]
//! - a plain copy: [`Guarded::get_copy`]
//! - several containers at once: see [`crate::all_locked`]
//!
//! Pick the write path when mutating and the read path otherwise:
//! - write path - always exclusive, broadcasts on the condition facility (if any) after the unlock
//! - read path - shared if the lock supports it, exclusive otherwise, never notifies
//!
//! Every operation locks exactly once, no matter how many times the value is touched inside.
//!
//! `&mut Guarded` and `Guarded` itself already prove nobody else is looking =>
//! [`Guarded::get_mut`] and [`Guarded::into_inner`] skip the lock.
//! Moving a container around is fine as long as nothing borrows it, guards and proxies do
//! => the borrow checker refuses to relocate it under them.

mod guard;
mod proxy;
mod wait;

pub use guard::{LockedMut, LockedRef};
pub use proxy::{ReadProxy, WriteProxy};

use std::{cell::UnsafeCell, fmt};

use crate::condition::{NoWait, Notify, WaitMode};
use crate::lock::{RawLock, SharedLock};

/// A value that can only be reached under its lock.
///
/// - `Y` - the value
/// - `L` - the lock, [`SharedLock`] by default
/// - `W` - [`NoWait`] (default) or [`Wait`](crate::Wait) to get the `wait*` operations
pub struct Guarded<Y, L: RawLock = SharedLock, W: WaitMode = NoWait> {
    lock: L,
    cond: W::Cond<L>,
    value: UnsafeCell<Y>,
}

/*
 * Readers may share the lock => several threads see &Y at once => Y: Sync.
 * Writers hand &mut Y to whatever thread holds the lock => Y: Send.
 * Same as std's RwLock.
 */
unsafe impl<Y, L, W> Sync for Guarded<Y, L, W>
where
    Y: Send + Sync,
    L: RawLock + Sync,
    W: WaitMode,
    W::Cond<L>: Sync,
{
}

impl<Y, L: RawLock, W: WaitMode> Guarded<Y, L, W> {
    /// Takes the value and a ready-made lock.
    pub fn with_lock(value: Y, lock: L) -> Self {
        Self {
            lock,
            cond: Default::default(),
            value: UnsafeCell::new(value),
        }
    }

    /// Takes the value, the lock is defaulted.
    pub fn new(value: Y) -> Self
    where
        L: Default,
    {
        Self::with_lock(value, L::default())
    }

    /// Takes the lock, the value is defaulted.
    pub fn from_lock(lock: L) -> Self
    where
        Y: Default,
    {
        Self::with_lock(Y::default(), lock)
    }

    /// Write path: calls `f` with exclusive access and returns what it returns.
    ///
    /// The lock is released and waiters are notified however `f` exits, panics included.
    pub fn with_locked<R>(&self, f: impl FnOnce(&mut Y) -> R) -> R {
        let mut guard = self.locked();
        f(&mut *guard)
    }

    /// Read path: calls `f` with shared access (exclusive if the lock has no shared mode).
    pub fn with_locked_ref<R>(&self, f: impl FnOnce(&Y) -> R) -> R {
        let guard = self.locked_ref();
        f(&*guard)
    }

    /// A copy of the value, taken on the read path.
    pub fn get_copy(&self) -> Y
    where
        Y: Clone,
    {
        Y::clone(&self.locked_ref())
    }

    /// Locks exclusively until the returned guard is dropped.
    /// Dropping it notifies the waiters, if any.
    pub fn locked(&self) -> LockedMut<'_, Y, L, W> {
        self.lock.lock();
        // SAFETY: just locked exclusively
        unsafe { LockedMut::new(self) }
    }

    /// Locks in the read mode until the returned guard is dropped.
    pub fn locked_ref(&self) -> LockedRef<'_, Y, L, W> {
        self.lock.lock_read();
        // SAFETY: just locked for reading
        unsafe { LockedRef::new(self) }
    }

    /// Same as [`Guarded::locked`], but gives up instead of blocking.
    pub fn try_locked(&self) -> Option<LockedMut<'_, Y, L, W>> {
        if self.lock.try_lock() {
            // SAFETY: locked exclusively
            Some(unsafe { LockedMut::new(self) })
        } else {
            None
        }
    }

    /// Same as [`Guarded::locked_ref`], but gives up instead of blocking.
    pub fn try_locked_ref(&self) -> Option<LockedRef<'_, Y, L, W>> {
        if self.lock.try_lock_read() {
            // SAFETY: locked for reading
            Some(unsafe { LockedRef::new(self) })
        } else {
            None
        }
    }

    /// No lock needed, `&mut self` is exclusive already.
    pub fn get_mut(&mut self) -> &mut Y {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> Y {
        self.value.into_inner()
    }

    pub(crate) fn notify(&self) {
        self.cond.notify_all();
    }
}

impl<Y: Default, L: RawLock + Default, W: WaitMode> Default for Guarded<Y, L, W> {
    fn default() -> Self {
        Self::new(Y::default())
    }
}

impl<Y, L: RawLock + Default, W: WaitMode> From<Y> for Guarded<Y, L, W> {
    fn from(value: Y) -> Self {
        Self::new(value)
    }
}

impl<Y: fmt::Debug, L: RawLock, W: WaitMode> fmt::Debug for Guarded<Y, L, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Guarded");
        // never block inside Debug
        match self.try_locked_ref() {
            Some(guard) => d.field("value", &&*guard),
            None => d.field("value", &format_args!("<locked>")),
        };
        d.finish_non_exhaustive()
    }
}
