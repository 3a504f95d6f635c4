use std::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use super::Guarded;
use crate::condition::{Notify, WaitMode};
use crate::lock::RawLock;

/*
 * Guards unlock on drop => the unlock must happen on the thread that locked.
 * Some primitives care about that, so the guards are !Send (the raw pointer marker).
 * They can't be cloned either, there's a single release point per lock.
 */

/// Exclusive access, the result of [`Guarded::locked`].
///
/// Dropping it unlocks, then notifies the waiters.
pub struct LockedMut<'a, Y, L: RawLock, W: WaitMode> {
    guarded: &'a Guarded<Y, L, W>,
    _not_send: PhantomData<*const ()>,
}

/// Read access, the result of [`Guarded::locked_ref`]. Dropping it only unlocks.
pub struct LockedRef<'a, Y, L: RawLock, W: WaitMode> {
    guarded: &'a Guarded<Y, L, W>,
    _not_send: PhantomData<*const ()>,
}

unsafe impl<Y: Sync, L: RawLock, W: WaitMode> Sync for LockedMut<'_, Y, L, W> {}
unsafe impl<Y: Sync, L: RawLock, W: WaitMode> Sync for LockedRef<'_, Y, L, W> {}

impl<'a, Y, L: RawLock, W: WaitMode> LockedMut<'a, Y, L, W> {
    /// # Safety
    /// The lock of `guarded` must be held exclusively, the guard takes over releasing it.
    pub(super) unsafe fn new(guarded: &'a Guarded<Y, L, W>) -> Self {
        Self {
            guarded,
            _not_send: PhantomData,
        }
    }
}

impl<'a, Y, L: RawLock, W: WaitMode> LockedRef<'a, Y, L, W> {
    /// # Safety
    /// The lock of `guarded` must be held in read mode, the guard takes over releasing it.
    pub(super) unsafe fn new(guarded: &'a Guarded<Y, L, W>) -> Self {
        Self {
            guarded,
            _not_send: PhantomData,
        }
    }
}

impl<Y, L: RawLock, W: WaitMode> Deref for LockedMut<'_, Y, L, W> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        // SAFETY: existence of the guard is caused by locking its lock
        unsafe { &*self.guarded.value.get() }
    }
}

impl<Y, L: RawLock, W: WaitMode> DerefMut for LockedMut<'_, Y, L, W> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the lock is exclusive and &mut self keeps the reference unique
        unsafe { &mut *self.guarded.value.get() }
    }
}

impl<Y, L: RawLock, W: WaitMode> Deref for LockedRef<'_, Y, L, W> {
    type Target = Y;
    fn deref(&self) -> &Self::Target {
        // SAFETY: read hold => only other readers around
        unsafe { &*self.guarded.value.get() }
    }
}

impl<Y, L: RawLock, W: WaitMode> Drop for LockedMut<'_, Y, L, W> {
    fn drop(&mut self) {
        // unlock first => the woken up ones don't bump into a locked lock
        unsafe { self.guarded.lock.unlock() };
        self.guarded.cond.notify_all();
    }
}

impl<Y, L: RawLock, W: WaitMode> Drop for LockedRef<'_, Y, L, W> {
    fn drop(&mut self) {
        unsafe { self.guarded.lock.unlock_read() };
    }
}

impl<Y: fmt::Debug, L: RawLock, W: WaitMode> fmt::Debug for LockedMut<'_, Y, L, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<Y: fmt::Debug, L: RawLock, W: WaitMode> fmt::Debug for LockedRef<'_, Y, L, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
