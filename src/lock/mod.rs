//! # Locks and what they are capable of
//!
//! The container doesn't lock anything on its own. It relies on a primitive lock
//! with the usual exclusive triple:
//! - `lock` - blocks until the lock is ours
//! - `try_lock` - same, but gives up immediately
//! - `unlock` - gives it back
//!
//! Some locks (rwlocks) can also be held by many readers at once. That's the one thing
//! the rest of the crate branches on, so it lives in the type system as [`RawLock::Capability`]:
//! - [`ExclusiveOnly`] - reads lock exclusively too, every access serializes
//! - [`ExclusiveAndShared`] - reads take the shared side, readers run in parallel
//!
//! The read-path triple (`lock_read` & co) defaults to the exclusive one.
//! Shared-capable locks override it, there's no runtime check anywhere.
//!
//! Ready to use locks:
//! - [`SharedLock`] (`parking_lot::RwLock<()>`) - the default one
//! - [`ExclusiveLock`] (`parking_lot::Mutex<()>`) - pairs with the cheaper condition variable
//! - [`RawShared`] / [`RawExclusive`] - plug any `lock_api` raw lock in

mod adapters;

pub use adapters::{RawExclusive, RawShared};

use std::mem;

use crate::condition::{AnyCondition, Condition, MutexCondition};

/// A shared-capable lock, the default for [`Guarded`](crate::Guarded).
pub type SharedLock = parking_lot::RwLock<()>;

/// An exclusive-only lock. Reads serialize with everything else.
pub type ExclusiveLock = parking_lot::Mutex<()>;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ExclusiveOnly {}
    impl Sealed for super::ExclusiveAndShared {}
}

/// Static descriptor of what a lock can do. It has exactly 2 implementors.
pub trait Capability: sealed::Sealed {
    /// `true` when many readers may hold the lock together
    const SHARED: bool;
}

/// The lock has the exclusive mode only.
#[derive(Debug)]
pub enum ExclusiveOnly {}

/// The lock has both exclusive and shared modes.
#[derive(Debug)]
pub enum ExclusiveAndShared {}

impl Capability for ExclusiveOnly {
    const SHARED: bool = false;
}

impl Capability for ExclusiveAndShared {
    const SHARED: bool = true;
}

/// Does `L` let readers in concurrently?
pub const fn is_shared_capable<L: RawLock>() -> bool {
    L::Capability::SHARED
}

/// A primitive lock the container can sit on.
///
/// # Safety
/// - `lock` / successful `try_lock` must give mutual exclusion against every other holder,
///   whatever mode they are in
/// - with [`ExclusiveOnly`] the read triple must stay exclusive (the defaults do that)
/// - with [`ExclusiveAndShared`] the read triple may only admit other readers
/// - the condition facility must re-acquire the lock in read mode before its wait returns
pub unsafe trait RawLock {
    /// Compile-time answer to "can readers share it?"
    type Capability: Capability;

    /// The condition facility a waitable container pairs with this lock.
    type Cond: Condition<Self>;

    fn lock(&self);

    fn try_lock(&self) -> bool;

    /// # Safety
    /// The lock must be held exclusively by the current context.
    unsafe fn unlock(&self);

    fn lock_read(&self) {
        self.lock()
    }

    fn try_lock_read(&self) -> bool {
        self.try_lock()
    }

    /// # Safety
    /// The lock must be held in read mode by the current context.
    unsafe fn unlock_read(&self) {
        self.unlock()
    }
}

/*
 * parking_lot's high level locks hand out guards, we want raw lock/unlock.
 * Forgetting the guard keeps the lock held, force_unlock gives it back later.
 * Inherent methods share the names with ours => fully qualified calls everywhere.
 */

unsafe impl RawLock for parking_lot::Mutex<()> {
    type Capability = ExclusiveOnly;
    type Cond = MutexCondition;

    fn lock(&self) {
        mem::forget(parking_lot::Mutex::lock(self));
    }

    fn try_lock(&self) -> bool {
        parking_lot::Mutex::try_lock(self).map(mem::forget).is_some()
    }

    unsafe fn unlock(&self) {
        parking_lot::Mutex::force_unlock(self)
    }
}

unsafe impl RawLock for parking_lot::RwLock<()> {
    type Capability = ExclusiveAndShared;
    type Cond = AnyCondition;

    fn lock(&self) {
        mem::forget(parking_lot::RwLock::write(self));
    }

    fn try_lock(&self) -> bool {
        parking_lot::RwLock::try_write(self)
            .map(mem::forget)
            .is_some()
    }

    unsafe fn unlock(&self) {
        parking_lot::RwLock::force_unlock_write(self)
    }

    fn lock_read(&self) {
        mem::forget(parking_lot::RwLock::read(self));
    }

    fn try_lock_read(&self) -> bool {
        parking_lot::RwLock::try_read(self).map(mem::forget).is_some()
    }

    unsafe fn unlock_read(&self) {
        parking_lot::RwLock::force_unlock_read(self)
    }
}
