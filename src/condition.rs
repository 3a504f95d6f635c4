//! # Condition facilities
//!
//! A waitable container pairs its lock with a condition variable, bound 1:1.
//! Waiters sleep on it, every write-path access broadcasts on it after the unlock.
//!
//! The waiting itself is the classic dance:
//! - the waiter holds the lock (read mode) and sees the predicate is false
//! - it releases the lock and sleeps *atomically* wrt. notifications
//! - it re-locks (read mode again) after a wake-up, spurious or not
//!
//! 2 flavours:
//! - [`MutexCondition`] - `parking_lot::Condvar` straight on the container's
//!   `parking_lot::Mutex<()>`, nothing else in between
//! - [`AnyCondition`] - works on top of any [`RawLock`]. The atomicity comes from an internal
//!   gate mutex: the waiter takes the gate *before* releasing the container lock and the condvar
//!   releases the gate only once the waiter is parked. A notifier has to take the gate too
//!   => it can't slip in between.
//!
//! Containers that never wait get [`Silent`], a zero-sized no-op.

use std::{mem, time::Instant};

use crate::lock::RawLock;

/// Something that can be broadcast on after a write.
pub trait Notify {
    fn notify_all(&self);
}

/// A condition variable usable with the lock `L`.
///
/// # Safety
/// `wait_read` must give the read hold on `lock` back before returning, on every path.
pub unsafe trait Condition<L: ?Sized>: Notify + Default {
    /// Releases the read hold on `lock`, sleeps until notified (or until `deadline`)
    /// and takes the read hold again. Returns `true` when the deadline passed.
    ///
    /// # Safety
    /// The caller must hold `lock` in read mode.
    unsafe fn wait_read(&self, lock: &L, deadline: Option<Instant>) -> bool;
}

/// Picks whether a container carries a condition facility.
pub trait WaitMode {
    type Cond<L: RawLock>: Notify + Default;
}

/// No waiting, notifications compile down to nothing.
#[derive(Debug)]
pub enum NoWait {}

/// The container carries its lock's condition facility and gets `wait*` operations.
#[derive(Debug)]
pub enum Wait {}

impl WaitMode for NoWait {
    type Cond<L: RawLock> = Silent;
}

impl WaitMode for Wait {
    type Cond<L: RawLock> = L::Cond;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notify for Silent {
    #[inline(always)]
    fn notify_all(&self) {}
}

/// The lighter condition for the plain mutex.
#[derive(Debug, Default)]
pub struct MutexCondition {
    condvar: parking_lot::Condvar,
}

impl Notify for MutexCondition {
    fn notify_all(&self) {
        self.condvar.notify_all();
    }
}

unsafe impl Condition<parking_lot::Mutex<()>> for MutexCondition {
    unsafe fn wait_read(&self, lock: &parking_lot::Mutex<()>, deadline: Option<Instant>) -> bool {
        // SAFETY: read mode of the plain mutex is the exclusive one and the caller holds it
        // => the guard describes the truth. It's forgotten below to keep the hold raw.
        let mut guard = lock.make_guard_unchecked();
        let timed_out = match deadline {
            Some(deadline) => self.condvar.wait_until(&mut guard, deadline).timed_out(),
            None => {
                self.condvar.wait(&mut guard);
                false
            }
        };
        mem::forget(guard);
        timed_out
    }
}

/// The general-purpose condition, any lock goes.
#[derive(Debug, Default)]
pub struct AnyCondition {
    gate: parking_lot::Mutex<()>,
    condvar: parking_lot::Condvar,
}

impl Notify for AnyCondition {
    fn notify_all(&self) {
        // waits for a half-way waiter to get parked
        let _gate = self.gate.lock();
        self.condvar.notify_all();
    }
}

unsafe impl<L: RawLock> Condition<L> for AnyCondition {
    unsafe fn wait_read(&self, lock: &L, deadline: Option<Instant>) -> bool {
        let mut gate = self.gate.lock();
        lock.unlock_read();
        let timed_out = match deadline {
            Some(deadline) => self.condvar.wait_until(&mut gate, deadline).timed_out(),
            None => {
                self.condvar.wait(&mut gate);
                false
            }
        };
        // never hold the gate while blocking on the container lock
        drop(gate);
        lock.lock_read();
        timed_out
    }
}
