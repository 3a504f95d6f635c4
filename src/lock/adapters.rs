use std::fmt;

use lock_api::{RawMutex, RawRwLock};

use super::{ExclusiveAndShared, ExclusiveOnly, RawLock};
use crate::condition::AnyCondition;

/*
 * lock_api splits raw locks into RawMutex and RawRwLock.
 * We can't pick an impl by "does R implement RawRwLock" (no specialization),
 * so the wrapper picks it instead: whatever sits in RawShared must have the shared mode.
 */

/// Any `lock_api` raw mutex, exclusive only.
pub struct RawExclusive<R>(R);

/// Any `lock_api` raw rwlock, readers share it.
pub struct RawShared<R>(R);

impl<R: RawMutex> RawExclusive<R> {
    pub const fn new() -> Self {
        Self(R::INIT)
    }
}

impl<R: RawRwLock> RawShared<R> {
    pub const fn new() -> Self {
        Self(R::INIT)
    }
}

impl<R: RawMutex> Default for RawExclusive<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RawRwLock> Default for RawShared<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for RawExclusive<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawExclusive")
    }
}

impl<R> fmt::Debug for RawShared<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawShared")
    }
}

unsafe impl<R: RawMutex> RawLock for RawExclusive<R> {
    type Capability = ExclusiveOnly;
    type Cond = AnyCondition;

    fn lock(&self) {
        RawMutex::lock(&self.0)
    }

    fn try_lock(&self) -> bool {
        RawMutex::try_lock(&self.0)
    }

    unsafe fn unlock(&self) {
        RawMutex::unlock(&self.0)
    }
}

unsafe impl<R: RawRwLock> RawLock for RawShared<R> {
    type Capability = ExclusiveAndShared;
    type Cond = AnyCondition;

    fn lock(&self) {
        self.0.lock_exclusive()
    }

    fn try_lock(&self) -> bool {
        self.0.try_lock_exclusive()
    }

    unsafe fn unlock(&self) {
        self.0.unlock_exclusive()
    }

    fn lock_read(&self) {
        self.0.lock_shared()
    }

    fn try_lock_read(&self) -> bool {
        self.0.try_lock_shared()
    }

    unsafe fn unlock_read(&self) {
        self.0.unlock_shared()
    }
}
