//! A lock that counts what's done to it.

use std::sync::{
    atomic::{AtomicUsize, Ordering::Relaxed},
    Arc,
};

use lock_api::{RawMutex as _, RawRwLock as _};

use crate::condition::AnyCondition;
use crate::lock::{ExclusiveAndShared, ExclusiveOnly, RawLock};

#[derive(Debug, Default)]
pub struct LockStats {
    pub locked: AtomicUsize,
    pub try_locked: AtomicUsize,
    pub unlocked: AtomicUsize,
    pub locked_shared: AtomicUsize,
    pub try_locked_shared: AtomicUsize,
    pub unlocked_shared: AtomicUsize,
    // readers inside right now and the most seen at once
    pub shared_holders: AtomicUsize,
    pub max_shared_holders: AtomicUsize,
    pub locks_built: AtomicUsize,
    pub values_built: AtomicUsize,
}

impl LockStats {
    pub fn has_been_shared_locked(&self) -> bool {
        self.locked_shared.load(Relaxed) > 0 || self.try_locked_shared.load(Relaxed) > 0
    }

    pub fn has_been_unique_locked(&self) -> bool {
        self.locked.load(Relaxed) > 0 || self.try_locked.load(Relaxed) > 0
    }

    fn enter_shared(&self) {
        let holders = self.shared_holders.fetch_add(1, Relaxed) + 1;
        self.max_shared_holders.fetch_max(holders, Relaxed);
    }
}

/// Counts every call, then forwards it to the raw lock `R`.
pub struct SpyLock<R> {
    stats: Arc<LockStats>,
    raw: R,
}

/// The spy without a shared mode.
pub type ExclusiveSpy = SpyLock<parking_lot::RawMutex>;

/// The spy with a shared mode.
pub type SharedSpy = SpyLock<parking_lot::RawRwLock>;

impl ExclusiveSpy {
    pub fn new(stats: Arc<LockStats>) -> Self {
        stats.locks_built.fetch_add(1, Relaxed);
        Self {
            stats,
            raw: parking_lot::RawMutex::INIT,
        }
    }
}

impl SharedSpy {
    pub fn new(stats: Arc<LockStats>) -> Self {
        stats.locks_built.fetch_add(1, Relaxed);
        Self {
            stats,
            raw: parking_lot::RawRwLock::INIT,
        }
    }
}

unsafe impl RawLock for ExclusiveSpy {
    type Capability = ExclusiveOnly;
    type Cond = AnyCondition;

    fn lock(&self) {
        self.raw.lock();
        self.stats.locked.fetch_add(1, Relaxed);
    }

    fn try_lock(&self) -> bool {
        self.stats.try_locked.fetch_add(1, Relaxed);
        self.raw.try_lock()
    }

    unsafe fn unlock(&self) {
        self.raw.unlock();
        self.stats.unlocked.fetch_add(1, Relaxed);
    }
}

unsafe impl RawLock for SharedSpy {
    type Capability = ExclusiveAndShared;
    type Cond = AnyCondition;

    fn lock(&self) {
        self.raw.lock_exclusive();
        self.stats.locked.fetch_add(1, Relaxed);
    }

    fn try_lock(&self) -> bool {
        self.stats.try_locked.fetch_add(1, Relaxed);
        self.raw.try_lock_exclusive()
    }

    unsafe fn unlock(&self) {
        self.raw.unlock_exclusive();
        self.stats.unlocked.fetch_add(1, Relaxed);
    }

    fn lock_read(&self) {
        self.raw.lock_shared();
        self.stats.locked_shared.fetch_add(1, Relaxed);
        self.stats.enter_shared();
    }

    fn try_lock_read(&self) -> bool {
        self.stats.try_locked_shared.fetch_add(1, Relaxed);
        let locked = self.raw.try_lock_shared();
        if locked {
            self.stats.enter_shared();
        }
        locked
    }

    unsafe fn unlock_read(&self) {
        self.stats.shared_holders.fetch_sub(1, Relaxed);
        self.raw.unlock_shared();
        self.stats.unlocked_shared.fetch_add(1, Relaxed);
    }
}
