//! # Waiting for a value
//!
//! Only containers built with [`Wait`] get these, the others have no condition
//! facility and don't pay for one.
//!
//! The predicate runs under the read lock:
//! - once before blocking at all (already true => no blocking)
//! - after every wake-up, the spurious ones included
//!
//! A waiter only observes writes whose lock was released before it re-locked,
//! so whatever value made the predicate true is the one it sees.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::Guarded;
use crate::condition::{Condition, Wait};
use crate::lock::RawLock;

impl<Y, L: RawLock> Guarded<Y, L, Wait> {
    /// Blocks until `predicate` holds for the value.
    pub fn wait(&self, predicate: impl FnMut(&Y) -> bool) {
        self.wait_deadline(None, predicate);
    }

    /// Blocks until `predicate` holds or `timeout` passes.
    /// Returns `false` in the latter case.
    #[must_use]
    pub fn wait_for(&self, timeout: Duration, predicate: impl FnMut(&Y) -> bool) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_deadline(Some(deadline), predicate),
            // too far away to be representable => it never comes
            None => self.wait_deadline(None, predicate),
        }
    }

    /// Blocks until `predicate` holds or `deadline` comes.
    /// Returns `false` in the latter case.
    #[must_use]
    pub fn wait_until(&self, deadline: Instant, predicate: impl FnMut(&Y) -> bool) -> bool {
        self.wait_deadline(Some(deadline), predicate)
    }

    fn wait_deadline(
        &self,
        deadline: Option<Instant>,
        mut predicate: impl FnMut(&Y) -> bool,
    ) -> bool {
        let guard = self.locked_ref();
        loop {
            if predicate(&guard) {
                return true;
            }
            // SAFETY: the guard proves the read hold, wait_read gives it back before returning
            let timed_out = unsafe { Condition::<L>::wait_read(&self.cond, &self.lock, deadline) };
            if timed_out {
                debug!("deadline passed, checking the predicate one last time");
                return predicate(&guard);
            }
            trace!("woken up");
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering::Relaxed},
            Arc,
        },
        thread::{scope, sleep},
        time::{Duration, Instant},
    };

    use crate::condition::Condition;
    use crate::lock::{ExclusiveLock, RawExclusive, RawLock, SharedLock};
    use crate::test_support::{LockStats, SharedSpy};
    use crate::{Guarded, Wait};

    #[derive(Clone, Default)]
    struct FutureInt(Option<i32>);

    impl FutureInt {
        fn compute(&mut self) {
            self.0 = Some(3);
        }
    }

    fn test_sync<L>()
    where
        L: RawLock + Default + Sync,
        L::Cond: Sync,
    {
        let init_after = Guarded::<FutureInt, L, Wait>::default();
        let waiting_is_over = AtomicBool::new(false);

        scope(|s| {
            // the thread that checks the result
            s.spawn(|| {
                init_after.wait(|fi| fi.0.is_some());
                assert_eq!(Some(3), init_after.get_copy().0);
                waiting_is_over.store(true, Relaxed);
            });

            // make sure it stopped where it waits
            sleep(Duration::from_millis(20));
            assert!(!waiting_is_over.load(Relaxed));

            // the thread that computes => change and notify
            s.spawn(|| init_after.with_locked(FutureInt::compute));
        });

        assert!(waiting_is_over.load(Relaxed));
    }

    #[test]
    fn test_mutex_sync() {
        test_sync::<ExclusiveLock>();
    }

    #[test]
    fn test_rwlock_sync() {
        test_sync::<SharedLock>();
    }

    #[test]
    fn test_raw_mutex_sync() {
        test_sync::<RawExclusive<parking_lot::RawMutex>>();
    }

    #[derive(Clone, Default)]
    struct FlaggedInt {
        val: i32,
        initialized: bool,
    }

    impl FlaggedInt {
        fn set(&mut self, v: i32) {
            self.val = v;
            self.initialized = true;
        }
    }

    #[test]
    fn test_notify_from_locked_guard() {
        let init_after = Guarded::<FlaggedInt, ExclusiveLock, Wait>::default();

        scope(|s| {
            // the thread that should wait
            s.spawn(|| {
                init_after.wait(|fi| fi.initialized);
                init_after.locked().val *= 3;
            });
            sleep(Duration::from_millis(20));

            // change and notify on drop
            init_after.locked().set(2);
        });

        assert_eq!(6, init_after.get_copy().val);
    }

    #[test]
    fn test_observes_the_satisfying_write() {
        let counter = Guarded::<i32, SharedLock, Wait>::new(0);

        scope(|s| {
            let waiter = s.spawn(|| {
                let mut seen = None;
                counter.wait(|v| {
                    seen = Some(*v);
                    *v >= 5
                });
                seen
            });

            for _ in 0..5 {
                sleep(Duration::from_millis(2));
                counter.with_locked(|v| *v += 1);
            }

            // nobody writes past 5 => it has to be exactly that
            assert_eq!(Some(5), waiter.join().unwrap());
        });
    }

    #[test]
    fn test_already_true_doesnt_block() {
        let stats = Arc::new(LockStats::default());
        let guarded = Guarded::<i32, _, Wait>::with_lock(1, SharedSpy::new(stats.clone()));

        guarded.wait(|v| *v == 1);

        // read path, one acquisition
        assert_eq!(1, stats.locked_shared.load(Relaxed));
        assert_eq!(1, stats.unlocked_shared.load(Relaxed));
        assert!(!stats.has_been_unique_locked());
    }

    #[test]
    fn test_wait_for_times_out() {
        let guarded = Guarded::<i32, ExclusiveLock, Wait>::new(0);
        let started = Instant::now();

        assert!(!guarded.wait_for(Duration::from_millis(30), |v| *v > 0));
        assert!(started.elapsed() >= Duration::from_millis(30));

        // the lock went back
        assert!(guarded.try_locked().is_some());
    }

    #[test]
    fn test_wait_until_times_out() {
        let guarded = Guarded::<i32, SharedLock, Wait>::new(0);
        let deadline = Instant::now() + Duration::from_millis(20);
        assert!(!guarded.wait_until(deadline, |v| *v > 0));
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_wait_for_succeeds() {
        let guarded = Guarded::<i32, SharedLock, Wait>::new(0);

        scope(|s| {
            s.spawn(|| {
                sleep(Duration::from_millis(10));
                guarded.with_locked(|v| *v = 42);
            });
            assert!(guarded.wait_for(Duration::from_secs(10), |v| *v == 42));
        });
    }

    #[test]
    fn test_reads_dont_wake_up() {
        let guarded = Guarded::<i32, SharedLock, Wait>::new(0);
        let read_done = AtomicBool::new(false);
        let started = Instant::now();

        scope(|s| {
            s.spawn(|| {
                sleep(Duration::from_millis(10));
                // the read path never notifies
                guarded.with_locked_ref(|v| assert_eq!(0, *v));
                read_done.store(true, Relaxed);
            });
            // true since ~10ms, but nobody tells the waiter => it finds out at the deadline
            assert!(guarded.wait_for(Duration::from_millis(50), |_| read_done.load(Relaxed)));
        });

        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_cond_type_follows_the_lock() {
        // compile-time pairing: the plain mutex gets the lighter facility
        fn cond_of<L: RawLock>() -> &'static str
        where
            L::Cond: Condition<L>,
        {
            std::any::type_name::<L::Cond>()
        }
        assert!(cond_of::<ExclusiveLock>().ends_with("MutexCondition"));
        assert!(cond_of::<SharedLock>().ends_with("AnyCondition"));
    }
}
