//! # Locking several containers at once
//!
//! Locking `a` then `b` in one thread and `b` then `a` in another is the textbook deadlock.
//! [`lock_all`] takes a tuple of proxies ([`Guarded::for_read`](crate::Guarded::for_read) /
//! [`Guarded::for_write`](crate::Guarded::for_write)) and locks them all with the
//! "lock one, try the rest, back off" protocol:
//! - block on the first lock
//! - `try_lock` the others one after another
//! - a failed try => release everything taken so far, start over *from the one that failed*
//!
//! A thread never blocks while holding any of the locks => there's no circular wait
//! among the callers going through here. Locking the same containers by hand in parallel
//! with coordinated calls is a different story, nothing protects against that.
//!
//! All or nothing: either every lock is held until [`AllLocked`] is dropped, or none is.
//! The locks are released in reverse argument order, then every container taken
//! for writing gets its waiters notified (a no-op for containers without [`Wait`](crate::Wait)).

use std::marker::PhantomData;

use tracing::trace;

/*
 * The raw lock/unlock of a container must stay behind a guard. The traits doing it live
 * in a private module => nameable (and callable) inside the crate only.
 */
pub(crate) mod sealed {
    /// What the coordinator needs from a single container.
    pub trait Lockable {
        /// Identity of the container behind it.
        fn addr(&self) -> *const ();
        /// `true` when other holders of the same container in the same mode are welcome.
        fn shared(&self) -> bool;
        fn lock(&self);
        fn try_lock(&self) -> bool;
        /// # Safety
        /// Must be held through this very proxy.
        unsafe fn unlock(&self);
        fn notify(&self);
    }

    /// A [`Lockable`] that gives access to the value once locked.
    ///
    /// # Safety
    /// `get` may only hand out `&mut` for proxies locking exclusively.
    pub unsafe trait Proxy: Lockable {
        type Ref<'r>
        where
            Self: 'r;

        /// # Safety
        /// The proxy's lock must be held and no other reference from `get` may be alive.
        unsafe fn get(&self) -> Self::Ref<'_>;
    }

    pub trait Lockables {
        fn with_lockables<R>(&self, f: impl FnOnce(&[&dyn Lockable]) -> R) -> R;
    }
}

use sealed::{Lockable, Lockables, Proxy};

/// A tuple of proxies, 1 to 8 of them.
pub trait LockSet: Lockables {
    /// References to the values, in the order of the tuple.
    type Refs<'r>
    where
        Self: 'r;

    /// # Safety
    /// All the locks must be held and no other references from `refs` may be alive.
    unsafe fn refs(&self) -> Self::Refs<'_>;
}

macro_rules! tuple_lock_set {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Proxy),+> Lockables for ($($name,)+) {
            fn with_lockables<R>(&self, f: impl FnOnce(&[&dyn Lockable]) -> R) -> R {
                f(&[$(&self.$idx as &dyn Lockable),+])
            }
        }

        impl<$($name: Proxy),+> LockSet for ($($name,)+) {
            type Refs<'r> = ($($name::Ref<'r>,)+) where Self: 'r;

            unsafe fn refs(&self) -> Self::Refs<'_> {
                ($(self.$idx.get(),)+)
            }
        }
    };
}

tuple_lock_set!(A.0);
tuple_lock_set!(A.0, B.1);
tuple_lock_set!(A.0, B.1, C.2);
tuple_lock_set!(A.0, B.1, C.2, D.3);
tuple_lock_set!(A.0, B.1, C.2, D.3, E.4);
tuple_lock_set!(A.0, B.1, C.2, D.3, E.4, F.5);
tuple_lock_set!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
tuple_lock_set!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);

/// Every lock of the set, held until dropped.
///
/// It stays on the thread that locked, same as the single-container guards:
///
/// ```compile_fail
/// use guarded::{lock_all, Guarded};
///
/// let a = Guarded::<i32>::new(0);
/// let all = lock_all((a.for_write(),));
/// std::thread::scope(|s| {
///     s.spawn(move || drop(all));
/// });
/// ```
///
/// The proxies don't lock on their own either:
///
/// ```compile_fail
/// use guarded::Guarded;
///
/// let a = Guarded::<i32>::new(0);
/// a.for_write().lock();
/// ```
#[must_use = "the locks are released right away if the guard isn't kept"]
pub struct AllLocked<S: LockSet> {
    set: S,
    _not_send: PhantomData<*const ()>,
}

impl<S: LockSet> AllLocked<S> {
    /// The values, in the order they were passed in.
    pub fn values(&mut self) -> S::Refs<'_> {
        // SAFETY: constructed with everything locked, &mut self keeps the refs unique
        unsafe { self.set.refs() }
    }
}

impl<S: LockSet> Drop for AllLocked<S> {
    fn drop(&mut self) {
        self.set.with_lockables(release);
    }
}

/// Locks every container of `set` without risking a deadlock with other calls of it.
///
/// The same container may show up several times for reading when its lock has the shared mode.
///
/// # Panics
/// If the same container shows up twice otherwise, before locking anything.
pub fn lock_all<S: LockSet>(set: S) -> AllLocked<S> {
    set.with_lockables(|locks| {
        check_distinct(locks);
        acquire(locks);
    });
    AllLocked {
        set,
        _not_send: PhantomData,
    }
}

/// [`lock_all`], then `f`, then release. Releases when `f` panics too.
///
/// ```
/// use guarded::{with_all_locked, Guarded};
///
/// let a = Guarded::<i32>::new(42);
/// let b = Guarded::<i32>::new(8);
/// let from_a = with_all_locked((a.for_read(), b.for_write()), |all| {
///     let (in_a, in_b) = all.values();
///     *in_b = 10;
///     *in_a
/// });
/// assert_eq!(42, from_a);
/// assert_eq!(10, b.get_copy());
/// ```
pub fn with_all_locked<S: LockSet, R>(set: S, f: impl FnOnce(&mut AllLocked<S>) -> R) -> R {
    let mut all = lock_all(set);
    f(&mut all)
}

fn check_distinct(locks: &[&dyn Lockable]) {
    for (i, lock) in locks.iter().enumerate() {
        let conflicts = locks[..i]
            .iter()
            .any(|other| other.addr() == lock.addr() && !(other.shared() && lock.shared()));
        if conflicts {
            // it could never be locked: an exclusive hold conflicts with any other one
            panic!("container #{i} is passed to lock_all more than once");
        }
    }
}

fn acquire(locks: &[&dyn Lockable]) {
    let n = locks.len();
    let mut first = 0;
    let mut attempt = 0usize;
    'retry: loop {
        // the only blocking call, nothing else is held at this point
        locks[first].lock();
        for step in 1..n {
            let idx = (first + step) % n;
            if !locks[idx].try_lock() {
                // back off: give back all we have, newest first
                for back in (0..step).rev() {
                    unsafe { locks[(first + back) % n].unlock() };
                }
                attempt += 1;
                trace!(attempt, blocked_on = idx, "backing off");
                // block on the busy one next time => no spinning around it
                first = idx;
                continue 'retry;
            }
        }
        return;
    }
}

fn release(locks: &[&dyn Lockable]) {
    for lock in locks.iter().rev() {
        // SAFETY: AllLocked exists only with every lock held
        unsafe { lock.unlock() };
    }
    // after all the unlocks, same as a single container
    for lock in locks {
        lock.notify();
    }
}
