//! # Guarded values
//!
//! A value and the lock protecting it live in one [`Guarded`] container,
//! the value is unreachable without holding the lock.
//!
//! ```
//! use guarded::Guarded;
//!
//! let counter = Guarded::<i32>::new(0);
//! std::thread::scope(|s| {
//!     for _ in 0..4 {
//!         s.spawn(|| counter.with_locked(|v| *v += 1));
//!     }
//! });
//! assert_eq!(4, counter.get_copy());
//! ```
//!
//! - [`lock`] - the primitive locks and their capabilities
//! - [`guarded`] - the container, its guards and the `wait*` operations
//! - [`all_locked`] - several containers at once, deadlock-free
//! - [`condition`] - condition facilities behind waiting

pub mod all_locked;
pub mod condition;
pub mod guarded;
pub mod lock;
#[cfg(test)]
mod test_support;

pub use all_locked::{lock_all, with_all_locked, AllLocked};
pub use condition::{NoWait, Wait};
pub use guarded::{Guarded, LockedMut, LockedRef, ReadProxy, WriteProxy};
pub use lock::{ExclusiveLock, RawLock, SharedLock};
