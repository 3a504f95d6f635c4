use std::fmt;

use super::Guarded;
use crate::all_locked::sealed::{Lockable, Proxy};
use crate::condition::WaitMode;
use crate::lock::{is_shared_capable, RawLock};

/// A container handed to [`lock_all`](crate::lock_all) for reading.
/// Locks on the read path and yields `&Y`.
pub struct ReadProxy<'a, Y, L: RawLock, W: WaitMode> {
    guarded: &'a Guarded<Y, L, W>,
}

/// A container handed to [`lock_all`](crate::lock_all) for writing.
/// Locks exclusively and yields `&mut Y`.
pub struct WriteProxy<'a, Y, L: RawLock, W: WaitMode> {
    guarded: &'a Guarded<Y, L, W>,
}

impl<Y, L: RawLock, W: WaitMode> Guarded<Y, L, W> {
    /// Takes part in a coordinated lock on the read path.
    pub fn for_read(&self) -> ReadProxy<'_, Y, L, W> {
        ReadProxy { guarded: self }
    }

    /// Takes part in a coordinated lock exclusively.
    pub fn for_write(&self) -> WriteProxy<'_, Y, L, W> {
        WriteProxy { guarded: self }
    }
}

impl<Y, L: RawLock, W: WaitMode> Lockable for ReadProxy<'_, Y, L, W> {
    fn addr(&self) -> *const () {
        (self.guarded as *const Guarded<Y, L, W>).cast()
    }

    fn shared(&self) -> bool {
        is_shared_capable::<L>()
    }

    fn lock(&self) {
        self.guarded.lock.lock_read()
    }

    fn try_lock(&self) -> bool {
        self.guarded.lock.try_lock_read()
    }

    unsafe fn unlock(&self) {
        self.guarded.lock.unlock_read()
    }

    // readers never notify
    fn notify(&self) {}
}

impl<Y, L: RawLock, W: WaitMode> Lockable for WriteProxy<'_, Y, L, W> {
    fn addr(&self) -> *const () {
        (self.guarded as *const Guarded<Y, L, W>).cast()
    }

    fn shared(&self) -> bool {
        false
    }

    fn lock(&self) {
        self.guarded.lock.lock()
    }

    fn try_lock(&self) -> bool {
        self.guarded.lock.try_lock()
    }

    unsafe fn unlock(&self) {
        self.guarded.lock.unlock()
    }

    fn notify(&self) {
        self.guarded.notify()
    }
}

unsafe impl<'a, Y, L: RawLock, W: WaitMode> Proxy for ReadProxy<'a, Y, L, W> {
    type Ref<'r> = &'r Y where Self: 'r;

    unsafe fn get(&self) -> Self::Ref<'_> {
        &*self.guarded.value.get()
    }
}

unsafe impl<'a, Y, L: RawLock, W: WaitMode> Proxy for WriteProxy<'a, Y, L, W> {
    type Ref<'r> = &'r mut Y where Self: 'r;

    unsafe fn get(&self) -> Self::Ref<'_> {
        &mut *self.guarded.value.get()
    }
}

impl<Y, L: RawLock, W: WaitMode> fmt::Debug for ReadProxy<'_, Y, L, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadProxy").field("addr", &self.addr()).finish()
    }
}

impl<Y, L: RawLock, W: WaitMode> fmt::Debug for WriteProxy<'_, Y, L, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteProxy").field("addr", &self.addr()).finish()
    }
}
