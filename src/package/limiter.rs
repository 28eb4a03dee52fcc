//! Bounded parallelism for clone operations.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Runs closures on the calling thread, at most `limit` at a time.
///
/// Waiting callers block on a condition variable and do not pick up other
/// work while they wait, so a caller may hold locks across [`run`].
///
/// [`run`]: CloneLimiter::run
pub struct CloneLimiter {
    free: Mutex<usize>,
    released: Condvar,
    limit: usize,
}

/// A taken slot, handed back on drop even when the closure panics.
struct Permit<'a> {
    limiter: &'a CloneLimiter,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        *self.limiter.slots() += 1;
        self.limiter.released.notify_one();
    }
}

impl CloneLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            free: Mutex::new(limit),
            released: Condvar::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn run<T, F>(&self, op: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _permit = self.acquire();
        op()
    }

    fn acquire(&self) -> Permit<'_> {
        let mut free = self
            .released
            .wait_while(self.slots(), |free| *free == 0)
            .unwrap_or_else(PoisonError::into_inner);
        *free -= 1;
        Permit { limiter: self }
    }

    // The counter stays consistent across a panic, so poisoning is ignored.
    fn slots(&self) -> MutexGuard<'_, usize> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
