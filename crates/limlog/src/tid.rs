//! Cached OS thread identifier.

use std::cell::Cell;

thread_local! {
    static TID: Cell<u64> = const { Cell::new(0) };
}

/// Decimal OS thread id of the calling thread, resolved once per thread.
pub fn current() -> u64 {
    TID.with(|cell| {
        let cached = cell.get();
        if cached != 0 {
            return cached;
        }
        let tid = os_thread_id();
        cell.set(tid);
        tid
    })
}

#[cfg(target_os = "linux")]
fn os_thread_id() -> u64 {
    // SAFETY: gettid has no preconditions.
    (unsafe { libc::gettid() }) as u64
}

#[cfg(all(unix, not(target_os = "linux")))]
fn os_thread_id() -> u64 {
    // SAFETY: pthread_self has no preconditions.
    (unsafe { libc::pthread_self() }) as u64
}

#[cfg(not(unix))]
fn os_thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_within_a_thread() {
        assert_ne!(current(), 0);
        assert_eq!(current(), current());
    }

    #[test]
    fn test_differs_across_threads() {
        let here = current();
        let there = std::thread::spawn(current).join().unwrap();
        assert_ne!(here, there);
    }
}
