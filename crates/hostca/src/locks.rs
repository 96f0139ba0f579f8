//! Per-hostname mutual exclusion.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

/// A set of hostnames currently being worked on.
///
/// [`HostLocks::lock`] blocks while another thread holds the same hostname;
/// different hostnames never wait on each other.
#[derive(Debug, Default)]
pub struct HostLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

/// Held while a hostname is locked; dropping it releases the hostname.
#[derive(Debug)]
pub struct HostGuard<'a> {
    locks: &'a HostLocks,
    hostname: String,
}

impl HostLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `hostname` is free, then take it.
    pub fn lock(&self, hostname: &str) -> HostGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(hostname) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(hostname.to_string());

        HostGuard {
            locks: self,
            hostname: hostname.to_string(),
        }
    }

    /// Is `hostname` held right now?
    #[must_use]
    pub fn is_locked(&self, hostname: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(hostname)
    }
}

impl HostGuard<'_> {
    /// The hostname this guard holds
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

impl Drop for HostGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.hostname);
        drop(held);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_guard_releases_on_drop() {
        let locks = HostLocks::new();
        {
            let guard = locks.lock("a.example.com");
            assert_eq!(guard.hostname(), "a.example.com");
            assert!(locks.is_locked("a.example.com"));
            assert!(!locks.is_locked("b.example.com"));
        }
        assert!(!locks.is_locked("a.example.com"));
    }

    #[test]
    fn test_same_host_is_exclusive() {
        let locks = HostLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);
        let barrier = Barrier::new(8);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    barrier.wait();
                    let _guard = locks.lock("same.example.com");
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_different_hosts_do_not_block() {
        let locks = HostLocks::new();
        let _a = locks.lock("a.example.com");

        // Would deadlock if hostnames shared a lock.
        thread::scope(|s| {
            s.spawn(|| {
                let _b = locks.lock("b.example.com");
            });
        });
    }
}
