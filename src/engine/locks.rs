//! Per-scope mutual exclusion and cooperative cancellation.

use super::error::{Result, ScheduleError};
use super::types::ScopeKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Registry of one mutex per scope, shared by every scheduler in the process.
///
/// Runs on different scopes never contend; runs on the same scope are
/// serialized for the whole read-modify-write sequence. An entry lives only
/// while some caller holds or waits for it.
#[derive(Clone, Default)]
pub struct ScopeLocks {
    inner: Arc<Mutex<HashMap<ScopeKey, Arc<Mutex<()>>>>>,
}

impl ScopeLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `scope`.
    pub fn with_scope<T>(&self, scope: ScopeKey, f: impl FnOnce() -> T) -> T {
        self.with_scopes(&[scope], f)
    }

    /// Runs `f` while holding the locks of every scope in `scopes`.
    ///
    /// Locks are taken in key order, so overlapping multi-scope callers
    /// cannot deadlock each other.
    pub fn with_scopes<T>(&self, scopes: &[ScopeKey], f: impl FnOnce() -> T) -> T {
        let mut keys = scopes.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let locks: Vec<_> = keys.iter().map(|&k| (k, self.lock_for(k))).collect();
        let value = {
            let _guards: Vec<_> = locks.iter().map(|(_, l)| l.lock()).collect();
            f()
        };
        self.release(locks);
        value
    }

    fn lock_for(&self, scope: ScopeKey) -> Arc<Mutex<()>> {
        let mut registry = self.inner.lock();
        Arc::clone(registry.entry(scope).or_default())
    }

    /// Drops registry entries nobody else holds. Clones are only taken under
    /// the registry lock, so a count of two (registry plus `held`) cannot
    /// grow while it is held.
    fn release(&self, held: Vec<(ScopeKey, Arc<Mutex<()>>)>) {
        let mut registry = self.inner.lock();
        for (scope, lock) in held {
            if Arc::strong_count(&lock) == 2 {
                registry.remove(&scope);
            }
        }
    }

    /// Number of scopes currently held or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared flag a caller flips to abandon an in-flight operation.
#[derive(Clone, Default, Debug)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// # Errors
    /// Returns `Cancelled` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ScheduleError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_scope_is_serialized() {
        let locks = ScopeLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let scope = ScopeKey::new(1, 1, 1);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = locks.clone();
                let inside = Arc::clone(&inside);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    locks.with_scope(scope, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_different_scopes_do_not_block() {
        let locks = ScopeLocks::new();
        let a = ScopeKey::new(1, 1, 1);
        let b = ScopeKey::new(1, 1, 2);
        let nested = locks.with_scope(a, || locks.with_scope(b, || locks.len()));
        assert_eq!(nested, 2);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_repeated_scopes_lock_once() {
        let locks = ScopeLocks::new();
        let a = ScopeKey::new(1, 1, 1);
        let b = ScopeKey::new(2, 1, 1);
        assert_eq!(locks.with_scopes(&[b, a, b, a], || locks.len()), 2);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_registry_does_not_grow_with_scopes_seen() {
        let locks = ScopeLocks::new();
        for image in 0..1_000 {
            locks.with_scope(ScopeKey::new(1, 1, image), || ());
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(ScheduleError::Cancelled)));
    }
}
