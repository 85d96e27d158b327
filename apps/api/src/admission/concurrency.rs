//! Bounded-concurrency admission for heavy inference endpoints.
//!
//! Fail-fast by contract: a request that cannot get a permit immediately is
//! rejected with 429 instead of queued, keeping worst-case latency bounded.
//! The pool is an atomic counter rather than a semaphore so the check and the
//! acquisition are a single compare-exchange, with no window for two callers
//! to race past a separate "is it free" probe.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed-size permit pool guarding the heavy inference endpoints.
#[derive(Clone)]
pub struct InferenceGate {
    max_permits: usize,
    in_flight: Arc<AtomicUsize>,
}

/// RAII permit. Dropping it releases the slot on every exit path.
pub struct InferencePermit {
    in_flight: Arc<AtomicUsize>,
}

impl InferenceGate {
    pub fn new(max_permits: usize) -> Self {
        InferenceGate {
            max_permits: max_permits.max(1),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn max_permits(&self) -> usize {
        self.max_permits
    }

    /// Current in-flight count, for assertions.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Non-blocking acquire. `None` means the pool is saturated.
    pub fn try_acquire(&self) -> Option<InferencePermit> {
        let mut current = self.in_flight.load(Ordering::Acquire);
        loop {
            if current >= self.max_permits {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(InferencePermit {
                        in_flight: Arc::clone(&self.in_flight),
                    })
                }
                Err(observed) => current = observed,
            }
        }
    }
}

impl Drop for InferencePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permits_bounded_by_pool_size() {
        let gate = InferenceGate::new(2);
        let a = gate.try_acquire();
        let b = gate.try_acquire();
        assert!(a.is_some());
        assert!(b.is_some());
        assert!(gate.try_acquire().is_none());
        assert_eq!(gate.in_flight(), 2);
    }

    #[test]
    fn test_drop_releases_permit() {
        let gate = InferenceGate::new(1);
        {
            let _permit = gate.try_acquire().unwrap();
            assert_eq!(gate.in_flight(), 1);
            assert!(gate.try_acquire().is_none());
        }
        assert_eq!(gate.in_flight(), 0);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_release_on_error_path() {
        let gate = InferenceGate::new(1);
        let result: Result<(), &str> = (|| {
            let _permit = gate.try_acquire().unwrap();
            Err("handler failed")
        })();
        assert!(result.is_err());
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_zero_pool_size_clamps_to_one() {
        let gate = InferenceGate::new(0);
        assert_eq!(gate.max_permits(), 1);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_count_returns_to_baseline_after_many_cycles() {
        let gate = InferenceGate::new(3);
        for _ in 0..50 {
            let p1 = gate.try_acquire().unwrap();
            let p2 = gate.try_acquire().unwrap();
            drop(p1);
            drop(p2);
        }
        assert_eq!(gate.in_flight(), 0);
    }
}
