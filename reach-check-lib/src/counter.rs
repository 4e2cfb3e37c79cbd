//! Counter that is safe to share between threads.

use std::sync::{Mutex, PoisonError};

/// A counter guarded by a mutex.
///
/// The lock stays private: callers only see [`Counter::increment`] and
/// [`Counter::read`]. The type is neither `Clone` nor `Copy`; share one
/// instance through an `Arc` instead of duplicating the guard.
#[derive(Debug, Default)]
pub struct Counter {
    value: Mutex<u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the counter.
    pub fn increment(&self) {
        let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        *value += 1;
    }

    /// Current value of the counter.
    pub fn read(&self) -> u64 {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
