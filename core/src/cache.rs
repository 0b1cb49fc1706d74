//! Cache-aside store for derived signals, with single-flight coalescing.
//!
//! RULES:
//!   - Entries are immutable snapshots; a refresh replaces the whole value.
//!   - Concurrent misses on one key run the factory exactly once: the
//!     first caller becomes the leader, the rest wait on its result.
//!   - Waiters are bounded by `wait_timeout`; hitting it is a transient
//!     [`EngineError::Timeout`], never a panic or a stale read.
//!   - If the leader fails, its in-flight marker is removed and one of
//!     the waiters is woken to lead a fresh attempt.

use crate::{
    clock::SharedClock,
    error::{EngineError, EngineResult},
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::time::Instant;

enum Slot<V> {
    Ready { value: V, expires_at: DateTime<Utc> },
    InFlight,
}

pub struct SignalCache<V> {
    name: &'static str,
    clock: SharedClock,
    wait_timeout: std::time::Duration,
    state: Mutex<HashMap<String, Slot<V>>>,
    ready: Condvar,
}

impl<V: Clone> SignalCache<V> {
    pub fn new(name: &'static str, clock: SharedClock, wait_timeout: std::time::Duration) -> Self {
        Self {
            name,
            clock,
            wait_timeout,
            state: Mutex::new(HashMap::new()),
            ready: Condvar::new(),
        }
    }

    /// Return the cached value if present and unexpired.
    pub fn get(&self, key: &str) -> Option<V> {
        let map = self.state.lock();
        match map.get(key) {
            Some(Slot::Ready { value, expires_at }) if *expires_at > self.clock.now() => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Store a value unconditionally, replacing any prior entry.
    pub fn insert(&self, key: &str, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        let mut map = self.state.lock();
        map.insert(key.to_string(), Slot::Ready { value, expires_at });
        drop(map);
        self.ready.notify_all();
    }

    /// Cache-aside read: return the fresh cached value, or compute it via
    /// `factory` and store it under `ttl`. Concurrent misses coalesce.
    pub fn get_or_compute<F>(&self, key: &str, ttl: Duration, factory: F) -> EngineResult<V>
    where
        F: FnOnce() -> EngineResult<V>,
    {
        enum Next<V> {
            Hit(V),
            Wait,
            Lead,
        }

        let deadline = Instant::now() + self.wait_timeout;
        {
            let mut map = self.state.lock();
            loop {
                let next = match map.get(key) {
                    Some(Slot::Ready { value, expires_at })
                        if *expires_at > self.clock.now() =>
                    {
                        Next::Hit(value.clone())
                    }
                    Some(Slot::InFlight) => Next::Wait,
                    // Miss or stale entry: this caller leads the refresh.
                    _ => Next::Lead,
                };
                match next {
                    Next::Hit(value) => return Ok(value),
                    Next::Wait => {
                        let result = self.ready.wait_until(&mut map, deadline);
                        let still_in_flight =
                            matches!(map.get(key), Some(Slot::InFlight));
                        if result.timed_out() && still_in_flight {
                            log::warn!(
                                "cache {}: gave up waiting on in-flight '{key}'",
                                self.name
                            );
                            return Err(EngineError::Timeout {
                                operation: format!("cache {} key '{key}'", self.name),
                                waited_ms: self.wait_timeout.as_millis() as u64,
                            });
                        }
                        // Woken (or raced a removal): re-check the slot.
                    }
                    Next::Lead => {
                        map.insert(key.to_string(), Slot::InFlight);
                        break;
                    }
                }
            }
        }

        log::debug!("cache {}: computing '{key}'", self.name);
        let result = factory();

        let mut map = self.state.lock();
        match &result {
            Ok(value) => {
                let expires_at = self.clock.now() + ttl;
                map.insert(
                    key.to_string(),
                    Slot::Ready {
                        value: value.clone(),
                        expires_at,
                    },
                );
            }
            Err(e) => {
                log::warn!("cache {}: factory for '{key}' failed: {e}", self.name);
                map.remove(key);
            }
        }
        drop(map);
        self.ready.notify_all();
        result
    }
}
