//! Simple In-Memory Cache
//!
//! Time-based cache keyed by string, used to layer caching over
//! code fetches without touching the inspector itself.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Simple time-based cache
#[derive(Debug)]
pub struct Cache<T> {
    data: HashMap<String, (T, Instant)>,
    ttl: Duration,
}

impl<T: Clone> Cache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: HashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.data.get(key).and_then(|(value, inserted)| {
            if inserted.elapsed() < self.ttl {
                Some(value.clone())
            } else {
                None
            }
        })
    }

    pub fn set(&mut self, key: String, value: T) {
        self.data.insert(key, (value, Instant::now()));
    }

    pub fn invalidate(&mut self, key: &str) {
        self.data.remove(key);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove expired entries
    pub fn cleanup(&mut self) {
        let ttl = self.ttl;
        self.data.retain(|_, (_, inserted)| inserted.elapsed() < ttl);
    }
}
