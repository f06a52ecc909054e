//! The generic per-namespace TTL bookkeeping shared by every data type
//! that has an `(EXPIRE, TTL, PERSIST, KEYEXIST)` family (§3, §4.7).
//!
//! Each TTL namespace is independent: a `KV` key and a `ZSET` key that
//! happen to share the same bytes never interact. The in-memory store
//! keeps one `HashMap<Bytes, Entry<T>>` per namespace and applies the
//! same expiry sweep to each via [`Entry::is_expired`], rather than
//! duplicating the TTL arithmetic per data type.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::Bytes;

/// Which TTL family a key belongs to. `Hash`/`List`/`Set` are named here
/// because §3 describes them as following the same pattern as `Zset`;
/// the covered command surface (§6) only wires `Kv`, `Bitmap`, and `Zset`
/// into the registry, so those two variants currently have no reachable
/// command but exist so the namespace split is total, not partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlNamespace {
    Kv,
    Bitmap,
    Hash,
    List,
    Set,
    Zset,
}

/// A stored value plus its optional expiry instant. `None` means no TTL.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub value: T,
    pub expire_at: Option<Instant>,
}

impl<T> Entry<T> {
    pub fn fresh(value: T) -> Self {
        Entry {
            value,
            expire_at: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expire_at, Some(at) if at <= now)
    }

    /// Remaining TTL in whole seconds, or `-1` if the key has no TTL.
    /// Matches the Redis `TTL` convention used throughout §8's scenarios.
    pub fn ttl_seconds(&self, now: Instant) -> i64 {
        match self.expire_at {
            None => -1,
            Some(at) if at <= now => -1,
            Some(at) => (at - now).as_secs() as i64 + 1,
        }
    }
}

/// Remaining TTL in seconds for `key` in `map`, sweeping it away first if
/// its TTL has already elapsed. `-1` covers both "no TTL" and "absent".
pub(crate) fn ttl_of<T>(map: &Mutex<HashMap<Bytes, Entry<T>>>, key: &[u8]) -> i64 {
    let now = Instant::now();
    let mut guard = map.lock().unwrap();
    match guard.get(key) {
        Some(e) if e.is_expired(now) => {
            guard.remove(key);
            -1
        }
        Some(e) => e.ttl_seconds(now),
        None => -1,
    }
}

/// Installs a fresh TTL on an existing, live key. Returns `false` if the
/// key is absent (or just expired).
pub(crate) fn expire_of<T>(map: &Mutex<HashMap<Bytes, Entry<T>>>, key: &[u8], secs: i64) -> bool {
    let now = Instant::now();
    let mut guard = map.lock().unwrap();
    match guard.get_mut(key) {
        Some(e) if e.is_expired(now) => {
            guard.remove(key);
            false
        }
        Some(e) => {
            e.expire_at = Some(now + Duration::from_secs(secs.max(0) as u64));
            true
        }
        None => false,
    }
}

/// Clears any TTL on `key`. Returns whether a TTL was actually present.
pub(crate) fn persist_of<T>(map: &Mutex<HashMap<Bytes, Entry<T>>>, key: &[u8]) -> bool {
    let now = Instant::now();
    let mut guard = map.lock().unwrap();
    match guard.get_mut(key) {
        Some(e) if e.is_expired(now) => {
            guard.remove(key);
            false
        }
        Some(e) => {
            let had = e.expire_at.is_some();
            e.expire_at = None;
            had
        }
        None => false,
    }
}

/// Whether `key` is present and live in `map`.
pub(crate) fn keyexist_of<T>(map: &Mutex<HashMap<Bytes, Entry<T>>>, key: &[u8]) -> bool {
    let now = Instant::now();
    let mut guard = map.lock().unwrap();
    match guard.get(key) {
        Some(e) if e.is_expired(now) => {
            guard.remove(key);
            false
        }
        Some(_) => true,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ttl_reports_negative_one() {
        let entry = Entry::fresh(7);
        assert_eq!(entry.ttl_seconds(Instant::now()), -1);
    }

    #[test]
    fn expired_entry_reports_negative_one() {
        let mut entry = Entry::fresh(7);
        entry.expire_at = Some(Instant::now());
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(entry.is_expired(Instant::now()));
        assert_eq!(entry.ttl_seconds(Instant::now()), -1);
    }
}
