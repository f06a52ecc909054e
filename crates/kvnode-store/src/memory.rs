//! An in-memory reference [`Store`] implementation. Exists so the
//! dispatch core's contract can be exercised in tests without a real
//! storage engine; no persistence, no background compaction, no
//! partitioning — one `Mutex<HashMap<...>>` per data type.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;

use crate::store::Store;
use crate::ttl::{expire_of, keyexist_of, persist_of, ttl_of, Entry, TtlNamespace};
use crate::zset::{LexBound, ZSet};
use crate::StoreError;

#[derive(Default)]
pub struct InMemoryStore {
    strings: Mutex<HashMap<Bytes, Entry<Bytes>>>,
    bitmaps: Mutex<HashMap<Bytes, Entry<Vec<u8>>>>,
    zsets: Mutex<HashMap<Bytes, Entry<ZSet>>>,
    hlls: Mutex<HashMap<Bytes, Entry<HashSet<Bytes>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace_ttl(&self, ns: TtlNamespace, key: &[u8]) -> i64 {
        match ns {
            TtlNamespace::Kv => ttl_of(&self.strings, key),
            TtlNamespace::Bitmap => ttl_of(&self.bitmaps, key),
            TtlNamespace::Zset => ttl_of(&self.zsets, key),
            TtlNamespace::Hash | TtlNamespace::List | TtlNamespace::Set => -1,
        }
    }
}

/// Removes `key` from `map` if its TTL has elapsed, and returns a clone of
/// its live value otherwise. Centralizes the "invisible to every read"
/// invariant (§3) so every read path sweeps expiry the same way.
fn read_live<T: Clone>(map: &Mutex<HashMap<Bytes, Entry<T>>>, key: &[u8]) -> Option<T> {
    let now = Instant::now();
    let mut guard = map.lock().unwrap();
    match guard.get(key) {
        Some(e) if e.is_expired(now) => {
            guard.remove(key);
            None
        }
        Some(e) => Some(e.value.clone()),
        None => None,
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError> {
        Ok(read_live(&self.strings, key))
    }

    async fn set(&self, key: &[u8], value: Bytes) -> Result<(), StoreError> {
        self.strings
            .lock()
            .unwrap()
            .insert(Bytes::copy_from_slice(key), Entry::fresh(value));
        Ok(())
    }

    async fn set_preserve_ttl(&self, key: &[u8], value: Bytes) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut guard = self.strings.lock().unwrap();
        let expire_at = guard
            .get(key)
            .filter(|e| !e.is_expired(now))
            .and_then(|e| e.expire_at);
        guard.insert(
            Bytes::copy_from_slice(key),
            Entry {
                value,
                expire_at,
            },
        );
        Ok(())
    }

    async fn setnx(&self, key: &[u8], value: Bytes) -> Result<bool, StoreError> {
        if read_live(&self.strings, key).is_some() {
            return Ok(false);
        }
        self.strings
            .lock()
            .unwrap()
            .insert(Bytes::copy_from_slice(key), Entry::fresh(value));
        Ok(true)
    }

    async fn setex(&self, key: &[u8], ttl_secs: i64, value: Bytes) -> Result<(), StoreError> {
        self.strings.lock().unwrap().insert(
            Bytes::copy_from_slice(key),
            Entry {
                value,
                expire_at: Some(Instant::now() + Duration::from_secs(ttl_secs.max(0) as u64)),
            },
        );
        Ok(())
    }

    async fn getset(&self, key: &[u8], value: Bytes) -> Result<Option<Bytes>, StoreError> {
        let old = read_live(&self.strings, key);
        self.strings
            .lock()
            .unwrap()
            .insert(Bytes::copy_from_slice(key), Entry::fresh(value));
        Ok(old)
    }

    async fn mget(&self, keys: &[Bytes]) -> Result<Vec<Option<Bytes>>, StoreError> {
        Ok(keys.iter().map(|k| read_live(&self.strings, k)).collect())
    }

    async fn mset(&self, pairs: &[(Bytes, Bytes)]) -> Result<(), StoreError> {
        let mut guard = self.strings.lock().unwrap();
        for (k, v) in pairs {
            guard.insert(k.clone(), Entry::fresh(v.clone()));
        }
        Ok(())
    }

    async fn incr_by(&self, key: &[u8], delta: i64) -> Result<i64, StoreError> {
        let now = Instant::now();
        let mut guard = self.strings.lock().unwrap();
        let current = match guard.get(key) {
            Some(e) if !e.is_expired(now) => parse_i64(&e.value)?,
            _ => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::Unsupported("increment overflows i64".to_string()))?;
        let expire_at = guard.get(key).filter(|e| !e.is_expired(now)).and_then(|e| e.expire_at);
        guard.insert(
            Bytes::copy_from_slice(key),
            Entry {
                value: Bytes::from(next.to_string()),
                expire_at,
            },
        );
        Ok(next)
    }

    /// `DEL` spans Redis's single unified keyspace: a key is of exactly one
    /// type at a time, so removing it means checking every type's table
    /// (S6 relies on this — `PFADD`'s HLL lives in its own table here,
    /// but `DEL k` must still make `PFCOUNT k` report 0 afterward).
    async fn del(&self, keys: &[Bytes]) -> Result<i64, StoreError> {
        let mut n = 0;
        for k in keys {
            let mut removed = false;
            removed |= self.strings.lock().unwrap().remove(k.as_ref()).is_some();
            removed |= self.bitmaps.lock().unwrap().remove(k.as_ref()).is_some();
            removed |= self.zsets.lock().unwrap().remove(k.as_ref()).is_some();
            removed |= self.hlls.lock().unwrap().remove(k.as_ref()).is_some();
            if removed {
                n += 1;
            }
        }
        Ok(n)
    }

    async fn exists(&self, keys: &[Bytes]) -> Result<i64, StoreError> {
        Ok(keys
            .iter()
            .filter(|k| read_live(&self.strings, k).is_some())
            .count() as i64)
    }

    async fn strlen(&self, key: &[u8]) -> Result<i64, StoreError> {
        Ok(read_live(&self.strings, key).map(|v| v.len() as i64).unwrap_or(0))
    }

    async fn append(&self, key: &[u8], value: &[u8]) -> Result<i64, StoreError> {
        let now = Instant::now();
        let mut guard = self.strings.lock().unwrap();
        let expire_at = guard.get(key).filter(|e| !e.is_expired(now)).and_then(|e| e.expire_at);
        let mut buf = guard
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.to_vec())
            .unwrap_or_default();
        buf.extend_from_slice(value);
        let len = buf.len() as i64;
        guard.insert(
            Bytes::copy_from_slice(key),
            Entry {
                value: Bytes::from(buf),
                expire_at,
            },
        );
        Ok(len)
    }

    async fn setrange(&self, key: &[u8], offset: i64, value: &[u8]) -> Result<i64, StoreError> {
        if offset < 0 {
            return Err(StoreError::Unsupported("negative SETRANGE offset".to_string()));
        }
        let offset = offset as usize;
        let now = Instant::now();
        let mut guard = self.strings.lock().unwrap();
        let expire_at = guard.get(key).filter(|e| !e.is_expired(now)).and_then(|e| e.expire_at);
        let mut buf = guard
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.to_vec())
            .unwrap_or_default();
        if buf.len() < offset + value.len() {
            buf.resize(offset + value.len(), 0);
        }
        buf[offset..offset + value.len()].copy_from_slice(value);
        let len = buf.len() as i64;
        guard.insert(
            Bytes::copy_from_slice(key),
            Entry {
                value: Bytes::from(buf),
                expire_at,
            },
        );
        Ok(len)
    }

    async fn ttl(&self, ns: TtlNamespace, key: &[u8]) -> Result<i64, StoreError> {
        Ok(self.namespace_ttl(ns, key))
    }

    async fn expire(&self, ns: TtlNamespace, key: &[u8], secs: i64) -> Result<bool, StoreError> {
        Ok(match ns {
            TtlNamespace::Kv => expire_of(&self.strings, key, secs),
            TtlNamespace::Bitmap => expire_of(&self.bitmaps, key, secs),
            TtlNamespace::Zset => expire_of(&self.zsets, key, secs),
            TtlNamespace::Hash | TtlNamespace::List | TtlNamespace::Set => false,
        })
    }

    async fn persist(&self, ns: TtlNamespace, key: &[u8]) -> Result<bool, StoreError> {
        Ok(match ns {
            TtlNamespace::Kv => persist_of(&self.strings, key),
            TtlNamespace::Bitmap => persist_of(&self.bitmaps, key),
            TtlNamespace::Zset => persist_of(&self.zsets, key),
            TtlNamespace::Hash | TtlNamespace::List | TtlNamespace::Set => false,
        })
    }

    async fn keyexist(&self, ns: TtlNamespace, key: &[u8]) -> Result<bool, StoreError> {
        Ok(match ns {
            TtlNamespace::Kv => keyexist_of(&self.strings, key),
            TtlNamespace::Bitmap => keyexist_of(&self.bitmaps, key),
            TtlNamespace::Zset => keyexist_of(&self.zsets, key),
            TtlNamespace::Hash | TtlNamespace::List | TtlNamespace::Set => false,
        })
    }

    async fn getbit(&self, key: &[u8], offset: i64) -> Result<i64, StoreError> {
        if offset < 0 {
            return Err(StoreError::Unsupported("negative bit offset".to_string()));
        }
        let bits = read_live(&self.bitmaps, key).unwrap_or_default();
        Ok(bit_get(&bits, offset as usize) as i64)
    }

    async fn setbit(&self, key: &[u8], offset: i64, value: i64) -> Result<i64, StoreError> {
        if offset < 0 {
            return Err(StoreError::Unsupported("negative bit offset".to_string()));
        }
        let now = Instant::now();
        let mut guard = self.bitmaps.lock().unwrap();
        let expire_at = guard.get(key).filter(|e| !e.is_expired(now)).and_then(|e| e.expire_at);
        let mut bits = guard
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
            .unwrap_or_default();
        let previous = bit_get(&bits, offset as usize);
        bit_set(&mut bits, offset as usize, value != 0);
        guard.insert(
            Bytes::copy_from_slice(key),
            Entry {
                value: bits,
                expire_at,
            },
        );
        Ok(previous as i64)
    }

    async fn bitcount(&self, key: &[u8], range: Option<(i64, i64)>) -> Result<i64, StoreError> {
        let bits = read_live(&self.bitmaps, key).unwrap_or_default();
        let slice: &[u8] = match range {
            None => &bits,
            Some((start, end)) => {
                let len = bits.len() as i64;
                let clamp = |i: i64| -> usize {
                    let resolved = if i < 0 { (len + i).max(0) } else { i };
                    resolved.min(len) as usize
                };
                let (start, end) = (clamp(start), clamp(end));
                if start > end || start >= bits.len() {
                    &[]
                } else {
                    &bits[start..=end.min(bits.len() - 1)]
                }
            }
        };
        Ok(slice.iter().map(|b| b.count_ones() as i64).sum())
    }

    async fn pfadd(&self, key: &[u8], elements: &[Bytes]) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut guard = self.hlls.lock().unwrap();
        let expire_at = guard.get(key).filter(|e| !e.is_expired(now)).and_then(|e| e.expire_at);
        let mut set = guard
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
            .unwrap_or_default();
        let mut changed = !guard.contains_key(key);
        for el in elements {
            changed |= set.insert(el.clone());
        }
        guard.insert(
            Bytes::copy_from_slice(key),
            Entry {
                value: set,
                expire_at,
            },
        );
        Ok(changed)
    }

    async fn pfcount(&self, keys: &[Bytes]) -> Result<i64, StoreError> {
        let mut union: HashSet<Bytes> = HashSet::new();
        for key in keys {
            if let Some(set) = read_live(&self.hlls, key) {
                union.extend(set);
            }
        }
        Ok(union.len() as i64)
    }

    async fn zadd(&self, key: &[u8], pairs: &[(f64, Bytes)]) -> Result<i64, StoreError> {
        let mut guard = self.zsets.lock().unwrap();
        let entry = guard
            .entry(Bytes::copy_from_slice(key))
            .or_insert_with(|| Entry::fresh(ZSet::default()));
        let mut added = 0;
        for (score, member) in pairs {
            if entry.value.insert(member.clone(), *score) {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn zscore(&self, key: &[u8], member: &[u8]) -> Result<Option<f64>, StoreError> {
        Ok(read_live(&self.zsets, key).and_then(|z| z.score(member)))
    }

    async fn zincrby(&self, key: &[u8], delta: f64, member: &[u8]) -> Result<f64, StoreError> {
        let mut guard = self.zsets.lock().unwrap();
        let entry = guard
            .entry(Bytes::copy_from_slice(key))
            .or_insert_with(|| Entry::fresh(ZSet::default()));
        let next = entry.value.score(member).unwrap_or(0.0) + delta;
        entry.value.insert(Bytes::copy_from_slice(member), next);
        Ok(next)
    }

    async fn zcard(&self, key: &[u8]) -> Result<i64, StoreError> {
        Ok(read_live(&self.zsets, key).map(|z| z.len() as i64).unwrap_or(0))
    }

    async fn zcount(&self, key: &[u8], min: f64, max: f64) -> Result<i64, StoreError> {
        Ok(read_live(&self.zsets, key).map(|z| z.count_by_score(min, max)).unwrap_or(0))
    }

    async fn zlexcount(&self, key: &[u8], min: LexBound, max: LexBound) -> Result<i64, StoreError> {
        Ok(read_live(&self.zsets, key)
            .map(|z| z.count_by_lex(&min, &max))
            .unwrap_or(0))
    }

    async fn zrank(&self, key: &[u8], member: &[u8], rev: bool) -> Result<Option<i64>, StoreError> {
        Ok(read_live(&self.zsets, key).and_then(|z| z.rank(member, rev)))
    }

    async fn zrange(
        &self,
        key: &[u8],
        start: i64,
        stop: i64,
        rev: bool,
    ) -> Result<Vec<(Bytes, f64)>, StoreError> {
        Ok(read_live(&self.zsets, key)
            .map(|z| z.range_by_rank(start, stop, rev))
            .unwrap_or_default())
    }

    async fn zrangebyscore(
        &self,
        key: &[u8],
        min: f64,
        max: f64,
        rev: bool,
    ) -> Result<Vec<(Bytes, f64)>, StoreError> {
        Ok(read_live(&self.zsets, key)
            .map(|z| z.range_by_score(min, max, rev))
            .unwrap_or_default())
    }

    async fn zrangebylex(
        &self,
        key: &[u8],
        min: LexBound,
        max: LexBound,
        rev: bool,
    ) -> Result<Vec<Bytes>, StoreError> {
        Ok(read_live(&self.zsets, key)
            .map(|z| z.range_by_lex(&min, &max, rev))
            .unwrap_or_default())
    }

    async fn zrem(&self, key: &[u8], members: &[Bytes]) -> Result<i64, StoreError> {
        let mut guard = self.zsets.lock().unwrap();
        let Some(entry) = guard.get_mut(key) else {
            return Ok(0);
        };
        let mut n = 0;
        for m in members {
            if entry.value.remove(m) {
                n += 1;
            }
        }
        Ok(n)
    }

    async fn zremrangebyrank(&self, key: &[u8], start: i64, stop: i64) -> Result<i64, StoreError> {
        let mut guard = self.zsets.lock().unwrap();
        Ok(guard.get_mut(key).map(|e| e.value.remove_by_rank(start, stop)).unwrap_or(0))
    }

    async fn zremrangebyscore(&self, key: &[u8], min: f64, max: f64) -> Result<i64, StoreError> {
        let mut guard = self.zsets.lock().unwrap();
        Ok(guard.get_mut(key).map(|e| e.value.remove_by_score(min, max)).unwrap_or(0))
    }

    async fn zremrangebylex(&self, key: &[u8], min: LexBound, max: LexBound) -> Result<i64, StoreError> {
        let mut guard = self.zsets.lock().unwrap();
        Ok(guard
            .get_mut(key)
            .map(|e| e.value.remove_by_lex(&min, &max))
            .unwrap_or(0))
    }

    async fn zclear(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.zsets.lock().unwrap().remove(key).is_some())
    }

    async fn scan(&self, cursor: u64, count: usize) -> Result<(u64, Vec<Bytes>), StoreError> {
        self.advscan(cursor, count, None).await
    }

    async fn advscan(
        &self,
        cursor: u64,
        count: usize,
        pattern: Option<&[u8]>,
    ) -> Result<(u64, Vec<Bytes>), StoreError> {
        let now = Instant::now();
        let guard = self.strings.lock().unwrap();
        let mut keys: Vec<&Bytes> = guard
            .iter()
            .filter(|(_, e)| !e.is_expired(now))
            .map(|(k, _)| k)
            .collect();
        keys.sort();
        let matches = |k: &Bytes| match pattern {
            None => true,
            Some(p) => k.as_ref() == p,
        };
        let start = cursor as usize;
        let mut out = Vec::new();
        let mut next = start;
        while next < keys.len() && out.len() < count {
            if matches(keys[next]) {
                out.push(keys[next].clone());
            }
            next += 1;
        }
        let next_cursor = if next >= keys.len() { 0 } else { next as u64 };
        Ok((next_cursor, out))
    }
}

fn parse_i64(bytes: &[u8]) -> Result<i64, StoreError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| StoreError::Unsupported("value is not an integer".to_string()))
}

fn bit_get(bits: &[u8], offset: usize) -> u8 {
    let byte = offset / 8;
    if byte >= bits.len() {
        return 0;
    }
    (bits[byte] >> (7 - offset % 8)) & 1
}

fn bit_set(bits: &mut Vec<u8>, offset: usize, value: bool) {
    let byte = offset / 8;
    if bits.len() <= byte {
        bits.resize(byte + 1, 0);
    }
    let mask = 1 << (7 - offset % 8);
    if value {
        bits[byte] |= mask;
    } else {
        bits[byte] &= !mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_clears_ttl_and_getset_reports_old_value() {
        let store = InMemoryStore::new();
        store.setex(b"k", 100, Bytes::from_static(b"v1")).await.unwrap();
        assert_eq!(store.ttl(TtlNamespace::Kv, b"k").await.unwrap(), 100);

        let old = store.getset(b"k", Bytes::from_static(b"v2")).await.unwrap();
        assert_eq!(old, Some(Bytes::from_static(b"v1")));
        assert_eq!(store.ttl(TtlNamespace::Kv, b"k").await.unwrap(), -1);
    }

    #[tokio::test]
    async fn append_preserves_existing_ttl() {
        let store = InMemoryStore::new();
        store.setex(b"k", 100, Bytes::from_static(b"hello")).await.unwrap();
        store.append(b"k", b" world").await.unwrap();
        assert_eq!(store.get(b"k").await.unwrap(), Some(Bytes::from_static(b"hello world")));
        assert_eq!(store.ttl(TtlNamespace::Kv, b"k").await.unwrap(), 100);
    }

    #[tokio::test]
    async fn expired_key_is_invisible_to_every_read() {
        let store = InMemoryStore::new();
        store.setex(b"k", 0, Bytes::from_static(b"v")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.get(b"k").await.unwrap(), None);
        assert_eq!(store.exists(&[Bytes::from_static(b"k")]).await.unwrap(), 0);
        assert_eq!(store.mget(&[Bytes::from_static(b"k")]).await.unwrap(), vec![None]);
        assert_eq!(store.ttl(TtlNamespace::Kv, b"k").await.unwrap(), -1);
    }

    #[tokio::test]
    async fn setbit_and_bitcount() {
        let store = InMemoryStore::new();
        let previous = store.setbit(b"key", 100, 1).await.unwrap();
        assert_eq!(previous, 0);
        assert_eq!(store.getbit(b"key", 100).await.unwrap(), 1);
        assert_eq!(store.bitcount(b"key", None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pfadd_and_pfcount_track_distinct_elements() {
        let store = InMemoryStore::new();
        assert!(store.pfadd(b"k", &[]).await.unwrap());
        assert!(store.pfadd(b"k", &[Bytes::from_static(b"1"), Bytes::from_static(b"2"), Bytes::from_static(b"3")]).await.unwrap());
        assert_eq!(store.pfcount(&[Bytes::from_static(b"k")]).await.unwrap(), 3);
        store.del(&[Bytes::from_static(b"k")]).await.unwrap();
    }

    #[tokio::test]
    async fn zset_range_and_rank() {
        let store = InMemoryStore::new();
        store
            .zadd(
                b"z",
                &[(1.0, Bytes::from_static(b"a")), (2.0, Bytes::from_static(b"b"))],
            )
            .await
            .unwrap();
        assert_eq!(store.zrank(b"z", b"b", false).await.unwrap(), Some(1));
        let range = store.zrange(b"z", 0, -1, false).await.unwrap();
        assert_eq!(range.len(), 2);
    }
}
