//! `SCAN`/`ADVSCAN`: admin commands with no namespaced key argument
//! (DESIGN.md supplemented feature). Both are read-only, cursor-based
//! passthroughs to the store; this layer's only contract with them is
//! the cursor argument shape, not keyspace iteration itself.

use bytes::Bytes;
use futures::future::BoxFuture;
use kvnode_store::{Store, StoreError, StoreValue};

use super::parse_u64;

/// Default page size when the caller omits `COUNT`, matching the
/// teacher's default batch cap order of magnitude.
const DEFAULT_SCAN_COUNT: usize = 10;

pub fn scan(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let cursor = args[1].clone();
    let count = args.get(2).cloned();
    Box::pin(async move {
        let cursor = parse_u64(&cursor)?;
        let count = match count {
            Some(c) => parse_u64(&c)? as usize,
            None => DEFAULT_SCAN_COUNT,
        };
        let (next, keys) = store.scan(cursor, count).await?;
        Ok(StoreValue::Array(vec![
            StoreValue::Int(next as i64),
            StoreValue::Array(keys.into_iter().map(StoreValue::Bulk).collect()),
        ]))
    })
}

pub fn advscan(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let cursor = args[1].clone();
    let count = args.get(2).cloned();
    let pattern = args.get(3).cloned();
    Box::pin(async move {
        let cursor = parse_u64(&cursor)?;
        let count = match count {
            Some(c) => parse_u64(&c)? as usize,
            None => DEFAULT_SCAN_COUNT,
        };
        let (next, keys) = store.advscan(cursor, count, pattern.as_deref()).await?;
        Ok(StoreValue::Array(vec![
            StoreValue::Int(next as i64),
            StoreValue::Array(keys.into_iter().map(StoreValue::Bulk).collect()),
        ]))
    })
}
