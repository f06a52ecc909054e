use bytes::Bytes;
use futures::future::BoxFuture;
use kvnode_store::{Store, StoreError, StoreValue, TtlNamespace};

use super::parse_i64;

pub fn get(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::BulkOpt(store.get(&key).await?)) })
}

pub fn set(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let (key, value) = (args[1].clone(), args[2].clone());
    Box::pin(async move {
        store.set(&key, value).await?;
        Ok(StoreValue::Ok)
    })
}

/// `PLSET`: see `kvnode_store::Store::set_preserve_ttl`.
pub fn plset(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let (key, value) = (args[1].clone(), args[2].clone());
    Box::pin(async move {
        store.set_preserve_ttl(&key, value).await?;
        Ok(StoreValue::Ok)
    })
}

pub fn setnx(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let (key, value) = (args[1].clone(), args[2].clone());
    Box::pin(async move { Ok(StoreValue::Bool(store.setnx(&key, value).await?)) })
}

pub fn setex(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let seconds = args[2].clone();
    let value = args[3].clone();
    Box::pin(async move {
        let seconds = parse_i64(&seconds)?;
        store.setex(&key, seconds, value).await?;
        Ok(StoreValue::Ok)
    })
}

pub fn getset(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let (key, value) = (args[1].clone(), args[2].clone());
    Box::pin(async move { Ok(StoreValue::BulkOpt(store.getset(&key, value).await?)) })
}

pub fn mget(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let keys: Vec<Bytes> = args[1..].to_vec();
    Box::pin(async move {
        let values = store.mget(&keys).await?;
        Ok(StoreValue::Array(values.into_iter().map(StoreValue::BulkOpt).collect()))
    })
}

pub fn mset(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let pairs: Vec<(Bytes, Bytes)> = args[1..]
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    Box::pin(async move {
        store.mset(&pairs).await?;
        Ok(StoreValue::Ok)
    })
}

fn incr_by_delta(store: &dyn Store, key: Bytes, delta: i64) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    Box::pin(async move { Ok(StoreValue::Int(store.incr_by(&key, delta).await?)) })
}

pub fn incr(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    incr_by_delta(store, args[1].clone(), 1)
}

pub fn incrby(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let delta = args[2].clone();
    Box::pin(async move {
        let delta = parse_i64(&delta)?;
        store.incr_by(&key, delta).await.map(StoreValue::Int)
    })
}

pub fn decrby(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let delta = args[2].clone();
    Box::pin(async move {
        let delta = parse_i64(&delta)?;
        store.incr_by(&key, -delta).await.map(StoreValue::Int)
    })
}

pub fn del(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let keys: Vec<Bytes> = args[1..].to_vec();
    Box::pin(async move { Ok(StoreValue::Int(store.del(&keys).await?)) })
}

/// `EXISTS` is `K-K` (DESIGN.md §4 supplemented feature): it returns the
/// count of keys that exist among the arguments, not a single boolean.
pub fn exists(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let keys: Vec<Bytes> = args[1..].to_vec();
    Box::pin(async move { Ok(StoreValue::Int(store.exists(&keys).await?)) })
}

pub fn strlen(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Int(store.strlen(&key).await?)) })
}

pub fn append(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let value = args[2].clone();
    Box::pin(async move { Ok(StoreValue::Int(store.append(&key, &value).await?)) })
}

pub fn setrange(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let offset = args[2].clone();
    let value = args[3].clone();
    Box::pin(async move {
        let offset = parse_i64(&offset)?;
        Ok(StoreValue::Int(store.setrange(&key, offset, &value).await?))
    })
}

pub fn ttl(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Int(store.ttl(TtlNamespace::Kv, &key).await?)) })
}

pub fn expire(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let seconds = args[2].clone();
    Box::pin(async move {
        let seconds = parse_i64(&seconds)?;
        Ok(StoreValue::Bool(store.expire(TtlNamespace::Kv, &key, seconds).await?))
    })
}

pub fn persist(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Bool(store.persist(TtlNamespace::Kv, &key).await?)) })
}
