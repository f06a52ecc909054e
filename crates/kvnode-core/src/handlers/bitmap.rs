use bytes::Bytes;
use futures::future::BoxFuture;
use kvnode_store::{Store, StoreError, StoreValue, TtlNamespace};

use super::parse_i64;

pub fn getbit(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let offset = args[2].clone();
    Box::pin(async move {
        let offset = parse_i64(&offset)?;
        Ok(StoreValue::Int(store.getbit(&key, offset).await?))
    })
}

fn setbit_impl(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let offset = args[2].clone();
    let value = args[3].clone();
    Box::pin(async move {
        let offset = parse_i64(&offset)?;
        let value = parse_i64(&value)?;
        Ok(StoreValue::Int(store.setbit(&key, offset, value).await?))
    })
}

pub fn setbit(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    setbit_impl(store, args)
}

/// `SETBITV2` is the same store-level operation as `SETBIT`; the `v2`
/// name reflects which proposer path (§4.5) the write travels through,
/// not a difference in semantics.
pub fn setbitv2(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    setbit_impl(store, args)
}

pub fn bitcount(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let range_args: Vec<Bytes> = args[2..].to_vec();
    Box::pin(async move {
        let range = match range_args.len() {
            0 => None,
            2 => Some((parse_i64(&range_args[0])?, parse_i64(&range_args[1])?)),
            _ => {
                return Err(StoreError::Unsupported(
                    "BITCOUNT takes zero or two range arguments".to_string(),
                ))
            }
        };
        Ok(StoreValue::Int(store.bitcount(&key, range).await?))
    })
}

pub fn bexpire(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let seconds = args[2].clone();
    Box::pin(async move {
        let seconds = parse_i64(&seconds)?;
        Ok(StoreValue::Bool(store.expire(TtlNamespace::Bitmap, &key, seconds).await?))
    })
}

pub fn bttl(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Int(store.ttl(TtlNamespace::Bitmap, &key).await?)) })
}

pub fn bpersist(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Bool(store.persist(TtlNamespace::Bitmap, &key).await?)) })
}

pub fn bkeyexist(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Bool(store.keyexist(TtlNamespace::Bitmap, &key).await?)) })
}
