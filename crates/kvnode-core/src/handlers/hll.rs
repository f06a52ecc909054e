use bytes::Bytes;
use futures::future::BoxFuture;
use kvnode_store::{Store, StoreError, StoreValue};

/// `PFADD key [element ...]`: zero elements on a previously-absent key
/// is a valid write that creates the key (S6).
pub fn pfadd(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let elements: Vec<Bytes> = args[2..].to_vec();
    Box::pin(async move { Ok(StoreValue::Bool(store.pfadd(&key, &elements).await?)) })
}

/// `PFCOUNT key [key ...]`: the approximate (here, exact) cardinality of
/// the union of the named keys.
pub fn pfcount(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let keys: Vec<Bytes> = args[1..].to_vec();
    Box::pin(async move { Ok(StoreValue::Int(store.pfcount(&keys).await?)) })
}
