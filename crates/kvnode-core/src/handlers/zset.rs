use bytes::Bytes;
use futures::future::BoxFuture;
use kvnode_store::zset::LexBound;
use kvnode_store::{Store, StoreError, StoreValue, TtlNamespace};

use super::{parse_f64, parse_i64};

fn lex_bound(raw: &[u8]) -> Result<LexBound, StoreError> {
    LexBound::parse(raw)
        .ok_or_else(|| StoreError::Unsupported("invalid zset lex range bound".to_string()))
}

pub fn zscore(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let member = args[2].clone();
    Box::pin(async move {
        let score = store.zscore(&key, &member).await?;
        Ok(StoreValue::BulkOpt(score.map(|s| Bytes::from(format_score(s)))))
    })
}

pub fn zcard(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Int(store.zcard(&key).await?)) })
}

pub fn zcount(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let (min, max) = (args[2].clone(), args[3].clone());
    Box::pin(async move {
        let (min, max) = (parse_f64(&min)?, parse_f64(&max)?);
        Ok(StoreValue::Int(store.zcount(&key, min, max).await?))
    })
}

pub fn zlexcount(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let (min, max) = (args[2].clone(), args[3].clone());
    Box::pin(async move {
        let (min, max) = (lex_bound(&min)?, lex_bound(&max)?);
        Ok(StoreValue::Int(store.zlexcount(&key, min, max).await?))
    })
}

fn zrank_impl(store: &dyn Store, args: &[Bytes], rev: bool) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let member = args[2].clone();
    Box::pin(async move { Ok(StoreValue::IntOpt(store.zrank(&key, &member, rev).await?)) })
}

pub fn zrank(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    zrank_impl(store, args, false)
}

pub fn zrevrank(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    zrank_impl(store, args, true)
}

fn zrange_impl(store: &dyn Store, args: &[Bytes], rev: bool) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let (start, stop) = (args[2].clone(), args[3].clone());
    Box::pin(async move {
        let (start, stop) = (parse_i64(&start)?, parse_i64(&stop)?);
        let pairs = store.zrange(&key, start, stop, rev).await?;
        Ok(StoreValue::MemberScores(pairs))
    })
}

pub fn zrange(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    zrange_impl(store, args, false)
}

pub fn zrevrange(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    zrange_impl(store, args, true)
}

fn zrangebyscore_impl(
    store: &dyn Store,
    args: &[Bytes],
    rev: bool,
) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let (a, b) = (args[2].clone(), args[3].clone());
    Box::pin(async move {
        // ZREVRANGEBYSCORE takes (max, min) in that order; ZRANGEBYSCORE
        // takes (min, max). Normalize to (min, max) for the store call.
        let (min, max) = if rev {
            (parse_f64(&b)?, parse_f64(&a)?)
        } else {
            (parse_f64(&a)?, parse_f64(&b)?)
        };
        let pairs = store.zrangebyscore(&key, min, max, rev).await?;
        Ok(StoreValue::MemberScores(pairs))
    })
}

pub fn zrangebyscore(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    zrangebyscore_impl(store, args, false)
}

pub fn zrevrangebyscore(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    zrangebyscore_impl(store, args, true)
}

pub fn zrangebylex(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let (min, max) = (args[2].clone(), args[3].clone());
    Box::pin(async move {
        let (min, max) = (lex_bound(&min)?, lex_bound(&max)?);
        let members = store.zrangebylex(&key, min, max, false).await?;
        Ok(StoreValue::Array(members.into_iter().map(StoreValue::Bulk).collect()))
    })
}

pub fn zadd(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let rest: Vec<Bytes> = args[2..].to_vec();
    Box::pin(async move {
        let mut pairs = Vec::with_capacity(rest.len() / 2);
        for pair in rest.chunks_exact(2) {
            pairs.push((parse_f64(&pair[0])?, pair[1].clone()));
        }
        Ok(StoreValue::Int(store.zadd(&key, &pairs).await?))
    })
}

pub fn zincrby(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let delta = args[2].clone();
    let member = args[3].clone();
    Box::pin(async move {
        let delta = parse_f64(&delta)?;
        let score = store.zincrby(&key, delta, &member).await?;
        Ok(StoreValue::Bulk(Bytes::from(format_score(score))))
    })
}

pub fn zrem(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let members: Vec<Bytes> = args[2..].to_vec();
    Box::pin(async move { Ok(StoreValue::Int(store.zrem(&key, &members).await?)) })
}

pub fn zremrangebyrank(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let (start, stop) = (args[2].clone(), args[3].clone());
    Box::pin(async move {
        let (start, stop) = (parse_i64(&start)?, parse_i64(&stop)?);
        Ok(StoreValue::Int(store.zremrangebyrank(&key, start, stop).await?))
    })
}

pub fn zremrangebyscore(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let (min, max) = (args[2].clone(), args[3].clone());
    Box::pin(async move {
        let (min, max) = (parse_f64(&min)?, parse_f64(&max)?);
        Ok(StoreValue::Int(store.zremrangebyscore(&key, min, max).await?))
    })
}

pub fn zremrangebylex(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let (min, max) = (args[2].clone(), args[3].clone());
    Box::pin(async move {
        let (min, max) = (lex_bound(&min)?, lex_bound(&max)?);
        Ok(StoreValue::Int(store.zremrangebylex(&key, min, max).await?))
    })
}

pub fn zttl(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Int(store.ttl(TtlNamespace::Zset, &key).await?)) })
}

pub fn zkeyexist(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Bool(store.keyexist(TtlNamespace::Zset, &key).await?)) })
}

pub fn zexpire(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    let seconds = args[2].clone();
    Box::pin(async move {
        let seconds = parse_i64(&seconds)?;
        Ok(StoreValue::Bool(store.expire(TtlNamespace::Zset, &key, seconds).await?))
    })
}

pub fn zpersist(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Bool(store.persist(TtlNamespace::Zset, &key).await?)) })
}

pub fn zclear(store: &dyn Store, args: &[Bytes]) -> BoxFuture<'_, Result<StoreValue, StoreError>> {
    let key = args[1].clone();
    Box::pin(async move { Ok(StoreValue::Bool(store.zclear(&key).await?)) })
}

pub(crate) fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e17 {
        format!("{}", score as i64)
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(score).to_string()
    }
}
