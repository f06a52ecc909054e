//! The storage engine collaborator: out of scope per §1 (owns on-disk
//! format, physical layout), specified here only as the trait the
//! dispatch core reads from and applies writes against.

use async_trait::async_trait;
use bytes::Bytes;

use crate::ttl::TtlNamespace;
use crate::zset::LexBound;
use crate::StoreError;

#[async_trait]
pub trait Store: Send + Sync {
    // -- KV --
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError>;
    async fn set(&self, key: &[u8], value: Bytes) -> Result<(), StoreError>;
    /// `PLSET`: like `SET`, but leaves any existing TTL untouched instead
    /// of clearing it (DESIGN.md: open interpretation of an otherwise
    /// undocumented command name).
    async fn set_preserve_ttl(&self, key: &[u8], value: Bytes) -> Result<(), StoreError>;
    async fn setnx(&self, key: &[u8], value: Bytes) -> Result<bool, StoreError>;
    async fn setex(&self, key: &[u8], ttl_secs: i64, value: Bytes) -> Result<(), StoreError>;
    async fn getset(&self, key: &[u8], value: Bytes) -> Result<Option<Bytes>, StoreError>;
    async fn mget(&self, keys: &[Bytes]) -> Result<Vec<Option<Bytes>>, StoreError>;
    async fn mset(&self, pairs: &[(Bytes, Bytes)]) -> Result<(), StoreError>;
    async fn incr_by(&self, key: &[u8], delta: i64) -> Result<i64, StoreError>;
    async fn del(&self, keys: &[Bytes]) -> Result<i64, StoreError>;
    async fn exists(&self, keys: &[Bytes]) -> Result<i64, StoreError>;
    async fn strlen(&self, key: &[u8]) -> Result<i64, StoreError>;
    async fn append(&self, key: &[u8], value: &[u8]) -> Result<i64, StoreError>;
    async fn setrange(&self, key: &[u8], offset: i64, value: &[u8]) -> Result<i64, StoreError>;

    // -- generic TTL family, shared across namespaces (§4.7) --
    async fn ttl(&self, ns: TtlNamespace, key: &[u8]) -> Result<i64, StoreError>;
    async fn expire(&self, ns: TtlNamespace, key: &[u8], secs: i64) -> Result<bool, StoreError>;
    async fn persist(&self, ns: TtlNamespace, key: &[u8]) -> Result<bool, StoreError>;
    async fn keyexist(&self, ns: TtlNamespace, key: &[u8]) -> Result<bool, StoreError>;

    // -- bitmap --
    async fn getbit(&self, key: &[u8], offset: i64) -> Result<i64, StoreError>;
    async fn setbit(&self, key: &[u8], offset: i64, value: i64) -> Result<i64, StoreError>;
    async fn bitcount(&self, key: &[u8], range: Option<(i64, i64)>) -> Result<i64, StoreError>;

    // -- HyperLogLog (modeled exactly via an underlying set; see DESIGN.md) --
    async fn pfadd(&self, key: &[u8], elements: &[Bytes]) -> Result<bool, StoreError>;
    async fn pfcount(&self, keys: &[Bytes]) -> Result<i64, StoreError>;

    // -- sorted set --
    async fn zadd(&self, key: &[u8], pairs: &[(f64, Bytes)]) -> Result<i64, StoreError>;
    async fn zscore(&self, key: &[u8], member: &[u8]) -> Result<Option<f64>, StoreError>;
    async fn zincrby(&self, key: &[u8], delta: f64, member: &[u8]) -> Result<f64, StoreError>;
    async fn zcard(&self, key: &[u8]) -> Result<i64, StoreError>;
    async fn zcount(&self, key: &[u8], min: f64, max: f64) -> Result<i64, StoreError>;
    async fn zlexcount(&self, key: &[u8], min: LexBound, max: LexBound) -> Result<i64, StoreError>;
    async fn zrank(&self, key: &[u8], member: &[u8], rev: bool) -> Result<Option<i64>, StoreError>;
    async fn zrange(
        &self,
        key: &[u8],
        start: i64,
        stop: i64,
        rev: bool,
    ) -> Result<Vec<(Bytes, f64)>, StoreError>;
    async fn zrangebyscore(
        &self,
        key: &[u8],
        min: f64,
        max: f64,
        rev: bool,
    ) -> Result<Vec<(Bytes, f64)>, StoreError>;
    async fn zrangebylex(
        &self,
        key: &[u8],
        min: LexBound,
        max: LexBound,
        rev: bool,
    ) -> Result<Vec<Bytes>, StoreError>;
    async fn zrem(&self, key: &[u8], members: &[Bytes]) -> Result<i64, StoreError>;
    async fn zremrangebyrank(&self, key: &[u8], start: i64, stop: i64) -> Result<i64, StoreError>;
    async fn zremrangebyscore(&self, key: &[u8], min: f64, max: f64) -> Result<i64, StoreError>;
    async fn zremrangebylex(
        &self,
        key: &[u8],
        min: LexBound,
        max: LexBound,
    ) -> Result<i64, StoreError>;
    async fn zclear(&self, key: &[u8]) -> Result<bool, StoreError>;

    // -- admin --
    /// Returns `(next_cursor, keys)`. `0` as the returned cursor means
    /// iteration is complete. The store owns iteration order; this layer
    /// only guarantees the cursor contract, not a particular ordering.
    async fn scan(&self, cursor: u64, count: usize) -> Result<(u64, Vec<Bytes>), StoreError>;
    async fn advscan(
        &self,
        cursor: u64,
        count: usize,
        pattern: Option<&[u8]>,
    ) -> Result<(u64, Vec<Bytes>), StoreError>;
}
