//! Per-command handler functions: the glue between a validated,
//! namespace-stripped argument vector and a [`kvnode_store::Store`]
//! method call. A descriptor's `handler` is invoked directly for reads,
//! and supplied to [`kvnode_proposer::ProposerAdapter::propose`] as the
//! apply closure for writes — the same function runs either way, which
//! is what lets §8 invariant 1 ("the raw frame handed to the proposer...")
//! and the apply-time semantics stay in lockstep.

use bytes::Bytes;
use futures::future::BoxFuture;
use kvnode_store::{Store, StoreError};

pub mod admin;
pub mod bitmap;
pub mod hll;
pub mod kv;
pub mod zset;

/// A command handler: takes the store and the validated, stripped
/// argument vector (including the command name at index 0), returns the
/// store's native result.
pub type HandlerFn =
    for<'a> fn(&'a dyn Store, &'a [Bytes]) -> BoxFuture<'a, Result<kvnode_store::StoreValue, StoreError>>;

pub(crate) fn parse_i64(arg: &[u8]) -> Result<i64, StoreError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| StoreError::Unsupported("expected integer argument".to_string()))
}

pub(crate) fn parse_f64(arg: &[u8]) -> Result<f64, StoreError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| StoreError::Unsupported("expected floating-point argument".to_string()))
}

pub(crate) fn parse_u64(arg: &[u8]) -> Result<u64, StoreError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| StoreError::Unsupported("expected cursor argument".to_string()))
}
