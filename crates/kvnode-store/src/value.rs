use bytes::Bytes;

/// A value returned by the store, in the store's own vocabulary — before
/// a `kvnode-core` response rewriter (§4.6) turns it into a wire
/// [`kvnode_wire::Value`]. Kept separate from the wire type so this crate
/// never needs to depend on RESP encoding concerns.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Ok,
    Nil,
    Bool(bool),
    Int(i64),
    /// A nil-able integer reply, e.g. `ZRANK` of a missing member: encoded
    /// on the wire as a null bulk string rather than a typed null
    /// integer, since RESP2 has no such type.
    IntOpt(Option<i64>),
    Bulk(Bytes),
    BulkOpt(Option<Bytes>),
    Array(Vec<StoreValue>),
    /// Member/score pairs, as returned by the zset range family; kept
    /// distinct from a plain `Array` so the rewriter can choose whether
    /// to interleave scores (`WITHSCORES`) without re-deriving pairing
    /// from a flat list.
    MemberScores(Vec<(Bytes, f64)>),
}
