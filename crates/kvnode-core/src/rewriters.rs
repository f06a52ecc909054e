//! §4.6: response rewriters. A bounded set of pure functions that turn
//! the store's native [`StoreValue`] into a wire-level [`Value`],
//! asserting the shape they expect and failing closed with
//! [`DispatchError::InvalidResponse`] on anything else — the store is an
//! external collaborator and this is the layer's only defense against it
//! returning a value of the wrong native type.

use bytes::Bytes;
use kvnode_store::StoreValue;
use kvnode_wire::Value;

use crate::error::DispatchError;
use crate::handlers::zset::format_score;

/// A response rewriter: takes the validated, namespace-stripped argument
/// vector (so commands like `ZRANGE ... WITHSCORES` can inspect their
/// own trailing flag) and the store's native return value.
pub type RewriterFn = fn(&[Bytes], StoreValue) -> Result<Value, DispatchError>;

/// Discards the value entirely; `SET`/`MSET`/`SETEX`/`PLSET` report a
/// bare `+OK` regardless of what the store returned, as long as it
/// signals success at all.
pub fn always_ok(_args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    match value {
        StoreValue::Ok => Ok(Value::ok()),
        _ => Err(DispatchError::InvalidResponse),
    }
}

/// Asserts the store returned a plain integer.
pub fn int_pass(_args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    match value {
        StoreValue::Int(i) => Ok(Value::Integer(i)),
        _ => Err(DispatchError::InvalidResponse),
    }
}

/// A nil-able integer reply (`ZRANK`): RESP2 has no typed null integer,
/// so a missing rank is rendered as a null bulk string, matching how
/// Redis clients already parse this family of replies.
pub fn int_opt_pass(_args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    match value {
        StoreValue::IntOpt(Some(i)) => Ok(Value::Integer(i)),
        StoreValue::IntOpt(None) => Ok(Value::NullBulk),
        _ => Err(DispatchError::InvalidResponse),
    }
}

/// Redis boolean replies are wire integers: `0` or `1`.
pub fn bool_as_int(_args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    match value {
        StoreValue::Bool(b) => Ok(Value::Integer(b as i64)),
        _ => Err(DispatchError::InvalidResponse),
    }
}

/// Nil passthrough; else assert byte-string, else `INVALID_RESPONSE`
/// (§4.6). Covers both `Bulk` and `BulkOpt` native returns so commands
/// with and without a nil case share one rewriter.
pub fn bulk_pass(_args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    match value {
        StoreValue::BulkOpt(None) => Ok(Value::NullBulk),
        StoreValue::BulkOpt(Some(b)) => Ok(Value::Bulk(b)),
        StoreValue::Bulk(b) => Ok(Value::Bulk(b)),
        _ => Err(DispatchError::InvalidResponse),
    }
}

/// `MGET`-shaped: an array of nil-able bulk strings.
pub fn bulk_array_opt_pass(_args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    match value {
        StoreValue::Array(items) => {
            let values = items
                .into_iter()
                .map(|item| match item {
                    StoreValue::BulkOpt(None) => Ok(Value::NullBulk),
                    StoreValue::BulkOpt(Some(b)) => Ok(Value::Bulk(b)),
                    StoreValue::Bulk(b) => Ok(Value::Bulk(b)),
                    _ => Err(DispatchError::InvalidResponse),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(values))
        }
        _ => Err(DispatchError::InvalidResponse),
    }
}

/// `ZRANGEBYLEX`-shaped: a plain array of bulk members, never
/// interleaved with scores.
pub fn bulk_array_pass(_args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    match value {
        StoreValue::Array(items) => {
            let values = items
                .into_iter()
                .map(|item| match item {
                    StoreValue::Bulk(b) => Ok(Value::Bulk(b)),
                    _ => Err(DispatchError::InvalidResponse),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(values))
        }
        _ => Err(DispatchError::InvalidResponse),
    }
}

/// `ZRANGE`/`ZREVRANGE`/`ZRANGEBYSCORE`/`ZREVRANGEBYSCORE`-shaped: an
/// array of member bulk strings, with scores interleaved only when the
/// command's trailing argument is `WITHSCORES` (case-insensitive).
pub fn zrange_rewriter(args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    let with_scores = args
        .last()
        .map(|a| a.eq_ignore_ascii_case(b"WITHSCORES"))
        .unwrap_or(false);
    match value {
        StoreValue::MemberScores(pairs) => {
            let mut out = Vec::with_capacity(pairs.len() * if with_scores { 2 } else { 1 });
            for (member, score) in pairs {
                out.push(Value::Bulk(member));
                if with_scores {
                    out.push(Value::Bulk(Bytes::from(format_score(score))));
                }
            }
            Ok(Value::Array(out))
        }
        _ => Err(DispatchError::InvalidResponse),
    }
}

/// `SCAN`/`ADVSCAN`-shaped: `[next_cursor, [key, ...]]`, matching the
/// standard Redis cursor-reply convention (the cursor itself is a bulk
/// string of digits, not a wire integer).
pub fn scan_rewriter(_args: &[Bytes], value: StoreValue) -> Result<Value, DispatchError> {
    let StoreValue::Array(mut items) = value else {
        return Err(DispatchError::InvalidResponse);
    };
    if items.len() != 2 {
        return Err(DispatchError::InvalidResponse);
    }
    let keys = items.pop().unwrap();
    let cursor = items.pop().unwrap();

    let StoreValue::Int(cursor) = cursor else {
        return Err(DispatchError::InvalidResponse);
    };
    let StoreValue::Array(keys) = keys else {
        return Err(DispatchError::InvalidResponse);
    };
    let keys = keys
        .into_iter()
        .map(|k| match k {
            StoreValue::Bulk(b) => Ok(Value::Bulk(b)),
            _ => Err(DispatchError::InvalidResponse),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::Array(vec![
        Value::Bulk(Bytes::from(cursor.to_string())),
        Value::Array(keys),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zrange_without_withscores_omits_scores() {
        let args = vec![Bytes::from_static(b"ZRANGE"), Bytes::from_static(b"z"), Bytes::from_static(b"0"), Bytes::from_static(b"-1")];
        let value = StoreValue::MemberScores(vec![(Bytes::from_static(b"a"), 1.0)]);
        let out = zrange_rewriter(&args, value).unwrap();
        assert_eq!(out, Value::Array(vec![Value::Bulk(Bytes::from_static(b"a"))]));
    }

    #[test]
    fn zrange_with_withscores_interleaves() {
        let args = vec![
            Bytes::from_static(b"ZRANGE"),
            Bytes::from_static(b"z"),
            Bytes::from_static(b"0"),
            Bytes::from_static(b"-1"),
            Bytes::from_static(b"WITHSCORES"),
        ];
        let value = StoreValue::MemberScores(vec![(Bytes::from_static(b"a"), 1.0)]);
        let out = zrange_rewriter(&args, value).unwrap();
        assert_eq!(
            out,
            Value::Array(vec![Value::Bulk(Bytes::from_static(b"a")), Value::Bulk(Bytes::from_static(b"1"))])
        );
    }

    #[test]
    fn int_opt_pass_renders_missing_as_null_bulk() {
        assert_eq!(int_opt_pass(&[], StoreValue::IntOpt(None)).unwrap(), Value::NullBulk);
        assert_eq!(int_opt_pass(&[], StoreValue::IntOpt(Some(3))).unwrap(), Value::Integer(3));
    }

    #[test]
    fn scan_rewriter_builds_cursor_and_key_array() {
        let value = StoreValue::Array(vec![
            StoreValue::Int(42),
            StoreValue::Array(vec![StoreValue::Bulk(Bytes::from_static(b"k"))]),
        ]);
        let out = scan_rewriter(&[], value).unwrap();
        assert_eq!(
            out,
            Value::Array(vec![
                Value::Bulk(Bytes::from_static(b"42")),
                Value::Array(vec![Value::Bulk(Bytes::from_static(b"k"))]),
            ])
        );
    }

    #[test]
    fn wrong_native_type_is_invalid_response() {
        assert!(matches!(int_pass(&[], StoreValue::Ok), Err(DispatchError::InvalidResponse)));
    }
}
