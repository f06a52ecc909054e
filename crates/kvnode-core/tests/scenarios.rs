//! End-to-end scenarios against an in-memory store and an in-memory
//! consensus log, exercising the dispatcher exactly the way a client
//! connection would: encoded frames in, wire values out. Mirrors the
//! scripted scenarios used to validate the covered design's dispatch
//! behavior.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kvnode_core::gate::AdmissionGate;
use kvnode_core::Dispatcher;
use kvnode_proposer::{InMemoryLog, ProposalMode, ProposerAdapter};
use kvnode_store::{InMemoryStore, Store};
use kvnode_wire::{CommandFrame, Value};

fn frame(parts: &[&str]) -> CommandFrame {
    let args: Vec<Bytes> = parts
        .iter()
        .map(|s| Bytes::copy_from_slice(s.as_bytes()))
        .collect();
    CommandFrame {
        raw: kvnode_wire::encode_command(&args),
        args,
    }
}

fn new_dispatcher() -> Dispatcher<InMemoryLog> {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::default());
    let proposer = Arc::new(ProposerAdapter::new(Arc::new(InMemoryLog::new()), ProposalMode::V2));
    Dispatcher::new(store, proposer, Arc::new(AdmissionGate::default()), 1024)
}

fn new_dispatcher_with_gate(gate: Arc<AdmissionGate>) -> Dispatcher<InMemoryLog> {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::default());
    let proposer = Arc::new(ProposerAdapter::new(Arc::new(InMemoryLog::new()), ProposalMode::V2));
    Dispatcher::new(store, proposer, gate, 1024)
}

/// S1: `SETEX` followed by `GET` before expiry, nil after.
#[tokio::test]
async fn s1_setex_then_expiry() {
    let d = new_dispatcher();

    let reply = d.dispatch(frame(&["SETEX", "default:test:xx", "1", "hello world"])).await;
    assert_eq!(reply, Value::ok());

    let reply = d.dispatch(frame(&["GET", "default:test:xx"])).await;
    assert_eq!(reply, Value::Bulk(Bytes::from_static(b"hello world")));

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let reply = d.dispatch(frame(&["GET", "default:test:xx"])).await;
    assert_eq!(reply, Value::NullBulk);
}

/// S2: `GETSET` returns the prior value and clears TTL.
#[tokio::test]
async fn s2_getset_returns_prior_value_and_clears_ttl() {
    let d = new_dispatcher();

    d.dispatch(frame(&["SET", "ns:k", "1234"])).await;

    let reply = d.dispatch(frame(&["GETSET", "ns:k", "123"])).await;
    assert_eq!(reply, Value::Bulk(Bytes::from_static(b"1234")));

    let reply = d.dispatch(frame(&["GET", "ns:k"])).await;
    assert_eq!(reply, Value::Bulk(Bytes::from_static(b"123")));

    let reply = d.dispatch(frame(&["TTL", "ns:k"])).await;
    assert_eq!(reply, Value::Integer(-1));
}

/// S3: `APPEND` merges into an existing key without disturbing its TTL.
#[tokio::test]
async fn s3_append_preserves_ttl() {
    let d = new_dispatcher();

    d.dispatch(frame(&["SETEX", "ns:k", "3", "hello"])).await;
    let reply = d.dispatch(frame(&["APPEND", "ns:k", " world"])).await;
    assert_eq!(reply, Value::Integer(11));

    let reply = d.dispatch(frame(&["TTL", "ns:k"])).await;
    let Value::Integer(ttl) = reply else { panic!("expected integer ttl") };
    assert!((2..=3).contains(&ttl));

    let reply = d.dispatch(frame(&["GET", "ns:k"])).await;
    assert_eq!(reply, Value::Bulk(Bytes::from_static(b"hello world")));
}

/// S4: the admission gate rejects writes without touching reads.
#[tokio::test]
async fn s4_admission_gate_blocks_writes_not_reads() {
    let gate = Arc::new(AdmissionGate::default());
    let d = new_dispatcher_with_gate(gate.clone());

    d.dispatch(frame(&["SET", "ns:k", "v"])).await;
    gate.set(true);

    let reply = d.dispatch(frame(&["SET", "ns:k", "v2"])).await;
    match reply {
        Value::Error(message) => assert!(message.starts_with("The cluster is only allowing syncer write")),
        other => panic!("expected error, got {other:?}"),
    }

    let reply = d.dispatch(frame(&["GET", "ns:k"])).await;
    assert_eq!(reply, Value::Bulk(Bytes::from_static(b"v")));
}

/// S5: bitmap round-trip, and a negative offset is rejected before proposal.
#[tokio::test]
async fn s5_bitmap_round_trip_and_negative_offset() {
    let d = new_dispatcher();

    let reply = d.dispatch(frame(&["SETBIT", "ns:key", "100", "1"])).await;
    assert_eq!(reply, Value::Integer(0));

    let reply = d.dispatch(frame(&["GETBIT", "ns:key", "100"])).await;
    assert_eq!(reply, Value::Integer(1));

    let reply = d.dispatch(frame(&["BITCOUNT", "ns:key"])).await;
    assert_eq!(reply, Value::Integer(1));

    let reply = d.dispatch(frame(&["SETBIT", "ns:key", "-7", "1"])).await;
    assert!(matches!(reply, Value::Error(_)));
}

/// S6: `PFADD` with zero elements on an absent key still creates it.
#[tokio::test]
async fn s6_pfadd_zero_elements_then_cardinality() {
    let d = new_dispatcher();

    let reply = d.dispatch(frame(&["PFADD", "ns:k"])).await;
    assert_eq!(reply, Value::Integer(1));

    let reply = d.dispatch(frame(&["PFADD", "ns:k", "1", "2", "3"])).await;
    assert_eq!(reply, Value::Integer(1));

    let reply = d.dispatch(frame(&["PFCOUNT", "ns:k"])).await;
    assert_eq!(reply, Value::Integer(3));

    d.dispatch(frame(&["DEL", "ns:k"])).await;

    let reply = d.dispatch(frame(&["PFCOUNT", "ns:k"])).await;
    assert_eq!(reply, Value::Integer(0));
}

#[tokio::test]
async fn zset_range_with_and_without_scores() {
    let d = new_dispatcher();

    d.dispatch(frame(&["ZADD", "ns:z", "1", "a", "2", "b"])).await;

    let reply = d.dispatch(frame(&["ZRANGE", "ns:z", "0", "-1"])).await;
    assert_eq!(
        reply,
        Value::Array(vec![Value::Bulk(Bytes::from_static(b"a")), Value::Bulk(Bytes::from_static(b"b"))])
    );

    let reply = d.dispatch(frame(&["ZRANGE", "ns:z", "0", "-1", "WITHSCORES"])).await;
    assert_eq!(
        reply,
        Value::Array(vec![
            Value::Bulk(Bytes::from_static(b"a")),
            Value::Bulk(Bytes::from_static(b"1")),
            Value::Bulk(Bytes::from_static(b"b")),
            Value::Bulk(Bytes::from_static(b"2")),
        ])
    );
}

#[tokio::test]
async fn zrank_is_nil_for_missing_member() {
    let d = new_dispatcher();
    d.dispatch(frame(&["ZADD", "ns:z", "1", "a"])).await;

    let reply = d.dispatch(frame(&["ZRANK", "ns:z", "nope"])).await;
    assert_eq!(reply, Value::NullBulk);

    let reply = d.dispatch(frame(&["ZRANK", "ns:z", "a"])).await;
    assert_eq!(reply, Value::Integer(0));
}

#[tokio::test]
async fn scan_reports_a_cursor_and_keys() {
    let d = new_dispatcher();
    d.dispatch(frame(&["SET", "ns:a", "1"])).await;
    d.dispatch(frame(&["SET", "ns:b", "2"])).await;

    let reply = d.dispatch(frame(&["SCAN", "0"])).await;
    let Value::Array(items) = reply else { panic!("expected array reply") };
    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Value::Bulk(_)));
    assert!(matches!(items[1], Value::Array(_)));
}

#[tokio::test]
async fn unknown_command_yields_wire_error() {
    let d = new_dispatcher();
    let reply = d.dispatch(frame(&["FROBNICATE", "ns:k"])).await;
    match reply {
        Value::Error(message) => assert!(message.contains("unknown command")),
        other => panic!("expected error, got {other:?}"),
    }
}
