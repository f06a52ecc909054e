//! §4.2: the command registry. A static table, keyed by lowercase
//! command name, mapping to a [`Descriptor`] — arity rule, namespace
//! shape, read/write kind, handler, and response rewriter. TTL handling
//! (§4.7) is not a separate tag consulted here; it falls out of which
//! `Store` method a command's handler calls (`set` vs
//! `set_preserve_ttl`, and so on — see `kvnode_store::Store`). Read and
//! write descriptors live in separate tables (§4.2: "so the dispatcher
//! can cheaply answer 'is this a write?'"), built once behind
//! `lazy_static` and never mutated afterward.

use std::collections::HashMap;

use bytes::Bytes;
use lazy_static::lazy_static;

use crate::error::DispatchError;
use crate::handlers::{self, HandlerFn};
use crate::rewriters::{self, RewriterFn};
use crate::validate::{Arity, Shape};

/// Whether a command merely replaces a key's value (`SET`) or merges
/// into its existing value (`INCR`, `ZADD`, `SETBIT`, `APPEND`). The
/// dispatcher treats both identically; the distinction exists purely for
/// observability, matching §3's data model ("kind (read | write |
/// merge-write)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Read,
    Write,
    MergeWrite,
}

impl CommandKind {
    pub fn is_write(self) -> bool {
        !matches!(self, CommandKind::Read)
    }
}

/// An optional second pass over already arity-checked, namespace-stripped
/// arguments, for the handful of commands whose argument *shape* is fine
/// but whose argument *value* isn't (the negative `SETBIT` offset
/// supplemented feature, DESIGN.md). Runs before the admission gate and
/// before proposal, so a malformed write never reaches the log.
pub type ArgValidator = fn(&[Bytes]) -> Result<(), DispatchError>;

#[derive(Clone, Copy)]
pub struct Descriptor {
    pub name: &'static str,
    pub kind: CommandKind,
    pub shape: Shape,
    pub handler: HandlerFn,
    pub rewriter: RewriterFn,
    pub validate_args: Option<ArgValidator>,
}

fn parse_i64_arg(args: &[Bytes], index: usize) -> Result<i64, DispatchError> {
    std::str::from_utf8(&args[index])
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| DispatchError::InvalidArgument("value is not an integer".to_string()))
}

/// Rejects a negative bit offset before it reaches the proposer
/// (DESIGN.md: `SETBIT`/`SETBITV2` supplemented feature).
fn reject_negative_bit_offset(args: &[Bytes]) -> Result<(), DispatchError> {
    if parse_i64_arg(args, 2)? < 0 {
        return Err(DispatchError::InvalidArgument(
            "bit offset is not an integer or out of range".to_string(),
        ));
    }
    Ok(())
}

macro_rules! descriptor {
    ($name:expr, $kind:expr, $shape:expr, $handler:path, $rewriter:path) => {
        Descriptor {
            name: $name,
            kind: $kind,
            shape: $shape,
            handler: $handler,
            rewriter: $rewriter,
            validate_args: None,
        }
    };
}

lazy_static! {
    static ref READ: HashMap<&'static str, Descriptor> = {
        use Arity::*;
        use CommandKind::Read;
        use Shape::*;

        let mut m = HashMap::new();
        let mut add = |d: Descriptor| {
            m.insert(d.name, d);
        };

        add(descriptor!("get", Read, SingleKey(Exact(2)), handlers::kv::get, rewriters::bulk_pass));
        add(descriptor!("mget", Read, MultiKey(AtLeast(2)), handlers::kv::mget, rewriters::bulk_array_opt_pass));
        add(descriptor!("exists", Read, MultiKey(AtLeast(2)), handlers::kv::exists, rewriters::int_pass));
        add(descriptor!("strlen", Read, SingleKey(Exact(2)), handlers::kv::strlen, rewriters::int_pass));
        add(descriptor!("ttl", Read, SingleKey(Exact(2)), handlers::kv::ttl, rewriters::int_pass));

        add(descriptor!("getbit", Read, SingleKey(Exact(3)), handlers::bitmap::getbit, rewriters::int_pass));
        add(descriptor!(
            "bitcount",
            Read,
            SingleKey(Units { base: 2, unit: 2, min_units: 0 }),
            handlers::bitmap::bitcount,
            rewriters::int_pass
        ));
        add(descriptor!("bttl", Read, SingleKey(Exact(2)), handlers::bitmap::bttl, rewriters::int_pass));
        add(descriptor!("bkeyexist", Read, SingleKey(Exact(2)), handlers::bitmap::bkeyexist, rewriters::bool_as_int));

        add(descriptor!("pfcount", Read, MultiKey(AtLeast(2)), handlers::hll::pfcount, rewriters::int_pass));

        add(descriptor!("zscore", Read, SingleKey(Exact(3)), handlers::zset::zscore, rewriters::bulk_pass));
        add(descriptor!("zcard", Read, SingleKey(Exact(2)), handlers::zset::zcard, rewriters::int_pass));
        add(descriptor!("zcount", Read, SingleKey(Exact(4)), handlers::zset::zcount, rewriters::int_pass));
        add(descriptor!("zlexcount", Read, SingleKey(Exact(4)), handlers::zset::zlexcount, rewriters::int_pass));
        add(descriptor!("zrank", Read, SingleKey(Exact(3)), handlers::zset::zrank, rewriters::int_opt_pass));
        add(descriptor!("zrevrank", Read, SingleKey(Exact(3)), handlers::zset::zrevrank, rewriters::int_opt_pass));
        add(descriptor!(
            "zrange",
            Read,
            SingleKey(Units { base: 4, unit: 1, min_units: 0 }),
            handlers::zset::zrange,
            rewriters::zrange_rewriter
        ));
        add(descriptor!(
            "zrevrange",
            Read,
            SingleKey(Units { base: 4, unit: 1, min_units: 0 }),
            handlers::zset::zrevrange,
            rewriters::zrange_rewriter
        ));
        add(descriptor!(
            "zrangebyscore",
            Read,
            SingleKey(Units { base: 4, unit: 1, min_units: 0 }),
            handlers::zset::zrangebyscore,
            rewriters::zrange_rewriter
        ));
        add(descriptor!(
            "zrevrangebyscore",
            Read,
            SingleKey(Units { base: 4, unit: 1, min_units: 0 }),
            handlers::zset::zrevrangebyscore,
            rewriters::zrange_rewriter
        ));
        add(descriptor!("zrangebylex", Read, SingleKey(Exact(4)), handlers::zset::zrangebylex, rewriters::bulk_array_pass));
        add(descriptor!("zttl", Read, SingleKey(Exact(2)), handlers::zset::zttl, rewriters::int_pass));
        add(descriptor!("zkeyexist", Read, SingleKey(Exact(2)), handlers::zset::zkeyexist, rewriters::bool_as_int));

        add(descriptor!(
            "scan",
            Read,
            NoKey(Units { base: 2, unit: 1, min_units: 0 }),
            handlers::admin::scan,
            rewriters::scan_rewriter
        ));
        add(descriptor!(
            "advscan",
            Read,
            NoKey(Units { base: 2, unit: 1, min_units: 0 }),
            handlers::admin::advscan,
            rewriters::scan_rewriter
        ));

        m
    };
    static ref WRITE: HashMap<&'static str, Descriptor> = {
        use Arity::*;
        use CommandKind::{MergeWrite, Write};
        use Shape::*;

        let mut m = HashMap::new();
        let mut add = |d: Descriptor| {
            m.insert(d.name, d);
        };

        add(descriptor!("set", Write, SingleKey(Exact(3)), handlers::kv::set, rewriters::always_ok));
        add(descriptor!("plset", Write, SingleKey(Exact(3)), handlers::kv::plset, rewriters::always_ok));
        add(descriptor!("setnx", Write, SingleKey(Exact(3)), handlers::kv::setnx, rewriters::bool_as_int));
        add(descriptor!("setex", Write, SingleKey(Exact(4)), handlers::kv::setex, rewriters::always_ok));
        add(descriptor!("getset", Write, SingleKey(Exact(3)), handlers::kv::getset, rewriters::bulk_pass));
        add(descriptor!(
            "mset",
            Write,
            PairedKeys(Units { base: 1, unit: 2, min_units: 1 }),
            handlers::kv::mset,
            rewriters::always_ok
        ));
        add(descriptor!("incr", MergeWrite, SingleKey(Exact(2)), handlers::kv::incr, rewriters::int_pass));
        add(descriptor!("incrby", MergeWrite, SingleKey(Exact(3)), handlers::kv::incrby, rewriters::int_pass));
        add(descriptor!("decrby", MergeWrite, SingleKey(Exact(3)), handlers::kv::decrby, rewriters::int_pass));
        add(descriptor!("del", Write, MultiKey(AtLeast(2)), handlers::kv::del, rewriters::int_pass));
        add(descriptor!("append", MergeWrite, SingleKey(Exact(3)), handlers::kv::append, rewriters::int_pass));
        add(descriptor!("setrange", MergeWrite, SingleKey(Exact(4)), handlers::kv::setrange, rewriters::int_pass));
        add(descriptor!("expire", Write, SingleKey(Exact(3)), handlers::kv::expire, rewriters::bool_as_int));
        add(descriptor!("persist", Write, SingleKey(Exact(2)), handlers::kv::persist, rewriters::bool_as_int));

        add(Descriptor {
            validate_args: Some(reject_negative_bit_offset),
            ..descriptor!("setbit", MergeWrite, SingleKey(Exact(4)), handlers::bitmap::setbit, rewriters::int_pass)
        });
        add(Descriptor {
            validate_args: Some(reject_negative_bit_offset),
            ..descriptor!("setbitv2", MergeWrite, SingleKey(Exact(4)), handlers::bitmap::setbitv2, rewriters::int_pass)
        });
        add(descriptor!("bexpire", Write, SingleKey(Exact(3)), handlers::bitmap::bexpire, rewriters::bool_as_int));
        add(descriptor!("bpersist", Write, SingleKey(Exact(2)), handlers::bitmap::bpersist, rewriters::bool_as_int));

        add(descriptor!(
            "pfadd",
            MergeWrite,
            SingleKey(Units { base: 2, unit: 1, min_units: 0 }),
            handlers::hll::pfadd,
            rewriters::bool_as_int
        ));

        add(descriptor!(
            "zadd",
            MergeWrite,
            SingleKey(Units { base: 2, unit: 2, min_units: 1 }),
            handlers::zset::zadd,
            rewriters::int_pass
        ));
        add(descriptor!("zincrby", MergeWrite, SingleKey(Exact(4)), handlers::zset::zincrby, rewriters::bulk_pass));
        add(descriptor!(
            "zrem",
            Write,
            SingleKey(Units { base: 2, unit: 1, min_units: 1 }),
            handlers::zset::zrem,
            rewriters::int_pass
        ));
        add(descriptor!("zremrangebyrank", Write, SingleKey(Exact(4)), handlers::zset::zremrangebyrank, rewriters::int_pass));
        add(descriptor!("zremrangebyscore", Write, SingleKey(Exact(4)), handlers::zset::zremrangebyscore, rewriters::int_pass));
        add(descriptor!("zremrangebylex", Write, SingleKey(Exact(4)), handlers::zset::zremrangebylex, rewriters::int_pass));
        add(descriptor!("zexpire", Write, SingleKey(Exact(3)), handlers::zset::zexpire, rewriters::bool_as_int));
        add(descriptor!("zpersist", Write, SingleKey(Exact(2)), handlers::zset::zpersist, rewriters::bool_as_int));
        add(descriptor!("zclear", Write, SingleKey(Exact(2)), handlers::zset::zclear, rewriters::bool_as_int));

        m
    };
}

/// Looks up `command` (already lowercased) in the read and write tables.
/// Returns the descriptor and whether it came from the write table.
/// Unknown commands are an `UNKNOWN_COMMAND` miss (§4.2).
pub fn lookup(command: &str) -> Option<(&'static Descriptor, bool)> {
    if let Some(d) = WRITE.get(command) {
        return Some((d, true));
    }
    READ.get(command).map(|d| (d, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_write_tables_are_disjoint() {
        for name in READ.keys() {
            assert!(!WRITE.contains_key(name), "{name} registered in both tables");
        }
    }

    #[test]
    fn get_is_a_read() {
        let (_, is_write) = lookup("get").unwrap();
        assert!(!is_write);
    }

    #[test]
    fn set_is_a_write() {
        let (_, is_write) = lookup("set").unwrap();
        assert!(is_write);
    }

    #[test]
    fn unknown_command_misses() {
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn setbit_carries_negative_offset_guard() {
        let (descriptor, _) = lookup("setbit").unwrap();
        assert!(descriptor.validate_args.is_some());
    }
}
