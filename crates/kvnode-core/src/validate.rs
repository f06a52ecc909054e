//! §4.3: the validation wrapper family. Every command's argument shape
//! reduces to one of three stripping patterns and one of three arity
//! rules, so rather than hand-writing a validator per command shape
//! (the source's per-command closures), a descriptor names a `Shape`
//! and an interpreter here both validates and namespace-strips.

use bytes::Bytes;

use crate::error::{ArityPath, DispatchError};

/// How many argument slots a shape requires, and — for the batchable
/// shapes — how batch size is counted.
#[derive(Debug, Clone, Copy)]
pub enum Arity {
    /// Exactly `n` arguments, including the command name.
    Exact(usize),
    /// At least `n` arguments.
    AtLeast(usize),
    /// `base` fixed arguments, then any number of `unit`-sized groups
    /// (at least `min_units` of them); the number of groups is the batch
    /// count. Covers `K-AnySubkey(minN)` and the pair-shaped commands.
    Units {
        base: usize,
        unit: usize,
        min_units: usize,
    },
}

impl Arity {
    fn units(arg_count: usize) -> usize {
        arg_count
    }

    fn check(self, arg_count: usize) -> Option<usize> {
        match self {
            Arity::Exact(n) => (arg_count == n).then_some(0),
            Arity::AtLeast(n) => (arg_count >= n).then_some(0),
            Arity::Units {
                base,
                unit,
                min_units,
            } => {
                if arg_count < base + unit * min_units {
                    return None;
                }
                let remainder = arg_count - base;
                if unit == 0 || remainder % unit != 0 {
                    return None;
                }
                Some(Self::units(remainder / unit))
            }
        }
    }
}

/// Which argument positions carry namespaced keys (§4.3).
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// Strip argument 1 only. Covers `K`, `K-Subkey`,
    /// `K-Subkey-Subkey+`, `K-AnySubkey(minN)`, `K-V`, `K-V-V`,
    /// `K-Subkey-V`: they differ only in arity, not in what gets
    /// stripped.
    SingleKey(Arity),
    /// Strip every argument from 1 onward. Covers `K-K` (`MGET`, `DEL`,
    /// `EXISTS`, `PFCOUNT`); batch count is the key count.
    MultiKey(Arity),
    /// Strip every other argument starting at 1 (positions 1, 3, 5, …).
    /// Covers `K-V-K-V` (`MSET`); batch count is the pair count.
    PairedKeys(Arity),
    /// No namespaced key argument at all. Covers the admin commands
    /// (`SCAN`, `ADVSCAN`): their cursor is not a wire key, so nothing
    /// is stripped, only arity is enforced.
    NoKey(Arity),
}

impl Shape {
    /// The number of namespaced keys this shape's arguments carry, given
    /// the total argument count (including the command name). Used by
    /// the dispatcher to size the V1 proposer's single-key restriction.
    pub fn key_count(self, arg_count: usize) -> usize {
        match self {
            Shape::SingleKey(_) => 1,
            Shape::MultiKey(_) => arg_count.saturating_sub(1),
            Shape::PairedKeys(_) => (arg_count.saturating_sub(1)) / 2,
            Shape::NoKey(_) => 0,
        }
    }

    /// Validates `args` against this shape and returns a fresh argument
    /// vector with every namespaced key position stripped to its bare
    /// key. `args[0]` (the command name) is carried through unchanged.
    pub fn validate_and_strip(
        self,
        command: &str,
        args: &[Bytes],
        max_batch: usize,
        path: ArityPath,
    ) -> Result<Vec<Bytes>, DispatchError> {
        let (arity, key_positions): (Arity, Vec<usize>) = match self {
            Shape::SingleKey(a) => (a, vec![1]),
            Shape::MultiKey(a) => (a, (1..args.len()).collect()),
            Shape::PairedKeys(a) => (a, (1..args.len()).step_by(2).collect()),
            Shape::NoKey(a) => (a, vec![]),
        };

        let batch = arity.check(args.len()).ok_or_else(|| DispatchError::WrongArity {
            command: command.to_string(),
            path,
        })?;
        // `MultiKey`'s arity is always `AtLeast`, which carries no batch
        // count of its own (`Arity::check` returns `0` for it) — the
        // batch here is the stripped key count, not an arity-derived
        // group count, so it's computed directly from the key positions
        // rather than trusted from `arity.check`'s return value.
        let batch = match self {
            Shape::MultiKey(_) => key_positions.len(),
            _ => batch,
        };

        if batch > max_batch {
            return Err(DispatchError::BatchTooLarge {
                command: command.to_string(),
                limit: max_batch,
            });
        }

        let mut out = Vec::with_capacity(args.len());
        out.push(args[0].clone());
        for (i, arg) in args.iter().enumerate().skip(1) {
            if key_positions.contains(&i) {
                let key = kvnode_wire::namespace::strip(arg)?;
                out.push(Bytes::copy_from_slice(key));
            } else {
                out.push(arg.clone());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn single_key_strips_only_arg_one() {
        let args = vec![b("GET"), b("ns:k")];
        let out = Shape::SingleKey(Arity::Exact(2))
            .validate_and_strip("get", &args, 1024, ArityPath::Read)
            .unwrap();
        assert_eq!(out, vec![b("GET"), b("k")]);
    }

    #[test]
    fn multi_key_strips_every_arg() {
        let args = vec![b("DEL"), b("ns:a"), b("ns:b")];
        let out = Shape::MultiKey(Arity::AtLeast(2))
            .validate_and_strip("del", &args, 1024, ArityPath::Write)
            .unwrap();
        assert_eq!(out, vec![b("DEL"), b("a"), b("b")]);
    }

    #[test]
    fn multi_key_rejects_batch_over_limit() {
        let args = vec![b("DEL"), b("ns:a"), b("ns:b"), b("ns:c")];
        let err = Shape::MultiKey(Arity::AtLeast(2))
            .validate_and_strip("del", &args, 2, ArityPath::Write)
            .unwrap_err();
        assert!(matches!(err, DispatchError::BatchTooLarge { .. }));
    }

    #[test]
    fn paired_keys_strips_every_other_arg() {
        let args = vec![b("MSET"), b("ns:a"), b("1"), b("ns:b"), b("2")];
        let out = Shape::PairedKeys(Arity::Units {
            base: 1,
            unit: 2,
            min_units: 1,
        })
        .validate_and_strip("mset", &args, 1024, ArityPath::Write)
        .unwrap();
        assert_eq!(out, vec![b("MSET"), b("a"), b("1"), b("b"), b("2")]);
    }

    #[test]
    fn wrong_arity_is_reported() {
        let args = vec![b("GET")];
        let err = Shape::SingleKey(Arity::Exact(2))
            .validate_and_strip("get", &args, 1024, ArityPath::Read)
            .unwrap_err();
        assert!(matches!(err, DispatchError::WrongArity { .. }));
    }

    #[test]
    fn missing_namespace_is_reported() {
        let args = vec![b("GET"), b("nokey")];
        let err = Shape::SingleKey(Arity::Exact(2))
            .validate_and_strip("get", &args, 1024, ArityPath::Read)
            .unwrap_err();
        assert!(matches!(err, DispatchError::NamespaceMissing));
    }

    #[test]
    fn no_key_shape_strips_nothing() {
        let args = vec![b("SCAN"), b("0"), b("COUNT"), b("10")];
        let out = Shape::NoKey(Arity::Units {
            base: 2,
            unit: 1,
            min_units: 0,
        })
        .validate_and_strip("scan", &args, 1024, ArityPath::Read)
        .unwrap();
        assert_eq!(out, args);
    }

    #[test]
    fn units_shape_caps_group_count_not_raw_arity() {
        // zadd-shaped: key + (score, member) pairs; 2 pairs allowed, 3 rejected.
        let args = vec![b("ZADD"), b("ns:z"), b("1"), b("a"), b("2"), b("b")];
        let out = Shape::SingleKey(Arity::Units {
            base: 2,
            unit: 2,
            min_units: 1,
        })
        .validate_and_strip("zadd", &args, 2, ArityPath::Write)
        .unwrap();
        assert_eq!(out[1], b("z"));

        let args3 = vec![
            b("ZADD"),
            b("ns:z"),
            b("1"),
            b("a"),
            b("2"),
            b("b"),
            b("3"),
            b("c"),
        ];
        let err = Shape::SingleKey(Arity::Units {
            base: 2,
            unit: 2,
            min_units: 1,
        })
        .validate_and_strip("zadd", &args3, 2, ArityPath::Write)
        .unwrap_err();
        assert!(matches!(err, DispatchError::BatchTooLarge { .. }));
    }
}
