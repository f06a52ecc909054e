//! The sorted-set value type: members ordered by `(score, member)` so
//! range queries and rank lookups are `BTreeSet` operations rather than a
//! sort-on-every-read.

use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;

/// An `f64` score wrapped so it can live in an ordered collection.
/// `total_cmp` gives NaN a total order instead of panicking or silently
/// misordering, which is the one place plain `f64::partial_cmp` would
/// bite us here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score(pub f64);

impl Eq for Score {}
impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Score {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A lexicographic range bound, as used by `ZRANGEBYLEX`/`ZREMRANGEBYLEX`:
/// `-`/`+` for unbounded, `[member` inclusive, `(member` exclusive.
#[derive(Debug, Clone)]
pub enum LexBound {
    NegInfinity,
    PosInfinity,
    Inclusive(Bytes),
    Exclusive(Bytes),
}

impl LexBound {
    pub fn parse(raw: &[u8]) -> Option<LexBound> {
        match raw.first() {
            Some(b'-') if raw.len() == 1 => Some(LexBound::NegInfinity),
            Some(b'+') if raw.len() == 1 => Some(LexBound::PosInfinity),
            Some(b'[') => Some(LexBound::Inclusive(Bytes::copy_from_slice(&raw[1..]))),
            Some(b'(') => Some(LexBound::Exclusive(Bytes::copy_from_slice(&raw[1..]))),
            _ => None,
        }
    }

    fn admits_as_lower(&self, member: &[u8]) -> bool {
        match self {
            LexBound::NegInfinity => true,
            LexBound::PosInfinity => false,
            LexBound::Inclusive(b) => member >= b.as_ref(),
            LexBound::Exclusive(b) => member > b.as_ref(),
        }
    }

    fn admits_as_upper(&self, member: &[u8]) -> bool {
        match self {
            LexBound::PosInfinity => true,
            LexBound::NegInfinity => false,
            LexBound::Inclusive(b) => member <= b.as_ref(),
            LexBound::Exclusive(b) => member < b.as_ref(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ZSet {
    by_score: BTreeSet<(Score, Bytes)>,
    scores: HashMap<Bytes, f64>,
}

impl ZSet {
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Inserts or updates `member`'s score. Returns `true` if `member` is
    /// new to the set.
    pub fn insert(&mut self, member: Bytes, score: f64) -> bool {
        let is_new = match self.scores.get(&member) {
            Some(&old) => {
                self.by_score.remove(&(Score(old), member.clone()));
                false
            }
            None => true,
        };
        self.by_score.insert((Score(score), member.clone()));
        self.scores.insert(member, score);
        is_new
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.by_score.remove(&(Score(score), Bytes::copy_from_slice(member)));
                true
            }
            None => false,
        }
    }

    pub fn rank(&self, member: &[u8], rev: bool) -> Option<i64> {
        let score = self.score(member)?;
        let target = (Score(score), Bytes::copy_from_slice(member));
        let position = self.by_score.iter().position(|entry| entry == &target)?;
        let rank = if rev {
            self.by_score.len() - 1 - position
        } else {
            position
        };
        Some(rank as i64)
    }

    /// Members ordered ascending by `(score, member)`, optionally reversed.
    fn ordered(&self, rev: bool) -> Vec<(Bytes, f64)> {
        let items: Vec<(Bytes, f64)> = self
            .by_score
            .iter()
            .map(|(Score(s), m)| (m.clone(), *s))
            .collect();
        if rev {
            items.into_iter().rev().collect()
        } else {
            items
        }
    }

    /// Resolves a possibly-negative Redis-style index into `0..=len`.
    fn resolve_index(len: usize, index: i64) -> usize {
        if index < 0 {
            len.saturating_sub(index.unsigned_abs() as usize)
        } else {
            (index as usize).min(len)
        }
    }

    pub fn range_by_rank(&self, start: i64, stop: i64, rev: bool) -> Vec<(Bytes, f64)> {
        let items = self.ordered(rev);
        let len = items.len();
        if len == 0 {
            return Vec::new();
        }
        let start = Self::resolve_index(len, start);
        let stop = if stop < 0 {
            Self::resolve_index(len, stop + 1)
        } else {
            (stop as usize + 1).min(len)
        };
        if start >= stop {
            return Vec::new();
        }
        items[start..stop].to_vec()
    }

    pub fn range_by_score(&self, min: f64, max: f64, rev: bool) -> Vec<(Bytes, f64)> {
        let mut items: Vec<(Bytes, f64)> = self
            .scores
            .iter()
            .filter(|(_, &score)| score >= min && score <= max)
            .map(|(m, s)| (m.clone(), *s))
            .collect();
        items.sort_by(|a, b| Score(a.1).cmp(&Score(b.1)).then_with(|| a.0.cmp(&b.0)));
        if rev {
            items.reverse();
        }
        items
    }

    pub fn range_by_lex(&self, min: &LexBound, max: &LexBound, rev: bool) -> Vec<Bytes> {
        let mut items: Vec<Bytes> = self
            .scores
            .keys()
            .filter(|m| min.admits_as_lower(m) && max.admits_as_upper(m))
            .cloned()
            .collect();
        items.sort();
        if rev {
            items.reverse();
        }
        items
    }

    pub fn count_by_score(&self, min: f64, max: f64) -> i64 {
        self.scores.values().filter(|&&s| s >= min && s <= max).count() as i64
    }

    pub fn count_by_lex(&self, min: &LexBound, max: &LexBound) -> i64 {
        self.scores
            .keys()
            .filter(|m| min.admits_as_lower(m) && max.admits_as_upper(m))
            .count() as i64
    }

    pub fn remove_by_rank(&mut self, start: i64, stop: i64) -> i64 {
        let victims: Vec<Bytes> = self
            .range_by_rank(start, stop, false)
            .into_iter()
            .map(|(m, _)| m)
            .collect();
        let n = victims.len();
        for member in victims {
            self.remove(&member);
        }
        n as i64
    }

    pub fn remove_by_score(&mut self, min: f64, max: f64) -> i64 {
        let victims: Vec<Bytes> = self
            .range_by_score(min, max, false)
            .into_iter()
            .map(|(m, _)| m)
            .collect();
        let n = victims.len();
        for member in victims {
            self.remove(&member);
        }
        n as i64
    }

    pub fn remove_by_lex(&mut self, min: &LexBound, max: &LexBound) -> i64 {
        let victims = self.range_by_lex(min, max, false);
        let n = victims.len();
        for member in victims {
            self.remove(&member);
        }
        n as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zset_with(pairs: &[(&str, f64)]) -> ZSet {
        let mut z = ZSet::default();
        for (m, s) in pairs {
            z.insert(Bytes::copy_from_slice(m.as_bytes()), *s);
        }
        z
    }

    #[test]
    fn insert_update_reports_new_vs_existing() {
        let mut z = ZSet::default();
        assert!(z.insert(Bytes::from_static(b"a"), 1.0));
        assert!(!z.insert(Bytes::from_static(b"a"), 2.0));
        assert_eq!(z.score(b"a"), Some(2.0));
    }

    #[test]
    fn rank_orders_by_score_then_member() {
        let z = zset_with(&[("b", 1.0), ("a", 1.0), ("c", 2.0)]);
        assert_eq!(z.rank(b"a", false), Some(0));
        assert_eq!(z.rank(b"b", false), Some(1));
        assert_eq!(z.rank(b"c", false), Some(2));
        assert_eq!(z.rank(b"c", true), Some(0));
    }

    #[test]
    fn range_by_rank_supports_negative_indices() {
        let z = zset_with(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let all = z.range_by_rank(0, -1, false);
        assert_eq!(all.len(), 3);
        let last_two = z.range_by_rank(-2, -1, false);
        assert_eq!(
            last_two.iter().map(|(m, _)| m.clone()).collect::<Vec<_>>(),
            vec![Bytes::from_static(b"b"), Bytes::from_static(b"c")]
        );
    }

    #[test]
    fn range_by_score_filters_inclusive() {
        let z = zset_with(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let mid = z.range_by_score(2.0, 3.0, false);
        assert_eq!(mid.len(), 2);
    }

    #[test]
    fn lex_bounds_parse_all_forms() {
        assert!(matches!(LexBound::parse(b"-"), Some(LexBound::NegInfinity)));
        assert!(matches!(LexBound::parse(b"+"), Some(LexBound::PosInfinity)));
        assert!(matches!(LexBound::parse(b"[a"), Some(LexBound::Inclusive(_))));
        assert!(matches!(LexBound::parse(b"(a"), Some(LexBound::Exclusive(_))));
    }

    #[test]
    fn remove_by_rank_shrinks_set() {
        let mut z = zset_with(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        assert_eq!(z.remove_by_rank(0, 0), 1);
        assert_eq!(z.len(), 2);
        assert!(z.score(b"a").is_none());
    }
}
