//! Value types shared across the hashdex crates.

use serde::{Deserialize, Serialize};

/// Partition-local document identifier.
pub type DocId = u32;

/// Sentinel returned by forward-only candidate iterators once exhausted.
///
/// Real doc ids are always strictly below this value (they index into a
/// partition-sized accumulator).
pub const NO_MORE_DOCS: DocId = DocId::MAX;

/// A hash code paired with its weight.
///
/// At index time each entry becomes one indexed term whose weight is stored
/// as the document frequency; at query time the weight caps how much a
/// matching posting may contribute to a document's score.
///
/// Ordering is by hash bytes (lexicographic, unsigned), then weight. The
/// candidate selector requires its input slice to be sorted in this order —
/// a precondition established by the matcher, not by the selector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HashAndFreq {
    /// Hash code bytes, used verbatim as an index term.
    pub hash: Vec<u8>,
    /// Weight of this code. Must be at least 1.
    pub freq: u32,
}

impl HashAndFreq {
    /// A code with the given weight.
    #[must_use]
    pub const fn new(hash: Vec<u8>, freq: u32) -> Self {
        Self { hash, freq }
    }

    /// A code with weight 1 — the common case for models that emit one
    /// entry per hash table.
    #[must_use]
    pub const fn once(hash: Vec<u8>) -> Self {
        Self { hash, freq: 1 }
    }
}

/// A scored document surfaced by the multi-partition searcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHit {
    /// Ordinal of the partition the document lives in.
    pub partition: usize,
    /// Partition-local document id.
    pub doc_id: DocId,
    /// Final score produced by the partition's score function.
    pub score: f32,
}

impl ScoredHit {
    /// Ordering for merged result lists: score descending with NaN treated
    /// as the worst possible score, then partition ordinal, then doc id.
    #[must_use]
    pub fn cmp_best_first(&self, other: &Self) -> std::cmp::Ordering {
        score_key(other.score)
            .total_cmp(&score_key(self.score))
            .then_with(|| self.partition.cmp(&other.partition))
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

const fn score_key(score: f32) -> f32 {
    if score.is_nan() { f32::NEG_INFINITY } else { score }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_freq_orders_by_bytes_unsigned() {
        let low = HashAndFreq::once(vec![0x01, 0xff]);
        let high = HashAndFreq::once(vec![0x80, 0x00]);
        assert!(low < high, "0x80 must compare above 0x01 (unsigned bytes)");
    }

    #[test]
    fn hash_and_freq_prefix_orders_before_extension() {
        let short = HashAndFreq::once(vec![0x01]);
        let long = HashAndFreq::once(vec![0x01, 0x00]);
        assert!(short < long);
    }

    #[test]
    fn hash_and_freq_ties_break_on_freq() {
        let once = HashAndFreq::once(vec![0x07]);
        let twice = HashAndFreq::new(vec![0x07], 2);
        assert!(once < twice);
    }

    #[test]
    fn once_has_weight_one() {
        assert_eq!(HashAndFreq::once(vec![1, 2, 3]).freq, 1);
    }

    #[test]
    fn sorting_matches_ord() {
        let mut codes = vec![
            HashAndFreq::once(vec![0x02]),
            HashAndFreq::once(vec![0x00, 0x01]),
            HashAndFreq::once(vec![0x00]),
        ];
        codes.sort();
        let hashes: Vec<&[u8]> = codes.iter().map(|c| c.hash.as_slice()).collect();
        assert_eq!(hashes, vec![&[0x00][..], &[0x00, 0x01][..], &[0x02][..]]);
    }

    #[test]
    fn scored_hit_orders_best_first() {
        let a = ScoredHit {
            partition: 0,
            doc_id: 1,
            score: 2.0,
        };
        let b = ScoredHit {
            partition: 0,
            doc_id: 2,
            score: 5.0,
        };
        assert_eq!(a.cmp_best_first(&b), std::cmp::Ordering::Greater);
        assert_eq!(b.cmp_best_first(&a), std::cmp::Ordering::Less);
    }

    #[test]
    fn scored_hit_nan_sorts_last() {
        let real = ScoredHit {
            partition: 1,
            doc_id: 9,
            score: -100.0,
        };
        let nan = ScoredHit {
            partition: 0,
            doc_id: 0,
            score: f32::NAN,
        };
        assert_eq!(real.cmp_best_first(&nan), std::cmp::Ordering::Less);
    }

    #[test]
    fn scored_hit_ties_break_on_partition_then_doc() {
        let a = ScoredHit {
            partition: 0,
            doc_id: 5,
            score: 1.0,
        };
        let b = ScoredHit {
            partition: 1,
            doc_id: 2,
            score: 1.0,
        };
        assert_eq!(a.cmp_best_first(&b), std::cmp::Ordering::Less);

        let c = ScoredHit {
            partition: 0,
            doc_id: 6,
            score: 1.0,
        };
        assert_eq!(a.cmp_best_first(&c), std::cmp::Ordering::Less);
    }

    #[test]
    fn no_more_docs_is_above_any_real_doc() {
        assert!(NO_MORE_DOCS > 4_000_000_000);
    }
}
