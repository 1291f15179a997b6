//! Top-K candidate selection over one partition.
//!
//! The selector resolves one posting cursor per query hash code and walks
//! all of them in lock-step rounds, accumulating a per-document match score.
//! A document whose id falls below every active cursor can never change
//! again; such settled documents feed a bounded min-heap that tracks the
//! current top K. The scan stops either when every posting has been visited
//! (exhaustive — the result is the true top K by score) or, in approximate
//! mode, when the heap is full and its weakest member already meets the
//! round threshold.
//!
//! The early-exit bound is exact only if posting traversal order correlated
//! with score potential. Postings arrive in doc-id order, not score order,
//! so the early exit is an accepted approximation trading recall for
//! latency.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashdex_core::error::MatchResult;
use hashdex_core::tracing_config::TARGET_PREFIX;
use hashdex_core::traits::{IndexPartition, PostingIterator};
use hashdex_core::types::{DocId, HashAndFreq};

/// Per-document accumulated match scores for one partition scan.
///
/// Sized to the partition's max doc id, created fresh per scan, and handed
/// to the caller afterwards for final scoring.
#[derive(Debug, Clone)]
pub struct ScoreAccumulator {
    counts: Vec<u32>,
}

impl ScoreAccumulator {
    fn new(max_doc: DocId) -> Self {
        Self {
            counts: vec![0; max_doc as usize],
        }
    }

    /// Accumulated match score for `doc_id`; 0 for ids outside the
    /// partition.
    #[must_use]
    pub fn get(&self, doc_id: DocId) -> u32 {
        self.counts.get(doc_id as usize).copied().unwrap_or(0)
    }

    fn add(&mut self, doc_id: DocId, weight: u32) {
        if let Some(slot) = self.counts.get_mut(doc_id as usize) {
            *slot += weight;
        }
    }

    /// One past the largest doc id this accumulator covers.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_doc(&self) -> DocId {
        self.counts.len() as DocId
    }
}

/// Output of one partition scan.
#[derive(Debug)]
pub struct Selection {
    /// Up to K candidate doc ids, sorted ascending. Fewer than K when the
    /// partition has fewer matching documents.
    pub candidates: Vec<DocId>,
    /// The full accumulator, needed to score candidates lazily.
    pub scores: ScoreAccumulator,
    /// Number of postings consumed before the scan stopped.
    pub postings_visited: u64,
    /// Number of lock-step rounds the scan ran.
    pub rounds: u64,
    /// Whether the scan stopped on the early-exit heuristic rather than
    /// exhaustion.
    pub early_exit: bool,
}

impl Selection {
    fn empty(scores: ScoreAccumulator) -> Self {
        Self {
            candidates: Vec::new(),
            scores,
            postings_visited: 0,
            rounds: 0,
            early_exit: false,
        }
    }
}

/// The weighted multi-term top-K scan.
///
/// Precondition: `hashes` is sorted by hash bytes. The matcher establishes
/// this once at construction; handing an unsorted slice here leaves scoring
/// behavior undefined (it is not a signaled error).
#[derive(Debug, Clone, Copy)]
pub struct CandidateSelector<'a> {
    hashes: &'a [HashAndFreq],
    candidates: usize,
    exact: bool,
}

impl<'a> CandidateSelector<'a> {
    /// A selector retaining up to `candidates` docs per partition.
    #[must_use]
    pub const fn new(hashes: &'a [HashAndFreq], candidates: usize) -> Self {
        Self {
            hashes,
            candidates,
            exact: false,
        }
    }

    /// Disable the early exit and always scan to exhaustion.
    #[must_use]
    pub const fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    /// Scan one partition.
    ///
    /// A partition with no matching terms yields an empty selection, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Engine failures resolving terms or iterating postings propagate
    /// unchanged; the scan stops at the first failure.
    pub fn select<P: IndexPartition>(&self, field: &str, partition: &P) -> MatchResult<Selection> {
        let max_doc = partition.max_doc();

        // Resolve a cursor per hash; absent terms stay inactive. The sum of
        // doc counts over active cursors is the exact stopping bound.
        let mut cursors: Vec<Option<P::Postings>> = Vec::with_capacity(self.hashes.len());
        let mut total_postings: u64 = 0;
        for entry in self.hashes {
            match partition.postings(field, &entry.hash)? {
                Some(postings) => {
                    total_postings += u64::from(postings.doc_count());
                    cursors.push(Some(postings));
                }
                None => cursors.push(None),
            }
        }

        let mut scores = ScoreAccumulator::new(max_doc);
        if total_postings == 0 {
            return Ok(Selection::empty(scores));
        }

        let mut last_contribution = vec![0u32; self.hashes.len()];
        let mut heap: BinaryHeap<HeapEntry> =
            BinaryHeap::with_capacity(self.candidates.saturating_add(1));
        let mut postings_visited: u64 = 0;
        let mut rounds: u64 = 0;
        let mut settled_upto: DocId = 0;
        let mut early_exit = false;

        loop {
            rounds += 1;
            let mut round_min: Option<DocId> = None;

            for (i, slot) in cursors.iter_mut().enumerate() {
                let Some(cursor) = slot.as_mut() else {
                    continue;
                };
                match cursor.next_doc()? {
                    Some(doc_id) => {
                        postings_visited += 1;
                        let weight = self.hashes[i].freq.min(cursor.freq());
                        scores.add(doc_id, weight);
                        last_contribution[i] = weight;
                        round_min = Some(round_min.map_or(doc_id, |m| m.min(doc_id)));
                    }
                    None => *slot = None,
                }
            }

            // Upper bound on the score any still-unsettled document could
            // gain from the cursors just advanced. Exhausted cursors keep
            // their final contribution, so the bound stays an overestimate.
            let threshold: u64 = last_contribution.iter().copied().map(u64::from).sum();

            // Every doc id strictly below the round minimum is out of reach
            // of every active cursor: settle it.
            let bound = round_min.unwrap_or(max_doc);
            settle(&mut heap, &scores, settled_upto, bound, self.candidates);
            settled_upto = bound;

            if postings_visited == total_postings || round_min.is_none() {
                // Exhaustive stop: nothing can change anywhere anymore, so
                // the unsettled tail settles too and the heap holds the
                // true top K. An all-exhausted round also lands here in
                // case an engine under-reported its doc counts.
                settle(&mut heap, &scores, settled_upto, max_doc, self.candidates);
                break;
            }

            if !self.exact
                && heap.len() == self.candidates
                && heap
                    .peek()
                    .is_some_and(|worst| u64::from(worst.score) >= threshold)
            {
                tracing::debug!(
                    target: TARGET_PREFIX,
                    rounds,
                    postings_visited,
                    total_postings,
                    threshold,
                    "early exit: candidate floor meets round threshold"
                );
                early_exit = true;
                break;
            }
        }

        let mut candidates: Vec<DocId> = heap.into_iter().map(|entry| entry.doc_id).collect();
        candidates.sort_unstable();
        tracing::debug!(
            target: TARGET_PREFIX,
            rounds,
            postings_visited,
            total_postings,
            result_count = candidates.len(),
            early_exit,
            "candidate selection finished"
        );
        Ok(Selection {
            candidates,
            scores,
            postings_visited,
            rounds,
            early_exit,
        })
    }
}

/// Candidate heap entry. The score is frozen at settlement time — a settled
/// doc's accumulator slot can no longer change — so entries never re-key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    doc_id: DocId,
    score: u32,
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap keeps the largest element on top. "Largest" here means
        // "worst", so peek() returns the current eviction cutoff.
        match self.score.cmp(&other.score) {
            Ordering::Less => Ordering::Greater,
            Ordering::Greater => Ordering::Less,
            Ordering::Equal => self.doc_id.cmp(&other.doc_id),
        }
    }
}

fn settle(
    heap: &mut BinaryHeap<HeapEntry>,
    scores: &ScoreAccumulator,
    from: DocId,
    to: DocId,
    limit: usize,
) {
    for doc_id in from..to {
        let score = scores.get(doc_id);
        // Zero-score docs matched nothing and are never candidates.
        if score > 0 {
            insert_candidate(heap, HeapEntry { doc_id, score }, limit);
        }
    }
}

fn insert_candidate(heap: &mut BinaryHeap<HeapEntry>, candidate: HeapEntry, limit: usize) {
    if limit == 0 {
        return;
    }
    if heap.len() < limit {
        heap.push(candidate);
        return;
    }
    // Evict only when the newcomer strictly out-scores the current floor;
    // equal scores keep the incumbent (ties carry no stable order).
    if let Some(&worst) = heap.peek()
        && candidate.score > worst.score
    {
        let _ = heap.pop();
        heap.push(candidate);
    }
}
