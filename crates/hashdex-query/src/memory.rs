//! In-memory reference implementation of the indexing-engine collaborator.
//!
//! The production engine lives behind [`IndexPartition`]; this module is the
//! always-available backend used by the test suites, benches, and examples.
//! It keeps a sorted term dictionary per partition with share-on-read
//! posting lists, and mirrors the index-time flow: every weighted hash code
//! of a document becomes one term whose posting stores the weight as the
//! document frequency.

use std::collections::BTreeMap;
use std::sync::Arc;

use hashdex_core::error::MatchResult;
use hashdex_core::traits::{HashingModel, IndexPartition, PostingIterator};
use hashdex_core::types::{DocId, HashAndFreq};

/// Accumulates documents for one partition.
#[derive(Debug, Clone)]
pub struct MemoryPartitionBuilder {
    field: String,
    next_doc: DocId,
    postings: BTreeMap<Vec<u8>, Vec<(DocId, u32)>>,
}

impl MemoryPartitionBuilder {
    /// A builder for a partition indexing hash codes under `field`.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            next_doc: 0,
            postings: BTreeMap::new(),
        }
    }

    /// Index one document's weighted hash codes and return its doc id.
    ///
    /// Doc ids are assigned in ascending insertion order, so posting lists
    /// stay sorted by construction. Duplicate codes within one document
    /// merge by summing their weights.
    pub fn add_document(&mut self, codes: &[HashAndFreq]) -> DocId {
        let doc_id = self.next_doc;
        self.next_doc += 1;
        for code in codes {
            let list = self.postings.entry(code.hash.clone()).or_default();
            match list.last_mut() {
                Some((last_doc, freq)) if *last_doc == doc_id => *freq += code.freq,
                _ => list.push((doc_id, code.freq)),
            }
        }
        doc_id
    }

    /// Number of documents added so far.
    #[must_use]
    pub const fn doc_count(&self) -> DocId {
        self.next_doc
    }

    /// Freeze into a queryable partition.
    #[must_use]
    pub fn build(self) -> MemoryPartition {
        MemoryPartition {
            field: self.field,
            max_doc: self.next_doc,
            postings: self
                .postings
                .into_iter()
                .map(|(term, list)| (term, Arc::from(list.into_boxed_slice())))
                .collect(),
        }
    }
}

/// One immutable in-memory partition.
#[derive(Debug, Clone)]
pub struct MemoryPartition {
    field: String,
    max_doc: DocId,
    postings: BTreeMap<Vec<u8>, Arc<[(DocId, u32)]>>,
}

impl MemoryPartition {
    /// Number of distinct terms in this partition.
    #[must_use]
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }
}

impl IndexPartition for MemoryPartition {
    type Postings = MemoryPostings;

    fn max_doc(&self) -> DocId {
        self.max_doc
    }

    fn postings(&self, field: &str, code: &[u8]) -> MatchResult<Option<Self::Postings>> {
        if field != self.field {
            return Ok(None);
        }
        Ok(self.postings.get(code).map(|list| MemoryPostings {
            list: Arc::clone(list),
            pos: 0,
            current: None,
        }))
    }
}

/// Forward-only cursor over one in-memory posting list.
#[derive(Debug, Clone)]
pub struct MemoryPostings {
    list: Arc<[(DocId, u32)]>,
    pos: usize,
    current: Option<(DocId, u32)>,
}

impl PostingIterator for MemoryPostings {
    #[allow(clippy::cast_possible_truncation)]
    fn doc_count(&self) -> u32 {
        self.list.len() as u32
    }

    fn next_doc(&mut self) -> MatchResult<Option<DocId>> {
        self.current = self.list.get(self.pos).copied();
        if self.current.is_some() {
            self.pos += 1;
        }
        Ok(self.current.map(|(doc_id, _)| doc_id))
    }

    fn freq(&self) -> u32 {
        self.current.map_or(0, |(_, freq)| freq)
    }
}

/// An ordered collection of partitions, scanned independently.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    partitions: Vec<MemoryPartition>,
}

impl MemoryIndex {
    /// Assemble an index from prebuilt partitions.
    #[must_use]
    pub fn from_partitions(partitions: Vec<MemoryPartition>) -> Self {
        Self { partitions }
    }

    /// Hash and index a corpus, splitting into partitions of at most
    /// `docs_per_partition` documents.
    ///
    /// # Errors
    ///
    /// Propagates hashing failures (e.g. a vector whose length does not
    /// match the model dimension); no partial index is returned.
    pub fn index_vectors(
        field: &str,
        model: &dyn HashingModel,
        vectors: &[Vec<f32>],
        docs_per_partition: usize,
    ) -> MatchResult<Self> {
        let per_partition = u32::try_from(docs_per_partition.max(1)).unwrap_or(u32::MAX);
        let mut partitions = Vec::new();
        let mut builder = MemoryPartitionBuilder::new(field);
        for vector in vectors {
            let codes = model.hash(vector)?;
            builder.add_document(&codes);
            if builder.doc_count() >= per_partition {
                let full = std::mem::replace(&mut builder, MemoryPartitionBuilder::new(field));
                partitions.push(full.build());
            }
        }
        if builder.doc_count() > 0 {
            partitions.push(builder.build());
        }
        Ok(Self { partitions })
    }

    /// The partitions in scan order.
    #[must_use]
    pub fn partitions(&self) -> &[MemoryPartition] {
        &self.partitions
    }

    /// Total document count across partitions.
    #[must_use]
    pub fn total_docs(&self) -> u64 {
        self.partitions.iter().map(|p| u64::from(p.max_doc())).sum()
    }
}
