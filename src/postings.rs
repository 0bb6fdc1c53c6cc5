//! The term occurrence boundary consumed by span queries.
//!
//! Span queries do not read an index themselves. They consume, per segment,
//! a [`SegmentReader`] that hands out one [`PostingIterator`] per term: a
//! cursor over (document, positions) pairs sorted by document then position.
//! [`MemorySegment`] is a simple in-memory implementation of that boundary,
//! useful for tests and benchmarks.

use std::fmt::Debug;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Result, YariError};

/// Document ordinal within a segment.
pub type DocId = u64;

/// Sentinel document ID reported by an exhausted iterator.
pub const NO_MORE_DOCS: DocId = u64::MAX;

/// A term in a specific field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    field: String,
    text: String,
}

impl Term {
    /// Create a new term.
    pub fn new<F: Into<String>, T: Into<String>>(field: F, text: T) -> Self {
        Term {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the term text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

/// Per-segment statistics for one term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    /// Number of documents containing the term.
    pub doc_freq: u64,
    /// Total number of occurrences across all documents.
    pub total_freq: u64,
}

/// What positional data a span query needs from the occurrence stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredPostings {
    /// Positions only.
    Positions,
    /// Positions plus per-position payloads.
    Payloads,
}

/// A cursor over the documents and positions of one term.
///
/// Iterators start positioned on their first document; `next` moves to the
/// second. Once `next` or `skip_to` returns `Ok(false)` the iterator is
/// exhausted and `doc_id` reports [`NO_MORE_DOCS`].
pub trait PostingIterator: Send + Debug {
    /// Get the current document ID.
    fn doc_id(&self) -> DocId;

    /// Get the term frequency in the current document.
    fn term_freq(&self) -> u64;

    /// Get the positions of the term in the current document, in increasing
    /// order.
    fn positions(&self) -> Result<Vec<i32>>;

    /// Get the payload attached to the position at `index` in the current
    /// document, if any.
    fn payload(&self, index: usize) -> Result<Option<Vec<u8>>> {
        let _ = index;
        Ok(None)
    }

    /// Move to the next document.
    fn next(&mut self) -> Result<bool>;

    /// Skip to the first document >= target.
    fn skip_to(&mut self, target: DocId) -> Result<bool>;

    /// Get the cost of iterating through this posting list.
    fn cost(&self) -> u64;

    /// Check if this iterator is exhausted.
    fn is_exhausted(&self) -> bool;
}

/// Read-only view of one index segment.
///
/// Implementations must be safe to share across threads; every call to
/// `postings` produces an independent iterator.
pub trait SegmentReader: Send + Sync + Debug {
    /// One past the highest document ID in the segment.
    fn max_doc(&self) -> DocId;

    /// Whether any term was ever indexed under `field` in this segment.
    fn has_field(&self, field: &str) -> bool;

    /// Get per-segment statistics for a term.
    fn term_info(&self, term: &Term) -> Result<Option<TermInfo>>;

    /// Get a posting iterator for a term, or `None` when the term has no
    /// occurrences in this segment.
    fn postings(
        &self,
        term: &Term,
        required: RequiredPostings,
    ) -> Result<Option<Box<dyn PostingIterator>>>;
}

/// A posting iterator over in-memory document and position vectors.
#[derive(Debug)]
pub struct VecPostingIterator {
    doc_ids: Vec<DocId>,
    positions: Vec<Vec<i32>>,
    current: usize,
    exhausted: bool,
}

impl VecPostingIterator {
    /// Create a new iterator; `doc_ids` must be strictly increasing and
    /// parallel to `positions`.
    pub fn new(doc_ids: Vec<DocId>, positions: Vec<Vec<i32>>) -> Result<Self> {
        if doc_ids.len() != positions.len() {
            return Err(YariError::invalid_argument(format!(
                "doc_ids length {} does not match positions length {}",
                doc_ids.len(),
                positions.len()
            )));
        }
        let exhausted = doc_ids.is_empty();
        Ok(VecPostingIterator {
            doc_ids,
            positions,
            current: 0,
            exhausted,
        })
    }
}

impl PostingIterator for VecPostingIterator {
    fn doc_id(&self) -> DocId {
        if self.exhausted {
            NO_MORE_DOCS
        } else {
            self.doc_ids[self.current]
        }
    }

    fn term_freq(&self) -> u64 {
        if self.exhausted {
            0
        } else {
            self.positions[self.current].len() as u64
        }
    }

    fn positions(&self) -> Result<Vec<i32>> {
        if self.exhausted {
            return Err(YariError::internal("positions() on exhausted iterator"));
        }
        Ok(self.positions[self.current].clone())
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        self.current += 1;
        if self.current >= self.doc_ids.len() {
            self.exhausted = true;
            return Ok(false);
        }
        Ok(true)
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        while self.doc_ids[self.current] < target {
            self.current += 1;
            if self.current >= self.doc_ids.len() {
                self.exhausted = true;
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn cost(&self) -> u64 {
        self.doc_ids.len() as u64
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[derive(Debug, Default, Clone)]
struct MemoryPostingList {
    doc_ids: Vec<DocId>,
    positions: Vec<Vec<i32>>,
}

/// An in-memory segment built from tokenized documents.
///
/// Documents must be added in non-decreasing `doc_id` order; token positions
/// are assigned sequentially from 0 within each (document, field) pair.
#[derive(Debug, Default)]
pub struct MemorySegment {
    fields: AHashSet<String>,
    postings: AHashMap<Term, MemoryPostingList>,
    max_doc: DocId,
}

impl MemorySegment {
    /// Create an empty segment.
    pub fn new() -> Self {
        MemorySegment::default()
    }

    /// Index `tokens` as the content of `field` in document `doc_id`.
    pub fn add_document(&mut self, doc_id: DocId, field: &str, tokens: &[&str]) {
        self.fields.insert(field.to_string());
        for (position, token) in tokens.iter().enumerate() {
            let term = Term::new(field, *token);
            let list = self.postings.entry(term).or_default();
            if list.doc_ids.last() != Some(&doc_id) {
                list.doc_ids.push(doc_id);
                list.positions.push(Vec::new());
            }
            list.positions
                .last_mut()
                .expect("posting list entry just pushed")
                .push(position as i32);
        }
        if doc_id + 1 > self.max_doc {
            self.max_doc = doc_id + 1;
        }
    }
}

impl SegmentReader for MemorySegment {
    fn max_doc(&self) -> DocId {
        self.max_doc
    }

    fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    fn term_info(&self, term: &Term) -> Result<Option<TermInfo>> {
        Ok(self.postings.get(term).map(|list| TermInfo {
            doc_freq: list.doc_ids.len() as u64,
            total_freq: list.positions.iter().map(|p| p.len() as u64).sum(),
        }))
    }

    fn postings(
        &self,
        term: &Term,
        _required: RequiredPostings,
    ) -> Result<Option<Box<dyn PostingIterator>>> {
        match self.postings.get(term) {
            Some(list) => {
                let iter = VecPostingIterator::new(list.doc_ids.clone(), list.positions.clone())?;
                Ok(Some(Box::new(iter)))
            }
            None => Ok(None),
        }
    }
}
