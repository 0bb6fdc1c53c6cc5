//! The leaf span clause: all positions of a single term.

use std::any::Any;
use std::fmt;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::postings::{DocId, PostingIterator, RequiredPostings, SegmentReader, Term};
use crate::query::query::{QueryVisitor, ScoreMode, SpanQuery, SpanWeight, seeded_hash};
use crate::query::spans::{NO_MORE_POSITIONS, SpanCollector, Spans};

const TERM_QUERY_SEED: u64 = 0x73_70_61_6e_74_65_72_6d;

/// A span query matching every occurrence of one term.
///
/// Like the plain term query, no analysis is applied: the term text must
/// already be in normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanTermQuery {
    term: Term,
}

impl SpanTermQuery {
    /// Create a new span term query.
    pub fn new<F: Into<String>, T: Into<String>>(field: F, text: T) -> Self {
        SpanTermQuery {
            term: Term::new(field, text),
        }
    }

    /// Create a span term query from an existing term.
    pub fn from_term(term: Term) -> Self {
        SpanTermQuery { term }
    }

    /// Get the term.
    pub fn term(&self) -> &Term {
        &self.term
    }
}

impl fmt::Display for SpanTermQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term)
    }
}

impl SpanQuery for SpanTermQuery {
    fn field(&self) -> Option<&str> {
        Some(self.term.field())
    }

    fn span_weight(&self, _score_mode: ScoreMode, boost: f32) -> Result<Box<dyn SpanWeight>> {
        Ok(Box::new(SpanTermWeight {
            term: self.term.clone(),
            boost,
        }))
    }

    fn visit(&self, visitor: &mut dyn QueryVisitor) {
        if visitor.accept_field(self.term.field()) {
            visitor.visit_leaf(self);
        }
    }

    fn clone_box(&self) -> Box<dyn SpanQuery> {
        Box::new(self.clone())
    }

    fn eq_box(&self, other: &dyn SpanQuery) -> bool {
        other
            .as_any()
            .downcast_ref::<SpanTermQuery>()
            .is_some_and(|q| q.term == self.term)
    }

    fn query_hash(&self) -> u64 {
        seeded_hash(TERM_QUERY_SEED, &self.term)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Compiled weight for [`SpanTermQuery`].
#[derive(Debug)]
pub struct SpanTermWeight {
    term: Term,
    boost: f32,
}

impl SpanWeight for SpanTermWeight {
    fn get_spans(
        &self,
        reader: &dyn SegmentReader,
        required: RequiredPostings,
    ) -> Result<Option<Box<dyn Spans>>> {
        let Some(postings) = reader.postings(&self.term, required)? else {
            return Ok(None);
        };
        // Position enumeration cost scales with the average term frequency.
        let positions_cost = match reader.term_info(&self.term)? {
            Some(info) if info.doc_freq > 0 => {
                1.0 + (info.total_freq as f32 / info.doc_freq as f32) / 2.0
            }
            _ => 1.0,
        };
        Ok(Some(Box::new(TermSpans::new(
            self.term.clone(),
            postings,
            positions_cost,
        ))))
    }

    fn extract_terms(&self, terms: &mut AHashSet<Term>) {
        terms.insert(self.term.clone());
    }

    fn is_cacheable(&self) -> bool {
        true
    }

    fn boost(&self) -> f32 {
        self.boost
    }
}

/// Positional iterator over one term's postings.
#[derive(Debug)]
pub struct TermSpans {
    term: Term,
    postings: Box<dyn PostingIterator>,
    positions: Vec<i32>,
    // -1 before the first next_start_position on the current doc
    pos_index: i32,
    loaded: bool,
    positions_cost: f32,
}

impl TermSpans {
    /// Wrap a posting iterator, which must be positioned on its first
    /// document.
    pub fn new(term: Term, postings: Box<dyn PostingIterator>, positions_cost: f32) -> Self {
        TermSpans {
            term,
            postings,
            positions: Vec::new(),
            pos_index: -1,
            loaded: false,
            positions_cost,
        }
    }

    fn reset_positions(&mut self) {
        self.positions.clear();
        self.pos_index = -1;
        self.loaded = false;
    }
}

impl Spans for TermSpans {
    fn doc_id(&self) -> DocId {
        self.postings.doc_id()
    }

    fn next_doc(&mut self) -> Result<bool> {
        self.reset_positions();
        self.postings.next()
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if !self.postings.is_exhausted() && target <= self.postings.doc_id() {
            return Ok(true);
        }
        self.reset_positions();
        self.postings.skip_to(target)
    }

    fn is_exhausted(&self) -> bool {
        self.postings.is_exhausted()
    }

    fn cost(&self) -> u64 {
        self.postings.cost()
    }

    fn next_start_position(&mut self) -> Result<i32> {
        if !self.loaded {
            self.positions = self.postings.positions()?;
            self.loaded = true;
        }
        if self.pos_index + 1 >= self.positions.len() as i32 {
            self.pos_index = self.positions.len() as i32;
            return Ok(NO_MORE_POSITIONS);
        }
        self.pos_index += 1;
        Ok(self.positions[self.pos_index as usize])
    }

    fn start_position(&self) -> i32 {
        if self.pos_index < 0 {
            -1
        } else if self.pos_index >= self.positions.len() as i32 {
            NO_MORE_POSITIONS
        } else {
            self.positions[self.pos_index as usize]
        }
    }

    fn end_position(&self) -> i32 {
        let start = self.start_position();
        if start == -1 || start == NO_MORE_POSITIONS {
            start
        } else {
            start + 1
        }
    }

    fn width(&self) -> i32 {
        // A single term match has no internal looseness.
        0
    }

    fn collect(&mut self, collector: &mut dyn SpanCollector) -> Result<()> {
        let start = self.start_position();
        debug_assert!(start >= 0 && start != NO_MORE_POSITIONS);
        let payload = self.postings.payload(self.pos_index as usize)?;
        collector.collect_leaf(&self.term, start, payload.as_deref())
    }

    fn positions_cost(&self) -> f32 {
        self.positions_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::VecPostingIterator;

    fn term_spans(doc_ids: Vec<DocId>, positions: Vec<Vec<i32>>) -> TermSpans {
        let postings = VecPostingIterator::new(doc_ids, positions).unwrap();
        TermSpans::new(Term::new("body", "fox"), Box::new(postings), 1.0)
    }

    #[test]
    fn test_span_term_query_equality_and_hash() {
        let a = SpanTermQuery::new("body", "fox");
        let b = SpanTermQuery::new("body", "fox");
        let c = SpanTermQuery::new("body", "dog");

        assert!(a.eq_box(&b));
        assert!(!a.eq_box(&c));
        assert_eq!(a.query_hash(), b.query_hash());
        assert_ne!(a.query_hash(), c.query_hash());
        assert_eq!(a.to_string(), "body:fox");
    }

    #[test]
    fn test_term_spans_position_cursor() {
        let mut spans = term_spans(vec![0, 3], vec![vec![2, 5], vec![1]]);

        assert_eq!(spans.doc_id(), 0);
        assert_eq!(spans.start_position(), -1);
        assert_eq!(spans.end_position(), -1);

        assert_eq!(spans.next_start_position().unwrap(), 2);
        assert_eq!(spans.start_position(), 2);
        assert_eq!(spans.end_position(), 3);
        assert_eq!(spans.next_start_position().unwrap(), 5);
        assert_eq!(spans.next_start_position().unwrap(), NO_MORE_POSITIONS);
        assert_eq!(spans.start_position(), NO_MORE_POSITIONS);

        assert!(spans.next_doc().unwrap());
        assert_eq!(spans.doc_id(), 3);
        assert_eq!(spans.start_position(), -1);
        assert_eq!(spans.next_start_position().unwrap(), 1);

        assert!(!spans.next_doc().unwrap());
        assert!(spans.is_exhausted());
    }

    #[test]
    fn test_term_spans_advance_position() {
        let mut spans = term_spans(vec![0], vec![vec![1, 4, 9]]);

        assert_eq!(spans.advance_position(3).unwrap(), 4);
        assert_eq!(spans.advance_position(4).unwrap(), 4);
        assert_eq!(spans.advance_position(10).unwrap(), NO_MORE_POSITIONS);
    }

    #[test]
    fn test_term_spans_collect() {
        use crate::query::spans::PositionCollector;

        let mut spans = term_spans(vec![0], vec![vec![7]]);
        spans.next_start_position().unwrap();

        let mut collector = PositionCollector::new();
        spans.collect(&mut collector).unwrap();
        assert_eq!(collector.entries(), &[(Term::new("body", "fox"), 7)]);
    }
}
