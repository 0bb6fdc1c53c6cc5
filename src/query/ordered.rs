//! Ordered proximity merge: sub-matches in clause order, non-overlapping,
//! within a slop budget.

use crate::error::{Result, YariError};
use crate::postings::DocId;
use crate::query::conjunction::ConjunctionSpansBase;
use crate::query::spans::{NO_MORE_POSITIONS, SpanCollector, Spans};

/// Spans formed from ordered sub-spans with a maximum slop between them.
///
/// A match requires each sub-iterator's interval to start at or after the
/// previous one's end, and the accumulated inter-clause gap to stay within
/// the slop. Only minimal matches are produced: for every anchor position of
/// the first clause, the remaining clauses stretch forward as little as
/// possible.
///
/// With slop >= 1 the produced matches may overlap. Querying `t1 t2 t3` with
/// slop 1 against the fragment `t1 t2 t1 t3 t2 t3` matches twice:
/// `t1 t2 .. t3` and `t1 .. t2 t3`.
#[derive(Debug)]
pub struct NearSpansOrdered {
    base: ConjunctionSpansBase,
    match_start: i32,
    match_end: i32,
    match_width: i32,
    allowed_slop: i32,
}

impl NearSpansOrdered {
    /// Build the engine over `sub_spans` in clause order and settle it on
    /// the first document with a valid match.
    pub fn new(allowed_slop: i32, sub_spans: Vec<Box<dyn Spans>>) -> Result<Self> {
        if allowed_slop < 0 {
            return Err(YariError::invalid_argument(format!(
                "slop must be non-negative, got {allowed_slop}"
            )));
        }
        let base = ConjunctionSpansBase::new(sub_spans)?;
        let mut spans = NearSpansOrdered {
            base,
            match_start: -1,
            match_end: -1,
            match_width: -1,
            allowed_slop,
        };
        if !spans.base.is_exhausted() {
            spans.to_matching_doc()?;
        }
        Ok(spans)
    }

    fn unpositioned(&self) -> bool {
        self.base.subs.iter().all(|s| s.start_position() == -1)
    }

    /// Advance aligned documents until one holds a valid match.
    fn to_matching_doc(&mut self) -> Result<bool> {
        loop {
            if self.current_doc_matches()? {
                return Ok(true);
            }
            if !self.base.next_aligned()? {
                return Ok(false);
            }
        }
    }

    /// Find the first valid match of the current document, anchored at
    /// successive positions of the first sub-iterator.
    fn current_doc_matches(&mut self) -> Result<bool> {
        debug_assert!(self.unpositioned());
        self.base.one_exhausted_in_current_doc = false;
        while self.base.subs[0].next_start_position()? != NO_MORE_POSITIONS
            && !self.base.one_exhausted_in_current_doc
        {
            if self.stretch_to_order()? && self.match_width <= self.allowed_slop {
                self.base.first_in_current_doc = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Order the sub-iterators behind the first one's current position,
    /// advancing each as little as necessary. Returns false when a
    /// sub-iterator exhausts its positions in this document.
    fn stretch_to_order(&mut self) -> Result<bool> {
        self.match_start = self.base.subs[0].start_position();
        debug_assert_ne!(self.match_start, NO_MORE_POSITIONS);
        self.match_width = 0;
        for i in 1..self.base.subs.len() {
            let prev_end = self.base.subs[i - 1].end_position();
            debug_assert_ne!(prev_end, NO_MORE_POSITIONS);
            if self.base.subs[i].advance_position(prev_end)? == NO_MORE_POSITIONS {
                self.base.one_exhausted_in_current_doc = true;
                return Ok(false);
            }
            self.match_width += self.base.subs[i].start_position() - prev_end;
        }
        self.match_end = self.base.subs[self.base.subs.len() - 1].end_position();
        Ok(true)
    }
}

impl Spans for NearSpansOrdered {
    fn doc_id(&self) -> DocId {
        self.base.doc_id()
    }

    fn next_doc(&mut self) -> Result<bool> {
        if !self.base.next_aligned()? {
            return Ok(false);
        }
        self.to_matching_doc()
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.base.is_exhausted() {
            return Ok(false);
        }
        if target <= self.base.doc_id() {
            return Ok(true);
        }
        if !self.base.skip_aligned(target)? {
            return Ok(false);
        }
        self.to_matching_doc()
    }

    fn is_exhausted(&self) -> bool {
        self.base.is_exhausted()
    }

    fn cost(&self) -> u64 {
        self.base.cost()
    }

    fn next_start_position(&mut self) -> Result<i32> {
        if self.base.first_in_current_doc {
            self.base.first_in_current_doc = false;
            return Ok(self.match_start);
        }
        while self.base.subs[0].next_start_position()? != NO_MORE_POSITIONS
            && !self.base.one_exhausted_in_current_doc
        {
            if self.stretch_to_order()? && self.match_width <= self.allowed_slop {
                return Ok(self.match_start);
            }
        }
        self.match_start = NO_MORE_POSITIONS;
        self.match_end = NO_MORE_POSITIONS;
        Ok(NO_MORE_POSITIONS)
    }

    fn start_position(&self) -> i32 {
        if self.base.first_in_current_doc {
            -1
        } else {
            self.match_start
        }
    }

    fn end_position(&self) -> i32 {
        if self.base.first_in_current_doc {
            -1
        } else {
            self.match_end
        }
    }

    fn width(&self) -> i32 {
        self.match_width
    }

    fn collect(&mut self, collector: &mut dyn SpanCollector) -> Result<()> {
        for sub in &mut self.base.subs {
            sub.collect(collector)?;
        }
        Ok(())
    }

    fn positions_cost(&self) -> f32 {
        self.base.match_cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::{NO_MORE_DOCS, Term, VecPostingIterator};
    use crate::query::term::TermSpans;

    fn spans(text: &str, doc_ids: Vec<DocId>, positions: Vec<Vec<i32>>) -> Box<dyn Spans> {
        let postings = VecPostingIterator::new(doc_ids, positions).unwrap();
        Box::new(TermSpans::new(
            Term::new("body", text),
            Box::new(postings),
            1.0,
        ))
    }

    #[test]
    fn test_adjacent_terms_within_slop() {
        // "quick" at 0, "fox" at 2: excess 1.
        let subs = vec![
            spans("quick", vec![0], vec![vec![0]]),
            spans("fox", vec![0], vec![vec![2]]),
        ];
        let mut near = NearSpansOrdered::new(1, subs).unwrap();

        assert_eq!(near.doc_id(), 0);
        assert_eq!(near.start_position(), -1);
        assert_eq!(near.next_start_position().unwrap(), 0);
        assert_eq!(near.end_position(), 3);
        assert_eq!(near.width(), 1);
        assert_eq!(near.next_start_position().unwrap(), NO_MORE_POSITIONS);
        assert!(!near.next_doc().unwrap());
        assert_eq!(near.doc_id(), NO_MORE_DOCS);
    }

    #[test]
    fn test_zero_slop_rejects_gap_between_terms() {
        let subs = vec![
            spans("quick", vec![0], vec![vec![0]]),
            spans("fox", vec![0], vec![vec![2]]),
        ];
        let near = NearSpansOrdered::new(0, subs).unwrap();
        assert!(near.is_exhausted());
    }

    #[test]
    fn test_out_of_order_terms_do_not_match() {
        // "fox" before "quick": ordered query must not match.
        let subs = vec![
            spans("quick", vec![0], vec![vec![2]]),
            spans("fox", vec![0], vec![vec![0]]),
        ];
        let near = NearSpansOrdered::new(10, subs).unwrap();
        assert!(near.is_exhausted());
    }

    #[test]
    fn test_enumerates_all_matches_in_start_order() {
        // t1 t2 t1 t3 t2 t3 with slop 1 matches twice.
        let subs = vec![
            spans("t1", vec![0], vec![vec![0, 2]]),
            spans("t2", vec![0], vec![vec![1, 4]]),
            spans("t3", vec![0], vec![vec![3, 5]]),
        ];
        let mut near = NearSpansOrdered::new(1, subs).unwrap();

        let mut starts = Vec::new();
        let mut last_excess = Vec::new();
        loop {
            let start = near.next_start_position().unwrap();
            if start == NO_MORE_POSITIONS {
                break;
            }
            starts.push(start);
            last_excess.push(near.width());
        }
        assert_eq!(starts, vec![0, 2]);
        assert!(last_excess.iter().all(|&w| w >= 0 && w <= 1));
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_doc_cursor_skips_documents_without_match() {
        let subs = vec![
            spans("a", vec![0, 1, 4], vec![vec![0], vec![0], vec![1]]),
            spans("b", vec![0, 1, 4], vec![vec![5], vec![1], vec![2]]),
        ];
        // doc 0 has excess 4, docs 1 and 4 are adjacent.
        let mut near = NearSpansOrdered::new(0, subs).unwrap();
        assert_eq!(near.doc_id(), 1);
        assert!(near.next_doc().unwrap());
        assert_eq!(near.doc_id(), 4);
        assert!(!near.next_doc().unwrap());
    }

    #[test]
    fn test_skip_to() {
        let subs = vec![
            spans("a", vec![0, 3, 8], vec![vec![0]; 3]),
            spans("b", vec![0, 3, 8], vec![vec![1]; 3]),
        ];
        let mut near = NearSpansOrdered::new(0, subs).unwrap();
        assert_eq!(near.doc_id(), 0);
        assert!(near.skip_to(4).unwrap());
        assert_eq!(near.doc_id(), 8);
        assert!(!near.next_doc().unwrap());
    }

    #[test]
    fn test_rejects_negative_slop() {
        let subs = vec![
            spans("a", vec![0], vec![vec![0]]),
            spans("b", vec![0], vec![vec![1]]),
        ];
        assert!(NearSpansOrdered::new(-1, subs).is_err());
    }

    #[test]
    fn test_rejects_single_clause() {
        let subs = vec![spans("a", vec![0], vec![vec![0]])];
        assert!(NearSpansOrdered::new(0, subs).is_err());
    }
}
