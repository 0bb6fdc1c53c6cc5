//! Unordered proximity merge: sub-matches in any order, overlap permitted,
//! within a slop budget.

use crate::error::{Result, YariError};
use crate::postings::DocId;
use crate::query::conjunction::ConjunctionSpansBase;
use crate::query::spans::{NO_MORE_POSITIONS, SpanCollector, Spans};

/// Spans formed from unordered sub-spans with a maximum slop between them.
///
/// The window of a candidate match runs from the smallest sub-match start to
/// the largest sub-match end. The match is valid when the window length minus
/// the summed sub-match lengths is within the slop. Sub-matches may overlap,
/// which can drive that excess negative.
///
/// Candidates are enumerated by keeping the sub-iterators in a min-heap
/// ordered by (start, end) and repeatedly advancing the minimum, so matches
/// are produced in non-decreasing start order within each document.
#[derive(Debug)]
pub struct NearSpansUnordered {
    base: ConjunctionSpansBase,
    allowed_slop: i32,
    /// Indices into `base.subs`, arranged as a binary min-heap by
    /// (start_position, end_position).
    heap: Vec<usize>,
    /// Current interval length of each sub-iterator.
    lengths: Vec<i32>,
    total_length: i32,
    /// Index of the sub-iterator with the largest end position.
    max_end_index: usize,
}

impl NearSpansUnordered {
    /// Build the engine over `sub_spans` and settle it on the first document
    /// with a valid match.
    pub fn new(allowed_slop: i32, sub_spans: Vec<Box<dyn Spans>>) -> Result<Self> {
        if allowed_slop < 0 {
            return Err(YariError::invalid_argument(format!(
                "slop must be non-negative, got {allowed_slop}"
            )));
        }
        let base = ConjunctionSpansBase::new(sub_spans)?;
        let n = base.subs.len();
        let mut spans = NearSpansUnordered {
            base,
            allowed_slop,
            heap: Vec::with_capacity(n),
            lengths: vec![0; n],
            total_length: 0,
            max_end_index: 0,
        };
        if !spans.base.is_exhausted() {
            spans.to_matching_doc()?;
        }
        Ok(spans)
    }

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

    fn current_doc_matches(&mut self) -> Result<bool> {
        self.seed_positions()?;
        loop {
            if self.at_match() {
                self.base.first_in_current_doc = true;
                self.base.one_exhausted_in_current_doc = false;
                return Ok(true);
            }
            if !self.advance_min()? {
                return Ok(false);
            }
        }
    }

    /// Position every sub-iterator on its first interval in the current
    /// document and rebuild the heap.
    fn seed_positions(&mut self) -> Result<()> {
        self.heap.clear();
        self.total_length = 0;
        self.max_end_index = 0;
        for i in 0..self.base.subs.len() {
            let start = self.base.subs[i].next_start_position()?;
            debug_assert_ne!(start, NO_MORE_POSITIONS);
            let length = self.base.subs[i].end_position() - start;
            self.lengths[i] = length;
            self.total_length += length;
            if self.base.subs[i].end_position()
                > self.base.subs[self.max_end_index].end_position()
            {
                self.max_end_index = i;
            }
            self.heap.push(i);
        }
        for i in (0..self.heap.len() / 2).rev() {
            self.sift_down(i);
        }
        Ok(())
    }

    /// Window length minus summed sub-match lengths, within the slop.
    fn at_match(&self) -> bool {
        let window = self.base.subs[self.max_end_index].end_position() - self.min_start();
        window - self.total_length <= self.allowed_slop
    }

    /// Advance the sub-iterator with the smallest (start, end) to its next
    /// interval. Returns false when it runs out of positions in this
    /// document, which ends the enumeration: any further window would still
    /// be missing that clause.
    fn advance_min(&mut self) -> Result<bool> {
        let i = self.heap[0];
        let start = self.base.subs[i].next_start_position()?;
        if start == NO_MORE_POSITIONS {
            self.base.one_exhausted_in_current_doc = true;
            return Ok(false);
        }
        let length = self.base.subs[i].end_position() - start;
        self.total_length += length - self.lengths[i];
        self.lengths[i] = length;
        if self.base.subs[i].end_position() > self.base.subs[self.max_end_index].end_position() {
            self.max_end_index = i;
        }
        self.sift_down(0);
        Ok(true)
    }

    fn min_start(&self) -> i32 {
        self.base.subs[self.heap[0]].start_position()
    }

    fn heap_less(&self, a: usize, b: usize) -> bool {
        let start_a = self.base.subs[a].start_position();
        let start_b = self.base.subs[b].start_position();
        start_a < start_b
            || (start_a == start_b
                && self.base.subs[a].end_position() < self.base.subs[b].end_position())
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut smallest = i;
            if left < self.heap.len() && self.heap_less(self.heap[left], self.heap[smallest]) {
                smallest = left;
            }
            if right < self.heap.len() && self.heap_less(self.heap[right], self.heap[smallest]) {
                smallest = right;
            }
            if smallest == i {
                return;
            }
            self.heap.swap(i, smallest);
            i = smallest;
        }
    }
}

impl Spans for NearSpansUnordered {
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
            return Ok(self.min_start());
        }
        loop {
            if !self.advance_min()? {
                return Ok(NO_MORE_POSITIONS);
            }
            if self.at_match() {
                return Ok(self.min_start());
            }
        }
    }

    fn start_position(&self) -> i32 {
        // The heap stays empty until the first document seeds positions,
        // which never happens when the conjunction exhausts at construction.
        if self.base.first_in_current_doc || self.heap.is_empty() {
            -1
        } else if self.base.one_exhausted_in_current_doc {
            NO_MORE_POSITIONS
        } else {
            self.min_start()
        }
    }

    fn end_position(&self) -> i32 {
        if self.base.first_in_current_doc || self.heap.is_empty() {
            -1
        } else if self.base.one_exhausted_in_current_doc {
            NO_MORE_POSITIONS
        } else {
            self.base.subs[self.max_end_index].end_position()
        }
    }

    fn width(&self) -> i32 {
        if self.heap.is_empty() {
            return -1;
        }
        self.base.subs[self.max_end_index].start_position() - self.min_start()
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
