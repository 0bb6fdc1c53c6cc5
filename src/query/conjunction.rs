//! Document-level conjunction over positional sub-iterators.
//!
//! Both merge engines require every sub-iterator on the same document before
//! any position work happens. The leapfrog alignment here drives that: the
//! first sub-iterator leads, everyone else skips to the current maximum
//! until all agree.

use crate::error::{Result, YariError};
use crate::postings::{DocId, NO_MORE_DOCS};
use crate::query::spans::Spans;

/// Shared doc-cursor state for N-way span conjunctions.
///
/// Owns the sub-iterators in clause order; the order is never changed, which
/// the ordered merge engine relies on.
#[derive(Debug)]
pub(crate) struct ConjunctionSpansBase {
    pub(crate) subs: Vec<Box<dyn Spans>>,
    current_doc: DocId,
    exhausted: bool,
    cost: u64,
    match_cost: f32,
    /// The first proximity match of the current doc was found during doc
    /// alignment and not yet handed out by `next_start_position`.
    pub(crate) first_in_current_doc: bool,
    /// A sub-iterator ran out of positions in the current doc.
    pub(crate) one_exhausted_in_current_doc: bool,
}

impl ConjunctionSpansBase {
    /// Build the conjunction and align it on the first common document.
    ///
    /// Sub-iterators must arrive positioned on their first documents, as
    /// produced by weight resolution.
    pub(crate) fn new(subs: Vec<Box<dyn Spans>>) -> Result<Self> {
        if subs.len() < 2 {
            return Err(YariError::invalid_argument(format!(
                "near spans require at least two sub spans, got {}",
                subs.len()
            )));
        }
        let cost = subs.iter().map(|s| s.cost()).min().unwrap_or(0);
        let match_cost = subs.iter().map(|s| s.positions_cost()).sum();
        let mut base = ConjunctionSpansBase {
            subs,
            current_doc: 0,
            exhausted: false,
            cost,
            match_cost,
            first_in_current_doc: false,
            one_exhausted_in_current_doc: false,
        };
        if !base.align()? {
            base.exhaust();
        }
        Ok(base)
    }

    fn exhaust(&mut self) {
        self.exhausted = true;
        self.current_doc = NO_MORE_DOCS;
    }

    /// Leapfrog all sub-iterators onto one document, starting from their
    /// current positions.
    fn align(&mut self) -> Result<bool> {
        loop {
            let mut max_doc = 0;
            for sub in &self.subs {
                if sub.is_exhausted() {
                    return Ok(false);
                }
                max_doc = max_doc.max(sub.doc_id());
            }

            let mut all_aligned = true;
            for sub in &mut self.subs {
                if sub.doc_id() < max_doc {
                    if !sub.skip_to(max_doc)? {
                        return Ok(false);
                    }
                    if sub.doc_id() != max_doc {
                        all_aligned = false;
                    }
                }
            }

            if all_aligned {
                self.current_doc = max_doc;
                return Ok(true);
            }
        }
    }

    /// Advance the lead sub-iterator and realign; `Ok(false)` means the
    /// conjunction is exhausted.
    pub(crate) fn next_aligned(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if !self.subs[0].next_doc()? || !self.align()? {
            self.exhaust();
            return Ok(false);
        }
        Ok(true)
    }

    /// Skip the conjunction to the first aligned document >= `target`.
    pub(crate) fn skip_aligned(&mut self, target: DocId) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if target <= self.current_doc {
            return Ok(true);
        }
        if !self.subs[0].skip_to(target)? || !self.align()? {
            self.exhaust();
            return Ok(false);
        }
        Ok(true)
    }

    pub(crate) fn doc_id(&self) -> DocId {
        self.current_doc
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub(crate) fn cost(&self) -> u64 {
        self.cost
    }

    pub(crate) fn match_cost(&self) -> f32 {
        self.match_cost
    }
}
