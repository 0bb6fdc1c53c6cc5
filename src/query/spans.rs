//! The positional iterator contract shared by every span clause.

use std::fmt::Debug;

use crate::error::Result;
use crate::postings::{DocId, Term};

/// Sentinel start/end position reported after the last position in the
/// current document.
pub const NO_MORE_POSITIONS: i32 = i32::MAX;

/// A two-level cursor over (document, position interval) matches.
///
/// Every clause — leaf term, gap, or composite — implements this contract,
/// which is what lets near queries nest arbitrarily deep.
///
/// Document cursor: a freshly resolved `Spans` is positioned on its first
/// matching document; `next_doc`/`skip_to` return `Ok(false)` on exhaustion,
/// after which `doc_id` reports [`NO_MORE_DOCS`](crate::postings::NO_MORE_DOCS)
/// and no further matches are yielded.
///
/// Position cursor: reset whenever the document cursor moves. Before the
/// first `next_start_position` on a document, `start_position` and
/// `end_position` report `-1`; after the last position in the document they
/// report [`NO_MORE_POSITIONS`]. Each valid position is a half-open interval
/// `[start, end)` in term-position units. Advancement never revisits a
/// document or position.
pub trait Spans: Send + Debug {
    /// Get the current document ID.
    fn doc_id(&self) -> DocId;

    /// Move to the next matching document.
    fn next_doc(&mut self) -> Result<bool>;

    /// Skip to the first matching document >= target.
    fn skip_to(&mut self, target: DocId) -> Result<bool>;

    /// Check if the document cursor is exhausted.
    fn is_exhausted(&self) -> bool;

    /// Estimate of the number of documents left to iterate. Used only for
    /// iterator ordering heuristics upstream.
    fn cost(&self) -> u64;

    /// Move to the next start position in the current document and return
    /// it, or [`NO_MORE_POSITIONS`] when the document has no more matches.
    ///
    /// Must not be called before the document cursor rests on a real
    /// document.
    fn next_start_position(&mut self) -> Result<i32>;

    /// The current start position, `-1` before the first
    /// `next_start_position` on this document, [`NO_MORE_POSITIONS`] after
    /// the last.
    fn start_position(&self) -> i32;

    /// The end position for the current start position, with the same
    /// sentinel behavior as [`Spans::start_position`].
    fn end_position(&self) -> i32;

    /// The looseness of the current match: the number of non-matching
    /// position slots it spans. Lower is tighter. Only meaningful while
    /// positioned on a valid match.
    fn width(&self) -> i32;

    /// Emit the leaf positions making up the current match.
    ///
    /// Only legal after `next_start_position` and before
    /// [`NO_MORE_POSITIONS`] is reached.
    fn collect(&mut self, collector: &mut dyn SpanCollector) -> Result<()>;

    /// Estimate of the cost of enumerating the positions of one document.
    /// Independent of the current document; no correctness dependency.
    fn positions_cost(&self) -> f32;

    /// Advance the position cursor to the first start position >= `position`
    /// and return it.
    fn advance_position(&mut self, position: i32) -> Result<i32> {
        while self.start_position() < position {
            self.next_start_position()?;
        }
        Ok(self.start_position())
    }
}

/// Receives (term, position, payload) triples from the leaves of a match.
pub trait SpanCollector {
    /// Collect one leaf occurrence.
    fn collect_leaf(&mut self, term: &Term, position: i32, payload: Option<&[u8]>) -> Result<()>;

    /// Called when the driving `Spans` moves to a new match.
    fn reset(&mut self);
}

/// A collector that records (term, position) pairs in collection order.
#[derive(Debug, Default)]
pub struct PositionCollector {
    entries: Vec<(Term, i32)>,
}

impl PositionCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        PositionCollector::default()
    }

    /// The collected (term, position) pairs.
    pub fn entries(&self) -> &[(Term, i32)] {
        &self.entries
    }
}

impl SpanCollector for PositionCollector {
    fn collect_leaf(&mut self, term: &Term, position: i32, _payload: Option<&[u8]>) -> Result<()> {
        self.entries.push((term.clone(), position));
        Ok(())
    }

    fn reset(&mut self) {
        self.entries.clear();
    }
}
