//! Base traits for span queries and their compiled weights.

use std::any::Any;
use std::fmt::{Debug, Display};
use std::hash::{DefaultHasher, Hash, Hasher};

use ahash::AHashSet;

use crate::error::Result;
use crate::postings::{RequiredPostings, SegmentReader, Term};
use crate::query::spans::Spans;

/// Whether a search session needs relevance scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// Scores are needed; weights collect term statistics.
    Complete,
    /// Matching only; no statistics are gathered.
    CompleteNoScores,
}

impl ScoreMode {
    /// Whether this mode requires scoring statistics.
    pub fn needs_scores(&self) -> bool {
        matches!(self, ScoreMode::Complete)
    }
}

/// Read-only introspection over a query tree. Visiting never executes
/// anything.
pub trait QueryVisitor {
    /// Whether the visitor is interested in `field`. Rejecting a field
    /// short-circuits the whole subtree.
    fn accept_field(&self, _field: &str) -> bool {
        true
    }

    /// Called before the sub-clauses of a conjunctive composite are visited.
    fn enter_conjunction(&mut self, _query: &dyn SpanQuery) {}

    /// Called for every leaf clause.
    fn visit_leaf(&mut self, _query: &dyn SpanQuery) {}
}

/// A query whose matches carry position intervals.
///
/// Implementations are immutable values: rewriting produces a new query
/// rather than editing in place, and equality/hash are structural.
pub trait SpanQuery: Send + Sync + Debug + Display {
    /// The field this query matches on, or `None` for field-agnostic
    /// clauses such as gaps nested in an ordered composite.
    fn field(&self) -> Option<&str>;

    /// Compile this query into a per-search-session weight.
    fn span_weight(&self, score_mode: ScoreMode, boost: f32) -> Result<Box<dyn SpanWeight>>;

    /// Rewrite this query into a more efficient form. Returns `None` when
    /// nothing changed, letting callers keep the original instance and
    /// upstream caches short-circuit.
    fn rewrite(&self) -> Result<Option<Box<dyn SpanQuery>>> {
        Ok(None)
    }

    /// Walk this query tree with `visitor`.
    fn visit(&self, visitor: &mut dyn QueryVisitor);

    /// Clone this query.
    fn clone_box(&self) -> Box<dyn SpanQuery>;

    /// Structural equality against any other span query.
    fn eq_box(&self, other: &dyn SpanQuery) -> bool;

    /// Structural hash, consistent with [`SpanQuery::eq_box`].
    fn query_hash(&self) -> u64;

    /// Get this query as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn SpanQuery> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn SpanQuery {
    fn eq(&self, other: &Self) -> bool {
        self.eq_box(other)
    }
}

/// Hash `value` with the process-stable default hasher, mixing in a
/// per-query-type seed so different clause types hash apart.
pub(crate) fn seeded_hash<T: Hash + ?Sized>(seed: u64, value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

/// A query compiled for one search session.
///
/// Weights are read-only after construction and safe to share across
/// threads; every `get_spans` call produces an independent iterator tree
/// owned by the caller.
pub trait SpanWeight: Send + Sync + Debug {
    /// Resolve a positional iterator over `reader`, or `None` when this
    /// query has no matches in the segment. Absence is not an error.
    fn get_spans(
        &self,
        reader: &dyn SegmentReader,
        required: RequiredPostings,
    ) -> Result<Option<Box<dyn Spans>>>;

    /// Collect the terms contributing to scoring statistics, recursively.
    fn extract_terms(&self, terms: &mut AHashSet<Term>);

    /// Whether a segment's resolution may be cached by upstream query
    /// caches.
    fn is_cacheable(&self) -> bool;

    /// The boost carried from compilation, for the scoring layer.
    fn boost(&self) -> f32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_mode() {
        assert!(ScoreMode::Complete.needs_scores());
        assert!(!ScoreMode::CompleteNoScores.needs_scores());
    }

    #[test]
    fn test_seeded_hash_distinguishes_seeds() {
        let a = seeded_hash(1, "fox");
        let b = seeded_hash(2, "fox");
        assert_ne!(a, b);
        assert_eq!(a, seeded_hash(1, "fox"));
    }
}
