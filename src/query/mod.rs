//! Span queries, their compiled weights, and the positional merge engines
//! behind them.

#[allow(clippy::module_inception)]
pub mod query;

pub(crate) mod conjunction;
pub mod near;
pub mod ordered;
pub mod spans;
pub mod term;
pub mod unordered;

pub use near::{GapSpans, SpanGapQuery, SpanNearQuery, SpanNearQueryBuilder, SpanNearWeight};
pub use ordered::NearSpansOrdered;
pub use query::{QueryVisitor, ScoreMode, SpanQuery, SpanWeight};
pub use spans::{NO_MORE_POSITIONS, PositionCollector, SpanCollector, Spans};
pub use term::{SpanTermQuery, SpanTermWeight, TermSpans};
pub use unordered::NearSpansUnordered;
