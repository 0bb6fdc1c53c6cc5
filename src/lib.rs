//! # Yari
//!
//! Positional proximity queries for full-text search indexes.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Span iterators exposing per-match position intervals
//! - Ordered and unordered proximity matching with a slop budget
//! - Gap clauses that consume positions without matching terms
//! - Structural query equality, hashing, and rewrite to fixed point
//!
//! ## Example
//!
//! ```
//! use yari::postings::{MemorySegment, RequiredPostings};
//! use yari::query::{ScoreMode, SpanNearQuery, SpanQuery, SpanTermQuery, Spans};
//!
//! # fn main() -> yari::error::Result<()> {
//! let mut segment = MemorySegment::new();
//! segment.add_document(0, "body", &["the", "quick", "brown", "fox"]);
//!
//! let query = SpanNearQuery::ordered("body")
//!     .add_clause(Box::new(SpanTermQuery::new("body", "quick")))?
//!     .add_clause(Box::new(SpanTermQuery::new("body", "fox")))?
//!     .slop(1)
//!     .build()?;
//!
//! let weight = query.span_weight(ScoreMode::CompleteNoScores, 1.0)?;
//! let mut spans = weight
//!     .get_spans(&segment, RequiredPostings::Positions)?
//!     .expect("both terms occur in the segment");
//! assert_eq!(spans.doc_id(), 0);
//! assert_eq!(spans.next_start_position()?, 1);
//! assert_eq!(spans.end_position(), 4);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod postings;
pub mod query;

pub mod prelude {
    pub use crate::error::{Result, YariError};
    pub use crate::postings::{
        DocId, MemorySegment, NO_MORE_DOCS, PostingIterator, RequiredPostings, SegmentReader, Term,
    };
    pub use crate::query::{
        NO_MORE_POSITIONS, ScoreMode, SpanCollector, SpanNearQuery, SpanQuery, SpanTermQuery,
        SpanWeight, Spans,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
