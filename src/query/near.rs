//! Proximity query over ordered or unordered span clauses.

use std::any::Any;
use std::fmt;

use ahash::AHashSet;

use crate::error::{Result, YariError};
use crate::postings::{DocId, RequiredPostings, SegmentReader, Term};
use crate::query::ordered::NearSpansOrdered;
use crate::query::query::{QueryVisitor, ScoreMode, SpanQuery, SpanWeight, seeded_hash};
use crate::query::spans::{SpanCollector, Spans};
use crate::query::unordered::NearSpansUnordered;

const NEAR_QUERY_SEED: u64 = 0x73_70_61_6e_6e_65_61_72;
const GAP_QUERY_SEED: u64 = 0x73_70_61_6e_5f_67_61_70;

/// Matches spans which occur near one another.
///
/// Clauses are resolved against the same field; a match requires every
/// clause to match within the same document, with at most `slop` excess
/// positions between them. With `in_order` set the clauses must additionally
/// match in the order given, without overlap.
#[derive(Debug, Clone)]
pub struct SpanNearQuery {
    clauses: Vec<Box<dyn SpanQuery>>,
    slop: i32,
    in_order: bool,
    field: String,
}

impl SpanNearQuery {
    /// Create a query from at least two clauses over a single field.
    ///
    /// Clauses that declare no field are accepted as long as at least one
    /// clause does; two clauses declaring different fields are rejected.
    pub fn new(clauses: Vec<Box<dyn SpanQuery>>, slop: i32, in_order: bool) -> Result<Self> {
        if clauses.len() < 2 {
            return Err(YariError::invalid_argument(format!(
                "span near query requires at least two clauses, got {}",
                clauses.len()
            )));
        }
        if slop < 0 {
            return Err(YariError::invalid_argument(format!(
                "slop must be non-negative, got {slop}"
            )));
        }
        let mut field: Option<String> = None;
        for clause in &clauses {
            match (clause.field(), &field) {
                (Some(f), None) => field = Some(f.to_string()),
                (Some(f), Some(existing)) if f != existing => {
                    return Err(YariError::field(format!(
                        "clauses must all be over the same field: {existing} vs {f}"
                    )));
                }
                _ => {}
            }
        }
        let Some(field) = field else {
            return Err(YariError::field(
                "at least one clause must declare a field".to_string(),
            ));
        };
        Ok(SpanNearQuery {
            clauses,
            slop,
            in_order,
            field,
        })
    }

    /// Builder for an in-order query on `field`, which may contain gaps.
    pub fn ordered<F: Into<String>>(field: F) -> SpanNearQueryBuilder {
        SpanNearQueryBuilder::new(field, true)
    }

    /// Builder for an any-order query on `field`.
    pub fn unordered<F: Into<String>>(field: F) -> SpanNearQueryBuilder {
        SpanNearQueryBuilder::new(field, false)
    }

    pub fn clauses(&self) -> &[Box<dyn SpanQuery>] {
        &self.clauses
    }

    pub fn slop(&self) -> i32 {
        self.slop
    }

    pub fn is_in_order(&self) -> bool {
        self.in_order
    }
}

impl fmt::Display for SpanNearQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spanNear([")?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{clause}")?;
        }
        write!(f, "], {}, {})", self.slop, self.in_order)
    }
}

impl SpanQuery for SpanNearQuery {
    fn field(&self) -> Option<&str> {
        Some(&self.field)
    }

    fn span_weight(&self, score_mode: ScoreMode, boost: f32) -> Result<Box<dyn SpanWeight>> {
        let mut sub_weights = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            sub_weights.push(clause.span_weight(score_mode, boost)?);
        }
        let terms = if score_mode.needs_scores() {
            let mut terms = AHashSet::new();
            for weight in &sub_weights {
                weight.extract_terms(&mut terms);
            }
            Some(terms)
        } else {
            None
        };
        Ok(Box::new(SpanNearWeight {
            field: self.field.clone(),
            slop: self.slop,
            in_order: self.in_order,
            sub_weights,
            terms,
            boost,
        }))
    }

    fn rewrite(&self) -> Result<Option<Box<dyn SpanQuery>>> {
        let mut changed = false;
        let mut rewritten: Vec<Box<dyn SpanQuery>> = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            match clause.rewrite()? {
                Some(new_clause) => {
                    changed = true;
                    rewritten.push(new_clause);
                }
                None => rewritten.push(clause.clone()),
            }
        }
        if changed {
            let query = SpanNearQuery::new(rewritten, self.slop, self.in_order)?;
            Ok(Some(Box::new(query)))
        } else {
            Ok(None)
        }
    }

    fn visit(&self, visitor: &mut dyn QueryVisitor) {
        if !visitor.accept_field(&self.field) {
            return;
        }
        visitor.enter_conjunction(self);
        for clause in &self.clauses {
            clause.visit(visitor);
        }
    }

    fn clone_box(&self) -> Box<dyn SpanQuery> {
        Box::new(self.clone())
    }

    fn eq_box(&self, other: &dyn SpanQuery) -> bool {
        match other.as_any().downcast_ref::<SpanNearQuery>() {
            Some(other) => {
                self.in_order == other.in_order
                    && self.slop == other.slop
                    && self.clauses == other.clauses
            }
            None => false,
        }
    }

    fn query_hash(&self) -> u64 {
        let mut clause_hash: u64 = 1;
        for clause in &self.clauses {
            clause_hash = clause_hash.wrapping_mul(31).wrapping_add(clause.query_hash());
        }
        let fac: u64 = 1 + if self.in_order { 8 } else { 4 };
        (NEAR_QUERY_SEED ^ clause_hash)
            .wrapping_add(self.slop as u64)
            .wrapping_mul(fac)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Incremental construction of a [`SpanNearQuery`], validating each clause
/// as it is added.
#[derive(Debug)]
pub struct SpanNearQueryBuilder {
    field: String,
    ordered: bool,
    slop: i32,
    clauses: Vec<Box<dyn SpanQuery>>,
}

impl SpanNearQueryBuilder {
    pub fn new<F: Into<String>>(field: F, ordered: bool) -> Self {
        SpanNearQueryBuilder {
            field: field.into(),
            ordered,
            slop: 0,
            clauses: Vec::new(),
        }
    }

    /// Add a clause, which must be over the builder's field.
    pub fn add_clause(mut self, clause: Box<dyn SpanQuery>) -> Result<Self> {
        if clause.field() != Some(self.field.as_str()) {
            return Err(YariError::field(format!(
                "clause must be over field '{}', got {:?}",
                self.field,
                clause.field()
            )));
        }
        self.clauses.push(clause);
        Ok(self)
    }

    /// Add a gap of `width` positions. Gaps are only meaningful when the
    /// clauses run in order.
    pub fn add_gap(mut self, width: i32) -> Result<Self> {
        if !self.ordered {
            return Err(YariError::invalid_argument(
                "gaps can only be added to ordered near queries".to_string(),
            ));
        }
        let gap = SpanGapQuery::new(self.field.clone(), width)?;
        self.clauses.push(Box::new(gap));
        Ok(self)
    }

    pub fn slop(mut self, slop: i32) -> Self {
        self.slop = slop;
        self
    }

    pub fn build(self) -> Result<SpanNearQuery> {
        SpanNearQuery::new(self.clauses, self.slop, self.ordered)
    }
}

/// Compiled form of a [`SpanNearQuery`].
#[derive(Debug)]
pub struct SpanNearWeight {
    field: String,
    slop: i32,
    in_order: bool,
    sub_weights: Vec<Box<dyn SpanWeight>>,
    /// Terms gathered up front when the score mode needs them.
    terms: Option<AHashSet<Term>>,
    boost: f32,
}

impl SpanNearWeight {
    /// Terms cached at compile time, present only under a scoring mode.
    pub fn terms(&self) -> Option<&AHashSet<Term>> {
        self.terms.as_ref()
    }
}

impl SpanWeight for SpanNearWeight {
    fn get_spans(
        &self,
        reader: &dyn SegmentReader,
        required: RequiredPostings,
    ) -> Result<Option<Box<dyn Spans>>> {
        if !reader.has_field(&self.field) {
            return Ok(None);
        }
        let mut sub_spans = Vec::with_capacity(self.sub_weights.len());
        for weight in &self.sub_weights {
            match weight.get_spans(reader, required)? {
                Some(spans) => sub_spans.push(spans),
                // All clauses are mandatory.
                None => return Ok(None),
            }
        }
        let spans: Box<dyn Spans> = if self.in_order {
            Box::new(NearSpansOrdered::new(self.slop, sub_spans)?)
        } else {
            Box::new(NearSpansUnordered::new(self.slop, sub_spans)?)
        };
        Ok(Some(spans))
    }

    fn extract_terms(&self, terms: &mut AHashSet<Term>) {
        for weight in &self.sub_weights {
            weight.extract_terms(terms);
        }
    }

    fn is_cacheable(&self) -> bool {
        self.sub_weights.iter().all(|w| w.is_cacheable())
    }

    fn boost(&self) -> f32 {
        self.boost
    }
}

/// A clause matching a fixed-width gap at every position of every document.
///
/// Gaps never match on their own; inside an ordered near query they consume
/// `width` positions between their neighbors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanGapQuery {
    field: String,
    width: i32,
}

impl SpanGapQuery {
    pub fn new<F: Into<String>>(field: F, width: i32) -> Result<Self> {
        if width < 0 {
            return Err(YariError::invalid_argument(format!(
                "gap width must be non-negative, got {width}"
            )));
        }
        Ok(SpanGapQuery {
            field: field.into(),
            width,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }
}

impl fmt::Display for SpanGapQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanGap({}:{})", self.field, self.width)
    }
}

impl SpanQuery for SpanGapQuery {
    fn field(&self) -> Option<&str> {
        Some(&self.field)
    }

    fn span_weight(&self, _score_mode: ScoreMode, boost: f32) -> Result<Box<dyn SpanWeight>> {
        Ok(Box::new(SpanGapWeight {
            width: self.width,
            boost,
        }))
    }

    fn visit(&self, visitor: &mut dyn QueryVisitor) {
        if visitor.accept_field(&self.field) {
            visitor.visit_leaf(self);
        }
    }

    fn clone_box(&self) -> Box<dyn SpanQuery> {
        Box::new(self.clone())
    }

    fn eq_box(&self, other: &dyn SpanQuery) -> bool {
        match other.as_any().downcast_ref::<SpanGapQuery>() {
            Some(other) => self == other,
            None => false,
        }
    }

    fn query_hash(&self) -> u64 {
        seeded_hash(GAP_QUERY_SEED, &(self.field.as_str(), self.width))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct SpanGapWeight {
    width: i32,
    boost: f32,
}

impl SpanWeight for SpanGapWeight {
    fn get_spans(
        &self,
        _reader: &dyn SegmentReader,
        _required: RequiredPostings,
    ) -> Result<Option<Box<dyn Spans>>> {
        Ok(Some(Box::new(GapSpans::new(self.width))))
    }

    fn extract_terms(&self, _terms: &mut AHashSet<Term>) {}

    fn is_cacheable(&self) -> bool {
        true
    }

    fn boost(&self) -> f32 {
        self.boost
    }
}

/// Spans of a gap clause: an interval of fixed width at every position of
/// every document. Never exhausts on its own.
#[derive(Debug)]
pub struct GapSpans {
    doc: DocId,
    pos: i32,
    width: i32,
}

impl GapSpans {
    pub fn new(width: i32) -> Self {
        GapSpans {
            doc: 0,
            pos: -1,
            width,
        }
    }
}

impl Spans for GapSpans {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<bool> {
        self.pos = -1;
        self.doc += 1;
        Ok(true)
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if target > self.doc {
            self.pos = -1;
            self.doc = target;
        }
        Ok(true)
    }

    fn is_exhausted(&self) -> bool {
        false
    }

    fn cost(&self) -> u64 {
        0
    }

    fn next_start_position(&mut self) -> Result<i32> {
        self.pos += 1;
        Ok(self.pos)
    }

    fn start_position(&self) -> i32 {
        self.pos
    }

    fn end_position(&self) -> i32 {
        if self.pos < 0 { self.pos } else { self.pos + self.width }
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn collect(&mut self, _collector: &mut dyn SpanCollector) -> Result<()> {
        Ok(())
    }

    fn positions_cost(&self) -> f32 {
        0.0
    }

    fn advance_position(&mut self, position: i32) -> Result<i32> {
        if position > self.pos {
            self.pos = position;
        }
        Ok(self.pos)
    }
}
