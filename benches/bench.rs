//! Criterion benchmarks for Yari proximity matching.
//!
//! Covers both merge engines over a synthetic corpus:
//! - Ordered matching with and without slop
//! - Unordered matching
//! - Resolution (weight compilation plus iterator construction)

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use yari::postings::{MemorySegment, NO_MORE_DOCS, RequiredPostings};
use yari::query::{
    NO_MORE_POSITIONS, ScoreMode, SpanNearQuery, SpanQuery, SpanTermQuery, Spans,
};

const VOCABULARY: &[&str] = &[
    "search", "engine", "full", "text", "index", "query", "document", "field", "term", "phrase",
    "boolean", "proximity", "position", "interval", "slop", "ordered", "window", "match", "span",
    "clause", "gap", "segment", "posting", "iterator", "merge", "heap", "stretch", "anchor",
    "excess", "width", "budget", "cursor",
];

/// Build a segment of `doc_count` documents with pseudo-random token streams.
fn generate_segment(doc_count: u64, doc_length: usize) -> MemorySegment {
    let mut rng = StdRng::seed_from_u64(0x59_41_52_49);
    let mut segment = MemorySegment::new();
    for doc in 0..doc_count {
        let tokens: Vec<&str> = (0..doc_length)
            .map(|_| VOCABULARY[rng.random_range(0..VOCABULARY.len())])
            .collect();
        segment.add_document(doc, "body", &tokens);
    }
    segment
}

fn near_query(slop: i32, in_order: bool) -> SpanNearQuery {
    SpanNearQuery::new(
        vec![
            Box::new(SpanTermQuery::new("body", "search")),
            Box::new(SpanTermQuery::new("body", "engine")),
        ],
        slop,
        in_order,
    )
    .unwrap()
}

/// Drain every match of every document, returning the match count.
fn drain(mut spans: Box<dyn Spans>) -> u64 {
    let mut matches = 0;
    while spans.doc_id() != NO_MORE_DOCS {
        while spans.next_start_position().unwrap() != NO_MORE_POSITIONS {
            matches += 1;
        }
        if !spans.next_doc().unwrap() {
            break;
        }
    }
    matches
}

fn bench_proximity_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("proximity_matching");

    let doc_count = 1000;
    let segment = generate_segment(doc_count, 120);
    group.throughput(Throughput::Elements(doc_count));

    for (name, slop, in_order) in [
        ("ordered_slop_0", 0, true),
        ("ordered_slop_4", 4, true),
        ("unordered_slop_4", 4, false),
    ] {
        let query = near_query(slop, in_order);
        let weight = query
            .span_weight(ScoreMode::CompleteNoScores, 1.0)
            .unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let spans = weight
                    .get_spans(black_box(&segment), RequiredPostings::Positions)
                    .unwrap();
                match spans {
                    Some(spans) => black_box(drain(spans)),
                    None => 0,
                }
            })
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    let segment = generate_segment(200, 80);
    let query = near_query(2, true);

    group.bench_function("compile_and_resolve", |b| {
        b.iter(|| {
            let weight = query
                .span_weight(ScoreMode::CompleteNoScores, 1.0)
                .unwrap();
            let spans = weight
                .get_spans(black_box(&segment), RequiredPostings::Positions)
                .unwrap();
            black_box(spans.map(|s| s.doc_id()))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_proximity_matching, bench_resolution);
criterion_main!(benches);
