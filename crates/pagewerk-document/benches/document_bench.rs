// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pagewerk-document crate: range parsing, split,
// merge, and archive packaging on synthetic PDFs.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pagewerk_document::pdf::fixtures::sample_pdf;
use pagewerk_document::split::split_sequential;
use pagewerk_document::{ArchiveBuilder, ArchiveEntry, Document, merge, range, split};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_range_parse(c: &mut Criterion) {
    c.bench_function("range_parse (20 tokens, 500 pages)", |b| {
        let raw: Vec<String> = (0..20).map(|i| format!("{}-{}", i * 20 + 1, i * 20 + 15)).collect();
        let raw = raw.join(",");
        b.iter(|| range::parse(black_box(Some(raw.as_str())), 500));
    });
}

/// Split a 50-page document into single pages, sequentially and on the task pool.
fn bench_split(c: &mut Criterion) {
    let document = Document::load(sample_pdf(50)).expect("load fixture");
    let ranges = range::all_pages(document.page_count());

    c.bench_function("split_sequential (50 pages)", |b| {
        b.iter(|| split_sequential(black_box(&document), &ranges).expect("split"));
    });

    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let shared = Arc::new(document);
    c.bench_function("split_concurrent (50 pages, 4 tasks)", |b| {
        b.iter(|| {
            runtime
                .block_on(split(Arc::clone(&shared), &ranges, 4))
                .expect("split")
        });
    });
}

/// Merge ten 5-page documents.
fn bench_merge(c: &mut Criterion) {
    let documents: Vec<Document> = (0..10)
        .map(|_| Document::load(sample_pdf(5)).expect("load fixture"))
        .collect();

    c.bench_function("merge (10 x 5 pages)", |b| {
        b.iter(|| merge(black_box(&documents)).expect("merge"));
    });
}

fn bench_archive(c: &mut Criterion) {
    let page = sample_pdf(1);

    c.bench_function("archive_build (50 entries)", |b| {
        b.iter(|| {
            let mut builder = ArchiveBuilder::new();
            for i in 0..50 {
                builder.push(ArchiveEntry::new(format!("doc-pages-{i}-{i}.pdf"), page.clone()));
            }
            builder.build().expect("archive")
        });
    });
}

criterion_group!(benches, bench_range_parse, bench_split, bench_merge, bench_archive);
criterion_main!(benches);
