// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split engine: one output document per page range.
//
// Ranges are extracted on the blocking pool by at most `concurrency` workers.
// Each worker parses the shared source bytes once, then claims ranges from a
// shared cursor until none are left. Results are slotted back by range index,
// so output order is range order whatever order the workers finish in. The
// first failure stops the other workers and fails the whole split.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pagewerk_core::error::{PagewerkError, Result};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use crate::pdf::{Document, DocumentBuilder, SourcePdf};
use crate::range::{PageRange, RangeSet};

/// One split output and the range it came from.
#[derive(Debug, Clone)]
pub struct SplitPart {
    pub range: PageRange,
    pub document: Document,
}

/// Extract the pages of `range` from `source` into a new, self-contained document.
pub fn extract_range(source: &Document, range: PageRange) -> Result<Document> {
    let pdf = SourcePdf::open(source)?;
    extract_from(&pdf, range)
}

fn extract_from(pdf: &SourcePdf, range: PageRange) -> Result<Document> {
    let indices: Vec<usize> = range.indices().collect();
    let mut builder = DocumentBuilder::new();
    builder.append_from(pdf, &indices)?;
    let page_count = builder.page_count();
    let bytes = builder.finish()?;
    Ok(Document::assembled(bytes, page_count))
}

/// Split `source` into one document per range in `ranges`, in range order.
///
/// All-or-nothing: if any extraction fails the error is returned and no
/// parts are.
#[instrument(skip_all, fields(source = %source.fingerprint(), ranges = ranges.len(), concurrency = concurrency))]
pub async fn split(
    source: Arc<Document>,
    ranges: &RangeSet,
    concurrency: usize,
) -> Result<Vec<SplitPart>> {
    let queue: Arc<[PageRange]> = ranges.as_slice().into();
    let cursor = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicBool::new(false));
    let workers = concurrency.clamp(1, queue.len().max(1));
    let mut tasks = JoinSet::new();

    for _ in 0..workers {
        let source = Arc::clone(&source);
        let queue = Arc::clone(&queue);
        let cursor = Arc::clone(&cursor);
        let failed = Arc::clone(&failed);
        tasks.spawn_blocking(move || {
            let outcome = drain_queue(&source, &queue, &cursor, &failed);
            if outcome.is_err() {
                failed.store(true, Ordering::Relaxed);
            }
            outcome
        });
    }

    let mut slots: Vec<Option<SplitPart>> = (0..queue.len()).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|err| PagewerkError::Pdf(format!("extraction task failed: {err}")))
            .and_then(|result| result);
        match outcome {
            Ok(parts) => {
                for (slot, part) in parts {
                    slots[slot] = Some(part);
                }
            }
            Err(err) => {
                failed.store(true, Ordering::Relaxed);
                tasks.abort_all();
                return Err(err);
            }
        }
    }

    let parts = slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| PagewerkError::Pdf("split finished with missing outputs".into()))?;

    info!(parts = parts.len(), "Split complete");
    Ok(parts)
}

/// One worker's share of a split: parse the source once, then extract claimed
/// ranges until the queue is empty or another worker has failed.
fn drain_queue(
    source: &Document,
    queue: &[PageRange],
    cursor: &AtomicUsize,
    failed: &AtomicBool,
) -> Result<Vec<(usize, SplitPart)>> {
    let pdf = SourcePdf::open(source)?;
    let mut done = Vec::new();

    while !failed.load(Ordering::Relaxed) {
        let slot = cursor.fetch_add(1, Ordering::Relaxed);
        let Some(&range) = queue.get(slot) else {
            break;
        };
        let document = extract_from(&pdf, range)?;
        debug!(range = %range, pages = document.page_count(), "Range extracted");
        done.push((slot, SplitPart { range, document }));
    }

    Ok(done)
}

/// Split without spawning tasks. Parses the source once for all ranges.
pub fn split_sequential(source: &Document, ranges: &RangeSet) -> Result<Vec<SplitPart>> {
    let pdf = SourcePdf::open(source)?;
    ranges
        .iter()
        .map(|&range| {
            Ok(SplitPart {
                range,
                document: extract_from(&pdf, range)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge;
    use crate::pdf::fixtures::{page_contents, page_labels, sample_pdf};
    use crate::range;

    fn load(pages: usize) -> Arc<Document> {
        Arc::new(Document::load(sample_pdf(pages)).expect("load fixture"))
    }

    #[tokio::test]
    async fn each_output_has_range_page_count() {
        let source = load(10);
        let ranges = range::parse(Some("1-3,7-7"), 10).unwrap();

        let parts = split(source, &ranges, 4).await.unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].document.page_count(), 3);
        assert_eq!(parts[1].document.page_count(), 1);
        assert_eq!(parts[0].range.to_string(), "1-3");
        assert_eq!(parts[1].range.to_string(), "7-7");
        assert_eq!(
            page_labels(parts[0].document.bytes()),
            vec!["Page 1", "Page 2", "Page 3"]
        );
        assert_eq!(page_labels(parts[1].document.bytes()), vec!["Page 7"]);
    }

    #[tokio::test]
    async fn default_split_yields_single_pages_in_order() {
        let source = load(5);
        let ranges = range::parse(None, 5).unwrap();

        // A single permit forces tasks to queue; order must still hold.
        let parts = split(source, &ranges, 1).await.unwrap();

        let labels: Vec<String> = parts
            .iter()
            .flat_map(|part| page_labels(part.document.bytes()))
            .collect();
        assert_eq!(labels, vec!["Page 1", "Page 2", "Page 3", "Page 4", "Page 5"]);
        assert!(parts.iter().all(|part| part.document.page_count() == 1));
    }

    #[tokio::test]
    async fn overlapping_ranges_produce_duplicate_outputs() {
        let source = load(4);
        let ranges = range::parse(Some("2-3,2-3,1-4"), 4).unwrap();

        let parts = split(source, &ranges, 8).await.unwrap();

        let counts: Vec<usize> = parts.iter().map(|p| p.document.page_count()).collect();
        assert_eq!(counts, vec![2, 2, 4]);
    }

    #[tokio::test]
    async fn outputs_are_independently_loadable() {
        let source = load(3);
        let parts = split(source, &range::all_pages(3), 2).await.unwrap();

        for part in parts {
            let reloaded = Document::load(part.document.to_vec()).expect("reload part");
            assert_eq!(reloaded.page_count(), 1);
        }
    }

    #[tokio::test]
    async fn split_then_merge_round_trips() {
        let bytes = sample_pdf(6);
        let source = Arc::new(Document::load(bytes.clone()).unwrap());

        let parts = split(source, &range::all_pages(6), 3).await.unwrap();
        let documents: Vec<Document> = parts.into_iter().map(|part| part.document).collect();
        let merged = merge(&documents).unwrap();

        assert_eq!(merged.page_count(), 6);
        assert_eq!(page_contents(merged.bytes()), page_contents(&bytes));
    }

    #[test]
    fn extract_range_copies_just_that_span() {
        let source = load(6);
        let range = range::parse(Some("3-5"), 6).unwrap().as_slice()[0];

        let document = extract_range(&source, range).unwrap();

        assert_eq!(document.page_count(), 3);
        assert_eq!(
            page_labels(document.bytes()),
            vec!["Page 3", "Page 4", "Page 5"]
        );
    }

    #[tokio::test]
    async fn one_failed_extraction_fails_the_whole_split() {
        // Claims three pages but cannot be parsed, so every extraction fails.
        let source = Arc::new(Document::assembled(b"not a pdf".to_vec(), 3));

        let outcome = split(source, &range::all_pages(3), 2).await;

        match outcome {
            Err(PagewerkError::Decode(_)) => {}
            other => panic!("expected a decode failure and no parts, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn many_ranges_with_few_workers_keep_range_order() {
        let source = load(40);

        let parts = split(source, &range::all_pages(40), 3).await.unwrap();

        let labels: Vec<String> = parts
            .iter()
            .flat_map(|part| page_labels(part.document.bytes()))
            .collect();
        let expected: Vec<String> = (1..=40).map(|n| format!("Page {n}")).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn sequential_split_matches_concurrent_shape() {
        let source = load(4);
        let ranges = range::parse(Some("4,1-2"), 4).unwrap();

        let parts = split_sequential(&source, &ranges).unwrap();

        assert_eq!(page_labels(parts[0].document.bytes()), vec!["Page 4"]);
        assert_eq!(
            page_labels(parts[1].document.bytes()),
            vec!["Page 1", "Page 2"]
        );
    }
}
