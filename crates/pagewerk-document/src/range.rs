// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range parsing.
//
// User input is one-based and comma separated ("1-3,7,9-10"). Parsed ranges
// are zero-based and inclusive, and are only ever created here, already
// validated against the document's page count.

use std::fmt;
use std::ops::RangeInclusive;

use pagewerk_core::error::{PagewerkError, RangeErrorReason, Result};

/// A validated, zero-based, inclusive span of pages.
///
/// Invariant: `start <= end < total_pages` of the document it was parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRange {
    start: usize,
    end: usize,
}

impl PageRange {
    /// Zero-based index of the first page.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Zero-based index of the last page (inclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of pages covered. Always at least one.
    pub fn page_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// The span as the user wrote it: one-based `(start, end)`.
    pub fn one_based(&self) -> (usize, usize) {
        (self.start + 1, self.end + 1)
    }

    /// Zero-based page indices, in order.
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl fmt::Display for PageRange {
    /// One-based `start-end`, e.g. `1-3` or `7-7`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.one_based();
        write!(f, "{start}-{end}")
    }
}

/// Ordered ranges; insertion order is output order. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<PageRange>,
    explicit: bool,
}

impl RangeSet {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// `true` if the ranges came from user input, `false` for the one-per-page default.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageRange> {
        self.ranges.iter()
    }

    pub fn as_slice(&self) -> &[PageRange] {
        &self.ranges
    }

    /// Total pages across all ranges, counting overlaps more than once.
    pub fn total_pages(&self) -> usize {
        self.ranges.iter().map(PageRange::page_count).sum()
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a PageRange;
    type IntoIter = std::slice::Iter<'a, PageRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// One single-page range per page, in page order.
pub fn all_pages(total_pages: usize) -> RangeSet {
    RangeSet {
        ranges: (0..total_pages)
            .map(|index| PageRange {
                start: index,
                end: index,
            })
            .collect(),
        explicit: false,
    }
}

/// Parse a range expression against a document of `total_pages` pages.
///
/// Absent or blank input yields [`all_pages`]. Otherwise every token must be
/// `N` or `A-B` with `1 <= A <= B <= total_pages`; the first bad token fails
/// the whole parse.
pub fn parse(raw: Option<&str>, total_pages: usize) -> Result<RangeSet> {
    let raw = match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(all_pages(total_pages)),
    };

    let ranges = raw
        .split(',')
        .map(|token| parse_token(token.trim(), total_pages))
        .collect::<Result<Vec<_>>>()?;

    Ok(RangeSet {
        ranges,
        explicit: true,
    })
}

fn parse_token(token: &str, total_pages: usize) -> Result<PageRange> {
    if token.is_empty() {
        return Err(PagewerkError::range(token, RangeErrorReason::EmptyToken));
    }

    let (start, end) = match token.split_once('-') {
        Some((start, end)) => (parse_page(token, start)?, parse_page(token, end)?),
        None => {
            let page = parse_page(token, token)?;
            (page, page)
        }
    };

    if start > end {
        return Err(PagewerkError::range(token, RangeErrorReason::StartAfterEnd));
    }
    if start < 1 {
        return Err(PagewerkError::range(token, RangeErrorReason::BelowFirstPage));
    }
    if end > total_pages {
        return Err(PagewerkError::range(
            token,
            RangeErrorReason::BeyondLastPage { total: total_pages },
        ));
    }

    Ok(PageRange {
        start: start - 1,
        end: end - 1,
    })
}

fn parse_page(token: &str, bound: &str) -> Result<usize> {
    let bound = bound.trim();
    if bound.is_empty() || !bound.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PagewerkError::range(token, RangeErrorReason::NotANumber));
    }
    // All digits, so only overflow can fail; saturate so it reads as past the last page.
    Ok(bound.parse().unwrap_or(usize::MAX))
}
