// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output file names.

use crate::range::PageRange;

/// Base name used when neither the request nor the upload provides one.
pub const DEFAULT_BASE: &str = "document";

/// Base name for merge outputs when the request does not name one.
pub const MERGED_BASE: &str = "merged";

/// Reduce a client-supplied name to a safe file-name base.
///
/// Drops any directory part and a trailing `.pdf`, and replaces characters
/// outside `[A-Za-z0-9 ._-]` with `_`. Returns `None` if nothing usable is left.
pub fn sanitize(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    let without_ext = strip_pdf_extension(last);

    let cleaned: String = without_ext
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_owned())
    }
}

fn strip_pdf_extension(name: &str) -> &str {
    match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => {
            &name[..cut]
        }
        _ => name,
    }
}

/// Pick the base name: the requested name, else the uploaded file's name,
/// else `fallback`.
pub fn base_name(requested: Option<&str>, upload_name: Option<&str>, fallback: &str) -> String {
    requested
        .and_then(sanitize)
        .or_else(|| upload_name.and_then(sanitize))
        .unwrap_or_else(|| fallback.to_owned())
}

/// `{base}-pages-{start}-{end}.pdf`, one-based.
pub fn split_entry_name(base: &str, range: &PageRange) -> String {
    let (start, end) = range.one_based();
    format!("{base}-pages-{start}-{end}.pdf")
}

pub fn archive_name(base: &str) -> String {
    format!("{base}.zip")
}

pub fn merged_name(base: &str) -> String {
    format!("{base}.pdf")
}

pub fn recombined_name(base: &str) -> String {
    format!("{base}-recombined.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range;

    #[test]
    fn sanitize_strips_paths_and_extension() {
        assert_eq!(sanitize("report.pdf").as_deref(), Some("report"));
        assert_eq!(sanitize("C:\\scans\\Report.PDF").as_deref(), Some("Report"));
        assert_eq!(sanitize("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize("q3 results v2").as_deref(), Some("q3 results v2"));
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("a\"b;c").as_deref(), Some("a_b_c"));
        assert_eq!(sanitize("résumé").as_deref(), Some("r_sum_"));
    }

    #[test]
    fn sanitize_rejects_empty_results() {
        assert_eq!(sanitize(""), None);
        assert_eq!(sanitize("   "), None);
        assert_eq!(sanitize(".pdf"), None);
        assert_eq!(sanitize("dir/"), None);
    }

    #[test]
    fn base_name_prefers_request_then_upload() {
        assert_eq!(base_name(Some("custom"), Some("upload.pdf"), DEFAULT_BASE), "custom");
        assert_eq!(base_name(None, Some("upload.pdf"), DEFAULT_BASE), "upload");
        assert_eq!(base_name(Some("///"), None, MERGED_BASE), "merged");
        assert_eq!(base_name(None, None, DEFAULT_BASE), "document");
    }

    #[test]
    fn split_names_use_one_based_spans() {
        let ranges = range::parse(Some("1-3,7-7"), 10).unwrap();
        let names: Vec<String> = ranges
            .iter()
            .map(|range| split_entry_name("doc", range))
            .collect();
        assert_eq!(names, vec!["doc-pages-1-3.pdf", "doc-pages-7-7.pdf"]);
    }

    #[test]
    fn composite_names() {
        assert_eq!(archive_name("doc"), "doc.zip");
        assert_eq!(merged_name("merged"), "merged.pdf");
        assert_eq!(recombined_name("doc"), "doc-recombined.pdf");
    }
}
