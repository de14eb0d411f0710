// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zip packaging for multi-document outputs.
//
// Entries are written in insertion order. A name that is already taken gets a
// " (n)" suffix before its extension, so every entry survives and nothing is
// silently overwritten.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use pagewerk_core::error::{PagewerkError, Result};
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A named byte buffer destined for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Collects entries for one archive.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ArchiveEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write all entries into a zip archive and return its bytes.
    pub fn build(self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut taken = HashSet::with_capacity(self.entries.len());

        for entry in &self.entries {
            let name = unique_name(&entry.name, &mut taken);
            zip.start_file(name.as_str(), options)
                .map_err(|err| archive_error(&name, err))?;
            zip.write_all(&entry.bytes)
                .map_err(|err| archive_error(&name, err))?;
        }

        let bytes = zip
            .finish()
            .map_err(|err| PagewerkError::ArchiveBuild(format!("cannot finalise archive: {err}")))?
            .into_inner();

        debug!(entries = self.entries.len(), archive_bytes = bytes.len(), "Archive built");
        Ok(bytes)
    }
}

impl Extend<ArchiveEntry> for ArchiveBuilder {
    fn extend<I: IntoIterator<Item = ArchiveEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

fn archive_error(name: &str, err: impl std::fmt::Display) -> PagewerkError {
    PagewerkError::ArchiveBuild(format!("cannot write entry `{name}`: {err}"))
}

/// First free variant of `name`: `name`, then `stem (2).ext`, `stem (3).ext`, ...
fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_owned()) {
        return name.to_owned();
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut n = 2usize;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
