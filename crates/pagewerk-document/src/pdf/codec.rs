// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF codec: load uploaded bytes, copy pages between documents, and serialise
// new documents using the `lopdf` crate.
//
// A `Document` is the immutable, request-owned upload: raw bytes plus the page
// count derived when it was decoded. Reading pages goes through a `SourcePdf`
// parsed from those bytes, and writing goes through a `DocumentBuilder`. Every
// copied page carries its own deep copy of the objects it references, so each
// output is self-contained.

use std::collections::HashMap;
use std::sync::Arc;

use lopdf::{Dictionary, Object, ObjectId};
use pagewerk_core::error::{PagewerkError, Result};
use tracing::{debug, instrument, warn};

use crate::integrity;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed page trees whose /Parent chain loops.
const MAX_TREE_DEPTH: usize = 64;

/// PDF version written into new documents.
const OUTPUT_VERSION: &str = "1.7";

/// An uploaded PDF: immutable bytes plus the page count derived on load.
///
/// Cheap to share across tasks (`Arc<Document>`); never mutated.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Arc<[u8]>,
    page_count: usize,
    fingerprint: String,
}

impl Document {
    /// Decode `data` as a PDF.
    ///
    /// Fails with [`PagewerkError::Decode`] if the bytes are not a readable
    /// PDF or the document has no pages.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn load(data: Vec<u8>) -> Result<Self> {
        let parsed = lopdf::Document::load_mem(&data)
            .map_err(|err| PagewerkError::Decode(err.to_string()))?;

        let page_count = parsed.get_pages().len();
        if page_count == 0 {
            return Err(PagewerkError::Decode("document has no pages".into()));
        }

        let document = Self::assembled(data, page_count);
        debug!(page_count, fingerprint = %document.fingerprint, "PDF decoded");
        Ok(document)
    }

    /// Wrap bytes this crate just produced, whose page count is already known.
    pub(crate) fn assembled(data: Vec<u8>, page_count: usize) -> Self {
        let fingerprint = integrity::short_fingerprint(&data);
        Self {
            bytes: data.into(),
            page_count,
            fingerprint,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copy the bytes out, e.g. to hand them to the response transport.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Short SHA-256 prefix identifying the content in logs.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// A parsed, read-only view of a [`Document`] used as a page source.
pub struct SourcePdf {
    inner: lopdf::Document,
    /// Page object ids in page order; index 0 is the first page.
    page_ids: Vec<ObjectId>,
}

impl SourcePdf {
    /// Parse `document` for page copying.
    pub fn open(document: &Document) -> Result<Self> {
        let inner = lopdf::Document::load_mem(document.bytes())
            .map_err(|err| PagewerkError::Decode(err.to_string()))?;
        // get_pages() is keyed by 1-based page number, so values are in page order.
        let page_ids: Vec<ObjectId> = inner.get_pages().into_values().collect();
        Ok(Self { inner, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            PagewerkError::Pdf(format!(
                "page index {} out of range (document has {} pages)",
                index,
                self.page_ids.len()
            ))
        })
    }

    /// Look up an inheritable attribute on `page`, walking up the page tree.
    fn inherited_attribute(&self, page: &Dictionary, key: &[u8]) -> Option<&Object> {
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        for _ in 0..MAX_TREE_DEPTH {
            let node = self.inner.get_dictionary(parent?).ok()?;
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }
}

/// A page whose objects have been copied into a [`DocumentBuilder`] but which
/// is not yet part of its page tree. Only meaningful to the builder that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopiedPage(ObjectId);

/// Assembles a new PDF from pages copied out of one or more sources.
pub struct DocumentBuilder {
    document: lopdf::Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    /// An empty document with a catalog and an (empty) page tree root.
    pub fn new() -> Self {
        let mut document = lopdf::Document::with_version(OUTPUT_VERSION);
        let pages_id = document.new_object_id();

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = document.add_object(catalog);
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Deep-copy the pages at zero-based `indices` out of `source`.
    ///
    /// Objects shared between the copied pages (fonts, images) are copied once
    /// per call. The returned pages must be passed to [`Self::append_pages`]
    /// to appear in the output.
    pub fn copy_pages(&mut self, source: &SourcePdf, indices: &[usize]) -> Result<Vec<CopiedPage>> {
        let page_ids = indices
            .iter()
            .map(|&index| source.page_id(index))
            .collect::<Result<Vec<_>>>()?;

        let mut copier = ObjectCopier::new(source, &mut self.document);
        // Every requested page gets its target id up front, so links between
        // copied pages land on the page-tree copy whichever page is reached first.
        let targets = copier.reserve_pages(&page_ids);

        for (&page_id, &target_id) in page_ids.iter().zip(&targets) {
            copier.copy_page(page_id, target_id, self.pages_id)?;
        }

        Ok(targets.into_iter().map(CopiedPage).collect())
    }

    /// Append previously copied pages to the end of the page tree, in order.
    pub fn append_pages(&mut self, pages: impl IntoIterator<Item = CopiedPage>) {
        self.kids.extend(pages.into_iter().map(|CopiedPage(id)| id));
    }

    /// Copy and append `indices` from `source` in one step.
    pub fn append_from(&mut self, source: &SourcePdf, indices: &[usize]) -> Result<()> {
        let pages = self.copy_pages(source, indices)?;
        self.append_pages(pages);
        Ok(())
    }

    /// Pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Write the page tree root and serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.kids.is_empty() {
            return Err(PagewerkError::Pdf("refusing to write a document with no pages".into()));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.kids.len() as i64)),
            (
                "Kids",
                Object::Array(self.kids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| PagewerkError::Pdf(format!("failed to serialise PDF: {}", err)))?;

        debug!(pages = self.kids.len(), output_bytes = output.len(), "PDF assembled");
        Ok(output)
    }
}

/// Copies objects from one `lopdf` document into another, remapping ids.
///
/// Every source object is copied at most once; repeated and cyclic references
/// resolve to the same target id. References to pages outside the copy, and
/// to page-tree nodes, become `Null`.
struct ObjectCopier<'a> {
    source: &'a SourcePdf,
    target: &'a mut lopdf::Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a SourcePdf, target: &'a mut lopdf::Document) -> Self {
        Self {
            source,
            target,
            copied: HashMap::new(),
        }
    }

    /// Allocate one target id per requested page, in order.
    ///
    /// References resolve to the first copy of a page requested more than once.
    fn reserve_pages(&mut self, page_ids: &[ObjectId]) -> Vec<ObjectId> {
        page_ids
            .iter()
            .map(|&page_id| {
                let target_id = self.target.new_object_id();
                self.copied.entry(page_id).or_insert(target_id);
                target_id
            })
            .collect()
    }

    /// Copy one page object into the reserved `target_id`, folding inherited
    /// attributes into it and re-parenting it under `pages_id`.
    fn copy_page(&mut self, page_id: ObjectId, target_id: ObjectId, pages_id: ObjectId) -> Result<()> {
        let source = self.source;
        let page = source.inner.get_dictionary(page_id).map_err(|err| {
            PagewerkError::Pdf(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let mut effective = page.clone();
        for key in INHERITABLE_KEYS {
            if !effective.has(key) {
                if let Some(value) = source.inherited_attribute(page, key) {
                    effective.set(key, value.clone());
                }
            }
        }

        let mut copied = self.copy_dictionary(&effective);
        copied.set("Parent", Object::Reference(pages_id));
        self.target.objects.insert(target_id, Object::Dictionary(copied));
        Ok(())
    }

    fn copy_reference(&mut self, id: ObjectId) -> Option<ObjectId> {
        if let Some(&existing) = self.copied.get(&id) {
            return Some(existing);
        }

        let source = self.source;
        let object = match source.inner.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                return None;
            }
        };
        // Pages not in this copy, and page-tree nodes, would drag in pages
        // that are not part of the output's page tree.
        if let Object::Dictionary(dict) = object {
            if is_page(dict) || is_page_tree_node(dict) {
                return None;
            }
        }

        let new_id = self.target.new_object_id();
        self.copied.insert(id, new_id);
        let copied = self.copy_object(object);
        self.target.objects.insert(new_id, copied);
        Some(new_id)
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_object(item)).collect())
            }
            Object::Reference(id) => self
                .copy_reference(*id)
                .map_or(Object::Null, Object::Reference),
            Object::Stream(stream) => {
                let mut copied = stream.clone();
                copied.dict = self.copy_dictionary(&stream.dict);
                Object::Stream(copied)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let skip_parent = is_page(dict) || is_page_tree_node(dict);
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            // Page parents are re-linked by the builder.
            if skip_parent && key.as_slice() == b"Parent" {
                continue;
            }
            copied.set(key.clone(), self.copy_object(value));
        }
        copied
    }
}

fn dictionary_type(dict: &Dictionary) -> Option<&[u8]> {
    dict.get(b"Type").and_then(Object::as_name).ok()
}

fn is_page(dict: &Dictionary) -> bool {
    dictionary_type(dict) == Some(b"Page".as_slice())
}

fn is_page_tree_node(dict: &Dictionary) -> bool {
    dictionary_type(dict) == Some(b"Pages".as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{page_labels, sample_pdf};

    #[test]
    fn load_reports_page_count() {
        let document = Document::load(sample_pdf(4)).expect("load");
        assert_eq!(document.page_count(), 4);
        assert_eq!(document.fingerprint().len(), 12);
    }

    #[test]
    fn load_rejects_garbage() {
        let err = Document::load(b"definitely not a pdf".to_vec()).unwrap_err();
        assert!(matches!(err, PagewerkError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn load_rejects_empty_input() {
        let err = Document::load(Vec::new()).unwrap_err();
        assert!(matches!(err, PagewerkError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn builder_copies_selected_pages_in_requested_order() {
        let document = Document::load(sample_pdf(5)).expect("load");
        let source = SourcePdf::open(&document).expect("open");

        let mut builder = DocumentBuilder::new();
        builder.append_from(&source, &[4, 0, 2]).expect("copy");
        assert_eq!(builder.page_count(), 3);

        let output = builder.finish().expect("finish");
        assert_eq!(page_labels(&output), vec!["Page 5", "Page 1", "Page 3"]);
    }

    #[test]
    fn copied_pages_keep_inherited_resources() {
        // The fixture declares its font on the /Pages root, not on each page.
        let document = Document::load(sample_pdf(2)).expect("load");
        let source = SourcePdf::open(&document).expect("open");

        let mut builder = DocumentBuilder::new();
        builder.append_from(&source, &[1]).expect("copy");
        let output = builder.finish().expect("finish");

        let parsed = lopdf::Document::load_mem(&output).expect("reload");
        let (_, page_id) = parsed.get_pages().into_iter().next().expect("one page");
        let page = parsed.get_dictionary(page_id).expect("page dict");
        assert!(page.has(b"Resources"));
        assert!(page.has(b"MediaBox"));
    }

    #[test]
    fn copy_pages_without_append_leaves_tree_unchanged() {
        let document = Document::load(sample_pdf(3)).expect("load");
        let source = SourcePdf::open(&document).expect("open");

        let mut builder = DocumentBuilder::new();
        let pages = builder.copy_pages(&source, &[0, 1]).expect("copy");
        assert_eq!(pages.len(), 2);
        assert_eq!(builder.page_count(), 0);

        builder.append_pages(pages);
        assert_eq!(builder.page_count(), 2);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let document = Document::load(sample_pdf(2)).expect("load");
        let source = SourcePdf::open(&document).expect("open");

        let mut builder = DocumentBuilder::new();
        let err = builder.copy_pages(&source, &[2]).unwrap_err();
        assert!(matches!(err, PagewerkError::Pdf(_)));
    }

    /// `pages`-page fixture whose first page links to its last page.
    fn with_link_to_last_page(pages: usize) -> Vec<u8> {
        let mut doc = lopdf::Document::load_mem(&sample_pdf(pages)).expect("load fixture");
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let (first, last) = (page_ids[0], page_ids[pages - 1]);

        let link = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Annot".to_vec())),
            ("Subtype", Object::Name(b"Link".to_vec())),
            (
                "Rect",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(100),
                    Object::Integer(20),
                ]),
            ),
            (
                "Dest",
                Object::Array(vec![Object::Reference(last), Object::Name(b"Fit".to_vec())]),
            ),
        ]));
        doc.get_dictionary_mut(first)
            .expect("first page")
            .set("Annots", Object::Array(vec![Object::Reference(link)]));

        let mut output = Vec::new();
        doc.save_to(&mut output).expect("save fixture");
        output
    }

    /// Page-tree kids, the number of /Page objects anywhere in the file, and
    /// the first page's link destination.
    fn link_layout(pdf: &[u8]) -> (Vec<ObjectId>, usize, Object) {
        let parsed = lopdf::Document::load_mem(pdf).expect("reload");
        let kids: Vec<ObjectId> = parsed.get_pages().into_values().collect();
        let page_objects = parsed
            .objects
            .values()
            .filter(|object| matches!(object, Object::Dictionary(dict) if is_page(dict)))
            .count();

        let first = parsed.get_dictionary(kids[0]).expect("first page");
        let annots = first.get(b"Annots").and_then(Object::as_array).expect("annots");
        let link_id = annots[0].as_reference().expect("link reference");
        let link = parsed.get_dictionary(link_id).expect("link");
        let dest = link.get(b"Dest").and_then(Object::as_array).expect("dest");
        (kids, page_objects, dest[0].clone())
    }

    #[test]
    fn links_between_copied_pages_target_the_page_tree_copy() {
        let document = Document::load(with_link_to_last_page(2)).expect("load");
        let source = SourcePdf::open(&document).expect("open");

        let mut builder = DocumentBuilder::new();
        builder.append_from(&source, &[0, 1]).expect("copy");
        let output = builder.finish().expect("finish");

        let (kids, page_objects, target) = link_layout(&output);
        assert_eq!(page_objects, 2);
        assert_eq!(target.as_reference().ok(), Some(kids[1]));
    }

    #[test]
    fn links_to_pages_left_behind_are_nulled() {
        let document = Document::load(with_link_to_last_page(3)).expect("load");
        let source = SourcePdf::open(&document).expect("open");

        let mut builder = DocumentBuilder::new();
        builder.append_from(&source, &[0]).expect("copy");
        let output = builder.finish().expect("finish");

        let (kids, page_objects, target) = link_layout(&output);
        assert_eq!(kids.len(), 1);
        assert_eq!(page_objects, 1);
        assert!(matches!(target, Object::Null), "got {target:?}");
    }

    #[test]
    fn empty_builder_refuses_to_finish() {
        assert!(DocumentBuilder::new().finish().is_err());
    }
}
