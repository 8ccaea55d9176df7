use std::path::Path;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::SplitError;

/// Page attributes a page may inherit from its `Pages` ancestors.
const INHERITED_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Bound on `Parent` hops, so a malformed cyclic page tree cannot loop forever.
const MAX_TREE_DEPTH: usize = 64;

/// A loaded source document that pages are read from and split out of.
pub struct SourcePdf {
    doc: Document,
    pages: Vec<(u32, ObjectId)>,
}

impl SourcePdf {
    pub fn open(path: &Path) -> Result<Self, SplitError> {
        let bytes = std::fs::read(path).map_err(|source| SplitError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SplitError> {
        let doc = Document::load_mem(bytes).map_err(SplitError::Parse)?;
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        if pages.is_empty() {
            return Err(SplitError::NoPages);
        }
        debug!(pages = pages.len(), "loaded source document");
        Ok(SourcePdf { doc, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 1-based page numbers in document order.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().map(|(page, _)| *page)
    }

    pub fn page_text(&self, page: u32) -> Result<String, SplitError> {
        self.doc
            .extract_text(&[page])
            .map_err(|source| SplitError::Text { page, source })
    }

    /// Serialized standalone document holding only `page`.
    ///
    /// Only the objects reachable from that page are copied, so the cost
    /// follows the page's size rather than the whole document's.
    pub fn split_page(&self, page: u32) -> Result<Vec<u8>, SplitError> {
        let split_err = |source| SplitError::Split { page, source };
        let page_id = self
            .pages
            .iter()
            .find(|(n, _)| *n == page)
            .map(|(_, id)| *id)
            .ok_or(lopdf::Error::PageNumberNotFound(page))
            .map_err(split_err)?;

        let mut page_dict = self
            .doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(split_err)?
            .clone();
        for key in INHERITED_KEYS {
            if !page_dict.has(key) {
                if let Some(value) = self.inherited(page_id, key) {
                    page_dict.set(key.to_vec(), value.clone());
                }
            }
        }
        page_dict.remove(b"Parent");

        let mut single = Document::with_version(self.doc.version.clone());
        let mut pending = Vec::new();
        collect_references(&Object::Dictionary(page_dict.clone()), &mut pending);
        single.objects.insert(page_id, Object::Dictionary(page_dict));
        while let Some(id) = pending.pop() {
            if single.objects.contains_key(&id) {
                continue;
            }
            // Dangling references are left dangling, as in the source.
            let Ok(object) = self.doc.get_object(id) else {
                continue;
            };
            collect_references(object, &mut pending);
            single.objects.insert(id, object.clone());
        }
        single.max_id = single.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);

        let pages_id = single.new_object_id();
        if let Some(Object::Dictionary(dict)) = single.objects.get_mut(&page_id) {
            dict.set("Parent", pages_id);
        }
        single.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = single.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        single.trailer.set("Root", catalog_id);
        single.renumber_objects();
        single.compress();

        let mut out = Vec::new();
        single
            .save_to(&mut out)
            .map_err(|source| split_err(lopdf::Error::IO(source)))?;
        Ok(out)
    }

    /// `key` from the page or its nearest page-tree ancestor.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = page_id;
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.doc.get_object(current).and_then(|o| o.as_dict()).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get(b"Parent").and_then(|o| o.as_reference()).ok()?;
        }
        None
    }
}

fn is_page_node(dict: &Dictionary) -> bool {
    dict.get(b"Type")
        .and_then(|o| o.as_name())
        .map(|t| t == b"Page" || t == b"Pages")
        .unwrap_or(false)
}

/// Push every object id referenced from `object`. A page-tree node's `Parent`
/// is not followed, which keeps sibling pages out of the copy.
fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        Object::Dictionary(dict) => collect_dict_references(dict, out),
        Object::Stream(stream) => collect_dict_references(&stream.dict, out),
        _ => {}
    }
}

fn collect_dict_references(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    let skip_parent = is_page_node(dict);
    for (key, value) in dict.iter() {
        if skip_parent && key.as_slice() == b"Parent" {
            continue;
        }
        collect_references(value, out);
    }
}
