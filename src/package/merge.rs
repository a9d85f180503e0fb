use crate::error::Result;
use crate::models::Document;
use crate::source::DocumentSource;
use lopdf::{Dictionary, Object, ObjectId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Page attributes a page may take from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// A document whose file could not be added to the merged output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDownload {
    pub number: String,
    pub url: String,
    pub reason: String,
}

/// Concatenated PDF plus the documents left out of it
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub skipped: Vec<SkippedDownload>,
}

/// Downloads each document's file in list order and concatenates the pages.
///
/// Documents without a link are left out silently. Failed downloads and files that are
/// not valid PDFs are logged and listed in `skipped`; they never fail the merge.
pub async fn merge_pdfs(source: &dyn DocumentSource, documents: &[Document]) -> Result<MergedDocument> {
    let language = source.download_language();
    let mut parts = Vec::new();
    let mut skipped = Vec::new();

    for doc in documents {
        let Some(url) = doc.download_url(language) else {
            continue;
        };
        let skip = |reason: String| {
            tracing::warn!("Skipping document {} ({}): {}", doc.number, url, reason);
            SkippedDownload {
                number: doc.number.clone(),
                url: url.to_string(),
                reason,
            }
        };

        match source.download(url).await {
            Ok(Some(bytes)) => match lopdf::Document::load_mem(&bytes) {
                Ok(pdf) => parts.push(pdf),
                Err(e) => skipped.push(skip(format!("not a readable PDF: {}", e))),
            },
            Ok(None) => skipped.push(skip("download answered with an error status".to_string())),
            Err(e) => skipped.push(skip(e.to_string())),
        }
    }

    let mut merged = concatenate(parts)?;
    let page_count = merged.get_pages().len();
    let mut bytes = Vec::new();
    merged.save_to(&mut bytes)?;

    tracing::info!(
        "Merged {} pages from {} documents, {} skipped",
        page_count,
        documents.len(),
        skipped.len()
    );
    Ok(MergedDocument {
        bytes,
        page_count,
        skipped,
    })
}

/// Joins the page trees of `parts` into one document, keeping part and page order
pub fn concatenate(parts: Vec<lopdf::Document>) -> Result<lopdf::Document> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut part in parts {
        part.renumber_objects_with(max_id);
        max_id = part.max_id + 1;
        for (_, page_id) in part.get_pages() {
            pages.push((page_id, with_inherited(&part, page_id)?));
        }
        objects.extend(part.objects);
    }

    let mut output = lopdf::Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut page_tree: Option<(ObjectId, Dictionary)> = None;

    for (id, object) in objects {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                if catalog.is_none() {
                    catalog = Some((id, object.as_dict()?.clone()));
                }
            }
            "Pages" => {
                let dict = object.as_dict()?.clone();
                page_tree = Some(match page_tree {
                    Some((root_id, mut root)) => {
                        root.extend(&dict);
                        (root_id, root)
                    }
                    None => (id, dict),
                });
            }
            "Page" | "Outlines" | "Outline" => {}
            _ => {
                output.objects.insert(id, object);
            }
        }
    }

    let (Some((catalog_id, mut catalog)), Some((tree_id, mut tree))) = (catalog, page_tree) else {
        return Ok(empty_document());
    };

    for (id, page) in &pages {
        let mut page = page.clone();
        page.set("Parent", tree_id);
        output.objects.insert(*id, Object::Dictionary(page));
    }

    tree.set("Count", pages.len() as u32);
    tree.set(
        "Kids",
        pages.iter().map(|(id, _)| Object::Reference(*id)).collect::<Vec<_>>(),
    );
    tree.remove(b"Parent");
    output.objects.insert(tree_id, Object::Dictionary(tree));

    catalog.set("Pages", tree_id);
    catalog.remove(b"Outlines");
    output.objects.insert(catalog_id, Object::Dictionary(catalog));

    output.trailer.set("Root", catalog_id);
    output.max_id = output.objects.keys().map(|(n, _)| *n).max().unwrap_or(0);
    output.renumber_objects();
    output.compress();
    Ok(output)
}

/// Page dictionary with inherited attributes copied down from its `Parent` chain, so the
/// page keeps them once it hangs under a different tree
fn with_inherited(part: &lopdf::Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = part.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut visited = HashSet::new();
    while let Some(node_id) = parent {
        if !visited.insert(node_id) {
            break;
        }
        let Ok(node) = part.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE {
            if page.has(key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                page.set(key.to_vec(), value.clone());
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(page)
}

/// Valid PDF with an empty page tree
fn empty_document() -> lopdf::Document {
    let mut doc = lopdf::Document::with_version("1.5");
    let tree_id = doc.new_object_id();
    let mut tree = Dictionary::new();
    tree.set("Type", Object::Name(b"Pages".to_vec()));
    tree.set("Kids", Vec::<Object>::new());
    tree.set("Count", 0);
    doc.objects.insert(tree_id, Object::Dictionary(tree));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", tree_id);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);
    doc
}
