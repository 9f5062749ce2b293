use std::collections::BTreeMap;

use assina_domain::{DomainError, DomainResult};
use lopdf::{Document, Object, ObjectId};

use crate::assembly_error;

/// Concatenate the pages of `documents` in order into one PDF.
///
/// The page objects of each input are carried over untouched and re-parented
/// under a single `Pages` node; nothing inside a page's content is edited,
/// which keeps provider-authored evidence pages byte-equivalent.
pub fn merge_documents(documents: Vec<Document>) -> DomainResult<Document> {
    if documents.is_empty() {
        return Err(DomainError::Assembly("nothing to merge".to_string()));
    }

    let mut max_id = 1;
    // Page object ids in concatenation order; the map holds their objects.
    let mut page_order: Vec<ObjectId> = Vec::new();
    let mut page_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            let object = doc
                .get_object(object_id)
                .map_err(|e| assembly_error("page object missing", e))?
                .to_owned();
            page_order.push(object_id);
            page_objects.insert(object_id, object);
        }
        all_objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;
    let mut pages: Option<(ObjectId, lopdf::Dictionary)> = None;

    for (object_id, object) in all_objects {
        match dict_type(&object) {
            Some(b"Catalog") => {
                // First catalog wins; later ones are redundant
                let id = catalog.as_ref().map(|(id, _)| *id).unwrap_or(object_id);
                catalog = Some((id, object));
            }
            Some(b"Pages") => {
                // Merge Pages dictionaries so inherited attributes survive
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref previous)) = pages {
                        dictionary.extend(previous);
                    }
                    let id = pages.as_ref().map(|(id, _)| *id).unwrap_or(object_id);
                    pages = Some((id, dictionary));
                }
            }
            // Pages are re-inserted below, outline trees are dropped
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, mut pages_dict) =
        pages.ok_or_else(|| DomainError::Assembly("no Pages root found".to_string()))?;
    let (catalog_id, catalog_object) =
        catalog.ok_or_else(|| DomainError::Assembly("no Catalog found".to_string()))?;

    for object_id in &page_order {
        if let Some(object) = page_objects.get(object_id) {
            if let Ok(dictionary) = object.as_dict() {
                let mut dictionary = dictionary.clone();
                dictionary.set("Parent", pages_id);
                merged
                    .objects
                    .insert(*object_id, Object::Dictionary(dictionary));
            }
        }
    }

    pages_dict.set("Count", page_order.len() as u32);
    pages_dict.set(
        "Kids",
        page_order
            .iter()
            .map(|id| Object::Reference(*id))
            .collect::<Vec<Object>>(),
    );
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog_dict = catalog_object
        .as_dict()
        .map_err(|e| assembly_error("catalog is not a dictionary", e))?
        .clone();
    catalog_dict.set("Pages", pages_id);
    catalog_dict.remove(b"Outlines");
    merged
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));
    merged.trailer.set("Root", catalog_id);

    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}

fn dict_type(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()
        .and_then(|d| d.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
}
