use assina_domain::{format_national_id, DomainError, DomainResult, SignatureBlock};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::assembly_error;

/// Width of the right-margin strip reserved for signature blocks.
const STRIP_WIDTH: f32 = 48.0;
/// Fixed vertical extent of one signer's block. Offsets are derived from
/// the signer index alone, so blocks never overlap and signers can be
/// stamped in separate invocations without inspecting earlier blocks.
const BLOCK_HEIGHT: f32 = 150.0;
const MARGIN_BOTTOM: f32 = 36.0;
/// Space at the strip bottom for the logo mark and verification line,
/// drawn once by the first signer.
const HEADER_HEIGHT: f32 = 72.0;

const FONT_KEY: &str = "Fassina";

/// Burn a vertical (90-degree rotated) signature block into the
/// right-margin strip of the last page.
pub fn stamp_block(pdf: &[u8], block: &SignatureBlock) -> DomainResult<Vec<u8>> {
    let mut doc = Document::load_mem(pdf).map_err(|e| assembly_error("loading pdf", e))?;

    let pages = doc.get_pages();
    let (_, &page_id) = pages
        .iter()
        .next_back()
        .ok_or_else(|| DomainError::Assembly("document has no pages".to_string()))?;

    let page_width = page_width(&doc, page_id);

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    ensure_page_font(&mut doc, page_id, font_id)?;

    let content = block_content(block, page_width)?;
    append_page_content(&mut doc, page_id, content)?;

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| assembly_error("saving stamped pdf", e))?;
    Ok(out)
}

fn block_content(block: &SignatureBlock, page_width: f32) -> DomainResult<Content> {
    let identity = match block.national_id.as_deref() {
        Some(id) => format!("{} - {}", block.name, format_national_id(id)),
        None => block.name.clone(),
    };
    let signed_line = format!(
        "Assinado em {}",
        block.signed_at.format("%d/%m/%Y %H:%M UTC")
    );

    let base_y = MARGIN_BOTTOM + HEADER_HEIGHT + block.signer_index as f32 * BLOCK_HEIGHT;
    let line1_x = page_width - 30.0;
    let line2_x = page_width - 18.0;

    let mut operations = vec![Operation::new("q", vec![])];
    operations.extend(vertical_text(line1_x, base_y, identity_font_size(&identity), &identity));
    operations.extend(vertical_text(line2_x, base_y, 7.0, &signed_line));

    if block.signer_index == 0 {
        // Logo mark at the foot of the strip
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
            Operation::new(
                "re",
                vec![
                    (page_width - STRIP_WIDTH + 8.0).into(),
                    MARGIN_BOTTOM.into(),
                    12.0.into(),
                    12.0.into(),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
        operations.extend(vertical_text(
            page_width - 24.0,
            MARGIN_BOTTOM + 18.0,
            6.0,
            &format!("Verifique em {}", block.verification_url),
        ));
    }

    operations.push(Operation::new("Q", vec![]));
    Ok(Content { operations })
}

/// Font size shrinks in discrete steps as the identity line lengthens so
/// it stays inside the strip.
fn identity_font_size(line: &str) -> f32 {
    match line.chars().count() {
        0..=44 => 8.0,
        45..=59 => 7.0,
        60..=79 => 6.0,
        _ => 5.0,
    }
}

/// Text rotated 90 degrees counter-clockwise, running up the page.
fn vertical_text(x: f32, y: f32, size: f32, value: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![FONT_KEY.into(), size.into()]),
        Operation::new(
            "Tm",
            vec![
                0.into(),
                1.into(),
                (-1).into(),
                0.into(),
                x.into(),
                y.into(),
            ],
        ),
        Operation::new("Tj", vec![Object::string_literal(value)]),
        Operation::new("ET", vec![]),
    ]
}

/// Effective page width from the page's (possibly inherited) MediaBox;
/// A4 when absent.
fn page_width(doc: &Document, page_id: ObjectId) -> f32 {
    let mut current = Some(page_id);
    for _ in 0..8 {
        let Some(id) = current else { break };
        let Ok(dict) = doc.get_dictionary(id) else { break };
        if let Ok(media_box) = dict.get(b"MediaBox") {
            if let Some(width) = media_box_width(doc, media_box) {
                return width;
            }
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|p| p.as_reference().ok());
    }
    595.0
}

fn media_box_width(doc: &Document, media_box: &Object) -> Option<f32> {
    let resolved = match media_box {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values = resolved.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    Some(number(&values[2])? - number(&values[0])?)
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Register the stamping font on the page's resources, following one level
/// of indirection for Resources and Font entries.
fn ensure_page_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> DomainResult<()> {
    let resources = doc
        .get_dictionary(page_id)
        .map_err(|e| assembly_error("page dictionary", e))?
        .get(b"Resources")
        .ok()
        .cloned();

    match resources {
        Some(Object::Reference(resources_id)) => {
            let resources = doc
                .get_object_mut(resources_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| assembly_error("resources dictionary", e))?;
            set_font_entry(resources, font_id);
        }
        Some(Object::Dictionary(mut dict)) => {
            set_font_entry(&mut dict, font_id);
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| assembly_error("page dictionary", e))?;
            page.set("Resources", dict);
        }
        _ => {
            // Inherited or missing resources: give the page its own
            let mut dict = Dictionary::new();
            set_font_entry(&mut dict, font_id);
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| assembly_error("page dictionary", e))?;
            page.set("Resources", dict);
        }
    }
    Ok(())
}

fn set_font_entry(resources: &mut Dictionary, font_id: ObjectId) {
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(existing)) => existing.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(FONT_KEY, font_id);
    resources.set("Font", fonts);
}

/// Append a new content stream after the page's existing ones.
fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Content,
) -> DomainResult<()> {
    let encoded = content
        .encode()
        .map_err(|e| assembly_error("encoding stamp content", e))?;
    let stream_id = doc.add_object(lopdf::Stream::new(dictionary! {}, encoded));

    let existing = doc
        .get_dictionary(page_id)
        .map_err(|e| assembly_error("page dictionary", e))?
        .get(b"Contents")
        .ok()
        .cloned();

    let mut contents: Vec<Object> = match existing {
        Some(Object::Array(items)) => items,
        Some(reference @ Object::Reference(_)) => vec![reference],
        Some(other) => vec![other],
        None => vec![],
    };
    contents.push(Object::Reference(stream_id));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| assembly_error("page dictionary", e))?;
    page.set("Contents", contents);
    Ok(())
}
