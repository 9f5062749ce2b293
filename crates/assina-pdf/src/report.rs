use assina_domain::{DomainResult, EvidenceReport};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use qrcode::{Color, QrCode};

use crate::assembly_error;

// A4 in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 48.0;
const LINE_HEIGHT: f32 = 12.0;
const QR_SIZE: f32 = 72.0;
const ROWS_PER_PAGE: usize = 8;

/// Render the evidence report as its own PDF: one tabular block per
/// signer, a QR code on every page linking to the public verification
/// endpoint.
pub fn render_report(report: &EvidenceReport) -> DomainResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let qr_ops = qr_code_ops(
        &report.verification_url,
        PAGE_WIDTH - MARGIN - QR_SIZE,
        PAGE_HEIGHT - MARGIN - QR_SIZE,
    )?;

    let chunks: Vec<&[assina_domain::EvidenceRow]> = if report.rows.is_empty() {
        vec![&[]]
    } else {
        report.rows.chunks(ROWS_PER_PAGE).collect()
    };
    let total_pages = chunks.len();

    let mut kids: Vec<Object> = Vec::with_capacity(total_pages);
    for (page_index, chunk) in chunks.into_iter().enumerate() {
        let mut operations: Vec<Operation> = Vec::new();

        operations.extend(text(FontRef::Bold, 14.0, MARGIN, PAGE_HEIGHT - MARGIN - 14.0, &format!(
            "Relatorio de evidencias - {}",
            &report.title
        )));
        operations.extend(text(
            FontRef::Regular,
            9.0,
            MARGIN,
            PAGE_HEIGHT - MARGIN - 30.0,
            &format!("Pagina {} de {}", page_index + 1, total_pages),
        ));

        let mut y = PAGE_HEIGHT - MARGIN - QR_SIZE - 24.0;
        for row in chunk {
            let signed_at = row
                .signed_at
                .map(|t| t.format("%d/%m/%Y %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".to_string());
            let lines = [
                format!("Signatario: {}", row.name),
                format!("Documento: {}   E-mail: {}", row.masked_national_id, row.email),
                format!("IP: {}   Localizacao: {}", row.signing_ip, row.geolocation),
                format!("Assinatura: {}   Assinado em: {}", row.signature_id, signed_at),
            ];
            for line in &lines {
                operations.extend(text(FontRef::Regular, 9.0, MARGIN, y, line));
                y -= LINE_HEIGHT;
            }
            y -= LINE_HEIGHT; // gap between signer blocks
        }

        operations.extend(text(
            FontRef::Regular,
            8.0,
            MARGIN,
            MARGIN,
            &format!("Verifique em {}", report.verification_url),
        ));
        operations.extend(qr_ops.iter().cloned());

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content
                .encode()
                .map_err(|e| assembly_error("encoding report content", e))?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "Freg" => regular_font,
                    "Fbold" => bold_font,
                },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as u32,
        "Kids" => kids,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| assembly_error("saving report", e))?;
    Ok(out)
}

#[derive(Clone, Copy)]
enum FontRef {
    Regular,
    Bold,
}

impl FontRef {
    fn name(self) -> &'static str {
        match self {
            FontRef::Regular => "Freg",
            FontRef::Bold => "Fbold",
        }
    }
}

fn text(font: FontRef, size: f32, x: f32, y: f32, value: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.name().into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(value)]),
        Operation::new("ET", vec![]),
    ]
}

/// Draw the QR matrix as filled rectangles anchored at (x, y).
fn qr_code_ops(url: &str, x: f32, y: f32) -> DomainResult<Vec<Operation>> {
    let code = QrCode::new(url.as_bytes()).map_err(|e| assembly_error("building QR code", e))?;
    let width = code.width();
    let module = QR_SIZE / width as f32;

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
    ];
    for (index, color) in code.to_colors().into_iter().enumerate() {
        if color == Color::Dark {
            let col = (index % width) as f32;
            let row = (index / width) as f32;
            operations.push(Operation::new(
                "re",
                vec![
                    (x + col * module).into(),
                    (y + QR_SIZE - (row + 1.0) * module).into(),
                    module.into(),
                    module.into(),
                ],
            ));
        }
    }
    operations.push(Operation::new("f", vec![]));
    operations.push(Operation::new("Q", vec![]));
    Ok(operations)
}

/// Minimal test fixture: a document with `pages` empty A4 pages.
#[cfg(test)]
pub(crate) fn blank_document(pages: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for _ in 0..pages {
        let content = Content {
            operations: vec![],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("empty content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as u32,
        "Kids" => kids,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use assina_domain::EvidenceRow;

    fn report_with_rows(count: usize) -> EvidenceReport {
        EvidenceReport {
            title: "Contrato".to_string(),
            verification_url: "https://verify.example.com/d/doc-1".to_string(),
            rows: (0..count)
                .map(|i| EvidenceRow {
                    name: format!("Signer {i}"),
                    masked_national_id: "123.***.***-01".to_string(),
                    email: format!("signer{i}@example.com"),
                    signing_ip: "203.0.113.7".to_string(),
                    geolocation: "Sao Paulo, BR".to_string(),
                    signature_id: format!("sig-{i}"),
                    signed_at: None,
                })
                .collect(),
        }
    }

    #[test]
    fn renders_a_loadable_pdf_with_signer_details() {
        // Act
        let bytes = render_report(&report_with_rows(2)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        // Assert
        assert_eq!(doc.get_pages().len(), 1);
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Signer 0"));
        assert!(text.contains("123.***.***-01"));
        assert!(text.contains("Verifique em https://verify.example.com/d/doc-1"));
    }

    #[test]
    fn paginates_long_signer_lists() {
        // 20 rows at 8 per page -> 3 pages
        let bytes = render_report(&report_with_rows(20)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn empty_report_still_produces_one_page() {
        let bytes = render_report(&report_with_rows(0)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
