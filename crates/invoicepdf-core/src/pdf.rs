//! PDF encoding
//!
//! Converts an [`InvoiceDocument`] into PDF bytes with lopdf. Layout
//! coordinates (millimetres from the top-left) are flipped into PDF user
//! space (points from the bottom-left) here and nowhere else.
//!
//! Output carries no timestamps or random identifiers, so encoding the same
//! document twice yields identical bytes.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::InvoiceError;
use crate::layout::{Element, FontStyle, ImageBox, PageGeometry, TextCell, MM_TO_PT};
use crate::logo::LogoImage;
use crate::render::InvoiceDocument;
use crate::text::encode_win_ansi;

const PRODUCER: &str = "invoicepdf";

/// Baseline offset below a cell's vertical centre, as a fraction of font size
const BASELINE_SHIFT: f32 = 0.3;

impl InvoiceDocument {
    /// Encode the document as PDF bytes
    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>, InvoiceError> {
        encode(self)
    }
}

/// Encode an invoice as a PDF file
pub fn encode(invoice: &InvoiceDocument) -> Result<Vec<u8>, InvoiceError> {
    let fail = |reason: String| InvoiceError::PdfEncoding {
        path: invoice.source.clone(),
        reason,
    };

    let geometry = invoice.geometry;
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary("Times-Roman"));
    let bold_id = doc.add_object(font_dictionary("Times-Bold"));
    let image_id = add_logo(&mut doc, invoice.logo()).map_err(fail)?;

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => Object::Reference(regular_id),
            "F2" => Object::Reference(bold_id),
        },
        "XObject" => dictionary! {
            "Im1" => Object::Reference(image_id),
        },
    });

    let mut page_ids = Vec::with_capacity(invoice.page_count());
    for page in invoice.pages() {
        let mut operations = vec![
            Operation::new("w", vec![Object::Real(geometry.line_width * MM_TO_PT)]),
            Operation::new("G", vec![Object::Integer(0)]),
        ];
        for element in &page.elements {
            match element {
                Element::Text(cell) => text_operations(&mut operations, cell, &geometry),
                Element::Image(image) => image_operations(&mut operations, image, &geometry),
            }
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| fail(format!("content stream: {}", e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(geometry.width * MM_TO_PT),
                Object::Real(geometry.height * MM_TO_PT),
            ],
            "Resources" => Object::Reference(resources_id),
            "Contents" => Object::Reference(content_id),
        });
        page_ids.push(page_id);
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => page_ids.len() as i64,
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => literal(&format!("Invoice nr. {}", invoice.invoice_number)),
        "Producer" => literal(PRODUCER),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| fail(format!("save failed: {}", e)))?;
    Ok(buffer)
}

fn font_dictionary(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn literal(text: &str) -> Object {
    Object::String(encode_win_ansi(text), StringFormat::Literal)
}

/// Embed the logo as an RGB image XObject, with a soft mask for alpha
fn add_logo(doc: &mut Document, logo: &LogoImage) -> Result<ObjectId, String> {
    let mut image = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => logo.width_px as i64,
        "Height" => logo.height_px as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };

    if let Some(alpha) = &logo.alpha {
        let mask = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => logo.width_px as i64,
            "Height" => logo.height_px as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let mask_id =
            doc.add_object(Stream::new(mask, deflate(alpha)?).with_compression(false));
        image.set("SMask", Object::Reference(mask_id));
    }

    Ok(doc.add_object(Stream::new(image, deflate(&logo.rgb)?).with_compression(false)))
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| format!("image compression: {}", e))?;
    encoder
        .finish()
        .map_err(|e| format!("image compression: {}", e))
}

fn pt(mm: f32) -> Object {
    Object::Real(mm * MM_TO_PT)
}

fn text_operations(ops: &mut Vec<Operation>, cell: &TextCell, geometry: &PageGeometry) {
    let top = geometry.height - cell.y;

    if cell.style.border {
        ops.push(Operation::new(
            "re",
            vec![pt(cell.x), pt(top), pt(cell.width), pt(-cell.height)],
        ));
        ops.push(Operation::new("S", vec![]));
    }

    if cell.text.is_empty() {
        return;
    }

    let font = match cell.style.font.style {
        FontStyle::Regular => "F1",
        FontStyle::Bold => "F2",
    };
    let baseline =
        cell.y + 0.5 * cell.height + BASELINE_SHIFT * cell.style.font.size_mm();
    let (r, g, b) = cell.style.color.unit();

    ops.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "rg",
            vec![Object::Real(r), Object::Real(g), Object::Real(b)],
        ),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(font.as_bytes().to_vec()),
                Object::Real(cell.style.font.size),
            ],
        ),
        Operation::new(
            "Td",
            vec![
                pt(cell.x + geometry.cell_padding),
                pt(geometry.height - baseline),
            ],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&cell.text),
                StringFormat::Literal,
            )],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]);
}

fn image_operations(ops: &mut Vec<Operation>, image: &ImageBox, geometry: &PageGeometry) {
    ops.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                pt(image.width),
                Object::Integer(0),
                Object::Integer(0),
                pt(image.height),
                pt(image.x),
                pt(geometry.height - (image.y + image.height)),
            ],
        ),
        Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
        Operation::new("Q", vec![]),
    ]);
}
