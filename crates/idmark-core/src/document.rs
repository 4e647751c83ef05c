//! Multi-image PDF assembly.
//!
//! Watermarked images are laid out with [`layout_pages`] and written as a
//! PDF where each image is an embedded JPEG XObject drawn once.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, Stream};
use thiserror::Error;
use tracing::debug;

use crate::decode::{DecodeError, DecodedImage, ImageSource};
use crate::encode::{encode_jpeg, EncodeError, DEFAULT_JPEG_QUALITY};
use crate::layout::{layout_pages, mm_to_pt, page_count, PageGeometry, Placement};

/// Name used when the caller passes an empty one.
pub const DEFAULT_DOCUMENT_NAME: &str = "身分證_已加浮水印.pdf";

/// Errors from document assembly.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to encode page image: {0}")]
    Encode(#[from] EncodeError),

    #[error("Failed to write PDF: {0}")]
    Pdf(String),
}

impl From<lopdf::Error> for AssembleError {
    fn from(e: lopdf::Error) -> Self {
        AssembleError::Pdf(e.to_string())
    }
}

/// A finished PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub placements: Vec<Placement>,
}

impl Document {
    pub fn mime_type(&self) -> &'static str {
        "application/pdf"
    }
}

/// Assemble the present images onto A4 pages.
///
/// Absent slots are skipped. With nothing left this is a no-op and returns
/// `Ok(None)`. Images are awaited one after another in input order.
pub async fn assemble<S: ImageSource>(
    images: &[Option<S>],
    file_name: &str,
) -> Result<Option<Document>, AssembleError> {
    assemble_with(&PageGeometry::a4(), images, file_name).await
}

/// [`assemble`] with explicit page geometry.
pub async fn assemble_with<S: ImageSource>(
    geometry: &PageGeometry,
    images: &[Option<S>],
    file_name: &str,
) -> Result<Option<Document>, AssembleError> {
    let mut decoded = Vec::new();
    for source in images.iter().flatten() {
        decoded.push(source.load().await?);
    }

    if decoded.is_empty() {
        debug!("no images to assemble");
        return Ok(None);
    }

    let aspects: Vec<f32> = decoded.iter().map(DecodedImage::aspect_ratio).collect();
    let placements = layout_pages(geometry, &aspects);
    let bytes = write_pdf(geometry, &decoded, &placements)?;
    let page_count = page_count(&placements);

    debug!(
        images = decoded.len(),
        pages = page_count,
        bytes = bytes.len(),
        "assembled document"
    );

    Ok(Some(Document {
        file_name: pdf_file_name(file_name),
        bytes,
        page_count,
        placements,
    }))
}

/// Ensure the name ends in `.pdf`.
pub fn pdf_file_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return DEFAULT_DOCUMENT_NAME.to_string();
    }
    if name.to_ascii_lowercase().ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{name}.pdf")
    }
}

fn write_pdf(
    geometry: &PageGeometry,
    images: &[DecodedImage],
    placements: &[Placement],
) -> Result<Vec<u8>, AssembleError> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let page_width = mm_to_pt(geometry.width);
    let page_height = mm_to_pt(geometry.height);
    let pages = page_count(placements);

    let mut operations: Vec<Vec<Operation>> = vec![Vec::new(); pages];
    let mut xobjects: Vec<Dictionary> = vec![Dictionary::new(); pages];

    for (index, (image, placement)) in images.iter().zip(placements).enumerate() {
        let image_id = doc.add_object(image_xobject(image)?);
        let name = format!("Im{}", index + 1);
        xobjects[placement.page].set(name.as_str(), Object::Reference(image_id));

        // PDF user space grows upward from the bottom-left corner
        let x = mm_to_pt(placement.x);
        let y = page_height - mm_to_pt(placement.bottom());
        operations[placement.page].extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(mm_to_pt(placement.width)),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(mm_to_pt(placement.height)),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
    }

    let mut kids = Vec::with_capacity(pages);
    for (operations, xobjects) in operations.into_iter().zip(xobjects) {
        let content = Content { operations }.encode()?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page_width),
                    Object::Real(page_height),
                ]),
            ),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter([(
                    "XObject",
                    Object::Dictionary(xobjects),
                )])),
            ),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| AssembleError::Pdf(e.to_string()))?;
    Ok(output)
}

/// JPEG-compressed RGB image XObject. Alpha is dropped.
fn image_xobject(image: &DecodedImage) -> Result<Stream, EncodeError> {
    let rgb: Vec<u8> = image
        .pixels
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let jpeg = encode_jpeg(&rgb, image.width, image.height, DEFAULT_JPEG_QUALITY)?;

    let dict = Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(image.width))),
        ("Height", Object::Integer(i64::from(image.height))),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"DCTDecode".to_vec())),
    ]);
    // Already DCT-compressed; keep lopdf from wrapping it in Flate
    Ok(Stream::new(dict, jpeg).with_compression(false))
}
