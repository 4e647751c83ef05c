//! WASM-compatible wrapper types for composite results and documents.
//!
//! Pixel and PDF data stay in WASM memory until JavaScript asks for encoded
//! bytes, which are copied out as a `Uint8Array`.

use idmark_core::{CompositeResult, Document, ExportFormat, Side};
use wasm_bindgen::prelude::*;

use crate::js_error;

/// A watermarked image wrapper for JavaScript.
#[wasm_bindgen]
pub struct JsCompositeResult {
    inner: CompositeResult,
}

#[wasm_bindgen]
impl JsCompositeResult {
    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Returns RGB pixel data as Uint8Array (a copy).
    pub fn pixels(&self) -> Vec<u8> {
        self.inner.pixels.clone()
    }

    /// Encode as PNG, the default download format.
    pub fn to_png(&self) -> Result<Vec<u8>, JsValue> {
        self.inner
            .encode(ExportFormat::Png)
            .map_err(|e| js_error("PNG encoding failed", e))
    }

    /// Encode as JPEG with quality 1-100.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, JsValue> {
        self.inner
            .encode(ExportFormat::Jpeg { quality })
            .map_err(|e| js_error("JPEG encoding failed", e))
    }

    /// Download name for this image as the given side ("front" or "back").
    ///
    /// Pass `jpeg = true` for the `.jpg` variant.
    pub fn file_name(&self, side: &str, jpeg: bool) -> Result<String, JsValue> {
        let side: Side = side.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let format = if jpeg {
            ExportFormat::jpeg()
        } else {
            ExportFormat::Png
        };
        Ok(side.file_name(format))
    }
}

impl JsCompositeResult {
    pub(crate) fn from_result(inner: CompositeResult) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &CompositeResult {
        &self.inner
    }
}

/// An assembled PDF wrapper for JavaScript.
#[wasm_bindgen]
pub struct JsDocument {
    inner: Document,
}

#[wasm_bindgen]
impl JsDocument {
    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.inner.file_name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn page_count(&self) -> usize {
        self.inner.page_count
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type().to_string()
    }

    /// Returns the PDF bytes as Uint8Array (a copy).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }
}

impl JsDocument {
    pub(crate) fn from_document(inner: Document) -> Self {
        Self { inner }
    }
}
