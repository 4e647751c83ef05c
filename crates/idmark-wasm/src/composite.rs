//! Watermark compositing WASM bindings.
//!
//! Both entry points return Promises. `composite_blob` reads the `File` or
//! `Blob` itself, so the page never has to hold the bytes.
//!
//! # Example
//!
//! ```typescript
//! import { composite_blob, default_config } from '@idmark/wasm';
//!
//! const config = { ...default_config(), text: '僅供銀行開戶使用' };
//! const result = await composite_blob(file, config);
//! const png = result.to_png();
//! const name = result.file_name('front', false);
//! ```

use idmark_core::compositor;
use idmark_core::decode::{decode_image, DecodeError, DecodedImage, EncodedImage, ImageSource};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::config::{active_font, parse_config};
use crate::js_error;
use crate::types::JsCompositeResult;

/// A browser `Blob` (or `File`) read when the compositor asks for it.
pub(crate) struct BlobSource {
    blob: web_sys::Blob,
}

impl BlobSource {
    pub(crate) fn new(blob: web_sys::Blob) -> Self {
        Self { blob }
    }
}

impl ImageSource for BlobSource {
    async fn load(&self) -> Result<DecodedImage, DecodeError> {
        let buffer = JsFuture::from(self.blob.array_buffer())
            .await
            .map_err(|e| DecodeError::Io(format!("{:?}", e)))?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        decode_image(&bytes)
    }
}

/// Watermark PNG/JPEG bytes.
///
/// `config` is the settings object; `undefined` uses the defaults.
#[wasm_bindgen]
pub async fn composite(bytes: Vec<u8>, config: JsValue) -> Result<JsCompositeResult, JsValue> {
    run(&EncodedImage::new(bytes), config).await
}

/// Watermark an image held in a `Blob` or `File`.
#[wasm_bindgen]
pub async fn composite_blob(
    blob: web_sys::Blob,
    config: JsValue,
) -> Result<JsCompositeResult, JsValue> {
    run(&BlobSource::new(blob), config).await
}

async fn run<S: ImageSource>(source: &S, config: JsValue) -> Result<JsCompositeResult, JsValue> {
    let config = parse_config(config)?;
    let font = active_font()?;
    compositor::composite(source, &config, &font)
        .await
        .map(JsCompositeResult::from_result)
        .map_err(|e| js_error("Watermark failed", e))
}
