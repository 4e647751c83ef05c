//! Document assembly WASM bindings.

use idmark_core::document;
use idmark_core::EncodedImage;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::js_error;
use crate::types::{JsCompositeResult, JsDocument};

/// Stack the given images onto A4 pages and return the PDF.
///
/// `images` holds `Uint8Array` PNG/JPEG bytes; `null` and `undefined`
/// entries are skipped. Resolves to `undefined` when no image is present.
///
/// ```typescript
/// const doc = await assemble_document([front.to_png(), backBytes ?? null], '身分證');
/// if (doc) download(doc.bytes(), doc.file_name);
/// ```
#[wasm_bindgen]
pub async fn assemble_document(
    images: js_sys::Array,
    file_name: String,
) -> Result<JsValue, JsValue> {
    let slots = images
        .iter()
        .map(|value| {
            if value.is_null() || value.is_undefined() {
                return Ok(None);
            }
            let bytes = value
                .dyn_into::<js_sys::Uint8Array>()
                .map_err(|_| JsValue::from_str("Invalid image: expected Uint8Array or null"))?;
            Ok(Some(EncodedImage::new(bytes.to_vec())))
        })
        .collect::<Result<Vec<_>, JsValue>>()?;

    match document::assemble(&slots, &file_name).await {
        Ok(Some(doc)) => Ok(JsDocument::from_document(doc).into()),
        Ok(None) => Ok(JsValue::UNDEFINED),
        Err(e) => Err(js_error("Document assembly failed", e)),
    }
}

/// Stack already-watermarked results without re-encoding them first.
#[wasm_bindgen]
pub async fn assemble_results(
    front: Option<JsCompositeResult>,
    back: Option<JsCompositeResult>,
    file_name: String,
) -> Result<JsValue, JsValue> {
    let slots = [
        front.map(|r| r.inner().clone()),
        back.map(|r| r.inner().clone()),
    ];

    match document::assemble(&slots, &file_name).await {
        Ok(Some(doc)) => Ok(JsDocument::from_document(doc).into()),
        Ok(None) => Ok(JsValue::UNDEFINED),
        Err(e) => Err(js_error("Document assembly failed", e)),
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use std::io::Cursor;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn png(width: u32, height: u32) -> js_sys::Uint8Array {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 200]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        js_sys::Uint8Array::from(out.into_inner().as_slice())
    }

    #[wasm_bindgen_test]
    async fn test_empty_array_resolves_undefined() {
        let result = assemble_document(js_sys::Array::new(), "x".into()).await.unwrap();
        assert!(result.is_undefined());
    }

    #[wasm_bindgen_test]
    async fn test_null_slots_resolve_undefined() {
        let images = js_sys::Array::of2(&JsValue::NULL, &JsValue::UNDEFINED);
        let result = assemble_document(images, "x".into()).await.unwrap();
        assert!(result.is_undefined());
    }

    #[wasm_bindgen_test]
    async fn test_assembles_document() {
        let images = js_sys::Array::of2(&png(86, 54), &JsValue::NULL);
        let result = assemble_document(images, "card".into()).await.unwrap();
        assert!(!result.is_undefined());
    }

    #[wasm_bindgen_test]
    async fn test_rejects_non_bytes() {
        let images = js_sys::Array::of1(&JsValue::from_str("not bytes"));
        assert!(assemble_document(images, "x".into()).await.is_err());
    }
}
