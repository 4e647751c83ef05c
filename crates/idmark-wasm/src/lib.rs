//! idmark WASM - WebAssembly bindings for idmark
//!
//! This crate exposes the idmark-core watermarking and document assembly to
//! the browser front-end. Images never leave the device.
//!
//! # Module Structure
//!
//! - `config` - Default settings, preset phrases and custom typefaces
//! - `composite` - Watermark compositing from bytes or a `Blob`
//! - `document` - A4 PDF assembly
//! - `types` - WASM-compatible wrapper types for results
//!
//! # Usage
//!
//! ```typescript
//! import init, { composite, default_config } from '@idmark/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = await composite(bytes, default_config());
//! console.log(`Watermarked ${result.width}x${result.height}`);
//! ```

use wasm_bindgen::prelude::*;

mod composite;
mod config;
mod document;
mod types;

// Re-export public types
pub use composite::{composite, composite_blob};
pub use config::{clamp_config, default_config, preset_texts, reset_font, set_font};
pub use document::{assemble_document, assemble_results};
pub use types::{JsCompositeResult, JsDocument};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Log `message: error` to the browser console and turn it into a JS error
/// value.
pub(crate) fn js_error(message: &str, error: impl std::fmt::Display) -> JsValue {
    let text = format!("{}: {}", message, error);
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&JsValue::from_str(&text));
    JsValue::from_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
