//! Watermark settings bindings.
//!
//! The front-end keeps its settings as a plain object
//! (`{ text, fontSize, opacity, color, angle, density }`); it is converted
//! with serde on every call. A custom typeface uploaded with [`set_font`]
//! replaces the embedded one for all later renders.

use std::cell::RefCell;

use idmark_core::{WatermarkConfig, WatermarkFont, PRESET_TEXTS};
use wasm_bindgen::prelude::*;

use crate::js_error;

thread_local! {
    static CUSTOM_FONT: RefCell<Option<WatermarkFont>> = const { RefCell::new(None) };
}

/// The default watermark settings as a plain object.
#[wasm_bindgen]
pub fn default_config() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&WatermarkConfig::default())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize config: {}", e)))
}

/// The settings object with every numeric field pulled into its slider range.
///
/// ```typescript
/// const config = clamp_config({ ...current, fontSize: 100 }); // fontSize 64
/// ```
#[wasm_bindgen]
pub fn clamp_config(config: JsValue) -> Result<JsValue, JsValue> {
    let config = parse_config(config)?.clamped();
    serde_wasm_bindgen::to_value(&config)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize config: {}", e)))
}

/// The preset usage-restriction phrases.
#[wasm_bindgen]
pub fn preset_texts() -> Vec<String> {
    PRESET_TEXTS.iter().map(|s| s.to_string()).collect()
}

/// Use the given TrueType/OpenType bytes for subsequent renders.
///
/// Pass a CJK-capable face to render the Chinese preset phrases.
#[wasm_bindgen]
pub fn set_font(bytes: Vec<u8>) -> Result<(), JsValue> {
    let font = WatermarkFont::from_bytes(bytes).map_err(|e| js_error("Invalid font", e))?;
    CUSTOM_FONT.with(|slot| *slot.borrow_mut() = Some(font));
    Ok(())
}

/// Go back to the embedded typeface.
#[wasm_bindgen]
pub fn reset_font() {
    CUSTOM_FONT.with(|slot| *slot.borrow_mut() = None);
}

/// The font renders should use right now.
pub(crate) fn active_font() -> Result<WatermarkFont, JsValue> {
    if let Some(font) = CUSTOM_FONT.with(|slot| slot.borrow().clone()) {
        return Ok(font);
    }
    WatermarkFont::embedded().map_err(|e| js_error("Embedded font unavailable", e))
}

/// Convert the front-end settings object; `undefined` or `null` gives the
/// defaults and missing fields take their default values.
pub(crate) fn parse_config(value: JsValue) -> Result<WatermarkConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(WatermarkConfig::default());
    }
    let config: WatermarkConfig = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid watermark config: {}", e)))?;
    config
        .validate()
        .map_err(|e| js_error("Invalid watermark config", e))?;
    Ok(config)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde::Serialize;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct PartialConfig {
        text: &'static str,
        font_size: f32,
        color: &'static str,
    }

    #[wasm_bindgen_test]
    fn test_parse_undefined_gives_defaults() {
        let config = parse_config(JsValue::UNDEFINED).unwrap();
        assert_eq!(config, WatermarkConfig::default());
    }

    #[wasm_bindgen_test]
    fn test_parse_partial_object() {
        let value = serde_wasm_bindgen::to_value(&PartialConfig {
            text: "COPY",
            font_size: 40.0,
            color: "#00F",
        })
        .unwrap();
        let config = parse_config(value).unwrap();
        assert_eq!(config.text, "COPY");
        assert_eq!(config.font_size, 40.0);
        assert_eq!(config.color.to_string(), "#0000FF");
        assert_eq!(config.opacity, 0.3);
    }

    #[wasm_bindgen_test]
    fn test_parse_rejects_bad_color() {
        let value = serde_wasm_bindgen::to_value(&PartialConfig {
            text: "COPY",
            font_size: 40.0,
            color: "blue",
        })
        .unwrap();
        assert!(parse_config(value).is_err());
    }

    #[wasm_bindgen_test]
    fn test_default_config_round_trips() {
        let value = default_config().unwrap();
        assert_eq!(parse_config(value).unwrap(), WatermarkConfig::default());
    }

    #[wasm_bindgen_test]
    fn test_clamp_config_pulls_into_slider_range() {
        let value = serde_wasm_bindgen::to_value(&PartialConfig {
            text: "COPY",
            font_size: 200.0,
            color: "#00F",
        })
        .unwrap();
        let clamped: WatermarkConfig =
            serde_wasm_bindgen::from_value(clamp_config(value).unwrap()).unwrap();
        assert_eq!(clamped.font_size, 64.0);
        assert_eq!(clamped.text, "COPY");
        assert_eq!(clamped.opacity, 0.3);
    }

    #[wasm_bindgen_test]
    fn test_clamp_config_rejects_invalid() {
        let value = serde_wasm_bindgen::to_value(&PartialConfig {
            text: "COPY",
            font_size: -1.0,
            color: "#00F",
        })
        .unwrap();
        assert!(clamp_config(value).is_err());
    }

    #[wasm_bindgen_test]
    fn test_set_font_rejects_garbage() {
        assert!(set_font(vec![0u8; 32]).is_err());
    }
}
