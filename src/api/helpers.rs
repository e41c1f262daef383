//! Shared helpers for WASM API operations
//!
//! Serialization at the JS boundary, error conversion and console logging.
//! The console bindings exist only on wasm32; native builds route the same
//! messages through the `log` facade so the API can be tested natively.

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::PipelineError;

// ============================================================================
// Console Logging Functions
// ============================================================================

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn info(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn warn(s: &str);

    #[wasm_bindgen(js_namespace = console)]
    fn error(s: &str);
}

// ============================================================================
// Logging Macros
// ============================================================================

/// Log a debug message with [WASM] prefix
#[macro_export]
macro_rules! wasm_log {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_debug(&format!($($arg)*))
    };
}

/// Log an info message with [WASM] prefix
#[macro_export]
macro_rules! wasm_info {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_info(&format!($($arg)*))
    };
}

/// Log a warning with [WASM] ⚠️ prefix
#[macro_export]
macro_rules! wasm_warn {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_warn(&format!($($arg)*))
    };
}

/// Log an error message with [WASM] ❌ prefix
#[macro_export]
macro_rules! wasm_error {
    ($($arg:tt)*) => {
        $crate::api::helpers::log_error(&format!($($arg)*))
    };
}

// ============================================================================
// Logging Helper Functions (called by macros)
// ============================================================================

pub fn log_debug(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    log(&format!("[WASM] {}", msg));
    #[cfg(not(target_arch = "wasm32"))]
    log::debug!("[WASM] {}", msg);
}

pub fn log_info(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    info(&format!("[WASM] {}", msg));
    #[cfg(not(target_arch = "wasm32"))]
    log::info!("[WASM] {}", msg);
}

pub fn log_warn(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    warn(&format!("[WASM] ⚠️ {}", msg));
    #[cfg(not(target_arch = "wasm32"))]
    log::warn!("[WASM] {}", msg);
}

pub fn log_error(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    error(&format!("[WASM] ❌ {}", msg));
    #[cfg(not(target_arch = "wasm32"))]
    log::error!("[WASM] {}", msg);
}

// ============================================================================
// Serialization/Deserialization Helpers
// ============================================================================

/// Deserialize a value from JavaScript with automatic error handling
pub fn deserialize<T: DeserializeOwned>(value: JsValue, error_context: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        log_error(&msg);
        JsValue::from_str(&msg)
    })
}

/// Deserialize an optional value; `undefined` and `null` give `None`
pub fn deserialize_optional<T: DeserializeOwned>(value: JsValue, error_context: &str) -> Result<Option<T>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    deserialize(value, error_context).map(Some)
}

/// Serialize a value to JavaScript with automatic error handling
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        log_error(&msg);
        JsValue::from_str(&msg)
    })
}

// ============================================================================
// Result Conversion Helpers
// ============================================================================

/// Message for a pipeline failure, prefixed with the failing stage
pub fn pipeline_error_message(err: &PipelineError) -> String {
    format!("[{}] {}", err.stage(), err)
}

/// Convert an API error message to a JsValue
pub fn js_error(msg: impl Into<String>) -> JsValue {
    let msg = msg.into();
    log_error(&msg);
    JsValue::from_str(&msg)
}
