//! Node bindings for browser hosts.
//!
//! The host owns the editor widget and the preview element; it hands the
//! buffer to [`render_component_native`] on every change and swaps the
//! returned HTML into the preview.

use napi_derive::napi;
use serde::{Deserialize, Serialize};

use crate::pipeline::{render_with_options, RenderOptions, RenderResult};
use crate::playground::EditorConfig;
use crate::preview::render_html;
use crate::source::DEFAULT_COMPONENT_SOURCE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[napi(object)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPayload {
    pub ok: bool,
    pub html: String,
    pub error: Option<String>,
}

impl From<&RenderResult> for PreviewPayload {
    fn from(result: &RenderResult) -> Self {
        Self {
            ok: result.is_success(),
            html: render_html(result),
            error: result.error_message().map(str::to_string),
        }
    }
}

#[napi]
pub fn render_component_native(
    code: String,
    options: Option<serde_json::Value>,
) -> napi::Result<PreviewPayload> {
    let options: RenderOptions = match options {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| napi::Error::from_reason(format!("Invalid render options: {}", e)))?,
        None => RenderOptions::default(),
    };
    let result = render_with_options(&code, options);
    Ok(PreviewPayload::from(&result))
}

/// The same cycle, returning the view model as JSON.
#[napi]
pub fn render_view_native(code: String) -> napi::Result<serde_json::Value> {
    let result = render_with_options(&code, RenderOptions::default());
    serde_json::to_value(result).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[napi]
pub fn default_component_source_native() -> String {
    DEFAULT_COMPONENT_SOURCE.to_string()
}

#[napi]
pub fn editor_config_native() -> napi::Result<serde_json::Value> {
    serde_json::to_value(EditorConfig::default())
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
