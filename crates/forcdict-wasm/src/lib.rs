use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderOptions {
    sanitized: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderResult {
    /// Empty when the entry failed to convert.
    html: String,
    diagnostics: Vec<JsDiagnostic>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsDiagnostic {
    code: String,
    message: String,
    severity: String,
    snippet: Option<String>,
}

impl From<forcdict_core::Diagnostic> for JsDiagnostic {
    fn from(diag: forcdict_core::Diagnostic) -> Self {
        Self {
            code: diag.code.to_string(),
            message: diag.message,
            severity: diag.severity.label().to_string(),
            snippet: diag.snippet,
        }
    }
}

#[wasm_bindgen]
pub fn render_entry(fragment: &str) -> Result<JsValue, JsValue> {
    render_entry_with_options(fragment, JsValue::UNDEFINED)
}

#[wasm_bindgen]
pub fn render_entry_with_options(fragment: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options = options_from_js(options)?;
    let result = render(fragment, &options);
    serde_wasm_bindgen::to_value(&result).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn render(fragment: &str, options: &RenderOptions) -> RenderResult {
    match forcdict_core::convert(fragment) {
        Ok(conversion) => {
            let html = if options.sanitized.unwrap_or(false) {
                forcdict_core::emit_entry_sanitized(&conversion.entry)
            } else {
                forcdict_core::emit_entry(&conversion.entry)
            };
            RenderResult {
                html,
                diagnostics: conversion.diagnostics.into_iter().map(Into::into).collect(),
            }
        }
        Err(err) => RenderResult {
            html: String::new(),
            diagnostics: vec![err.to_diagnostic().into()],
        },
    }
}

fn options_from_js(value: JsValue) -> Result<RenderOptions, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(RenderOptions::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{RenderOptions, render};

    #[test]
    fn converted_entry_carries_warnings() {
        let result = render(
            "<div>Vox <span style=\"color:red\">rubra</span>.</div>",
            &RenderOptions::default(),
        );
        assert!(result.html.starts_with("<entryFree>"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "W_STYLE_UNKNOWN");
        assert_eq!(result.diagnostics[0].severity, "warning");
    }

    #[test]
    fn failed_entry_reports_error_without_html() {
        let result = render("", &RenderOptions::default());
        assert!(result.html.is_empty());
        assert_eq!(result.diagnostics[0].code, "E_FRAGMENT_EMPTY");
        assert_eq!(result.diagnostics[0].severity, "error");
    }

    #[test]
    fn sanitized_output_is_lowercased() {
        let result = render(
            "<div>x</div>",
            &RenderOptions {
                sanitized: Some(true),
            },
        );
        assert_eq!(result.html, "<entryfree>x</entryfree>");
    }
}
