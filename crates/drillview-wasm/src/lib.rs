#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::indexing_slicing)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `DrillView` WASM module: Excellon drill parsing, transforms and mesh output.

pub mod config;
pub mod error;
pub mod excellon;
pub mod geometry;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::config::ExcellonConfig;
use crate::error::ExcellonError;
use crate::excellon::{ExcellonDocument, ExcellonParser, ParseStatus, ToolSummary, TransformOp};
use crate::geometry::{fill_geometry, saturate_u32, GeometryBuilder, LayerGeometry, LayerMeta};

thread_local! {
    static LAST_DOCUMENT: RefCell<Option<ExcellonDocument>> = const { RefCell::new(None) };
    static LAST_GEOMETRY: RefCell<Option<LayerGeometry>> = const { RefCell::new(None) };
}

fn store(doc: ExcellonDocument, geom: LayerGeometry) {
    LAST_DOCUMENT.with(|d| {
        *d.borrow_mut() = Some(doc);
    });
    LAST_GEOMETRY.with(|g| {
        *g.borrow_mut() = Some(geom);
    });
}

/// Initialize the WASM module. Sets up the panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Parse an Excellon drill file from raw bytes and generate renderable geometry.
///
/// Returns `LayerMeta` as a `JsValue` via `serde-wasm-bindgen`.
/// Geometry buffers are stored internally; retrieve with
/// [`get_positions`] and [`get_indices`].
///
/// # Errors
///
/// Returns the serialized [`ParseStatus`] if the parse is aborted.
#[wasm_bindgen]
pub fn parse_excellon(data: &[u8]) -> Result<JsValue, JsValue> {
    let meta = parse_excellon_internal(data, &ExcellonConfig::default()).map_err(status_to_js)?;
    to_js(&meta)
}

/// Like [`parse_excellon`], with an `ExcellonConfig` object overriding the
/// defaults. `undefined` or `null` selects the defaults.
///
/// # Errors
///
/// Returns an error string for an invalid configuration, or the serialized
/// [`ParseStatus`] if the parse is aborted.
#[wasm_bindgen]
pub fn parse_excellon_with_config(data: &[u8], config: JsValue) -> Result<JsValue, JsValue> {
    let config: ExcellonConfig = if config.is_undefined() || config.is_null() {
        ExcellonConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {e}")))?
    };
    let meta = parse_excellon_internal(data, &config).map_err(status_to_js)?;
    to_js(&meta)
}

/// Apply a transform (`{ op: "rotate", angle: 90 }` and so on) to the last
/// parsed drill file and regenerate its geometry.
///
/// # Errors
///
/// Returns an error string if the request is invalid or nothing was parsed.
#[wasm_bindgen]
pub fn transform_excellon(op: JsValue) -> Result<JsValue, JsValue> {
    let op: TransformOp = serde_wasm_bindgen::from_value(op)
        .map_err(|e| JsValue::from_str(&format!("invalid transform: {e}")))?;
    let meta = transform_excellon_internal(&op).map_err(|e| JsValue::from_str(&e))?;
    to_js(&meta)
}

/// Replace a tool's diameter in the last parsed drill file and regenerate
/// its geometry.
///
/// # Errors
///
/// Returns an error string if the tool is unknown, the diameter is not
/// positive, or nothing was parsed.
#[wasm_bindgen]
pub fn set_tool_diameter(tool: &str, diameter: f64) -> Result<JsValue, JsValue> {
    let meta = with_document(|doc| doc.set_tool_diameter(tool, diameter))
        .map_err(|e| JsValue::from_str(&e))?;
    to_js(&meta)
}

/// Per-tool diameters and feature counts of the last parsed drill file.
///
/// # Errors
///
/// Returns an error string if serialization fails.
#[wasm_bindgen]
pub fn get_tools() -> Result<JsValue, JsValue> {
    to_js(&tool_summaries())
}

/// Internal parse logic shared between the wasm export and native tests.
#[doc(hidden)]
pub fn parse_excellon_internal(
    data: &[u8],
    config: &ExcellonConfig,
) -> Result<LayerMeta, ParseStatus> {
    let doc = ExcellonParser::new(config.clone())
        .parse(data)
        .map_err(|err| ParseStatus::from(&err))?;
    let geom = render(&doc).map_err(|err| ParseStatus::from(&err))?;
    let meta = layer_meta(&doc, &geom);
    store(doc, geom);
    Ok(meta)
}

/// Internal transform logic shared between the wasm export and native tests.
#[doc(hidden)]
pub fn transform_excellon_internal(op: &TransformOp) -> Result<LayerMeta, String> {
    with_document(|doc| {
        doc.apply(op);
        Ok(())
    })
}

/// Tool summaries of the last parsed document; empty if none.
#[doc(hidden)]
pub fn tool_summaries() -> Vec<ToolSummary> {
    LAST_DOCUMENT.with(|d| {
        d.borrow()
            .as_ref()
            .map_or_else(Vec::new, ExcellonDocument::tool_summaries)
    })
}

fn with_document(
    edit: impl FnOnce(&mut ExcellonDocument) -> Result<(), ExcellonError>,
) -> Result<LayerMeta, String> {
    let mut doc = LAST_DOCUMENT
        .with(|d| d.borrow_mut().take())
        .ok_or_else(|| "no drill file has been parsed".to_string())?;
    let edited = edit(&mut doc).and_then(|()| render(&doc));
    match edited {
        Ok(geom) => {
            let meta = layer_meta(&doc, &geom);
            store(doc, geom);
            Ok(meta)
        }
        Err(err) => {
            LAST_DOCUMENT.with(|d| {
                *d.borrow_mut() = Some(doc);
            });
            Err(err.to_string())
        }
    }
}

fn render(doc: &ExcellonDocument) -> Result<LayerGeometry, ExcellonError> {
    let mut builder = GeometryBuilder::new();
    for warning in doc.warnings().all_messages() {
        builder.warn(warning.to_string());
    }
    fill_geometry(&mut builder, &doc.solid_geometry())?;
    Ok(builder.build())
}

fn layer_meta(doc: &ExcellonDocument, geom: &LayerGeometry) -> LayerMeta {
    LayerMeta {
        bounds: doc.bounding_box(),
        vertex_count: geom.vertex_count,
        index_count: saturate_u32(geom.indices.len()),
        drill_count: saturate_u32(doc.drills().len()),
        slot_count: saturate_u32(doc.slots().len()),
        tool_count: saturate_u32(doc.tools().len()),
        units: doc.units().as_str().to_string(),
        diameterless: doc.warnings().diameterless,
        warning_count: saturate_u32(geom.warnings.len()),
        warnings: geom.warnings.clone(),
    }
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[allow(clippy::needless_pass_by_value)]
fn status_to_js(status: ParseStatus) -> JsValue {
    serde_wasm_bindgen::to_value(&status).unwrap_or_else(|e| JsValue::from_str(&e.to_string()))
}

/// Retrieve the position buffer for the last parsed layer.
///
/// Returns a copy of the interleaved `[x0, y0, x1, y1, ...]` positions.
/// Returns an empty array if no layer has been parsed yet.
#[wasm_bindgen]
pub fn get_positions() -> Vec<f32> {
    LAST_GEOMETRY.with(|g| {
        g.borrow()
            .as_ref()
            .map_or_else(Vec::new, |geom| geom.positions.clone())
    })
}

/// Retrieve the index buffer for the last parsed layer.
///
/// Returns a copy of the triangle-list indices.
/// Returns an empty array if no layer has been parsed yet.
#[wasm_bindgen]
pub fn get_indices() -> Vec<u32> {
    LAST_GEOMETRY.with(|g| {
        g.borrow()
            .as_ref()
            .map_or_else(Vec::new, |geom| geom.indices.clone())
    })
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn wasm_parse_returns_meta() {
        let data = b"M48\nMETRIC\nT1C1.0\n%\nT1\nX1.0Y1.0\nM30\n";
        assert!(parse_excellon(data).is_ok());
        assert!(!get_positions().is_empty());
    }
}
