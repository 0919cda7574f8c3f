//! QR code labels for storage bins
//!
//! A bin's label encodes nothing but its id. Scanning the label yields the
//! id back, which [`lookup`] resolves to the bin.

use qrcode::render::{svg, unicode};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

use crate::entities::Bin;

/// Errors producing or resolving QR codes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QrError {
    #[error("could not encode QR code: {0}")]
    Encode(String),

    #[error("No bin found with this QR code.")]
    NotFound(String),
}

fn encode(payload: &str) -> Result<QrCode, QrError> {
    // Labels always use the highest error correction level.
    QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|e| QrError::Encode(e.to_string()))
}

/// Render a QR code as Unicode half-blocks for the terminal
pub fn render_terminal(payload: &str) -> Result<String, QrError> {
    let code = encode(payload)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

/// Render a QR code as an SVG document, `module_px` pixels per module
pub fn render_svg(payload: &str, module_px: u32) -> Result<String, QrError> {
    let code = encode(payload)?;
    Ok(code
        .render::<svg::Color<'_>>()
        .module_dimensions(module_px, module_px)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .quiet_zone(true)
        .build())
}

/// Resolve a scanned payload to the bin whose id it encodes
pub fn lookup<'a>(bins: &'a [Bin], payload: &str) -> Result<&'a Bin, QrError> {
    let code = payload.trim();
    bins.iter()
        .find(|bin| bin.id.to_string() == code)
        .ok_or_else(|| QrError::NotFound(code.to_string()))
}
