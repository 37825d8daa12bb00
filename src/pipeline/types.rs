// SPDX-License-Identifier: GPL-3.0-only

//! Core types for the scanning pipeline
//!
//! Detector output lives in a normalized space (0.0 to 1.0, origin at the
//! bottom-left, y growing upward). Overlay output lives in screen pixels
//! (origin at the top-left, y growing downward). The conversion between the
//! two is done by [`super::geometry`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbol family currently eligible for acceptance and display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanMode {
    /// One-dimensional linear barcodes
    #[default]
    Barcode,
    /// QR codes
    Qr,
}

impl ScanMode {
    /// All modes, for iteration
    pub const ALL: [ScanMode; 2] = [ScanMode::Barcode, ScanMode::Qr];

    /// Wire name of the mode ("BARCODE" or "QR")
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Barcode => "BARCODE",
            ScanMode::Qr => "QR",
        }
    }

    /// Symbol kind this mode accepts
    pub fn symbol_kind(&self) -> SymbolKind {
        match self {
            ScanMode::Barcode => SymbolKind::Barcode,
            ScanMode::Qr => SymbolKind::Qr,
        }
    }

    /// Whether observations of `kind` are eligible in this mode
    pub fn accepts(&self, kind: SymbolKind) -> bool {
        self.symbol_kind() == kind
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a mode string is neither "BARCODE" nor "QR"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModeError(pub String);

impl fmt::Display for UnknownModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown scan mode '{}' (expected BARCODE or QR)", self.0)
    }
}

impl std::error::Error for UnknownModeError {}

impl FromStr for ScanMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ScanMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownModeError(s.to_string()))
    }
}

/// Coarse classification of a detected symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymbolKind {
    Qr,
    Barcode,
}

/// Symbology descriptor reported by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Qr,
    MicroQr,
    Aztec,
    DataMatrix,
    Pdf417,
    Ean8,
    Ean13,
    UpcE,
    Code39,
    Code93,
    Code128,
    Itf14,
    Codabar,
    /// Detector did not report a descriptor
    #[default]
    Unknown,
}

impl Symbology {
    /// QR-family descriptors
    pub fn is_qr(&self) -> bool {
        matches!(self, Symbology::Qr | Symbology::MicroQr)
    }
}

/// A point in the detector's normalized space (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box in normalized space
///
/// `(x, y)` is the bottom-left corner of the box, so the box spans
/// `y..y + height` upward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest axis-aligned box containing all four corners of `quad`
    pub fn enclosing(quad: &Quad) -> Self {
        let points = quad.points();
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

/// Four named corners of a detected symbol
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: NormalizedPoint,
    pub top_right: NormalizedPoint,
    pub bottom_right: NormalizedPoint,
    pub bottom_left: NormalizedPoint,
}

impl Quad {
    /// Corners of an axis-aligned box
    pub fn from_rect(rect: &NormalizedRect) -> Self {
        let left = rect.x;
        let right = rect.x + rect.width;
        let bottom = rect.y;
        let top = rect.y + rect.height;

        Self {
            top_left: NormalizedPoint::new(left, top),
            top_right: NormalizedPoint::new(right, top),
            bottom_right: NormalizedPoint::new(right, bottom),
            bottom_left: NormalizedPoint::new(left, bottom),
        }
    }

    /// Corners in clockwise order starting at the top-left
    pub fn points(&self) -> [NormalizedPoint; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// One symbol detected in one frame
///
/// Produced by the detector once per frame per detected symbol and
/// discarded once its batch has been processed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawObservation {
    /// Corner points, when the detector reports them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corners: Option<Quad>,
    /// Bounding box, when the detector reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<NormalizedRect>,
    /// Decoded content, when the symbol could be decoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Detector's descriptor of the symbol
    #[serde(default)]
    pub symbology: Symbology,
}

impl RawObservation {
    /// QR observation with the given corners and payload
    pub fn qr(corners: Quad, payload: Option<&str>) -> Self {
        Self {
            bounding_box: Some(NormalizedRect::enclosing(&corners)),
            corners: Some(corners),
            payload: payload.map(str::to_string),
            symbology: Symbology::Qr,
        }
    }

    /// Linear barcode observation with the given bounding box and payload
    pub fn barcode(symbology: Symbology, bounding_box: NormalizedRect, payload: Option<&str>) -> Self {
        Self {
            corners: Some(Quad::from_rect(&bounding_box)),
            bounding_box: Some(bounding_box),
            payload: payload.map(str::to_string),
            symbology,
        }
    }
}

/// Size of the drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A point in screen pixels (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in screen pixels, `(x, y)` being its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One drawable shape of an overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenShape {
    /// QR outline, ordered top-right, bottom-right, bottom-left, top-left.
    /// Renderers start the closed path at the last point.
    Polygon { points: [ScreenPoint; 4] },
    /// Barcode bounds
    Rect(ScreenRect),
}

/// Final state of a scanning session as seen by the caller that started it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "codes", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The session finished with the accepted payloads in first-seen order
    Completed(Vec<String>),
    /// The session was cancelled and carries no result
    Cancelled,
}

impl SessionOutcome {
    /// Payloads, if the session produced a result
    pub fn codes(&self) -> Option<&[String]> {
        match self {
            SessionOutcome::Completed(codes) => Some(codes),
            SessionOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionOutcome::Cancelled)
    }
}
