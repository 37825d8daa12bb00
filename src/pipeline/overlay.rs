// SPDX-License-Identifier: GPL-3.0-only

//! Overlay construction and publication
//!
//! Every batch produces a brand new [`OverlayFrame`]. Frames are never
//! patched: the builder emits a complete shape list and the
//! [`OverlayHandle`] swaps the published frame in one step, so a renderer
//! reading from another thread always sees one whole frame.

use super::classifier::classify;
use super::geometry::{to_screen_quad, to_screen_rect};
use super::types::{RawObservation, ScanMode, ScreenShape, SurfaceSize, SymbolKind};
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// Shapes to draw for one processed batch
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OverlayFrame {
    /// Number of the batch this frame was built from (0 before any batch)
    pub sequence: u64,
    pub shapes: Vec<ScreenShape>,
}

impl OverlayFrame {
    /// Frame with nothing to draw
    pub fn empty(sequence: u64) -> Self {
        Self {
            sequence,
            shapes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Render the frame as a standalone SVG document
    ///
    /// QR outlines become closed paths that start at the top-left corner and
    /// run through top-right, bottom-right and bottom-left.
    pub fn to_svg(&self, surface: SurfaceSize) -> String {
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = surface.width,
            h = surface.height
        );

        for shape in &self.shapes {
            let element = match shape {
                ScreenShape::Polygon { points } => {
                    let start = points[3];
                    let segments: String = points
                        .iter()
                        .map(|p| format!(" L {} {}", p.x, p.y))
                        .collect();
                    format!(
                        "  <path d=\"M {} {}{} Z\" fill=\"none\" stroke=\"blue\" stroke-width=\"2\" stroke-linejoin=\"round\"/>\n",
                        start.x, start.y, segments
                    )
                }
                ScreenShape::Rect(rect) => format!(
                    "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"blue\" stroke-width=\"2\"/>\n",
                    rect.x, rect.y, rect.width, rect.height
                ),
            };
            svg.push_str(&element);
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Builds overlay frames for a fixed drawing surface
#[derive(Debug, Clone)]
pub struct OverlayBuilder {
    surface: SurfaceSize,
}

impl OverlayBuilder {
    pub fn new(surface: SurfaceSize) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    /// Build the complete overlay for one batch
    ///
    /// QR symbols are drawn only in QR mode, barcodes only in barcode mode.
    /// Observations without geometry are skipped. An empty batch yields an
    /// empty frame.
    pub fn build(
        &self,
        sequence: u64,
        observations: &[RawObservation],
        mode: ScanMode,
    ) -> OverlayFrame {
        let shapes = observations
            .iter()
            .filter_map(classify)
            .filter(|c| mode.accepts(c.kind))
            .filter_map(|c| {
                let geometry = c.geometry?;
                Some(match c.kind {
                    SymbolKind::Qr => ScreenShape::Polygon {
                        points: to_screen_quad(&geometry.quad, self.surface).outline(),
                    },
                    SymbolKind::Barcode => {
                        ScreenShape::Rect(to_screen_rect(geometry.bounding_box, self.surface))
                    }
                })
            })
            .collect();

        OverlayFrame { sequence, shapes }
    }
}

/// Published overlay, shared between the session thread and readers
///
/// Cloning the handle shares the same slot.
#[derive(Debug, Clone, Default)]
pub struct OverlayHandle {
    current: Arc<RwLock<Arc<OverlayFrame>>>,
}

impl OverlayHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently published frame
    pub fn current(&self) -> Arc<OverlayFrame> {
        match self.current.read() {
            Ok(frame) => Arc::clone(&frame),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the published frame
    pub(crate) fn publish(&self, frame: OverlayFrame) {
        let frame = Arc::new(frame);
        match self.current.write() {
            Ok(mut slot) => *slot = frame,
            Err(poisoned) => *poisoned.into_inner() = frame,
        }
    }
}
