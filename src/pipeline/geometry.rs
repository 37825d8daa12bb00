// SPDX-License-Identifier: GPL-3.0-only

//! Normalized-to-screen coordinate transform
//!
//! The detector reports geometry with the origin at the bottom-left and y
//! growing upward, both axes in 0.0..=1.0. Screens put the origin at the
//! top-left with y growing downward, in pixels. Every conversion flips the
//! vertical axis the same way, so a point and a box that touch agree on
//! where the contact is.

use super::types::{NormalizedPoint, NormalizedRect, Quad, ScreenPoint, ScreenRect, SurfaceSize};

/// Map a normalized point to screen pixels: `(x·W, (1−y)·H)`
pub fn to_screen_point(point: NormalizedPoint, surface: SurfaceSize) -> ScreenPoint {
    ScreenPoint {
        x: point.x * surface.width,
        y: (1.0 - point.y) * surface.height,
    }
}

/// Map a normalized box to a screen rectangle
///
/// The box's top edge `y + h` becomes the rectangle's top-left corner at
/// `(1−(y+h))·H`. Flipping the edge before scaling keeps a box that touches
/// the top of the frame at exactly `y = 0`.
pub fn to_screen_rect(rect: NormalizedRect, surface: SurfaceSize) -> ScreenRect {
    ScreenRect {
        x: rect.x * surface.width,
        y: (1.0 - (rect.y + rect.height)) * surface.height,
        width: rect.width * surface.width,
        height: rect.height * surface.height,
    }
}

/// Map all four corners of a quad, keeping their names
pub fn to_screen_quad(quad: &Quad, surface: SurfaceSize) -> ScreenQuad {
    ScreenQuad {
        top_left: to_screen_point(quad.top_left, surface),
        top_right: to_screen_point(quad.top_right, surface),
        bottom_right: to_screen_point(quad.bottom_right, surface),
        bottom_left: to_screen_point(quad.bottom_left, surface),
    }
}

/// Named corners in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenQuad {
    pub top_left: ScreenPoint,
    pub top_right: ScreenPoint,
    pub bottom_right: ScreenPoint,
    pub bottom_left: ScreenPoint,
}

impl ScreenQuad {
    /// Outline order for drawing: top-right, bottom-right, bottom-left, top-left
    ///
    /// A closed path starting at the top-left and visiting these in order
    /// never crosses itself.
    pub fn outline(&self) -> [ScreenPoint; 4] {
        [
            self.top_right,
            self.bottom_right,
            self.bottom_left,
            self.top_left,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: SurfaceSize = SurfaceSize {
        width: 300.0,
        height: 600.0,
    };

    #[test]
    fn test_point_center() {
        let p = to_screen_point(NormalizedPoint::new(0.5, 0.5), SURFACE);
        assert_eq!(p, ScreenPoint::new(150.0, 300.0));
    }

    #[test]
    fn test_point_corners() {
        assert_eq!(
            to_screen_point(NormalizedPoint::new(0.0, 0.0), SURFACE),
            ScreenPoint::new(0.0, 600.0)
        );
        assert_eq!(
            to_screen_point(NormalizedPoint::new(0.0, 1.0), SURFACE),
            ScreenPoint::new(0.0, 0.0)
        );
        assert_eq!(
            to_screen_point(NormalizedPoint::new(1.0, 1.0), SURFACE),
            ScreenPoint::new(300.0, 0.0)
        );
    }

    #[test]
    fn test_rect_at_bottom_edge() {
        // A degenerate box sitting on the bottom of the frame
        let r = to_screen_rect(NormalizedRect::new(0.0, 0.0, 0.0, 0.0), SURFACE);
        assert_eq!(r.y, 600.0);
        assert_eq!(r.height, 0.0);
    }

    #[test]
    fn test_rect_touching_top_edge() {
        let h = 0.25;
        let r = to_screen_rect(NormalizedRect::new(0.5, 1.0 - h, 0.5, h), SURFACE);
        assert_eq!(r.x, 150.0);
        assert_eq!(r.y, 0.0);
        assert_eq!(r.width, 150.0);
        assert_eq!(r.height, 150.0);
    }

    #[test]
    fn test_rect_touching_top_edge_any_height() {
        for h in [0.1, 0.3, 0.7, 0.123, 0.999] {
            for height in [600.0, 1920.0, 1080.0] {
                let surface = SurfaceSize::new(300.0, height);
                let r = to_screen_rect(NormalizedRect::new(0.0, 1.0 - h, 0.5, h), surface);
                assert_eq!(r.y, 0.0, "h = {} on height {}", h, height);
            }
        }
    }

    #[test]
    fn test_rect_agrees_with_points() {
        let rect = NormalizedRect::new(0.25, 0.25, 0.5, 0.5);
        let r = to_screen_rect(rect, SURFACE);
        let top_left = to_screen_point(NormalizedPoint::new(0.25, 0.75), SURFACE);
        let bottom_right = to_screen_point(NormalizedPoint::new(0.75, 0.25), SURFACE);

        assert_eq!(ScreenPoint::new(r.x, r.y), top_left);
        assert_eq!(
            ScreenPoint::new(r.x + r.width, r.y + r.height),
            bottom_right
        );
    }

    #[test]
    fn test_quad_outline_order() {
        let quad = Quad::from_rect(&NormalizedRect::new(0.0, 0.0, 1.0, 1.0));
        let outline = to_screen_quad(&quad, SURFACE).outline();
        assert_eq!(
            outline,
            [
                ScreenPoint::new(300.0, 0.0),
                ScreenPoint::new(300.0, 600.0),
                ScreenPoint::new(0.0, 600.0),
                ScreenPoint::new(0.0, 0.0),
            ]
        );
    }
}
