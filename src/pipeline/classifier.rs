// SPDX-License-Identifier: GPL-3.0-only

//! Observation classification
//!
//! Splits a raw observation into the pieces the two downstream paths need:
//! the symbol kind, the payload (aggregation path) and the geometry
//! (overlay path). Missing pieces only remove the observation from the
//! path that needs them.

use super::types::{NormalizedRect, Quad, RawObservation, SymbolKind};

/// Geometry of an observation, completed from whatever the detector reported
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub quad: Quad,
    pub bounding_box: NormalizedRect,
}

/// Classified view of one observation
#[derive(Debug, Clone, PartialEq)]
pub struct Classification<'a> {
    pub kind: SymbolKind,
    /// Non-empty decoded payload
    pub payload: Option<&'a str>,
    /// `None` when the detector reported neither corners nor a box
    pub geometry: Option<Geometry>,
}

/// Classify an observation
///
/// Returns `None` when the observation is unusable on both paths: it has no
/// payload and no geometry.
pub fn classify(observation: &RawObservation) -> Option<Classification<'_>> {
    let kind = if observation.symbology.is_qr() {
        SymbolKind::Qr
    } else {
        SymbolKind::Barcode
    };

    let payload = observation
        .payload
        .as_deref()
        .filter(|payload| !payload.is_empty());

    let geometry = match (observation.corners, observation.bounding_box) {
        (Some(quad), Some(bounding_box)) => Some(Geometry { quad, bounding_box }),
        (Some(quad), None) => Some(Geometry {
            bounding_box: NormalizedRect::enclosing(&quad),
            quad,
        }),
        (None, Some(bounding_box)) => Some(Geometry {
            quad: Quad::from_rect(&bounding_box),
            bounding_box,
        }),
        (None, None) => None,
    };

    if payload.is_none() && geometry.is_none() {
        return None;
    }

    Some(Classification {
        kind,
        payload,
        geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{NormalizedPoint, Symbology};

    fn square() -> NormalizedRect {
        NormalizedRect::new(0.25, 0.25, 0.5, 0.5)
    }

    #[test]
    fn test_qr_descriptor() {
        let obs = RawObservation::qr(Quad::from_rect(&square()), Some("ABC"));
        let c = classify(&obs).unwrap();
        assert_eq!(c.kind, SymbolKind::Qr);
        assert_eq!(c.payload, Some("ABC"));
        assert!(c.geometry.is_some());
    }

    #[test]
    fn test_non_qr_descriptors_are_barcodes() {
        for symbology in [Symbology::Ean13, Symbology::Code128, Symbology::Unknown] {
            let obs = RawObservation::barcode(symbology, square(), Some("123"));
            assert_eq!(classify(&obs).unwrap().kind, SymbolKind::Barcode);
        }
    }

    #[test]
    fn test_undecoded_is_still_drawable() {
        let obs = RawObservation::qr(Quad::from_rect(&square()), None);
        let c = classify(&obs).unwrap();
        assert_eq!(c.payload, None);
        assert!(c.geometry.is_some());
    }

    #[test]
    fn test_empty_payload_counts_as_missing() {
        let obs = RawObservation::barcode(Symbology::Ean8, square(), Some(""));
        assert_eq!(classify(&obs).unwrap().payload, None);
    }

    #[test]
    fn test_payload_without_geometry() {
        let obs = RawObservation {
            payload: Some("XYZ".to_string()),
            symbology: Symbology::Qr,
            ..Default::default()
        };
        let c = classify(&obs).unwrap();
        assert_eq!(c.payload, Some("XYZ"));
        assert!(c.geometry.is_none());
    }

    #[test]
    fn test_nothing_usable_is_dropped() {
        let obs = RawObservation {
            symbology: Symbology::Qr,
            ..Default::default()
        };
        assert!(classify(&obs).is_none());
    }

    #[test]
    fn test_box_completed_from_corners() {
        let quad = Quad {
            top_left: NormalizedPoint::new(0.25, 0.75),
            top_right: NormalizedPoint::new(0.75, 0.5),
            bottom_right: NormalizedPoint::new(0.5, 0.25),
            bottom_left: NormalizedPoint::new(0.125, 0.5),
        };
        let obs = RawObservation {
            corners: Some(quad),
            symbology: Symbology::Qr,
            ..Default::default()
        };
        let geometry = classify(&obs).unwrap().geometry.unwrap();
        assert_eq!(
            geometry.bounding_box,
            NormalizedRect::new(0.125, 0.25, 0.625, 0.5)
        );
    }

    #[test]
    fn test_corners_completed_from_box() {
        let obs = RawObservation {
            bounding_box: Some(square()),
            symbology: Symbology::Code39,
            ..Default::default()
        };
        let geometry = classify(&obs).unwrap().geometry.unwrap();
        assert_eq!(geometry.quad, Quad::from_rect(&square()));
    }
}
