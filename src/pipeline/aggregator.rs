// SPDX-License-Identifier: GPL-3.0-only

//! Session aggregator
//!
//! Owns the accepted payloads of a session. Each mode keeps its own list, so
//! switching modes mid-session neither clears nor mixes what was scanned
//! before. Lists are deduplicated and keep first-seen order.
//!
//! The aggregator has no internal locking: it lives on the session thread
//! and is only ever touched from there.

use super::classifier::Classification;
use super::types::ScanMode;
use indexmap::IndexSet;
use tracing::debug;

/// Result of offering a classified observation to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Payload appended to the active mode's list
    Accepted,
    /// Payload was already in the list; nothing changed
    Duplicate,
    /// Observation carried no decoded payload
    NoPayload,
    /// Observation's kind is not eligible in the active mode
    ModeMismatch,
}

/// Deduplicated, ordered payload lists, one per mode
#[derive(Debug, Default)]
pub struct SessionAggregator {
    barcodes: IndexSet<String>,
    qr_codes: IndexSet<String>,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an observation's payload for acceptance under `mode`
    ///
    /// Accepted iff a payload is present, the kind matches the mode and the
    /// payload is not already listed. Repeats are a no-op.
    pub fn accept(&mut self, classification: &Classification<'_>, mode: ScanMode) -> AcceptOutcome {
        let Some(payload) = classification.payload else {
            return AcceptOutcome::NoPayload;
        };

        if !mode.accepts(classification.kind) {
            return AcceptOutcome::ModeMismatch;
        }

        let codes = self.codes_mut(mode);
        if codes.contains(payload) {
            return AcceptOutcome::Duplicate;
        }

        codes.insert(payload.to_string());
        debug!(mode = %mode, payload = %payload, total = codes.len(), "Accepted code");
        AcceptOutcome::Accepted
    }

    /// Read-only view of the accepted payloads for `mode`, in first-seen order
    pub fn codes(&self, mode: ScanMode) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.list(mode).iter().map(String::as_str)
    }

    /// Owned copy of the accepted payloads for `mode`
    pub fn snapshot(&self, mode: ScanMode) -> Vec<String> {
        self.list(mode).iter().cloned().collect()
    }

    pub fn len(&self, mode: ScanMode) -> usize {
        self.list(mode).len()
    }

    pub fn is_empty(&self, mode: ScanMode) -> bool {
        self.list(mode).is_empty()
    }

    fn list(&self, mode: ScanMode) -> &IndexSet<String> {
        match mode {
            ScanMode::Barcode => &self.barcodes,
            ScanMode::Qr => &self.qr_codes,
        }
    }

    fn codes_mut(&mut self, mode: ScanMode) -> &mut IndexSet<String> {
        match mode {
            ScanMode::Barcode => &mut self.barcodes,
            ScanMode::Qr => &mut self.qr_codes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::SymbolKind;

    fn seen(kind: SymbolKind, payload: Option<&str>) -> Classification<'_> {
        Classification {
            kind,
            payload,
            geometry: None,
        }
    }

    #[test]
    fn test_duplicate_is_noop() {
        let mut agg = SessionAggregator::new();
        let obs = seen(SymbolKind::Qr, Some("ABC"));

        assert_eq!(agg.accept(&obs, ScanMode::Qr), AcceptOutcome::Accepted);
        for _ in 0..5 {
            assert_eq!(agg.accept(&obs, ScanMode::Qr), AcceptOutcome::Duplicate);
        }
        assert_eq!(agg.snapshot(ScanMode::Qr), vec!["ABC"]);
    }

    #[test]
    fn test_first_seen_order() {
        let mut agg = SessionAggregator::new();
        for payload in ["P1", "P2", "P1", "P3", "P2"] {
            agg.accept(&seen(SymbolKind::Barcode, Some(payload)), ScanMode::Barcode);
        }
        let codes: Vec<&str> = agg.codes(ScanMode::Barcode).collect();
        assert_eq!(codes, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_mode_mismatch() {
        let mut agg = SessionAggregator::new();
        assert_eq!(
            agg.accept(&seen(SymbolKind::Qr, Some("XYZ")), ScanMode::Barcode),
            AcceptOutcome::ModeMismatch
        );
        assert_eq!(
            agg.accept(&seen(SymbolKind::Barcode, Some("123")), ScanMode::Qr),
            AcceptOutcome::ModeMismatch
        );
        assert!(agg.is_empty(ScanMode::Barcode));
        assert!(agg.is_empty(ScanMode::Qr));
    }

    #[test]
    fn test_no_payload() {
        let mut agg = SessionAggregator::new();
        assert_eq!(
            agg.accept(&seen(SymbolKind::Qr, None), ScanMode::Qr),
            AcceptOutcome::NoPayload
        );
        assert_eq!(agg.len(ScanMode::Qr), 0);
    }

    #[test]
    fn test_lists_are_per_mode() {
        let mut agg = SessionAggregator::new();
        agg.accept(&seen(SymbolKind::Barcode, Some("123")), ScanMode::Barcode);
        agg.accept(&seen(SymbolKind::Qr, Some("ABC")), ScanMode::Qr);
        agg.accept(&seen(SymbolKind::Barcode, Some("456")), ScanMode::Barcode);

        assert_eq!(agg.snapshot(ScanMode::Barcode), vec!["123", "456"]);
        assert_eq!(agg.snapshot(ScanMode::Qr), vec!["ABC"]);
    }
}
