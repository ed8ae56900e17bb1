//! Zoom factor to 35mm-equivalent focal length mapping.
//!
//! Every zoom/focal conversion in the engine goes through
//! [`FocalLengthResolver`]; the lens gate, the reference builder and the
//! target-zoom hint must never disagree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// One physical lens: the display zoom where it engages and its focal length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensAnchor {
    pub zoom: f64,
    pub focal_mm: f64,
}

impl LensAnchor {
    pub const fn new(zoom: f64, focal_mm: f64) -> Self {
        Self { zoom, focal_mm }
    }
}

/// Physical lens steps of one device, ascending by zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensTable {
    pub device: String,
    anchors: Vec<LensAnchor>,
}

const GENERIC_ANCHORS: &[LensAnchor] = &[
    LensAnchor::new(0.5, 13.0),
    LensAnchor::new(1.0, 26.0),
    LensAnchor::new(2.0, 52.0),
    LensAnchor::new(3.0, 77.0),
];

const KNOWN_DEVICES: &[(&str, &[LensAnchor])] = &[
    (
        "iphone15pro",
        &[
            LensAnchor::new(0.5, 13.0),
            LensAnchor::new(1.0, 24.0),
            LensAnchor::new(2.0, 48.0),
            LensAnchor::new(5.0, 120.0),
        ],
    ),
    (
        "iphone14pro",
        &[
            LensAnchor::new(0.5, 13.0),
            LensAnchor::new(1.0, 24.0),
            LensAnchor::new(2.0, 48.0),
            LensAnchor::new(3.0, 77.0),
        ],
    ),
    (
        "iphone15",
        &[
            LensAnchor::new(0.5, 13.0),
            LensAnchor::new(1.0, 26.0),
            LensAnchor::new(2.0, 52.0),
        ],
    ),
    (
        "pixel8pro",
        &[
            LensAnchor::new(0.5, 11.0),
            LensAnchor::new(1.0, 25.0),
            LensAnchor::new(5.0, 113.0),
        ],
    ),
];

impl LensTable {
    /// Build a table; anchors must be positive and strictly ascending.
    pub fn new(device: impl Into<String>, mut anchors: Vec<LensAnchor>) -> EngineResult<Self> {
        let device = device.into();
        if anchors.is_empty() {
            return Err(EngineError::invalid_lens_table(device, "no anchors"));
        }
        if anchors
            .iter()
            .any(|a| !(a.zoom > 0.0 && a.focal_mm > 0.0 && a.zoom.is_finite() && a.focal_mm.is_finite()))
        {
            return Err(EngineError::invalid_lens_table(device, "non-positive anchor"));
        }
        anchors.sort_by(|a, b| a.zoom.total_cmp(&b.zoom));
        if anchors.windows(2).any(|w| w[0].zoom == w[1].zoom || w[0].focal_mm >= w[1].focal_mm) {
            return Err(EngineError::invalid_lens_table(
                device,
                "anchors must be strictly ascending",
            ));
        }
        Ok(Self { device, anchors })
    }

    /// Fallback table for unknown devices.
    pub fn generic() -> Self {
        Self {
            device: "generic".to_string(),
            anchors: GENERIC_ANCHORS.to_vec(),
        }
    }

    /// Table for a device model; unknown models get the generic table.
    pub fn for_device(model: &str) -> Self {
        let key: String = model
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match KNOWN_DEVICES.iter().find(|(name, _)| *name == key) {
            Some((name, anchors)) => Self {
                device: (*name).to_string(),
                anchors: anchors.to_vec(),
            },
            None => {
                debug!(model, "Unknown device model, using generic lens table");
                Self::generic()
            }
        }
    }

    pub fn anchors(&self) -> &[LensAnchor] {
        &self.anchors
    }
}

impl Default for LensTable {
    fn default() -> Self {
        Self::generic()
    }
}

/// Resolves zoom factors against one lens table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FocalLengthResolver {
    table: LensTable,
}

impl FocalLengthResolver {
    pub fn new(table: LensTable) -> Self {
        Self { table }
    }

    pub fn for_device(model: &str) -> Self {
        Self::new(LensTable::for_device(model))
    }

    pub fn table(&self) -> &LensTable {
        &self.table
    }

    /// Equivalent focal length for a display zoom factor: the nearest lower
    /// physical lens scaled by the digital zoom above it.
    pub fn focal_length_mm(&self, zoom: f64) -> EngineResult<f64> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(EngineError::InvalidZoom(zoom));
        }
        let anchor = self.anchor_for_zoom(zoom);
        Ok(anchor.focal_mm * zoom / anchor.zoom)
    }

    /// Display zoom factor that produces `focal_mm`.
    pub fn zoom_for_focal_length(&self, focal_mm: f64) -> EngineResult<f64> {
        if !(focal_mm.is_finite() && focal_mm > 0.0) {
            return Err(EngineError::degenerate(format!(
                "focal length must be positive, got {}",
                focal_mm
            )));
        }
        let anchors = &self.table.anchors;
        let pos = anchors
            .iter()
            .rposition(|a| a.focal_mm <= focal_mm)
            .unwrap_or(0);
        let anchor = *anchors
            .get(pos)
            .ok_or_else(|| EngineError::invalid_lens_table(self.table.device.as_str(), "no anchors"))?;
        let zoom = anchor.zoom * focal_mm / anchor.focal_mm;

        // Focal lengths between a lens's digital maximum and the next lens
        // are unreachable; snap to the next lens.
        Ok(match anchors.get(pos + 1) {
            Some(next) if zoom > next.zoom => next.zoom,
            _ => zoom,
        })
    }

    fn anchor_for_zoom(&self, zoom: f64) -> LensAnchor {
        let anchors = &self.table.anchors;
        anchors
            .iter()
            .rev()
            .find(|a| a.zoom <= zoom)
            .or_else(|| anchors.first())
            .copied()
            .unwrap_or(LensAnchor::new(1.0, 26.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_anchors() {
        let resolver = FocalLengthResolver::default();
        assert!((resolver.focal_length_mm(1.0).unwrap() - 26.0).abs() < 1e-9);
        assert!((resolver.focal_length_mm(2.0).unwrap() - 52.0).abs() < 1e-9);
        assert!((resolver.focal_length_mm(0.5).unwrap() - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_digital_zoom_scales_from_lower_anchor() {
        let resolver = FocalLengthResolver::default();
        // 1.5x is digital zoom on the 1x lens
        assert!((resolver.focal_length_mm(1.5).unwrap() - 39.0).abs() < 1e-9);
        // 6x is digital zoom on the 3x lens
        let focal = resolver.focal_length_mm(6.0).unwrap();
        assert!((focal - 154.0).abs() < 1e-9, "got {}", focal);
        // Below the widest lens, scale from it
        assert!((resolver.focal_length_mm(0.25).unwrap() - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_device_table_lookup() {
        let pro = FocalLengthResolver::for_device("iPhone 15 Pro");
        assert_eq!(pro.table().device, "iphone15pro");
        assert!((pro.focal_length_mm(1.0).unwrap() - 24.0).abs() < 1e-9);
        assert!((pro.focal_length_mm(5.0).unwrap() - 120.0).abs() < 1e-9);

        let unknown = FocalLengthResolver::for_device("Nokia 3310");
        assert_eq!(unknown.table().device, "generic");
    }

    #[test]
    fn test_inverse_matches_forward() {
        let resolver = FocalLengthResolver::for_device("iphone15pro");
        for zoom in [0.5, 0.8, 1.0, 1.7, 2.0, 3.5, 5.0, 8.0] {
            let focal = resolver.focal_length_mm(zoom).unwrap();
            let back = resolver.zoom_for_focal_length(focal).unwrap();
            assert!((back - zoom).abs() < 1e-9, "zoom {} -> {}mm -> {}", zoom, focal, back);
        }
    }

    #[test]
    fn test_invalid_zoom_is_error() {
        let resolver = FocalLengthResolver::default();
        assert!(matches!(resolver.focal_length_mm(0.0), Err(EngineError::InvalidZoom(_))));
        assert!(resolver.focal_length_mm(f64::NAN).is_err());
        assert!(resolver.zoom_for_focal_length(-5.0).is_err());
    }

    #[test]
    fn test_invalid_tables_rejected() {
        assert!(LensTable::new("empty", vec![]).is_err());
        assert!(LensTable::new(
            "dup",
            vec![LensAnchor::new(1.0, 26.0), LensAnchor::new(1.0, 30.0)]
        )
        .is_err());
        let sorted = LensTable::new(
            "custom",
            vec![LensAnchor::new(2.0, 50.0), LensAnchor::new(1.0, 25.0)],
        )
        .unwrap();
        assert_eq!(sorted.anchors()[0].zoom, 1.0);
    }
}
