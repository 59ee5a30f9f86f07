//! Canvas configuration.

use crate::geometry::Size;
use serde::{Deserialize, Serialize};

/// Largest accepted `historyDepth`. Each entry is a full scene snapshot.
pub const MAX_HISTORY_DEPTH: usize = 1000;

/// Geometry and interaction constants shared by hit-testing, rendering,
/// history, and the controller.
///
/// Every field has a default, so a partial JSON object such as
/// `{"historyDepth": 50}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Node rectangle width in content units.
    pub node_width: f32,
    /// Node rectangle height in content units.
    pub node_height: f32,
    /// Hit radius around each socket anchor.
    pub socket_radius: f32,
    /// Border padding around a group's member bounding box.
    pub group_padding: f32,
    /// Height of the group title strip above the member bounding box.
    pub group_header: f32,
    /// Maximum number of undo snapshots kept.
    pub history_depth: usize,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Multiplicative zoom step for keyboard zoom and one wheel notch.
    pub zoom_step: f32,
    /// Minimum horizontal control-point offset of a connection curve.
    pub min_curve_bow: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            node_width: 160.0,
            node_height: 60.0,
            socket_radius: 8.0,
            group_padding: 16.0,
            group_header: 32.0,
            history_depth: 20,
            min_zoom: 0.1,
            max_zoom: 4.0,
            zoom_step: 1.1,
            min_curve_bow: 40.0,
        }
    }
}

impl CanvasConfig {
    pub fn node_size(&self) -> Size {
        Size {
            width: self.node_width,
            height: self.node_height,
        }
    }

    /// Parse a (possibly partial) JSON config.
    ///
    /// # Errors
    /// Returns the serde error message on malformed JSON or bad field types,
    /// or the [`validate`](Self::validate) message for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Check the ranges the rest of the canvas relies on: a usable zoom
    /// interval, a zoom step above zero, a non-empty node, and a history
    /// depth of 1 to [`MAX_HISTORY_DEPTH`].
    ///
    /// # Errors
    /// Names the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if !positive(self.min_zoom) || self.max_zoom.is_nan() || self.min_zoom > self.max_zoom {
            return Err(format!(
                "zoom range {}..{} must satisfy 0 < minZoom <= maxZoom",
                self.min_zoom, self.max_zoom
            ));
        }
        if !positive(self.zoom_step) {
            return Err(format!("zoomStep must be positive, got {}", self.zoom_step));
        }
        if !positive(self.node_width) || !positive(self.node_height) {
            return Err(format!(
                "node size {}x{} must be positive",
                self.node_width, self.node_height
            ));
        }
        if !(1..=MAX_HISTORY_DEPTH).contains(&self.history_depth) {
            return Err(format!(
                "historyDepth must be between 1 and {MAX_HISTORY_DEPTH}, got {}",
                self.history_depth
            ));
        }
        Ok(())
    }
}

/// False for zero, negatives and NaN.
fn positive(v: f32) -> bool {
    v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = CanvasConfig::from_json(r#"{"historyDepth": 50, "nodeWidth": 200}"#).unwrap();
        assert_eq!(cfg.history_depth, 50);
        assert_eq!(cfg.node_width, 200.0);
        assert_eq!(cfg.node_height, CanvasConfig::default().node_height);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(CanvasConfig::from_json("{nope").is_err());
        assert!(CanvasConfig::from_json(r#"{"historyDepth": "many"}"#).is_err());
    }

    #[test]
    fn out_of_range_values_are_refused() {
        for json in [
            r#"{"minZoom": 5}"#,
            r#"{"minZoom": 0}"#,
            r#"{"minZoom": -1, "maxZoom": 2}"#,
            r#"{"zoomStep": 0}"#,
            r#"{"nodeWidth": 0}"#,
            r#"{"nodeHeight": -10}"#,
            r#"{"historyDepth": 0}"#,
            r#"{"historyDepth": 1000000}"#,
        ] {
            assert!(CanvasConfig::from_json(json).is_err(), "{json} accepted");
        }
    }

    #[test]
    fn boundary_values_are_accepted() {
        let cfg = CanvasConfig::from_json(r#"{"minZoom": 2, "maxZoom": 2, "historyDepth": 1000}"#).unwrap();
        assert_eq!((cfg.min_zoom, cfg.max_zoom, cfg.history_depth), (2.0, 2.0, 1000));
        assert!(CanvasConfig::from_json(r#"{"historyDepth": 1}"#).is_ok());
        assert!(CanvasConfig::default().validate().is_ok());
    }
}
