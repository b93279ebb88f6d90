//! Map frame handling: where the view should be, and how to get there.
//!
//! The frame is derived from a backend-supplied origin when one arrives
//! and falls back to a fixed default otherwise. Bounds, when valid, take
//! precedence over center and zoom.

use serde::Serialize;

use crate::models::Point;

/// Padding fraction applied when fitting the view to bounds.
pub const BOUNDS_PADDING: f64 = 0.1;

/// Earth-scale bounds used to frame the whole world.
pub const WORLD_BOUNDS: (Point, Point) = (
    Point { lat: -85.0, lng: -180.0 },
    Point { lat: 85.0, lng: 180.0 },
);

/// The current map framing. Bounds override center/zoom when present
/// and non-degenerate.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFrame {
    pub center: Point,
    pub zoom: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<(Point, Point)>,
}

impl Default for MapFrame {
    fn default() -> Self {
        MapFrame {
            center: Point { lat: 17.0, lng: -75.0 },
            zoom: 5,
            bounds: None,
        }
    }
}

/// A backend origin: any subset of a frame. Absent parts leave the
/// current frame untouched.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Origin {
    pub center: Option<Point>,
    pub zoom: Option<u8>,
    pub bounds: Option<(Point, Point)>,
}

/// What the presentation surface should do with its viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum FrameAction {
    FitBounds {
        bounds: (Point, Point),
        padding: f64,
    },
    SetView {
        center: Point,
        zoom: u8,
    },
}

fn degenerate(bounds: &(Point, Point)) -> bool {
    bounds.0.lat == bounds.1.lat || bounds.0.lng == bounds.1.lng
}

impl MapFrame {
    /// Resolves the frame into a single view instruction. Degenerate
    /// bounds (corners sharing a latitude or longitude) carry no area
    /// and fall through to center/zoom.
    pub fn resolve(&self) -> FrameAction {
        if let Some(bounds) = self.bounds {
            if !degenerate(&bounds) {
                return FrameAction::FitBounds {
                    bounds,
                    padding: BOUNDS_PADDING,
                };
            }
        }
        FrameAction::SetView {
            center: self.center,
            zoom: self.zoom,
        }
    }

    /// Applies whatever parts of an origin are present. Returns true if
    /// anything changed, so callers can re-trigger frame-sensitive
    /// fetches.
    pub fn apply_origin(&mut self, origin: &Origin) -> bool {
        let mut changed = false;
        if let Some(center) = origin.center {
            self.center = center;
            changed = true;
        }
        if let Some(zoom) = origin.zoom {
            self.zoom = zoom;
            changed = true;
        }
        if let Some(bounds) = origin.bounds {
            self.bounds = Some(bounds);
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_take_precedence_over_center_and_zoom() {
        let frame = MapFrame {
            center: Point { lat: 17.0, lng: -75.0 },
            zoom: 5,
            bounds: Some(WORLD_BOUNDS),
        };
        assert_eq!(
            frame.resolve(),
            FrameAction::FitBounds {
                bounds: WORLD_BOUNDS,
                padding: 0.1
            }
        );
    }

    #[test]
    fn missing_bounds_fall_back_to_center_and_zoom() {
        let frame = MapFrame::default();
        assert_eq!(
            frame.resolve(),
            FrameAction::SetView {
                center: Point { lat: 17.0, lng: -75.0 },
                zoom: 5
            }
        );
    }

    #[test]
    fn degenerate_bounds_fall_back_to_center_and_zoom() {
        let mut frame = MapFrame::default();
        frame.bounds = Some((
            Point { lat: 10.0, lng: -80.0 },
            Point { lat: 10.0, lng: -60.0 },
        ));
        assert!(matches!(frame.resolve(), FrameAction::SetView { .. }));
    }

    #[test]
    fn origin_applies_only_present_parts() {
        let mut frame = MapFrame::default();
        let changed = frame.apply_origin(&Origin {
            center: None,
            zoom: Some(8),
            bounds: None,
        });
        assert!(changed);
        assert_eq!(frame.zoom, 8);
        assert_eq!(frame.center, Point { lat: 17.0, lng: -75.0 });

        let unchanged = frame.apply_origin(&Origin::default());
        assert!(!unchanged);
    }
}
